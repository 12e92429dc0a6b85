// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Behaviour when the store is shared or partly unavailable.

use appraisal::Command;
use appraisal_domain::TargetSetting;
use appraisal_persistence::Persistence;
use diesel::{Connection, RunQueryDsl, SqliteConnection};

use super::helpers::{
    TestDirectory, create_employee_draft, create_test_cause, create_test_directory_in,
    remove_database, temp_database_path, valid_target_entries,
};
use crate::handlers::commit_transition;
use super::helpers::TEST_PASSWORD;
use crate::{
    ApiError, AuthError, AuthenticatedActor, AuthenticationService, LoginRequest, LoginResponse,
    Role, TargetSettingInfo, TargetSettingResponse, UpdateTargetSettingRequest,
    get_target_setting, login, submit_target_setting, update_target_setting,
};

fn drop_table(path: &std::path::Path, table: &str) {
    let mut conn: SqliteConnection = SqliteConnection::establish(path.to_str().unwrap()).unwrap();
    diesel::sql_query(format!("DROP TABLE {table}"))
        .execute(&mut conn)
        .unwrap();
}

fn employee_login() -> LoginRequest {
    LoginRequest {
        login_name: String::from("employee"),
        password: TEST_PASSWORD.to_string(),
    }
}

#[test]
fn test_submit_computed_from_stale_read_loses_to_draft_save() {
    let path = temp_database_path("stale_submit");
    let mut dir: TestDirectory =
        create_test_directory_in(Persistence::new_with_file(&path).unwrap());
    let mut other: Persistence = Persistence::new_with_file(&path).unwrap();
    let id: String = create_employee_draft(&mut dir);

    let stale: TargetSetting = dir
        .persistence
        .find_target_setting_by_id(&id)
        .unwrap()
        .unwrap();

    // A second server process saves a shorter draft. The status stays `draft`.
    let saved: TargetSettingResponse = update_target_setting(
        &mut other,
        &id,
        UpdateTargetSettingRequest {
            targets: vec![valid_target_entries()[0].clone()],
            current_role: None,
            long_term_goal: None,
        },
        &dir.employee,
        create_test_cause(),
    )
    .unwrap();
    assert_eq!(saved.target_setting.targets.len(), 1);

    let result: Result<TargetSetting, ApiError> = commit_transition(
        &mut dir.persistence,
        &stale,
        Command::Submit,
        dir.employee.to_audit_actor(Role::Employee),
        create_test_cause(),
    );
    assert!(matches!(result, Err(ApiError::Conflict { .. })));

    let stored: TargetSettingInfo = get_target_setting(&mut other, &id, &dir.employee).unwrap();
    assert_eq!(stored.status, "draft");
    assert_eq!(stored.targets.len(), 1);

    // A fresh submit sees the saved list and rejects it.
    let resubmit: Result<TargetSettingResponse, ApiError> =
        submit_target_setting(&mut dir.persistence, &id, &dir.employee, create_test_cause());
    assert!(matches!(resubmit, Err(ApiError::ValidationFailed { .. })));

    drop(dir);
    drop(other);
    remove_database(&path);
}

#[test]
fn test_transition_survives_audit_write_failure() {
    let path = temp_database_path("audit_failure");
    let mut dir: TestDirectory =
        create_test_directory_in(Persistence::new_with_file(&path).unwrap());
    let id: String = create_employee_draft(&mut dir);

    drop_table(&path, "audit_events");

    let submitted: TargetSettingResponse =
        submit_target_setting(&mut dir.persistence, &id, &dir.employee, create_test_cause())
            .unwrap();
    assert_eq!(submitted.target_setting.status, "submitted_to_manager");

    let stored: TargetSettingInfo =
        get_target_setting(&mut dir.persistence, &id, &dir.employee).unwrap();
    assert_eq!(stored.status, "submitted_to_manager");
    assert!(stored.submitted_at.is_some());

    drop(dir);
    remove_database(&path);
}

#[test]
fn test_session_store_failure_is_internal_not_unauthenticated() {
    let path = temp_database_path("session_store_failure");
    let mut dir: TestDirectory =
        create_test_directory_in(Persistence::new_with_file(&path).unwrap());
    let response: LoginResponse = login(
        &mut dir.persistence,
        &employee_login(),
        AuthenticationService::DEFAULT_SESSION_TTL,
    )
    .unwrap();

    drop_table(&path, "sessions");

    let result: Result<AuthenticatedActor, AuthError> =
        AuthenticationService::validate_session(&mut dir.persistence, &response.session_token);
    assert!(matches!(result, Err(AuthError::Internal { .. })));

    let relogin: Result<LoginResponse, ApiError> = login(
        &mut dir.persistence,
        &employee_login(),
        AuthenticationService::DEFAULT_SESSION_TTL,
    );
    assert!(matches!(relogin, Err(ApiError::Internal { .. })));

    drop(dir);
    remove_database(&path);
}
