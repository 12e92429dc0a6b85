// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::helpers::{
    TestDirectory, create_employee_draft, create_test_cause, create_test_directory,
    valid_target_entries,
};
use crate::{
    ApiError, AuditTrailResponse, AuthError, AuthenticatedActor, AuthorizationService,
    DecideTargetSettingRequest, DecisionAction, Role, TargetSettingInfo, TargetSettingResponse,
    UpdateTargetSettingRequest, decide_target_setting, get_target_setting,
    get_target_setting_audit_trail, submit_target_setting, update_target_setting,
};

#[test]
fn test_read_allowed_for_owner_manager_and_hr() {
    let mut dir: TestDirectory = create_test_directory();
    let id: String = create_employee_draft(&mut dir);

    for actor in [dir.employee.clone(), dir.manager.clone(), dir.hr.clone()] {
        let result: Result<TargetSettingInfo, ApiError> =
            get_target_setting(&mut dir.persistence, &id, &actor);
        assert!(result.is_ok(), "{} was refused", actor.login_name);
    }
}

#[test]
fn test_read_forbidden_for_unrelated_users() {
    let mut dir: TestDirectory = create_test_directory();
    let id: String = create_employee_draft(&mut dir);

    for actor in [dir.other_employee.clone(), dir.other_manager.clone()] {
        let result: Result<TargetSettingInfo, ApiError> =
            get_target_setting(&mut dir.persistence, &id, &actor);
        assert!(
            matches!(result, Err(ApiError::Forbidden { .. })),
            "{} was allowed",
            actor.login_name
        );
    }
}

#[test]
fn test_audit_trail_follows_read_rules() {
    let mut dir: TestDirectory = create_test_directory();
    let id: String = create_employee_draft(&mut dir);

    let allowed: AuditTrailResponse =
        get_target_setting_audit_trail(&mut dir.persistence, &id, &dir.manager).unwrap();
    assert_eq!(allowed.events.len(), 1);

    let refused: Result<AuditTrailResponse, ApiError> =
        get_target_setting_audit_trail(&mut dir.persistence, &id, &dir.other_employee);
    assert!(matches!(refused, Err(ApiError::Forbidden { .. })));
}

#[test]
fn test_only_owner_may_update_or_submit() {
    let mut dir: TestDirectory = create_test_directory();
    let id: String = create_employee_draft(&mut dir);

    for actor in [dir.manager.clone(), dir.hr.clone(), dir.other_employee.clone()] {
        let update: Result<TargetSettingResponse, ApiError> = update_target_setting(
            &mut dir.persistence,
            &id,
            UpdateTargetSettingRequest {
                targets: valid_target_entries(),
                current_role: None,
                long_term_goal: None,
            },
            &actor,
            create_test_cause(),
        );
        assert!(matches!(update, Err(ApiError::Forbidden { .. })));

        let submit: Result<TargetSettingResponse, ApiError> =
            submit_target_setting(&mut dir.persistence, &id, &actor, create_test_cause());
        assert!(matches!(submit, Err(ApiError::Forbidden { .. })));
    }
}

#[test]
fn test_owner_cannot_approve_own_targets() {
    let mut dir: TestDirectory = create_test_directory();
    let id: String = create_employee_draft(&mut dir);
    submit_target_setting(&mut dir.persistence, &id, &dir.employee, create_test_cause()).unwrap();

    let result: Result<TargetSettingResponse, ApiError> = decide_target_setting(
        &mut dir.persistence,
        &id,
        DecideTargetSettingRequest {
            action: DecisionAction::Approve,
            feedback: None,
        },
        &dir.employee,
        create_test_cause(),
    );

    assert!(matches!(result, Err(ApiError::Forbidden { .. })));
}

#[test]
fn test_hr_admin_cannot_decide() {
    let mut dir: TestDirectory = create_test_directory();
    let id: String = create_employee_draft(&mut dir);
    submit_target_setting(&mut dir.persistence, &id, &dir.employee, create_test_cause()).unwrap();

    let result: Result<TargetSettingResponse, ApiError> = decide_target_setting(
        &mut dir.persistence,
        &id,
        DecideTargetSettingRequest {
            action: DecisionAction::Approve,
            feedback: None,
        },
        &dir.hr,
        create_test_cause(),
    );

    assert!(matches!(result, Err(ApiError::Forbidden { .. })));
}

#[test]
fn test_authorization_precedes_state_check() {
    let mut dir: TestDirectory = create_test_directory();
    let id: String = create_employee_draft(&mut dir);

    // The record is still a draft, but the stranger learns nothing about that.
    let result: Result<TargetSettingResponse, ApiError> = decide_target_setting(
        &mut dir.persistence,
        &id,
        DecideTargetSettingRequest {
            action: DecisionAction::Approve,
            feedback: None,
        },
        &dir.other_manager,
        create_test_cause(),
    );

    assert!(matches!(result, Err(ApiError::Forbidden { .. })));
}

#[test]
fn test_user_admin_requires_hr_role() {
    let actor: AuthenticatedActor = AuthenticatedActor {
        user_id: 7,
        login_name: String::from("someone"),
        display_name: String::from("Someone"),
        roles: vec![Role::Employee, Role::Manager],
        manager_id: None,
    };

    let result: Result<(), AuthError> =
        AuthorizationService::authorize_user_admin(&actor, "list users");
    assert!(matches!(result, Err(AuthError::Unauthorized { .. })));

    let hr: AuthenticatedActor = AuthenticatedActor {
        roles: vec![Role::HrAdmin],
        ..actor
    };
    assert!(AuthorizationService::authorize_user_admin(&hr, "list users").is_ok());
}

#[test]
fn test_role_names_round_trip() {
    for role in [Role::Employee, Role::Manager, Role::HrAdmin] {
        assert_eq!(Role::parse(role.as_str()), Some(role));
    }
    assert_eq!(Role::parse("admin"), None);
}
