// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test helper functions and fixtures.

use appraisal_audit::Cause;
use appraisal_persistence::{NewUser, Persistence, UserData};
use serde_json::json;
use std::path::{Path, PathBuf};

use crate::{
    AuthenticatedActor, CreateTargetSettingRequest, TargetSettingResponse, create_target_setting,
};

pub const TEST_PASSWORD: &str = "Correct-Horse-42";
pub const TEST_YEAR: i32 = 2026;

/// A small directory: one HR admin, two managers, and one report each.
pub struct TestDirectory {
    pub persistence: Persistence,
    pub hr: AuthenticatedActor,
    pub manager: AuthenticatedActor,
    pub employee: AuthenticatedActor,
    pub other_manager: AuthenticatedActor,
    pub other_employee: AuthenticatedActor,
}

pub fn create_test_user(
    persistence: &mut Persistence,
    login_name: &str,
    roles: &[&str],
    manager_id: Option<i64>,
) -> AuthenticatedActor {
    let roles: Vec<String> = roles.iter().map(|r| (*r).to_string()).collect();
    let user_id: i64 = persistence
        .create_user(&NewUser {
            login_name,
            display_name: login_name,
            password: TEST_PASSWORD,
            roles: &roles,
            manager_id,
        })
        .unwrap();
    let user: UserData = persistence.get_user_by_id(user_id).unwrap().unwrap();
    AuthenticatedActor::from_user(&user).unwrap()
}

pub fn create_test_directory() -> TestDirectory {
    create_test_directory_in(Persistence::new_in_memory().unwrap())
}

/// Seeds the directory into an existing store.
pub fn create_test_directory_in(mut persistence: Persistence) -> TestDirectory {
    let hr: AuthenticatedActor = create_test_user(&mut persistence, "hr", &["hr_admin"], None);
    let manager: AuthenticatedActor =
        create_test_user(&mut persistence, "manager", &["employee", "manager"], None);
    let employee: AuthenticatedActor = create_test_user(
        &mut persistence,
        "employee",
        &["employee"],
        Some(manager.user_id),
    );
    let other_manager: AuthenticatedActor = create_test_user(
        &mut persistence,
        "other-manager",
        &["employee", "manager"],
        None,
    );
    let other_employee: AuthenticatedActor = create_test_user(
        &mut persistence,
        "other-employee",
        &["employee"],
        Some(other_manager.user_id),
    );

    TestDirectory {
        persistence,
        hr,
        manager,
        employee,
        other_manager,
        other_employee,
    }
}

/// A database file path unique to this process and `name`.
pub fn temp_database_path(name: &str) -> PathBuf {
    let path: PathBuf =
        std::env::temp_dir().join(format!("appraisal_api_{name}_{}.db", std::process::id()));
    remove_database(&path);
    path
}

/// Removes a database file together with its WAL side files.
pub fn remove_database(path: &Path) {
    for suffix in ["", "-wal", "-shm"] {
        let mut file = path.to_path_buf().into_os_string();
        file.push(suffix);
        let _ = std::fs::remove_file(file);
    }
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("api-req-456"), String::from("API request"))
}

pub fn valid_target_entries() -> Vec<serde_json::Value> {
    vec![
        json!({
            "taskDescription": "Deliver the quarterly planning report",
            "kpi": "Accepted by leadership",
            "weight": 40,
            "difficulty": "L1"
        }),
        json!({
            "taskDescription": "Reduce open support tickets",
            "kpi": "Backlog under 20",
            "weight": 35,
            "difficulty": "L2"
        }),
        json!({
            "taskDescription": "Mentor a new team member",
            "kpi": "Onboarding completed",
            "weight": 25,
            "difficulty": "L3"
        }),
    ]
}

pub fn create_draft_request(targets: Vec<serde_json::Value>) -> CreateTargetSettingRequest {
    CreateTargetSettingRequest {
        cycle_year: TEST_YEAR,
        targets,
        current_role: Some(String::from("Analyst")),
        long_term_goal: Some(String::from("Lead a team")),
        is_draft: true,
    }
}

/// Creates a valid draft for `dir.employee` and returns its id.
pub fn create_employee_draft(dir: &mut TestDirectory) -> String {
    let response: TargetSettingResponse = create_target_setting(
        &mut dir.persistence,
        create_draft_request(valid_target_entries()),
        &dir.employee,
        create_test_cause(),
    )
    .unwrap();
    response.target_setting.id
}
