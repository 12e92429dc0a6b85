// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{NewUser, Persistence};
use appraisal_domain::{Difficulty, Target, TargetSetting, TargetSettingStatus};
use time::OffsetDateTime;

pub fn create_test_persistence() -> Persistence {
    Persistence::new_in_memory().unwrap()
}

/// A database file path unique to this process and `name`.
pub fn temp_database_path(name: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!(
        "appraisal_persistence_{name}_{}.db",
        std::process::id()
    ));
    remove_database(&path);
    path
}

/// Removes a database file together with its WAL side files.
pub fn remove_database(path: &std::path::Path) {
    for suffix in ["", "-wal", "-shm"] {
        let mut file = path.to_path_buf().into_os_string();
        file.push(suffix);
        let _ = std::fs::remove_file(file);
    }
}

pub fn create_test_user(
    persistence: &mut Persistence,
    login_name: &str,
    roles: &[&str],
    manager_id: Option<i64>,
) -> i64 {
    let roles: Vec<String> = roles.iter().map(|r| (*r).to_string()).collect();
    persistence
        .create_user(&NewUser {
            login_name,
            display_name: login_name,
            password: "correct-horse-battery-9",
            roles: &roles,
            manager_id,
        })
        .unwrap()
}

/// Creates a manager and an employee reporting to them.
pub fn create_reporting_pair(persistence: &mut Persistence) -> (i64, i64) {
    let manager_id: i64 = create_test_user(persistence, "manager", &["manager"], None);
    let employee_id: i64 =
        create_test_user(persistence, "employee", &["employee"], Some(manager_id));
    (employee_id, manager_id)
}

pub fn create_valid_targets() -> Vec<Target> {
    vec![
        Target::new(
            "Deliver the quarterly planning report",
            "Accepted by leadership",
            40,
            Difficulty::L1,
        ),
        Target::new(
            "Reduce open support tickets",
            "Backlog under 20",
            35,
            Difficulty::L2,
        ),
        Target::new(
            "Mentor a new team member",
            "Onboarding completed",
            25,
            Difficulty::L3,
        ),
    ]
}

pub fn create_test_record(id: &str, employee_id: i64, manager_id: i64, year: i32) -> TargetSetting {
    let now: OffsetDateTime = OffsetDateTime::from_unix_timestamp(1_750_000_000).unwrap();
    TargetSetting {
        id: id.to_string(),
        employee_id,
        manager_id,
        cycle_year: year,
        status: TargetSettingStatus::Draft,
        targets: create_valid_targets(),
        current_role: Some(String::from("Analyst")),
        long_term_goal: Some(String::from("Team lead within two years")),
        manager_feedback: None,
        submitted_at: None,
        approved_at: None,
        created_at: now,
        updated_at: now,
        version: 1,
    }
}
