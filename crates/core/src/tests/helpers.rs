// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::CreateTargetSetting;
use appraisal_audit::{Actor, Cause};
use appraisal_domain::{Difficulty, Target, TargetSetting, TargetSettingStatus};
use time::OffsetDateTime;

pub const EMPLOYEE_ID: i64 = 10;
pub const MANAGER_ID: i64 = 20;

pub fn create_test_actor() -> Actor {
    Actor::new(EMPLOYEE_ID.to_string(), String::from("employee"))
}

pub fn create_manager_actor() -> Actor {
    Actor::new(MANAGER_ID.to_string(), String::from("manager"))
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("req-456"), String::from("API request"))
}

pub fn test_now() -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(1_750_000_000).unwrap()
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

pub fn create_test_record(status: TargetSettingStatus, targets: Vec<Target>) -> TargetSetting {
    let created: OffsetDateTime = OffsetDateTime::UNIX_EPOCH;
    TargetSetting {
        id: String::from("ts-1"),
        employee_id: EMPLOYEE_ID,
        manager_id: MANAGER_ID,
        cycle_year: 2025,
        status,
        targets,
        current_role: Some(String::from("Analyst")),
        long_term_goal: None,
        manager_feedback: None,
        submitted_at: None,
        approved_at: None,
        created_at: created,
        updated_at: created,
        version: 1,
    }
}

pub fn create_test_command(targets: Vec<Target>, is_draft: bool) -> CreateTargetSetting {
    CreateTargetSetting {
        id: String::from("ts-new"),
        employee_id: EMPLOYEE_ID,
        manager_id: Some(MANAGER_ID),
        cycle_year: 2025,
        targets,
        current_role: None,
        long_term_goal: None,
        is_draft,
    }
}
