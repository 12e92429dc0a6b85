// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::RunQueryDsl;
use time::OffsetDateTime;

use crate::tests::helpers::{
    create_reporting_pair, create_test_persistence, create_test_record, create_test_user,
    remove_database, temp_database_path,
};
use crate::{AccessScope, Persistence, PersistenceError, TargetSettingFilter};
use appraisal_domain::{Difficulty, Target, TargetSetting, TargetSettingStatus};

#[test]
fn test_create_and_read_back_round_trip() {
    let mut persistence: Persistence = create_test_persistence();
    let (employee_id, manager_id) = create_reporting_pair(&mut persistence);
    let record: TargetSetting = create_test_record("ts-1", employee_id, manager_id, 2025);

    persistence.create_target_setting(&record).unwrap();

    let by_id: TargetSetting = persistence
        .find_target_setting_by_id("ts-1")
        .unwrap()
        .unwrap();
    assert_eq!(by_id, record);

    let by_year: TargetSetting = persistence
        .find_target_setting_by_employee_and_year(employee_id, 2025)
        .unwrap()
        .unwrap();
    assert_eq!(by_year, record);
}

#[test]
fn test_round_trip_preserves_incomplete_draft_targets() {
    let mut persistence: Persistence = create_test_persistence();
    let (employee_id, manager_id) = create_reporting_pair(&mut persistence);
    let mut record: TargetSetting = create_test_record("ts-1", employee_id, manager_id, 2025);
    record.targets = vec![
        Target {
            task_description: String::from("Half written"),
            ..Target::default()
        },
        Target::new("Another item to do", "Done", 10, Difficulty::L3),
    ];
    record.submitted_at = Some(OffsetDateTime::from_unix_timestamp(1_760_000_000).unwrap());

    persistence.create_target_setting(&record).unwrap();

    let stored: TargetSetting = persistence
        .find_target_setting_by_id("ts-1")
        .unwrap()
        .unwrap();
    assert_eq!(stored.targets, record.targets);
    assert_eq!(stored.submitted_at, record.submitted_at);
}

#[test]
fn test_missing_record_returns_none() {
    let mut persistence: Persistence = create_test_persistence();

    assert!(persistence.find_target_setting_by_id("nope").unwrap().is_none());
    assert!(
        persistence
            .find_target_setting_by_employee_and_year(1, 2025)
            .unwrap()
            .is_none()
    );
}

#[test]
fn test_duplicate_employee_and_year_is_unique_violation() {
    let mut persistence: Persistence = create_test_persistence();
    let (employee_id, manager_id) = create_reporting_pair(&mut persistence);

    persistence
        .create_target_setting(&create_test_record("ts-1", employee_id, manager_id, 2025))
        .unwrap();

    let result: Result<TargetSetting, PersistenceError> = persistence
        .create_target_setting(&create_test_record("ts-2", employee_id, manager_id, 2025));
    assert!(matches!(result, Err(PersistenceError::UniqueViolation(_))));

    // A different year is fine
    persistence
        .create_target_setting(&create_test_record("ts-3", employee_id, manager_id, 2026))
        .unwrap();
}

#[test]
fn test_conditional_update_applies_when_status_matches() {
    let mut persistence: Persistence = create_test_persistence();
    let (employee_id, manager_id) = create_reporting_pair(&mut persistence);
    let record: TargetSetting = create_test_record("ts-1", employee_id, manager_id, 2025);
    persistence.create_target_setting(&record).unwrap();

    let mut submitted: TargetSetting = record.clone();
    submitted.status = TargetSettingStatus::SubmittedToManager;
    submitted.submitted_at = Some(OffsetDateTime::from_unix_timestamp(1_760_000_000).unwrap());
    submitted.manager_feedback = Some(String::from("kept"));
    submitted.version = 2;

    persistence
        .update_target_setting(&submitted, TargetSettingStatus::Draft, 1)
        .unwrap();

    let stored: TargetSetting = persistence
        .find_target_setting_by_id("ts-1")
        .unwrap()
        .unwrap();
    assert_eq!(stored, submitted);
}

#[test]
fn test_conditional_update_clears_nullable_fields() {
    let mut persistence: Persistence = create_test_persistence();
    let (employee_id, manager_id) = create_reporting_pair(&mut persistence);
    let mut record: TargetSetting = create_test_record("ts-1", employee_id, manager_id, 2025);
    record.manager_feedback = Some(String::from("Please revise the KPIs"));
    persistence.create_target_setting(&record).unwrap();

    let mut cleared: TargetSetting = record.clone();
    cleared.manager_feedback = None;
    cleared.current_role = None;
    cleared.version = 2;
    persistence
        .update_target_setting(&cleared, TargetSettingStatus::Draft, 1)
        .unwrap();

    let stored: TargetSetting = persistence
        .find_target_setting_by_id("ts-1")
        .unwrap()
        .unwrap();
    assert!(stored.manager_feedback.is_none());
    assert!(stored.current_role.is_none());
}

#[test]
fn test_stale_update_reports_current_status() {
    let mut persistence: Persistence = create_test_persistence();
    let (employee_id, manager_id) = create_reporting_pair(&mut persistence);
    let record: TargetSetting = create_test_record("ts-1", employee_id, manager_id, 2025);
    persistence.create_target_setting(&record).unwrap();

    let mut submitted: TargetSetting = record.clone();
    submitted.status = TargetSettingStatus::SubmittedToManager;
    submitted.version = 2;

    persistence
        .update_target_setting(&submitted, TargetSettingStatus::Draft, 1)
        .unwrap();
    let second: Result<TargetSetting, PersistenceError> =
        persistence.update_target_setting(&submitted, TargetSettingStatus::Draft, 1);

    assert_eq!(
        second.unwrap_err(),
        PersistenceError::StatusConflict {
            id: String::from("ts-1"),
            current: TargetSettingStatus::SubmittedToManager,
        }
    );
}

#[test]
fn test_write_from_stale_read_is_rejected_across_connections() {
    let path = temp_database_path("stale_write");
    let mut first: Persistence = Persistence::new_with_file(&path).unwrap();
    let mut second: Persistence = Persistence::new_with_file(&path).unwrap();

    let (employee_id, manager_id) = create_reporting_pair(&mut first);
    first
        .create_target_setting(&create_test_record("ts-1", employee_id, manager_id, 2025))
        .unwrap();

    let stale: TargetSetting = first.find_target_setting_by_id("ts-1").unwrap().unwrap();

    // The other connection saves a new draft. The status stays `draft`.
    let mut saved: TargetSetting = second.find_target_setting_by_id("ts-1").unwrap().unwrap();
    saved.targets.truncate(1);
    saved.version = 2;
    second
        .update_target_setting(&saved, TargetSettingStatus::Draft, 1)
        .unwrap();

    let mut submitted: TargetSetting = stale.clone();
    submitted.status = TargetSettingStatus::SubmittedToManager;
    submitted.version = stale.version + 1;
    let result: Result<TargetSetting, PersistenceError> =
        first.update_target_setting(&submitted, TargetSettingStatus::Draft, stale.version);

    assert_eq!(
        result.unwrap_err(),
        PersistenceError::StatusConflict {
            id: String::from("ts-1"),
            current: TargetSettingStatus::Draft,
        }
    );
    let stored: TargetSetting = first.find_target_setting_by_id("ts-1").unwrap().unwrap();
    assert_eq!(stored, saved);

    drop(first);
    drop(second);
    remove_database(&path);
}

#[test]
fn test_update_of_missing_record_is_not_found() {
    let mut persistence: Persistence = create_test_persistence();
    let record: TargetSetting = create_test_record("ghost", 1, 2, 2025);

    let result: Result<TargetSetting, PersistenceError> =
        persistence.update_target_setting(&record, TargetSettingStatus::Draft, 1);

    assert!(matches!(result, Err(PersistenceError::NotFound(_))));
}

#[test]
fn test_unknown_stored_status_is_rejected_on_read() {
    let mut persistence: Persistence = create_test_persistence();
    let (employee_id, manager_id) = create_reporting_pair(&mut persistence);
    persistence
        .create_target_setting(&create_test_record("ts-1", employee_id, manager_id, 2025))
        .unwrap();

    diesel::sql_query("UPDATE target_settings SET status = 'archived' WHERE id = 'ts-1'")
        .execute(&mut persistence.conn)
        .unwrap();

    let result: Result<Option<TargetSetting>, PersistenceError> =
        persistence.find_target_setting_by_id("ts-1");
    assert!(matches!(result, Err(PersistenceError::SerializationError(_))));
}

fn seed_listing(persistence: &mut Persistence) -> (i64, i64, i64, i64) {
    let manager_id: i64 = create_test_user(persistence, "manager", &["manager", "employee"], None);
    let other_manager: i64 = create_test_user(persistence, "other", &["manager"], None);
    let alice: i64 = create_test_user(persistence, "alice", &["employee"], Some(manager_id));
    let bob: i64 = create_test_user(persistence, "bob", &["employee"], Some(other_manager));

    persistence
        .create_target_setting(&create_test_record("alice-2025", alice, manager_id, 2025))
        .unwrap();
    persistence
        .create_target_setting(&create_test_record("alice-2024", alice, manager_id, 2024))
        .unwrap();
    persistence
        .create_target_setting(&create_test_record("bob-2025", bob, other_manager, 2025))
        .unwrap();
    persistence
        .create_target_setting(&create_test_record(
            "manager-2025",
            manager_id,
            other_manager,
            2025,
        ))
        .unwrap();

    (manager_id, other_manager, alice, bob)
}

fn ids(records: &[TargetSetting]) -> Vec<&str> {
    records.iter().map(|r| r.id.as_str()).collect()
}

#[test]
fn test_list_own_scope() {
    let mut persistence: Persistence = create_test_persistence();
    let (_, _, alice, _) = seed_listing(&mut persistence);

    let records: Vec<TargetSetting> = persistence
        .list_target_settings(&AccessScope::Own(alice), &TargetSettingFilter::default())
        .unwrap();

    assert_eq!(ids(&records), vec!["alice-2025", "alice-2024"]);
}

#[test]
fn test_list_manager_scope_includes_own_and_reports() {
    let mut persistence: Persistence = create_test_persistence();
    let (manager_id, _, _, _) = seed_listing(&mut persistence);

    let records: Vec<TargetSetting> = persistence
        .list_target_settings(
            &AccessScope::ManagerOf(manager_id),
            &TargetSettingFilter::default(),
        )
        .unwrap();

    let mut found: Vec<&str> = ids(&records);
    found.sort_unstable();
    assert_eq!(found, vec!["alice-2024", "alice-2025", "manager-2025"]);
}

#[test]
fn test_list_all_with_filters() {
    let mut persistence: Persistence = create_test_persistence();
    seed_listing(&mut persistence);

    let all: Vec<TargetSetting> = persistence
        .list_target_settings(&AccessScope::All, &TargetSettingFilter::default())
        .unwrap();
    assert_eq!(all.len(), 4);

    let for_2024: Vec<TargetSetting> = persistence
        .list_target_settings(
            &AccessScope::All,
            &TargetSettingFilter {
                cycle_year: Some(2024),
                status: None,
            },
        )
        .unwrap();
    assert_eq!(ids(&for_2024), vec!["alice-2024"]);

    let submitted: Vec<TargetSetting> = persistence
        .list_target_settings(
            &AccessScope::All,
            &TargetSettingFilter {
                cycle_year: None,
                status: Some(TargetSettingStatus::SubmittedToManager),
            },
        )
        .unwrap();
    assert!(submitted.is_empty());
}
