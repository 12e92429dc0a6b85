// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Target-setting mutations.
//!
//! Writes are linearizable per record without holding locks across
//! requests. Creation relies on the unique `(employee_id, cycle_year)`
//! index and updates are conditional on the status and version the caller
//! read, so a write computed from a stale read never lands.

use appraisal_domain::{TargetSetting, TargetSettingStatus};
use diesel::SqliteConnection;
use diesel::prelude::*;
use tracing::{info, warn};

use crate::data_models::TargetSettingRow;
use crate::diesel_schema::target_settings;
use crate::error::PersistenceError;
use crate::queries;

/// Inserts a new record.
///
/// # Errors
///
/// Returns `UniqueViolation` if the employee already has a record for the
/// cycle year, or another error if the insert fails.
pub fn create(
    conn: &mut SqliteConnection,
    record: &TargetSetting,
) -> Result<TargetSetting, PersistenceError> {
    let row: TargetSettingRow = TargetSettingRow::from_domain(record)?;

    diesel::insert_into(target_settings::table)
        .values(&row)
        .execute(conn)?;

    info!(
        id = %record.id,
        employee_id = record.employee_id,
        cycle_year = record.cycle_year,
        "Created target setting"
    );
    Ok(record.clone())
}

/// Writes `record` only if the stored row is still at `expected_status`
/// and `expected_version`.
///
/// A draft save keeps the status at `draft`, so the status alone cannot
/// tell a fresh read from a stale one. The version can.
///
/// # Errors
///
/// Returns:
/// - `NotFound` if no record has this id
/// - `StatusConflict` if the stored row was written since it was read
/// - another error if the update fails
pub fn update_conditional(
    conn: &mut SqliteConnection,
    record: &TargetSetting,
    expected_status: TargetSettingStatus,
    expected_version: i64,
) -> Result<TargetSetting, PersistenceError> {
    let row: TargetSettingRow = TargetSettingRow::from_domain(record)?;

    let rows_affected: usize = diesel::update(target_settings::table)
        .filter(target_settings::id.eq(&record.id))
        .filter(target_settings::status.eq(expected_status.as_str()))
        .filter(target_settings::version.eq(expected_version))
        .set(&row)
        .execute(conn)?;

    if rows_affected == 0 {
        return match queries::target_settings::find_status(conn, &record.id)? {
            None => Err(PersistenceError::NotFound(format!(
                "Target setting {} not found",
                record.id
            ))),
            Some(current) => {
                warn!(
                    id = %record.id,
                    expected = %expected_status,
                    expected_version,
                    current = %current,
                    "Conditional update lost the race"
                );
                Err(PersistenceError::StatusConflict {
                    id: record.id.clone(),
                    current,
                })
            }
        };
    }

    info!(
        id = %record.id,
        from = %expected_status,
        to = %record.status,
        "Updated target setting"
    );
    Ok(record.clone())
}
