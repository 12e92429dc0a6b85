// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use appraisal_domain::{TargetSetting, TargetSettingStatus};
use diesel::SqliteConnection;
use diesel::prelude::*;
use diesel::sqlite::Sqlite;
use tracing::debug;

use crate::data_models::{AccessScope, TargetSettingFilter, TargetSettingRow};
use crate::diesel_schema::target_settings;
use crate::error::PersistenceError;

/// Finds the record for an employee and cycle year.
///
/// # Errors
///
/// Returns an error if the query fails or the stored row is malformed.
pub fn find_by_employee_and_year(
    conn: &mut SqliteConnection,
    employee_id: i64,
    cycle_year: i32,
) -> Result<Option<TargetSetting>, PersistenceError> {
    debug!(employee_id, cycle_year, "Looking up target setting by employee and year");

    target_settings::table
        .filter(target_settings::employee_id.eq(employee_id))
        .filter(target_settings::cycle_year.eq(cycle_year))
        .select(TargetSettingRow::as_select())
        .first(conn)
        .optional()?
        .map(TargetSettingRow::into_domain)
        .transpose()
}

/// Finds a record by id.
///
/// # Errors
///
/// Returns an error if the query fails or the stored row is malformed.
pub fn find_by_id(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<TargetSetting>, PersistenceError> {
    debug!(id, "Looking up target setting by id");

    target_settings::table
        .filter(target_settings::id.eq(id))
        .select(TargetSettingRow::as_select())
        .first(conn)
        .optional()?
        .map(TargetSettingRow::into_domain)
        .transpose()
}

/// Reads only the stored status of a record.
///
/// # Errors
///
/// Returns an error if the query fails or the status is unknown.
pub fn find_status(
    conn: &mut SqliteConnection,
    id: &str,
) -> Result<Option<TargetSettingStatus>, PersistenceError> {
    let status: Option<String> = target_settings::table
        .filter(target_settings::id.eq(id))
        .select(target_settings::status)
        .first(conn)
        .optional()?;

    status
        .map(|s| {
            s.parse::<TargetSettingStatus>()
                .map_err(|e| PersistenceError::SerializationError(e.to_string()))
        })
        .transpose()
}

/// Lists the records visible under `scope`, narrowed by `filter`.
///
/// Ordered by cycle year (newest first), then creation time.
///
/// # Errors
///
/// Returns an error if the query fails or a stored row is malformed.
pub fn list(
    conn: &mut SqliteConnection,
    scope: &AccessScope,
    filter: &TargetSettingFilter,
) -> Result<Vec<TargetSetting>, PersistenceError> {
    debug!(?scope, ?filter, "Listing target settings");

    let mut query = target_settings::table
        .select(TargetSettingRow::as_select())
        .into_boxed::<Sqlite>();

    match *scope {
        AccessScope::Own(employee_id) => {
            query = query.filter(target_settings::employee_id.eq(employee_id));
        }
        AccessScope::ManagerOf(user_id) => {
            query = query.filter(
                target_settings::employee_id
                    .eq(user_id)
                    .or(target_settings::manager_id.eq(user_id)),
            );
        }
        AccessScope::All => {}
    }

    if let Some(cycle_year) = filter.cycle_year {
        query = query.filter(target_settings::cycle_year.eq(cycle_year));
    }
    if let Some(status) = filter.status {
        query = query.filter(target_settings::status.eq(status.as_str()));
    }

    let rows: Vec<TargetSettingRow> = query
        .order((
            target_settings::cycle_year.desc(),
            target_settings::created_at.asc(),
            target_settings::id.asc(),
        ))
        .load(conn)?;

    rows.into_iter().map(TargetSettingRow::into_domain).collect()
}
