// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use appraisal_domain::{Target, TargetSetting, TargetSettingStatus};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::diesel_schema::target_settings;
use crate::error::PersistenceError;

/// Serializable representation of an Actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorData {
    pub id: String,
    pub actor_type: String,
}

/// Serializable representation of a Cause.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CauseData {
    pub id: String,
    pub description: String,
}

/// Serializable representation of an Action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionData {
    pub name: String,
    pub details: Option<String>,
}

/// Serializable representation of a `StateSnapshot`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateSnapshotData {
    pub data: String,
}

/// A user directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserData {
    pub user_id: i64,
    pub login_name: String,
    pub display_name: String,
    pub password_hash: String,
    /// Role names as stored, e.g. `["employee", "manager"]`.
    pub roles: Vec<String>,
    pub manager_id: Option<i64>,
    pub is_active: bool,
    pub created_at: String,
}

/// Input for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub login_name: &'a str,
    pub display_name: &'a str,
    /// Plain-text password, hashed before storage.
    pub password: &'a str,
    pub roles: &'a [String],
    pub manager_id: Option<i64>,
}

/// A login session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionData {
    pub session_id: i64,
    pub session_token: String,
    pub user_id: i64,
    pub created_at: String,
    pub last_activity_at: String,
    /// RFC 3339 expiry timestamp.
    pub expires_at: String,
}

/// The set of target settings a listing caller may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessScope {
    /// Only records owned by this employee.
    Own(i64),
    /// Records owned by this user plus those where they are manager-of-record.
    ManagerOf(i64),
    /// Every record.
    All,
}

/// Optional listing filters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TargetSettingFilter {
    pub cycle_year: Option<i32>,
    pub status: Option<TargetSettingStatus>,
}

/// Formats a timestamp for storage.
///
/// # Errors
///
/// Returns an error if the timestamp cannot be represented in RFC 3339.
pub fn format_timestamp(value: OffsetDateTime) -> Result<String, PersistenceError> {
    value
        .format(&Rfc3339)
        .map_err(|e| PersistenceError::SerializationError(e.to_string()))
}

fn format_optional(value: Option<OffsetDateTime>) -> Result<Option<String>, PersistenceError> {
    value.map(format_timestamp).transpose()
}

/// Parses a stored timestamp.
///
/// # Errors
///
/// Returns an error if the text is not RFC 3339.
pub fn parse_timestamp(value: &str) -> Result<OffsetDateTime, PersistenceError> {
    OffsetDateTime::parse(value, &Rfc3339)
        .map_err(|e| PersistenceError::SerializationError(format!("Bad timestamp '{value}': {e}")))
}

fn parse_optional(value: Option<&str>) -> Result<Option<OffsetDateTime>, PersistenceError> {
    value.map(parse_timestamp).transpose()
}

/// Diesel row for `target_settings`.
///
/// Used for reads, inserts, and conditional updates alike. The targets
/// list lives in `targets_json` and never leaves this crate as text.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = target_settings)]
#[diesel(treat_none_as_null = true)]
pub struct TargetSettingRow {
    pub id: String,
    pub employee_id: i64,
    pub manager_id: i64,
    pub cycle_year: i32,
    pub status: String,
    pub targets_json: String,
    pub current_role: Option<String>,
    pub long_term_goal: Option<String>,
    pub manager_feedback: Option<String>,
    pub submitted_at: Option<String>,
    pub approved_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub version: i64,
}

impl TargetSettingRow {
    /// Builds the storage row for a record.
    ///
    /// # Errors
    ///
    /// Returns an error if the targets or timestamps cannot be serialized.
    pub fn from_domain(record: &TargetSetting) -> Result<Self, PersistenceError> {
        Ok(Self {
            id: record.id.clone(),
            employee_id: record.employee_id,
            manager_id: record.manager_id,
            cycle_year: record.cycle_year,
            status: record.status.as_str().to_string(),
            targets_json: serde_json::to_string(&record.targets)?,
            current_role: record.current_role.clone(),
            long_term_goal: record.long_term_goal.clone(),
            manager_feedback: record.manager_feedback.clone(),
            submitted_at: format_optional(record.submitted_at)?,
            approved_at: format_optional(record.approved_at)?,
            created_at: format_timestamp(record.created_at)?,
            updated_at: format_timestamp(record.updated_at)?,
            version: record.version,
        })
    }

    /// Converts the row back into a domain record.
    ///
    /// # Errors
    ///
    /// Returns `SerializationError` if the status is unknown or the targets
    /// blob or a timestamp is malformed.
    pub fn into_domain(self) -> Result<TargetSetting, PersistenceError> {
        let status: TargetSettingStatus = self
            .status
            .parse()
            .map_err(|e: appraisal_domain::DomainError| {
                PersistenceError::SerializationError(e.to_string())
            })?;
        let targets: Vec<Target> = serde_json::from_str(&self.targets_json)?;

        Ok(TargetSetting {
            submitted_at: parse_optional(self.submitted_at.as_deref())?,
            approved_at: parse_optional(self.approved_at.as_deref())?,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
            id: self.id,
            employee_id: self.employee_id,
            manager_id: self.manager_id,
            cycle_year: self.cycle_year,
            status,
            targets,
            current_role: self.current_role,
            long_term_goal: self.long_term_goal,
            manager_feedback: self.manager_feedback,
            version: self.version,
        })
    }
}

/// Splits a stored role list.
#[must_use]
pub fn split_roles(roles: &str) -> Vec<String> {
    roles
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(String::from)
        .collect()
}
