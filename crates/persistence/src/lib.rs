// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Persistence layer for the appraisal target-setting service.
//!
//! This crate stores target settings, the audit trail, the user directory,
//! and login sessions in `SQLite` through Diesel.
//!
//! ## Consistency
//!
//! Two database rules keep the workflow consistent under concurrent
//! requests, independently of any locking done by callers:
//!
//! - a unique index on `(employee_id, cycle_year)` admits one record per
//!   employee and cycle
//! - every write to a record is a conditional
//!   `UPDATE ... WHERE status = ? AND version = ?` and bumps the version, so
//!   of two writes computed from the same read exactly one applies
//!
//! ## Testing
//!
//! `Persistence::new_in_memory()` creates an isolated shared-cache database
//! per call, so tests never observe each other's rows.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

use appraisal_audit::{AuditEvent, TARGET_SETTING_ENTITY};
use appraisal_domain::{TargetSetting, TargetSettingStatus};
use diesel::SqliteConnection;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counter for generating unique in-memory database names.
///
/// Each call to `new_in_memory()` receives a unique sequential ID.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Minimum bcrypt cost, used for throwaway in-memory databases.
const IN_MEMORY_BCRYPT_COST: u32 = 4;

mod backend;
mod data_models;
mod diesel_schema;
mod error;
mod mutations;
mod queries;

#[cfg(test)]
mod tests;

pub use backend::sqlite::{EXPECTED_TABLES, TARGET_SETTING_UNIQUE_INDEX};
pub use data_models::{
    AccessScope, NewUser, SessionData, TargetSettingFilter, UserData, format_timestamp,
    parse_timestamp,
};
pub use error::PersistenceError;

use backend::PersistenceBackend;

/// Persistence adapter over a single `SQLite` connection.
pub struct Persistence {
    pub(crate) conn: SqliteConnection,
    bcrypt_cost: u32,
}

impl Persistence {
    /// Creates a new persistence adapter with an in-memory `SQLite` database.
    ///
    /// Each call receives a unique database instance via atomic counter.
    /// Passwords are hashed with the minimum bcrypt cost.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        let db_id = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let db_name = format!("memdb_test_{db_id}");
        let shared_memory_url = format!("file:{db_name}?mode=memory&cache=shared");

        let mut conn: SqliteConnection = backend::sqlite::initialize_database(&shared_memory_url)?;
        conn.verify_foreign_key_enforcement()?;
        backend::sqlite::verify_schema(&mut conn)?;

        Ok(Self {
            conn,
            bcrypt_cost: IN_MEMORY_BCRYPT_COST,
        })
    }

    /// Creates a new persistence adapter with a file-based `SQLite` database.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the `SQLite` database file
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path_str = path.as_ref().to_str().ok_or_else(|| {
            PersistenceError::InitializationError("Invalid database path".to_string())
        })?;

        let mut conn: SqliteConnection = backend::sqlite::initialize_database(path_str)?;

        // Enable WAL mode for better read concurrency
        backend::sqlite::enable_wal_mode(&mut conn)?;

        conn.verify_foreign_key_enforcement()?;
        backend::sqlite::verify_schema(&mut conn)?;

        Ok(Self {
            conn,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        })
    }

    /// Verifies that foreign key enforcement is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if foreign key enforcement is not enabled.
    pub fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError> {
        self.conn.verify_foreign_key_enforcement()
    }

    /// Checks that the migrated schema has every expected table and the
    /// target-setting uniqueness index.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first missing object.
    pub fn verify_schema(&mut self) -> Result<(), PersistenceError> {
        backend::sqlite::verify_schema(&mut self.conn)
    }

    // ========================================================================
    // Target Settings
    // ========================================================================

    /// Finds the record for an employee and cycle year.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored row is malformed.
    pub fn find_target_setting_by_employee_and_year(
        &mut self,
        employee_id: i64,
        cycle_year: i32,
    ) -> Result<Option<TargetSetting>, PersistenceError> {
        queries::target_settings::find_by_employee_and_year(&mut self.conn, employee_id, cycle_year)
    }

    /// Finds a record by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored row is malformed.
    pub fn find_target_setting_by_id(
        &mut self,
        id: &str,
    ) -> Result<Option<TargetSetting>, PersistenceError> {
        queries::target_settings::find_by_id(&mut self.conn, id)
    }

    /// Inserts a new record.
    ///
    /// # Errors
    ///
    /// Returns `UniqueViolation` if the employee already has a record for
    /// the cycle year.
    pub fn create_target_setting(
        &mut self,
        record: &TargetSetting,
    ) -> Result<TargetSetting, PersistenceError> {
        mutations::target_settings::create(&mut self.conn, record)
    }

    /// Writes `record` if the stored row is still at `expected_status` and
    /// `expected_version`, i.e. nothing was written since it was read.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the record does not exist and `StatusConflict`
    /// if it was written since it was read.
    pub fn update_target_setting(
        &mut self,
        record: &TargetSetting,
        expected_status: TargetSettingStatus,
        expected_version: i64,
    ) -> Result<TargetSetting, PersistenceError> {
        mutations::target_settings::update_conditional(
            &mut self.conn,
            record,
            expected_status,
            expected_version,
        )
    }

    /// Lists the records visible under `scope`, narrowed by `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a stored row is malformed.
    pub fn list_target_settings(
        &mut self,
        scope: &AccessScope,
        filter: &TargetSettingFilter,
    ) -> Result<Vec<TargetSetting>, PersistenceError> {
        queries::target_settings::list(&mut self.conn, scope, filter)
    }

    // ========================================================================
    // Audit
    // ========================================================================

    /// Persists an audit event.
    ///
    /// # Returns
    ///
    /// The event ID assigned to the persisted audit event.
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails.
    pub fn persist_audit_event(&mut self, event: &AuditEvent) -> Result<i64, PersistenceError> {
        mutations::audit::persist_audit_event(&mut self.conn, event)
    }

    /// Retrieves an audit event by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the event is not found or cannot be deserialized.
    pub fn get_audit_event(&mut self, event_id: i64) -> Result<AuditEvent, PersistenceError> {
        queries::audit::get_audit_event(&mut self.conn, event_id)
    }

    /// Retrieves the audit trail of a target setting, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the events cannot be retrieved or deserialized.
    pub fn get_audit_events_for_entity(
        &mut self,
        entity_id: &str,
    ) -> Result<Vec<AuditEvent>, PersistenceError> {
        queries::audit::get_audit_events_for_entity(
            &mut self.conn,
            TARGET_SETTING_ENTITY,
            entity_id,
        )
    }

    // ========================================================================
    // User Directory
    // ========================================================================

    /// Creates a user, hashing the password.
    ///
    /// # Errors
    ///
    /// Returns `UniqueViolation` if the login name is taken.
    pub fn create_user(&mut self, user: &NewUser<'_>) -> Result<i64, PersistenceError> {
        mutations::users::create_user(&mut self.conn, user, self.bcrypt_cost)
    }

    /// Retrieves a user by login name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_user_by_login(
        &mut self,
        login_name: &str,
    ) -> Result<Option<UserData>, PersistenceError> {
        queries::users::get_user_by_login(&mut self.conn, login_name)
    }

    /// Retrieves a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_user_by_id(&mut self, user_id: i64) -> Result<Option<UserData>, PersistenceError> {
        queries::users::get_user_by_id(&mut self.conn, user_id)
    }

    /// Lists all users.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_users(&mut self) -> Result<Vec<UserData>, PersistenceError> {
        queries::users::list_users(&mut self.conn)
    }

    /// Counts the users in the directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn count_users(&mut self) -> Result<i64, PersistenceError> {
        queries::users::count_users(&mut self.conn)
    }

    /// Deactivates a user and deletes their sessions.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` if the user does not exist.
    pub fn deactivate_user(&mut self, user_id: i64) -> Result<(), PersistenceError> {
        mutations::users::deactivate_user(&mut self.conn, user_id)
    }

    /// Verifies a password against a stored hash.
    ///
    /// # Errors
    ///
    /// Returns an error if password verification fails.
    pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, PersistenceError> {
        queries::users::verify_password(password, password_hash)
    }

    // ========================================================================
    // Session Management
    // ========================================================================

    /// Creates a new session for a user.
    ///
    /// # Arguments
    ///
    /// * `session_token` - The unique session token
    /// * `user_id` - The user ID
    /// * `expires_at` - The expiration timestamp (RFC 3339)
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be created.
    pub fn create_session(
        &mut self,
        session_token: &str,
        user_id: i64,
        expires_at: &str,
    ) -> Result<i64, PersistenceError> {
        mutations::users::create_session(&mut self.conn, session_token, user_id, expires_at)
    }

    /// Retrieves a session by token.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_session_by_token(
        &mut self,
        session_token: &str,
    ) -> Result<Option<SessionData>, PersistenceError> {
        queries::users::get_session_by_token(&mut self.conn, session_token)
    }

    /// Updates the last activity timestamp for a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub fn update_session_activity(&mut self, session_id: i64) -> Result<(), PersistenceError> {
        mutations::users::update_session_activity(&mut self.conn, session_id)
    }

    /// Deletes a session by token.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub fn delete_session(&mut self, session_token: &str) -> Result<(), PersistenceError> {
        mutations::users::delete_session(&mut self.conn, session_token)
    }

    /// Deletes all sessions that expired before `now` (RFC 3339).
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub fn delete_expired_sessions(&mut self, now: &str) -> Result<usize, PersistenceError> {
        mutations::users::delete_expired_sessions(&mut self.conn, now)
    }
}
