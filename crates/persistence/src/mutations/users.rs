// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! User directory and session mutations.

use diesel::SqliteConnection;
use diesel::prelude::*;
use tracing::{debug, info};

use crate::backend::PersistenceBackend;
use crate::data_models::NewUser;
use crate::diesel_schema::{sessions, users};
use crate::error::PersistenceError;

/// Creates a new user.
///
/// The `login_name` is normalized to lowercase for case-insensitive uniqueness.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `user` - The user to create; the password is hashed before storage
/// * `bcrypt_cost` - The bcrypt work factor
///
/// # Errors
///
/// Returns `UniqueViolation` if the login name already exists, or another
/// error if hashing or the insert fails.
pub fn create_user(
    conn: &mut SqliteConnection,
    user: &NewUser<'_>,
    bcrypt_cost: u32,
) -> Result<i64, PersistenceError> {
    let normalized_login: String = user.login_name.trim().to_lowercase();

    info!(
        "Creating user with login_name: {}, display_name: {}, roles: {:?}",
        normalized_login, user.display_name, user.roles
    );

    let password_hash: String = bcrypt::hash(user.password, bcrypt_cost)
        .map_err(|e| PersistenceError::Other(format!("Failed to hash password: {e}")))?;

    diesel::insert_into(users::table)
        .values((
            users::login_name.eq(&normalized_login),
            users::display_name.eq(user.display_name),
            users::password_hash.eq(&password_hash),
            users::roles.eq(user.roles.join(",")),
            users::manager_id.eq(user.manager_id),
        ))
        .execute(conn)?;

    let user_id: i64 = conn.get_last_insert_rowid()?;

    info!(user_id, "User created");
    Ok(user_id)
}

/// Deactivates a user and ends all of their sessions.
///
/// # Errors
///
/// Returns `UserNotFound` if no user has this id, or another error if the
/// update fails.
pub fn deactivate_user(conn: &mut SqliteConnection, user_id: i64) -> Result<(), PersistenceError> {
    conn.transaction(|conn| {
        let rows_affected: usize = diesel::update(users::table)
            .filter(users::user_id.eq(user_id))
            .set(users::is_active.eq(0))
            .execute(conn)?;

        if rows_affected == 0 {
            return Err(PersistenceError::UserNotFound(user_id));
        }

        delete_sessions_for_user(conn, user_id)?;
        Ok(())
    })?;

    info!(user_id, "User deactivated");
    Ok(())
}

/// Creates a new session for a user.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `session_token` - The unique session token
/// * `user_id` - The user ID
/// * `expires_at` - The expiration timestamp (RFC 3339)
///
/// # Errors
///
/// Returns an error if the session cannot be created.
pub fn create_session(
    conn: &mut SqliteConnection,
    session_token: &str,
    user_id: i64,
    expires_at: &str,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(sessions::table)
        .values((
            sessions::session_token.eq(session_token),
            sessions::user_id.eq(user_id),
            sessions::expires_at.eq(expires_at),
        ))
        .execute(conn)?;

    let session_id: i64 = conn.get_last_insert_rowid()?;

    debug!(session_id, user_id, expires_at, "Session created");
    Ok(session_id)
}

/// Updates the last activity timestamp for a session.
///
/// # Errors
///
/// Returns an error if the database update fails.
pub fn update_session_activity(
    conn: &mut SqliteConnection,
    session_id: i64,
) -> Result<(), PersistenceError> {
    diesel::update(sessions::table)
        .filter(sessions::session_id.eq(session_id))
        .set(
            sessions::last_activity_at.eq(diesel::dsl::sql::<diesel::sql_types::Text>(
                "CURRENT_TIMESTAMP",
            )),
        )
        .execute(conn)?;

    Ok(())
}

/// Deletes a session by token. Used for logout.
///
/// # Errors
///
/// Returns an error if the database delete fails.
pub fn delete_session(
    conn: &mut SqliteConnection,
    session_token: &str,
) -> Result<(), PersistenceError> {
    debug!("Deleting session by token");

    diesel::delete(sessions::table)
        .filter(sessions::session_token.eq(session_token))
        .execute(conn)?;

    Ok(())
}

/// Deletes all sessions for a user.
///
/// # Errors
///
/// Returns an error if the database delete fails.
pub fn delete_sessions_for_user(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> Result<usize, PersistenceError> {
    let rows_affected: usize = diesel::delete(sessions::table)
        .filter(sessions::user_id.eq(user_id))
        .execute(conn)?;

    debug!(user_id, rows_affected, "Deleted sessions for user");
    Ok(rows_affected)
}

/// Deletes every session that expired before `now` (RFC 3339).
///
/// # Errors
///
/// Returns an error if the database delete fails.
pub fn delete_expired_sessions(
    conn: &mut SqliteConnection,
    now: &str,
) -> Result<usize, PersistenceError> {
    let rows_affected: usize = diesel::delete(sessions::table)
        .filter(sessions::expires_at.lt(now))
        .execute(conn)?;

    if rows_affected > 0 {
        info!("Deleted {} expired sessions", rows_affected);
    }
    Ok(rows_affected)
}
