// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Authentication and authorization types and services.

use appraisal_audit::Actor;
use appraisal_domain::TargetSetting;
use appraisal_persistence::{
    Persistence, PersistenceError, SessionData, UserData, format_timestamp, parse_timestamp,
};
use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};

use crate::error::AuthError;

/// Directory roles.
///
/// A user may hold several roles at once; a manager is usually also an
/// employee with targets of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Drafts and submits their own targets.
    Employee,
    /// Decides on targets of employees who report to them.
    Manager,
    /// Reads every record and manages the user directory.
    HrAdmin,
}

impl Role {
    /// Returns the stored name of this role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Employee => "employee",
            Self::Manager => "manager",
            Self::HrAdmin => "hr_admin",
        }
    }

    /// Parses a stored role name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "employee" => Some(Self::Employee),
            "manager" => Some(Self::Manager),
            "hr_admin" => Some(Self::HrAdmin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An authenticated user, resolved from a session.
///
/// Handlers receive this explicitly; nothing reads the caller from ambient
/// state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedActor {
    pub user_id: i64,
    pub login_name: String,
    pub display_name: String,
    pub roles: Vec<Role>,
    /// The user's current manager, if any.
    pub manager_id: Option<i64>,
}

impl AuthenticatedActor {
    /// Builds an actor from a directory entry.
    ///
    /// # Errors
    ///
    /// Returns an error if a stored role name is not recognized.
    pub fn from_user(user: &UserData) -> Result<Self, AuthError> {
        let roles: Vec<Role> = user
            .roles
            .iter()
            .map(|name| {
                Role::parse(name).ok_or_else(|| AuthError::AuthenticationFailed {
                    reason: format!("Invalid role: {name}"),
                })
            })
            .collect::<Result<_, _>>()?;

        Ok(Self {
            user_id: user.user_id,
            login_name: user.login_name.clone(),
            display_name: user.display_name.clone(),
            roles,
            manager_id: user.manager_id,
        })
    }

    /// Returns true if the actor holds `role`.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Converts this actor into an audit actor acting in `role`.
    #[must_use]
    pub fn to_audit_actor(&self, role: Role) -> Actor {
        Actor::new(self.user_id.to_string(), role.as_str().to_string())
    }
}

/// Relationship and role checks.
///
/// Lifecycle state is not checked here; the workflow engine does that after
/// authorization passes.
pub struct AuthorizationService;

impl AuthorizationService {
    /// Read access: the owner, the manager-of-record, or an HR admin.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor has none of those relationships.
    pub fn authorize_read(
        actor: &AuthenticatedActor,
        record: &TargetSetting,
    ) -> Result<(), AuthError> {
        if record.is_owned_by(actor.user_id)
            || record.is_managed_by(actor.user_id)
            || actor.has_role(Role::HrAdmin)
        {
            return Ok(());
        }

        warn!(
            user_id = actor.user_id,
            target_setting_id = %record.id,
            "Read of unrelated target setting refused"
        );
        Err(AuthError::Unauthorized {
            action: String::from("view this target setting"),
            reason: String::from("only the owner, their manager, or HR may view it"),
        })
    }

    /// Owner-only actions: update and submit.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor does not own the record.
    pub fn authorize_owner_action(
        actor: &AuthenticatedActor,
        record: &TargetSetting,
        action: &str,
    ) -> Result<(), AuthError> {
        if record.is_owned_by(actor.user_id) {
            return Ok(());
        }

        warn!(
            user_id = actor.user_id,
            target_setting_id = %record.id,
            action,
            "Owner action by non-owner refused"
        );
        Err(AuthError::Unauthorized {
            action: action.to_string(),
            reason: String::from("only the owning employee may do this"),
        })
    }

    /// Approval decisions: the manager-of-record only.
    ///
    /// The manager is the one snapshotted at creation. A later change of
    /// reporting line does not move the decision.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor is not the manager-of-record.
    pub fn authorize_manager_decision(
        actor: &AuthenticatedActor,
        record: &TargetSetting,
        action: &str,
    ) -> Result<(), AuthError> {
        if record.is_managed_by(actor.user_id) {
            return Ok(());
        }

        warn!(
            user_id = actor.user_id,
            target_setting_id = %record.id,
            action,
            "Decision by non-manager refused"
        );
        Err(AuthError::Unauthorized {
            action: action.to_string(),
            reason: String::from("only the employee's manager-of-record may decide"),
        })
    }

    /// Directory administration.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor is not an HR admin.
    pub fn authorize_user_admin(actor: &AuthenticatedActor, action: &str) -> Result<(), AuthError> {
        if actor.has_role(Role::HrAdmin) {
            return Ok(());
        }

        warn!(user_id = actor.user_id, action, "Directory action refused");
        Err(AuthError::Unauthorized {
            action: action.to_string(),
            reason: String::from("requires the hr_admin role"),
        })
    }
}

/// Session-based authentication.
pub struct AuthenticationService;

impl AuthenticationService {
    /// Session lifetime used when the server is not configured otherwise.
    pub const DEFAULT_SESSION_TTL: Duration = Duration::hours(12);

    /// Authenticates a user and creates a session.
    ///
    /// Expired sessions are purged first. Unknown login names and wrong
    /// passwords produce the same failure.
    ///
    /// # Arguments
    ///
    /// * `persistence` - The persistence layer
    /// * `login_name` - The login name (case-insensitive)
    /// * `password` - The plain-text password
    /// * `session_ttl` - How long the new session stays valid
    ///
    /// # Returns
    ///
    /// A tuple of (`session_token`, `authenticated_actor`, `expires_at`)
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are wrong or the user is inactive.
    pub fn login(
        persistence: &mut Persistence,
        login_name: &str,
        password: &str,
        session_ttl: Duration,
    ) -> Result<(String, AuthenticatedActor, String), AuthError> {
        let invalid = || AuthError::AuthenticationFailed {
            reason: String::from("Invalid login name or password"),
        };

        let user: UserData = persistence
            .get_user_by_login(login_name)
            .map_err(Self::map_persistence_error)?
            .ok_or_else(invalid)?;

        let password_ok: bool = Persistence::verify_password(password, &user.password_hash)
            .map_err(Self::map_persistence_error)?;
        if !password_ok {
            debug!(login_name, "Password mismatch");
            return Err(invalid());
        }

        if !user.is_active {
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("User is inactive"),
            });
        }

        let actor: AuthenticatedActor = AuthenticatedActor::from_user(&user)?;

        let now: OffsetDateTime = OffsetDateTime::now_utc();
        let now_str: String = format_timestamp(now).map_err(Self::map_persistence_error)?;
        let purged: usize = persistence
            .delete_expired_sessions(&now_str)
            .map_err(Self::map_persistence_error)?;
        if purged > 0 {
            debug!(purged, "Purged expired sessions");
        }

        let session_token: String = Self::generate_session_token();
        let expires_at: String =
            format_timestamp(now + session_ttl).map_err(Self::map_persistence_error)?;

        persistence
            .create_session(&session_token, user.user_id, &expires_at)
            .map_err(Self::map_persistence_error)?;

        Ok((session_token, actor, expires_at))
    }

    /// Validates a session token and returns the authenticated actor.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is unknown or expired, or if its user
    /// is missing or inactive.
    pub fn validate_session(
        persistence: &mut Persistence,
        session_token: &str,
    ) -> Result<AuthenticatedActor, AuthError> {
        let session: SessionData = persistence
            .get_session_by_token(session_token)
            .map_err(Self::map_persistence_error)?
            .ok_or_else(|| AuthError::AuthenticationFailed {
                reason: String::from("Invalid session token"),
            })?;

        let expires_at: OffsetDateTime =
            parse_timestamp(&session.expires_at).map_err(Self::map_persistence_error)?;
        if OffsetDateTime::now_utc() > expires_at {
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("Session expired"),
            });
        }

        let user: UserData = persistence
            .get_user_by_id(session.user_id)
            .map_err(Self::map_persistence_error)?
            .ok_or_else(|| AuthError::AuthenticationFailed {
                reason: String::from("User not found"),
            })?;

        if !user.is_active {
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("User is inactive"),
            });
        }

        let actor: AuthenticatedActor = AuthenticatedActor::from_user(&user)?;

        persistence
            .update_session_activity(session.session_id)
            .map_err(Self::map_persistence_error)?;

        Ok(actor)
    }

    /// Logs out by deleting the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the logout fails.
    pub fn logout(persistence: &mut Persistence, session_token: &str) -> Result<(), AuthError> {
        persistence
            .delete_session(session_token)
            .map_err(Self::map_persistence_error)
    }

    fn generate_session_token() -> String {
        format!(
            "session_{}{:016x}",
            uuid::Uuid::new_v4().simple(),
            rand::random::<u64>()
        )
    }

    fn map_persistence_error(err: PersistenceError) -> AuthError {
        AuthError::Internal {
            message: format!("Database error: {err}"),
        }
    }
}
