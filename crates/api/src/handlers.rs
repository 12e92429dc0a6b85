// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API handler functions for state-changing and read-only operations.
//!
//! Every state-changing handler follows the same order: load the record,
//! authorize the actor against it, apply the core transition, write the
//! record conditionally, then record the audit event.

use appraisal::{
    Command, CreateResult, CreateTargetSetting, TransitionResult, apply, apply_create,
};
use appraisal_audit::{Action, Actor, AuditEvent, Cause, EntityRef, StateSnapshot};
use appraisal_domain::{
    DomainError, Target, TargetSetting, TargetSettingStatus, validate_draft_entries,
};
use appraisal_persistence::{
    AccessScope, NewUser, Persistence, PersistenceError, TargetSettingFilter, UserData,
    format_timestamp,
};
use std::str::FromStr;
use time::{Duration, OffsetDateTime};
use tracing::{debug, info, warn};

use crate::auth::{AuthenticatedActor, AuthenticationService, AuthorizationService, Role};
use crate::error::{
    ApiError, translate_core_error, translate_domain_error, translate_persistence_error,
};
use crate::password_policy::PasswordPolicy;
use crate::request_response::{
    AuditEventInfo, AuditTrailResponse, CreateTargetSettingRequest, CreateUserRequest,
    CreateUserResponse, DeactivateUserResponse, DecideTargetSettingRequest, DecisionAction,
    ListTargetSettingsQuery, ListTargetSettingsResponse, ListUsersResponse, LoginRequest,
    LoginResponse, TargetSettingInfo, TargetSettingResponse, UpdateTargetSettingRequest,
    UserInfo, WhoAmIResponse,
};

/// Entity type recorded for user directory audit events.
const USER_ENTITY: &str = "user";

// ============================================================================
// Shared helpers
// ============================================================================

fn format_optional(value: Option<OffsetDateTime>) -> Result<Option<String>, ApiError> {
    value
        .map(format_timestamp)
        .transpose()
        .map_err(translate_persistence_error)
}

impl TargetSettingInfo {
    /// Builds the client view of a record.
    ///
    /// # Errors
    ///
    /// Returns an error if a timestamp cannot be formatted.
    pub fn from_record(record: &TargetSetting) -> Result<Self, ApiError> {
        Ok(Self {
            id: record.id.clone(),
            employee_id: record.employee_id,
            manager_id: record.manager_id,
            cycle_year: record.cycle_year,
            status: record.status.as_str().to_string(),
            targets: record.targets.clone(),
            total_weight: record.total_weight(),
            current_role: record.current_role.clone(),
            long_term_goal: record.long_term_goal.clone(),
            manager_feedback: record.manager_feedback.clone(),
            submitted_at: format_optional(record.submitted_at)?,
            approved_at: format_optional(record.approved_at)?,
            created_at: format_timestamp(record.created_at).map_err(translate_persistence_error)?,
            updated_at: format_timestamp(record.updated_at).map_err(translate_persistence_error)?,
        })
    }
}

impl From<&AuditEvent> for AuditEventInfo {
    fn from(event: &AuditEvent) -> Self {
        let details: Option<serde_json::Value> = event.action.details.as_ref().map(|text| {
            serde_json::from_str(text).unwrap_or_else(|_| serde_json::Value::from(text.as_str()))
        });

        Self {
            event_id: event.event_id,
            actor_id: event.actor.id.clone(),
            actor_role: event.actor.actor_type.clone(),
            action: event.action.name.clone(),
            details,
            cause_id: event.cause.id.clone(),
            cause_description: event.cause.description.clone(),
            before: event.before.data.clone(),
            after: event.after.data.clone(),
            created_at: event.created_at.clone(),
        }
    }
}

impl From<&UserData> for UserInfo {
    fn from(user: &UserData) -> Self {
        Self {
            user_id: user.user_id,
            login_name: user.login_name.clone(),
            display_name: user.display_name.clone(),
            roles: user.roles.clone(),
            manager_id: user.manager_id,
            is_active: user.is_active,
            created_at: user.created_at.clone(),
        }
    }
}

impl From<&AuthenticatedActor> for WhoAmIResponse {
    fn from(actor: &AuthenticatedActor) -> Self {
        Self {
            user_id: actor.user_id,
            login_name: actor.login_name.clone(),
            display_name: actor.display_name.clone(),
            roles: actor.roles.iter().map(|r| r.as_str().to_string()).collect(),
            manager_id: actor.manager_id,
        }
    }
}

fn load_target_setting(persistence: &mut Persistence, id: &str) -> Result<TargetSetting, ApiError> {
    persistence
        .find_target_setting_by_id(id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| ApiError::ResourceNotFound {
            resource_type: String::from("Target setting"),
            message: format!("Target setting {id} does not exist"),
        })
}

fn parse_draft_targets(entries: &[serde_json::Value]) -> Result<Vec<Target>, ApiError> {
    validate_draft_entries(entries).map_err(|errors| {
        translate_domain_error(DomainError::InvalidTargets { errors })
    })
}

/// Persists an audit event after the record write has committed.
///
/// A failure here is logged and swallowed: the transition already happened.
fn record_audit(persistence: &mut Persistence, event: &AuditEvent) {
    if let Err(e) = persistence.persist_audit_event(event) {
        warn!(
            action = %event.action.name,
            entity_id = %event.entity.entity_id,
            error = %e,
            "Failed to persist audit event"
        );
    }
}

/// Applies `command` and writes the result if the record has not been
/// written since `record` was read.
pub(crate) fn commit_transition(
    persistence: &mut Persistence,
    record: &TargetSetting,
    command: Command,
    actor: Actor,
    cause: Cause,
) -> Result<TargetSetting, ApiError> {
    let result: TransitionResult = apply(record, command, actor, cause, OffsetDateTime::now_utc())
        .map_err(translate_core_error)?;

    let saved: TargetSetting = persistence
        .update_target_setting(
            &result.new_record,
            result.expected_status,
            result.expected_version,
        )
        .map_err(translate_persistence_error)?;

    record_audit(persistence, &result.audit_event);

    info!(
        target_setting_id = %saved.id,
        from = %result.expected_status,
        to = %saved.status,
        action = %result.audit_event.action.name,
        "Target setting transitioned"
    );

    Ok(saved)
}

fn target_setting_response(
    record: &TargetSetting,
    message: String,
) -> Result<TargetSettingResponse, ApiError> {
    Ok(TargetSettingResponse {
        target_setting: TargetSettingInfo::from_record(record)?,
        message,
    })
}

// ============================================================================
// Target settings
// ============================================================================

/// Creates a target setting for the calling employee.
///
/// The manager-of-record is the caller's manager at this moment. A draft
/// request only needs object-shaped entries; a non-draft request must
/// already pass strict validation.
///
/// # Arguments
///
/// * `persistence` - The persistence layer
/// * `request` - The create request
/// * `actor` - The authenticated employee
/// * `cause` - The cause for this action
///
/// # Errors
///
/// Returns an error if:
/// - The entries or cycle year are invalid
/// - The caller has no manager
/// - A record already exists for the caller and cycle year
/// - Database operations fail
pub fn create_target_setting(
    persistence: &mut Persistence,
    request: CreateTargetSettingRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<TargetSettingResponse, ApiError> {
    let targets: Vec<Target> = parse_draft_targets(&request.targets)?;
    let cycle_year: i32 = request.cycle_year;

    let command: CreateTargetSetting = CreateTargetSetting {
        id: uuid::Uuid::new_v4().to_string(),
        employee_id: actor.user_id,
        manager_id: actor.manager_id,
        cycle_year,
        targets,
        current_role: request.current_role,
        long_term_goal: request.long_term_goal,
        is_draft: request.is_draft,
    };

    let result: CreateResult = apply_create(
        command,
        actor.to_audit_actor(Role::Employee),
        cause,
        OffsetDateTime::now_utc(),
    )
    .map_err(translate_core_error)?;

    let duplicate = || {
        translate_domain_error(DomainError::DuplicateTargetSetting {
            employee_id: actor.user_id,
            cycle_year,
        })
    };

    // Advisory only. The unique index decides when two creates race.
    if persistence
        .find_target_setting_by_employee_and_year(actor.user_id, cycle_year)
        .map_err(translate_persistence_error)?
        .is_some()
    {
        return Err(duplicate());
    }

    let saved: TargetSetting = persistence
        .create_target_setting(&result.new_record)
        .map_err(|e| match e {
            PersistenceError::UniqueViolation(_) => duplicate(),
            other => translate_persistence_error(other),
        })?;

    record_audit(persistence, &result.audit_event);

    info!(
        target_setting_id = %saved.id,
        employee_id = saved.employee_id,
        cycle_year = saved.cycle_year,
        "Target setting created"
    );

    target_setting_response(
        &saved,
        format!("Target setting created for cycle year {}", saved.cycle_year),
    )
}

/// Replaces the targets of an editable record owned by the caller.
///
/// The record returns to `draft` whether it was in `draft` or
/// `revision_requested`.
///
/// # Errors
///
/// Returns an error if:
/// - The record does not exist
/// - The caller is not the owner
/// - The entries are not object-shaped
/// - The record is not editable, or changed concurrently
pub fn update_target_setting(
    persistence: &mut Persistence,
    id: &str,
    request: UpdateTargetSettingRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<TargetSettingResponse, ApiError> {
    let record: TargetSetting = load_target_setting(persistence, id)?;
    AuthorizationService::authorize_owner_action(actor, &record, "update this target setting")?;

    let targets: Vec<Target> = parse_draft_targets(&request.targets)?;
    let command: Command = Command::UpdateDraft {
        targets,
        current_role: request.current_role,
        long_term_goal: request.long_term_goal,
    };

    let saved: TargetSetting = commit_transition(
        persistence,
        &record,
        command,
        actor.to_audit_actor(Role::Employee),
        cause,
    )?;

    target_setting_response(&saved, String::from("Draft saved"))
}

/// Submits the caller's stored targets to their manager-of-record.
///
/// # Errors
///
/// Returns an error if:
/// - The record does not exist
/// - The caller is not the owner
/// - The stored list fails strict validation
/// - The record is not editable, or changed concurrently
pub fn submit_target_setting(
    persistence: &mut Persistence,
    id: &str,
    actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<TargetSettingResponse, ApiError> {
    let record: TargetSetting = load_target_setting(persistence, id)?;
    AuthorizationService::authorize_owner_action(actor, &record, "submit this target setting")?;

    let saved: TargetSetting = commit_transition(
        persistence,
        &record,
        Command::Submit,
        actor.to_audit_actor(Role::Employee),
        cause,
    )?;

    target_setting_response(&saved, String::from("Targets submitted to manager"))
}

/// Applies the manager-of-record's decision to submitted targets.
///
/// # Errors
///
/// Returns an error if:
/// - The record does not exist
/// - The caller is not the manager-of-record
/// - A revision request lacks valid feedback
/// - The record is not awaiting a decision, or changed concurrently
pub fn decide_target_setting(
    persistence: &mut Persistence,
    id: &str,
    request: DecideTargetSettingRequest,
    actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<TargetSettingResponse, ApiError> {
    let record: TargetSetting = load_target_setting(persistence, id)?;

    let (command, message): (Command, &str) = match request.action {
        DecisionAction::Approve => (Command::Approve, "Targets approved"),
        DecisionAction::RequestRevision => (
            Command::RequestRevision {
                feedback: request.feedback,
            },
            "Revision requested",
        ),
    };

    AuthorizationService::authorize_manager_decision(
        actor,
        &record,
        &format!("{} this target setting", command.verb()),
    )?;

    let saved: TargetSetting = commit_transition(
        persistence,
        &record,
        command,
        actor.to_audit_actor(Role::Manager),
        cause,
    )?;

    target_setting_response(&saved, message.to_string())
}

/// Returns a single record to a related caller.
///
/// # Errors
///
/// Returns an error if the record does not exist or the caller is neither
/// owner, manager-of-record, nor HR admin.
pub fn get_target_setting(
    persistence: &mut Persistence,
    id: &str,
    actor: &AuthenticatedActor,
) -> Result<TargetSettingInfo, ApiError> {
    let record: TargetSetting = load_target_setting(persistence, id)?;
    AuthorizationService::authorize_read(actor, &record)?;

    debug!(target_setting_id = %record.id, user_id = actor.user_id, "Target setting read");

    TargetSettingInfo::from_record(&record)
}

/// Lists the records the caller may see.
///
/// HR admins see every record, managers see their own and those they are
/// manager-of-record for, and everyone else sees only their own.
///
/// # Errors
///
/// Returns an error if the status filter is unknown or the query fails.
pub fn list_target_settings(
    persistence: &mut Persistence,
    query: &ListTargetSettingsQuery,
    actor: &AuthenticatedActor,
) -> Result<ListTargetSettingsResponse, ApiError> {
    let scope: AccessScope = if actor.has_role(Role::HrAdmin) {
        AccessScope::All
    } else if actor.has_role(Role::Manager) {
        AccessScope::ManagerOf(actor.user_id)
    } else {
        AccessScope::Own(actor.user_id)
    };

    let status: Option<TargetSettingStatus> = query
        .status
        .as_deref()
        .map(TargetSettingStatus::from_str)
        .transpose()
        .map_err(|e| ApiError::InvalidInput {
            field: String::from("status"),
            message: e.to_string(),
        })?;

    let filter: TargetSettingFilter = TargetSettingFilter {
        cycle_year: query.cycle_year,
        status,
    };

    let records: Vec<TargetSetting> = persistence
        .list_target_settings(&scope, &filter)
        .map_err(translate_persistence_error)?;

    debug!(user_id = actor.user_id, count = records.len(), "Target settings listed");

    let target_settings: Vec<TargetSettingInfo> = records
        .iter()
        .map(TargetSettingInfo::from_record)
        .collect::<Result<_, _>>()?;

    Ok(ListTargetSettingsResponse { target_settings })
}

/// Returns the audit trail of a record, oldest first.
///
/// Read authorization is the same as for the record itself.
///
/// # Errors
///
/// Returns an error if the record does not exist, the caller may not read
/// it, or the events cannot be loaded.
pub fn get_target_setting_audit_trail(
    persistence: &mut Persistence,
    id: &str,
    actor: &AuthenticatedActor,
) -> Result<AuditTrailResponse, ApiError> {
    let record: TargetSetting = load_target_setting(persistence, id)?;
    AuthorizationService::authorize_read(actor, &record)?;

    let events: Vec<AuditEvent> = persistence
        .get_audit_events_for_entity(&record.id)
        .map_err(translate_persistence_error)?;

    Ok(AuditTrailResponse {
        target_setting_id: record.id,
        events: events.iter().map(AuditEventInfo::from).collect(),
    })
}

// ============================================================================
// Sessions
// ============================================================================

/// Authenticates a user and opens a session.
///
/// # Errors
///
/// Returns an error if the credentials are wrong or the user is inactive.
pub fn login(
    persistence: &mut Persistence,
    request: &LoginRequest,
    session_ttl: Duration,
) -> Result<LoginResponse, ApiError> {
    let (session_token, actor, expires_at): (String, AuthenticatedActor, String) =
        AuthenticationService::login(
            persistence,
            &request.login_name,
            &request.password,
            session_ttl,
        )?;

    info!(user_id = actor.user_id, login_name = %actor.login_name, "User logged in");

    Ok(LoginResponse {
        session_token,
        expires_at,
        user: WhoAmIResponse::from(&actor),
    })
}

/// Logs out by deleting the session.
///
/// # Errors
///
/// Returns an error if the logout fails.
pub fn logout(persistence: &mut Persistence, session_token: &str) -> Result<(), ApiError> {
    AuthenticationService::logout(persistence, session_token)?;
    Ok(())
}

/// Describes the caller.
#[must_use]
pub fn whoami(actor: &AuthenticatedActor) -> WhoAmIResponse {
    WhoAmIResponse::from(actor)
}

// ============================================================================
// User directory
// ============================================================================

fn parse_roles(names: &[String]) -> Result<Vec<Role>, ApiError> {
    if names.is_empty() {
        return Err(ApiError::InvalidInput {
            field: String::from("roles"),
            message: String::from("At least one role is required"),
        });
    }

    names
        .iter()
        .map(|name| {
            Role::parse(name).ok_or_else(|| ApiError::InvalidInput {
                field: String::from("roles"),
                message: format!(
                    "Invalid role: {name}. Must be 'employee', 'manager' or 'hr_admin'"
                ),
            })
        })
        .collect()
}

fn validate_manager_reference(
    persistence: &mut Persistence,
    manager_id: i64,
) -> Result<(), ApiError> {
    let invalid = |message: String| ApiError::InvalidInput {
        field: String::from("managerId"),
        message,
    };

    let manager: UserData = persistence
        .get_user_by_id(manager_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| invalid(format!("User {manager_id} does not exist")))?;

    if !manager.is_active {
        return Err(invalid(format!("User {manager_id} is inactive")));
    }
    if !manager.roles.iter().any(|r| r == Role::Manager.as_str()) {
        return Err(invalid(format!(
            "User {manager_id} does not hold the manager role"
        )));
    }

    Ok(())
}

/// Adds a user to the directory.
///
/// While the directory is empty this is open to unauthenticated callers so
/// the first HR admin can be created; that first user must hold `hr_admin`.
/// Afterwards only HR admins may create users.
///
/// # Arguments
///
/// * `persistence` - The persistence layer
/// * `request` - The create user request
/// * `actor` - The authenticated caller, if any
/// * `cause` - The cause for this action
///
/// # Errors
///
/// Returns an error if:
/// - The caller is missing or not an HR admin (outside bootstrap)
/// - A field, role, or manager reference is invalid
/// - The password breaks the policy
/// - The login name is taken
pub fn create_user(
    persistence: &mut Persistence,
    request: CreateUserRequest,
    actor: Option<&AuthenticatedActor>,
    cause: Cause,
) -> Result<CreateUserResponse, ApiError> {
    let bootstrap: bool = persistence
        .count_users()
        .map_err(translate_persistence_error)?
        == 0;

    let roles: Vec<Role> = parse_roles(&request.roles)?;

    let audit_actor: Actor = if bootstrap {
        if !roles.contains(&Role::HrAdmin) {
            return Err(ApiError::InvalidInput {
                field: String::from("roles"),
                message: String::from("The first user must hold the hr_admin role"),
            });
        }
        Actor::new(String::from("bootstrap"), String::from("system"))
    } else {
        let actor: &AuthenticatedActor = actor.ok_or_else(|| ApiError::AuthenticationFailed {
            reason: String::from("Authentication required"),
        })?;
        AuthorizationService::authorize_user_admin(actor, "create users")?;
        actor.to_audit_actor(Role::HrAdmin)
    };

    let login_name: String = request.login_name.trim().to_lowercase();
    if login_name.is_empty() {
        return Err(ApiError::InvalidInput {
            field: String::from("loginName"),
            message: String::from("Login name must not be empty"),
        });
    }
    let display_name: &str = request.display_name.trim();
    if display_name.is_empty() {
        return Err(ApiError::InvalidInput {
            field: String::from("displayName"),
            message: String::from("Display name must not be empty"),
        });
    }

    PasswordPolicy::default().validate(
        &request.password,
        &request.password_confirmation,
        &login_name,
        display_name,
    )?;

    if let Some(manager_id) = request.manager_id {
        validate_manager_reference(persistence, manager_id)?;
    }

    let role_names: Vec<String> = roles.iter().map(|r| r.as_str().to_string()).collect();
    let user_id: i64 = persistence
        .create_user(&NewUser {
            login_name: &login_name,
            display_name,
            password: &request.password,
            roles: &role_names,
            manager_id: request.manager_id,
        })
        .map_err(|e| match e {
            PersistenceError::UniqueViolation(_) => ApiError::Conflict {
                message: format!("Login name '{login_name}' already exists"),
            },
            other => translate_persistence_error(other),
        })?;

    let user: UserData = persistence
        .get_user_by_id(user_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| ApiError::Internal {
            message: String::from("User not found after creation"),
        })?;

    let audit_event: AuditEvent = AuditEvent::new(
        audit_actor,
        cause,
        Action::new(
            String::from("create_user"),
            Some(
                serde_json::json!({
                    "loginName": user.login_name,
                    "roles": user.roles,
                    "managerId": user.manager_id,
                })
                .to_string(),
            ),
        ),
        EntityRef::new(USER_ENTITY.to_string(), user_id.to_string()),
        StateSnapshot::new(String::from("none")),
        StateSnapshot::new(format!(
            "login_name={},roles={},active=true",
            user.login_name,
            user.roles.join("|")
        )),
    );
    record_audit(persistence, &audit_event);

    info!(user_id, login_name = %user.login_name, bootstrap, "User created");

    Ok(CreateUserResponse {
        user: UserInfo::from(&user),
        message: format!("User {} created", user.login_name),
    })
}

/// Lists every directory entry.
///
/// # Errors
///
/// Returns an error if the caller is not an HR admin or the query fails.
pub fn list_users(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
) -> Result<ListUsersResponse, ApiError> {
    AuthorizationService::authorize_user_admin(actor, "list users")?;

    let users: Vec<UserData> = persistence
        .list_users()
        .map_err(translate_persistence_error)?;

    Ok(ListUsersResponse {
        users: users.iter().map(UserInfo::from).collect(),
    })
}

/// Deactivates a user and ends their sessions.
///
/// Existing target settings are untouched, including those where the user
/// is manager-of-record.
///
/// # Errors
///
/// Returns an error if:
/// - The caller is not an HR admin
/// - The caller targets themselves
/// - The user does not exist
pub fn deactivate_user(
    persistence: &mut Persistence,
    user_id: i64,
    actor: &AuthenticatedActor,
    cause: Cause,
) -> Result<DeactivateUserResponse, ApiError> {
    AuthorizationService::authorize_user_admin(actor, "deactivate users")?;

    if user_id == actor.user_id {
        return Err(ApiError::InvalidInput {
            field: String::from("userId"),
            message: String::from("Users cannot deactivate themselves"),
        });
    }

    persistence
        .deactivate_user(user_id)
        .map_err(translate_persistence_error)?;

    let audit_event: AuditEvent = AuditEvent::new(
        actor.to_audit_actor(Role::HrAdmin),
        cause,
        Action::new(String::from("deactivate_user"), None),
        EntityRef::new(USER_ENTITY.to_string(), user_id.to_string()),
        StateSnapshot::new(String::from("active=true")),
        StateSnapshot::new(String::from("active=false")),
    );
    record_audit(persistence, &audit_event);

    info!(user_id, by = actor.user_id, "User deactivated");

    Ok(DeactivateUserResponse {
        user_id,
        message: format!("User {user_id} deactivated"),
    })
}
