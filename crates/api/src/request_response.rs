// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API request and response data transfer objects.
//!
//! JSON field names are camelCase.

use appraisal_domain::Target;
use serde::{Deserialize, Serialize};

const fn default_is_draft() -> bool {
    true
}

/// API request to create a target setting for the caller.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTargetSettingRequest {
    /// The appraisal year.
    pub cycle_year: i32,
    /// Raw target entries. Drafts may be incomplete.
    #[serde(default)]
    pub targets: Vec<serde_json::Value>,
    #[serde(default)]
    pub current_role: Option<String>,
    #[serde(default)]
    pub long_term_goal: Option<String>,
    /// When false the list must already pass strict validation.
    #[serde(default = "default_is_draft")]
    pub is_draft: bool,
}

/// API request to replace the draft targets of a record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTargetSettingRequest {
    /// Raw target entries. May be incomplete.
    pub targets: Vec<serde_json::Value>,
    /// Replacement role text. Absent keeps the stored value.
    #[serde(default)]
    pub current_role: Option<String>,
    /// Replacement goal text. Absent keeps the stored value.
    #[serde(default)]
    pub long_term_goal: Option<String>,
}

/// A manager's decision on submitted targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionAction {
    Approve,
    RequestRevision,
}

/// API request carrying a manager decision.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecideTargetSettingRequest {
    pub action: DecisionAction,
    /// Required for `request_revision`, ignored for `approve`.
    #[serde(default)]
    pub feedback: Option<String>,
}

/// Listing filters, taken from the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTargetSettingsQuery {
    #[serde(default)]
    pub cycle_year: Option<i32>,
    /// Status name, e.g. `submitted_to_manager`.
    #[serde(default)]
    pub status: Option<String>,
}

/// A target setting as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetSettingInfo {
    pub id: String,
    pub employee_id: i64,
    pub manager_id: i64,
    pub cycle_year: i32,
    pub status: String,
    pub targets: Vec<Target>,
    /// Sum of the target weights.
    pub total_weight: i64,
    pub current_role: Option<String>,
    pub long_term_goal: Option<String>,
    pub manager_feedback: Option<String>,
    /// RFC 3339 timestamps.
    pub submitted_at: Option<String>,
    pub approved_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// API response for a successful create or transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetSettingResponse {
    /// The record after the operation.
    pub target_setting: TargetSettingInfo,
    /// A success message.
    pub message: String,
}

/// API response for listing target settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTargetSettingsResponse {
    pub target_settings: Vec<TargetSettingInfo>,
}

/// One audit trail entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEventInfo {
    pub event_id: Option<i64>,
    pub actor_id: String,
    /// Role the actor acted in.
    pub actor_role: String,
    pub action: String,
    /// Structured details (previous/new status, target count, feedback).
    pub details: Option<serde_json::Value>,
    pub cause_id: String,
    pub cause_description: String,
    pub before: String,
    pub after: String,
    pub created_at: Option<String>,
}

/// API response for the audit trail of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditTrailResponse {
    pub target_setting_id: String,
    /// Events in insertion order.
    pub events: Vec<AuditEventInfo>,
}

/// API request to log in.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub login_name: String,
    pub password: String,
}

/// API response for successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// The session token (opaque).
    pub session_token: String,
    /// Session expiration timestamp (RFC 3339).
    pub expires_at: String,
    pub user: WhoAmIResponse,
}

/// API response describing the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhoAmIResponse {
    pub user_id: i64,
    pub login_name: String,
    pub display_name: String,
    pub roles: Vec<String>,
    pub manager_id: Option<i64>,
}

/// API request to add a user to the directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub login_name: String,
    pub display_name: String,
    pub password: String,
    pub password_confirmation: String,
    /// Role names: `employee`, `manager`, `hr_admin`.
    pub roles: Vec<String>,
    /// The user's manager. Must be an active user holding `manager`.
    #[serde(default)]
    pub manager_id: Option<i64>,
}

/// A directory entry as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub user_id: i64,
    pub login_name: String,
    pub display_name: String,
    pub roles: Vec<String>,
    pub manager_id: Option<i64>,
    pub is_active: bool,
    pub created_at: String,
}

/// API response for a created user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserResponse {
    pub user: UserInfo,
    /// A success message.
    pub message: String,
}

/// API response for listing users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersResponse {
    pub users: Vec<UserInfo>,
}

/// API response for a deactivated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeactivateUserResponse {
    pub user_id: i64,
    /// A success message.
    pub message: String,
}
