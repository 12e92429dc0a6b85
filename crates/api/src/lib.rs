// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API boundary for the appraisal target-setting service.
//!
//! Handlers take the persistence layer and an explicit
//! [`AuthenticatedActor`]. They decide who may act (relationship and role
//! checks), delegate lifecycle and content rules to the pure core, and
//! translate every lower-layer error into an [`ApiError`].

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

mod auth;
mod error;
mod handlers;
mod password_policy;
mod request_response;

#[cfg(test)]
mod tests;

pub use auth::{AuthenticatedActor, AuthenticationService, AuthorizationService, Role};
pub use error::{
    ApiError, AuthError, translate_core_error, translate_domain_error,
    translate_persistence_error,
};
pub use handlers::{
    create_target_setting, create_user, deactivate_user, decide_target_setting,
    get_target_setting, get_target_setting_audit_trail, list_target_settings, list_users, login,
    logout, submit_target_setting, update_target_setting, whoami,
};
pub use password_policy::{PasswordPolicy, PasswordPolicyError};
pub use request_response::{
    AuditEventInfo, AuditTrailResponse, CreateTargetSettingRequest, CreateUserRequest,
    CreateUserResponse, DeactivateUserResponse, DecideTargetSettingRequest, DecisionAction,
    ListTargetSettingsQuery, ListTargetSettingsResponse, ListUsersResponse, LoginRequest,
    LoginResponse, TargetSettingInfo, TargetSettingResponse, UpdateTargetSettingRequest,
    UserInfo, WhoAmIResponse,
};
