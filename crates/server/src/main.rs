// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

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

mod session;

#[cfg(test)]
mod tests;

use appraisal_api::{
    ApiError, AuditTrailResponse, AuthenticationService, CreateTargetSettingRequest,
    CreateUserRequest, CreateUserResponse, DeactivateUserResponse, DecideTargetSettingRequest,
    ListTargetSettingsQuery, ListTargetSettingsResponse, ListUsersResponse, LoginRequest,
    LoginResponse, TargetSettingInfo, TargetSettingResponse, UpdateTargetSettingRequest,
    WhoAmIResponse,
};
use appraisal_audit::Cause;
use appraisal_domain::FieldError;
use appraisal_persistence::Persistence;
use axum::{
    Json, Router,
    extract::{Path, Query, State as AxumState},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::session::SessionActor;

/// Appraisal Server - HTTP server for performance target setting
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long)]
    database: Option<String>,

    /// Address to bind the server to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind the server to
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Lifetime of a login session, in hours
    #[arg(long, default_value_t = 12)]
    session_ttl_hours: i64,
}

/// Application state shared across handlers.
///
/// The store is a single connection, so requests take turns on it. Record
/// consistency does not depend on this lock; the store's conditional
/// updates and unique index provide it.
#[derive(Clone)]
pub struct AppState {
    /// The persistence layer.
    pub persistence: Arc<Mutex<Persistence>>,
    /// Lifetime of newly created sessions.
    pub session_ttl: time::Duration,
}

/// Error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error indicator.
    pub error: bool,
    /// Error message.
    pub message: String,
    /// Field-level failures, for validation errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

/// Health check response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct HealthResponse {
    status: String,
}

/// HTTP error wrapper that implements `IntoResponse`.
#[derive(Debug)]
struct HttpError {
    /// The HTTP status code.
    status: StatusCode,
    /// The error message.
    message: String,
    /// Field-level failures, if any.
    errors: Option<Vec<FieldError>>,
}

impl HttpError {
    const fn new(status: StatusCode, message: String) -> Self {
        Self {
            status,
            message,
            errors: None,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let body: Json<ErrorResponse> = Json(ErrorResponse {
            error: true,
            message: self.message,
            errors: self.errors,
        });
        (self.status, body).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::AuthenticationFailed { .. } => {
                Self::new(StatusCode::UNAUTHORIZED, err.to_string())
            }
            ApiError::Forbidden { .. } => Self::new(StatusCode::FORBIDDEN, err.to_string()),
            ApiError::ResourceNotFound { .. } => Self::new(StatusCode::NOT_FOUND, err.to_string()),
            ApiError::Conflict { .. } => Self::new(StatusCode::CONFLICT, err.to_string()),
            ApiError::ValidationFailed { message, errors } => Self {
                status: StatusCode::BAD_REQUEST,
                message,
                errors: Some(errors),
            },
            ApiError::InvalidInput { .. } | ApiError::PasswordPolicyViolation { .. } => {
                Self::new(StatusCode::BAD_REQUEST, err.to_string())
            }
            ApiError::Internal { message } => {
                error!(error = %message, "Internal error");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    String::from("Internal server error"),
                )
            }
        }
    }
}

/// Builds the cause recorded in audit events for one request.
fn request_cause(description: &str) -> Cause {
    Cause::new(uuid::Uuid::new_v4().to_string(), description.to_string())
}

// ============================================================================
// Target settings
// ============================================================================

/// Handler for POST /targets.
async fn handle_create_target_setting(
    AxumState(app_state): AxumState<AppState>,
    SessionActor(actor, _): SessionActor,
    Json(req): Json<CreateTargetSettingRequest>,
) -> Result<(StatusCode, Json<TargetSettingResponse>), HttpError> {
    info!(user_id = actor.user_id, cycle_year = req.cycle_year, "Handling create_target_setting request");

    let mut persistence = app_state.persistence.lock().await;
    let response: TargetSettingResponse = appraisal_api::create_target_setting(
        &mut persistence,
        req,
        &actor,
        request_cause("POST /targets"),
    )?;
    drop(persistence);

    Ok((StatusCode::CREATED, Json(response)))
}

/// Handler for PUT `/targets/{id}`.
async fn handle_update_target_setting(
    AxumState(app_state): AxumState<AppState>,
    SessionActor(actor, _): SessionActor,
    Path(id): Path<String>,
    Json(req): Json<UpdateTargetSettingRequest>,
) -> Result<Json<TargetSettingResponse>, HttpError> {
    info!(user_id = actor.user_id, %id, "Handling update_target_setting request");

    let mut persistence = app_state.persistence.lock().await;
    let response: TargetSettingResponse = appraisal_api::update_target_setting(
        &mut persistence,
        &id,
        req,
        &actor,
        request_cause("PUT /targets/{id}"),
    )?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/targets/{id}/submit`.
async fn handle_submit_target_setting(
    AxumState(app_state): AxumState<AppState>,
    SessionActor(actor, _): SessionActor,
    Path(id): Path<String>,
) -> Result<Json<TargetSettingResponse>, HttpError> {
    info!(user_id = actor.user_id, %id, "Handling submit_target_setting request");

    let mut persistence = app_state.persistence.lock().await;
    let response: TargetSettingResponse = appraisal_api::submit_target_setting(
        &mut persistence,
        &id,
        &actor,
        request_cause("POST /targets/{id}/submit"),
    )?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/targets/{id}/approve`.
///
/// The body's `action` selects approval or a revision request.
async fn handle_decide_target_setting(
    AxumState(app_state): AxumState<AppState>,
    SessionActor(actor, _): SessionActor,
    Path(id): Path<String>,
    Json(req): Json<DecideTargetSettingRequest>,
) -> Result<Json<TargetSettingResponse>, HttpError> {
    info!(user_id = actor.user_id, %id, action = ?req.action, "Handling decide_target_setting request");

    let mut persistence = app_state.persistence.lock().await;
    let response: TargetSettingResponse = appraisal_api::decide_target_setting(
        &mut persistence,
        &id,
        req,
        &actor,
        request_cause("POST /targets/{id}/approve"),
    )?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET `/targets/{id}`.
async fn handle_get_target_setting(
    AxumState(app_state): AxumState<AppState>,
    SessionActor(actor, _): SessionActor,
    Path(id): Path<String>,
) -> Result<Json<TargetSettingInfo>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: TargetSettingInfo =
        appraisal_api::get_target_setting(&mut persistence, &id, &actor)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET /targets.
async fn handle_list_target_settings(
    AxumState(app_state): AxumState<AppState>,
    SessionActor(actor, _): SessionActor,
    Query(query): Query<ListTargetSettingsQuery>,
) -> Result<Json<ListTargetSettingsResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: ListTargetSettingsResponse =
        appraisal_api::list_target_settings(&mut persistence, &query, &actor)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET `/targets/{id}/audit`.
async fn handle_get_audit_trail(
    AxumState(app_state): AxumState<AppState>,
    SessionActor(actor, _): SessionActor,
    Path(id): Path<String>,
) -> Result<Json<AuditTrailResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: AuditTrailResponse =
        appraisal_api::get_target_setting_audit_trail(&mut persistence, &id, &actor)?;
    drop(persistence);

    Ok(Json(response))
}

// ============================================================================
// Sessions
// ============================================================================

/// Handler for POST /auth/login.
async fn handle_login(
    AxumState(app_state): AxumState<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, HttpError> {
    info!(login_name = %req.login_name, "Handling login request");

    let mut persistence = app_state.persistence.lock().await;
    let response: LoginResponse =
        appraisal_api::login(&mut persistence, &req, app_state.session_ttl)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST /auth/logout.
async fn handle_logout(
    AxumState(app_state): AxumState<AppState>,
    SessionActor(actor, token): SessionActor,
) -> Result<StatusCode, HttpError> {
    info!(user_id = actor.user_id, "Handling logout request");

    let mut persistence = app_state.persistence.lock().await;
    appraisal_api::logout(&mut persistence, &token)?;
    drop(persistence);

    Ok(StatusCode::OK)
}

/// Handler for GET /auth/me.
async fn handle_whoami(SessionActor(actor, _): SessionActor) -> Json<WhoAmIResponse> {
    Json(appraisal_api::whoami(&actor))
}

// ============================================================================
// User directory
// ============================================================================

/// Handler for POST /users.
///
/// Open without a session only while the directory is empty.
async fn handle_create_user(
    AxumState(app_state): AxumState<AppState>,
    session: Option<SessionActor>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<CreateUserResponse>), HttpError> {
    info!(login_name = %req.login_name, "Handling create_user request");

    let actor = session.map(|SessionActor(actor, _)| actor);

    let mut persistence = app_state.persistence.lock().await;
    let response: CreateUserResponse = appraisal_api::create_user(
        &mut persistence,
        req,
        actor.as_ref(),
        request_cause("POST /users"),
    )?;
    drop(persistence);

    Ok((StatusCode::CREATED, Json(response)))
}

/// Handler for GET /users.
async fn handle_list_users(
    AxumState(app_state): AxumState<AppState>,
    SessionActor(actor, _): SessionActor,
) -> Result<Json<ListUsersResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    let response: ListUsersResponse = appraisal_api::list_users(&mut persistence, &actor)?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for POST `/users/{user_id}/deactivate`.
async fn handle_deactivate_user(
    AxumState(app_state): AxumState<AppState>,
    SessionActor(actor, _): SessionActor,
    Path(user_id): Path<i64>,
) -> Result<Json<DeactivateUserResponse>, HttpError> {
    info!(user_id, by = actor.user_id, "Handling deactivate_user request");

    let mut persistence = app_state.persistence.lock().await;
    let response: DeactivateUserResponse = appraisal_api::deactivate_user(
        &mut persistence,
        user_id,
        &actor,
        request_cause("POST /users/{user_id}/deactivate"),
    )?;
    drop(persistence);

    Ok(Json(response))
}

/// Handler for GET /health.
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: String::from("ok"),
    })
}

/// Builds the application router with all endpoints.
fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/targets",
            post(handle_create_target_setting).get(handle_list_target_settings),
        )
        .route(
            "/targets/{id}",
            get(handle_get_target_setting).put(handle_update_target_setting),
        )
        .route("/targets/{id}/submit", post(handle_submit_target_setting))
        .route("/targets/{id}/approve", post(handle_decide_target_setting))
        .route("/targets/{id}/audit", get(handle_get_audit_trail))
        .route("/auth/login", post(handle_login))
        .route("/auth/logout", post(handle_logout))
        .route("/auth/me", get(handle_whoami))
        .route("/users", post(handle_create_user).get(handle_list_users))
        .route("/users/{user_id}/deactivate", post(handle_deactivate_user))
        .route("/health", get(handle_health))
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing Appraisal Server");

    let persistence: Persistence = if let Some(db_path) = &args.database {
        info!("Using file-based database at: {}", db_path);
        Persistence::new_with_file(db_path)?
    } else {
        info!("Using in-memory database");
        Persistence::new_in_memory()?
    };

    let session_ttl: time::Duration = if args.session_ttl_hours > 0 {
        time::Duration::hours(args.session_ttl_hours)
    } else {
        AuthenticationService::DEFAULT_SESSION_TTL
    };

    let app_state: AppState = AppState {
        persistence: Arc::new(Mutex::new(persistence)),
        session_ttl,
    };

    let app: Router = build_router(app_state);

    let addr: std::net::SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    info!(session_ttl_hours = session_ttl.whole_hours(), "Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
