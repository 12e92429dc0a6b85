// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Session extraction for the server.
//!
//! Handlers that need a caller take [`SessionActor`]; the one endpoint that
//! is open during bootstrap takes `Option<SessionActor>`.

use appraisal_api::{AuthError, AuthenticatedActor, AuthenticationService};
use axum::{
    Json,
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use tracing::{debug, error, warn};

use crate::{AppState, ErrorResponse};

/// Extractor for an authenticated caller.
///
/// Validates `Authorization: Bearer <token>` and yields the actor together
/// with the raw session token (needed by logout).
///
/// # Errors
///
/// Rejects with HTTP 401 if the header is missing or malformed, or the
/// session is unknown, expired, or belongs to an inactive user. Rejects
/// with HTTP 500 if the session store cannot be read.
pub struct SessionActor(pub AuthenticatedActor, pub String);

fn bearer_token(parts: &Parts) -> Result<Option<String>, SessionError> {
    let Some(value) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let header: &str = value.to_str().map_err(|_| {
        warn!("Invalid Authorization header encoding");
        SessionError::InvalidAuthorizationHeader
    })?;

    let token: &str = header.strip_prefix("Bearer ").ok_or_else(|| {
        warn!("Authorization header does not start with 'Bearer '");
        SessionError::InvalidAuthorizationHeader
    })?;

    Ok(Some(token.trim().to_string()))
}

async fn resolve(state: &AppState, token: String) -> Result<SessionActor, SessionError> {
    let mut persistence = state.persistence.lock().await;
    let actor: AuthenticatedActor = AuthenticationService::validate_session(&mut persistence, &token)
        .map_err(|e| match e {
            AuthError::Internal { message } => SessionError::Internal(message),
            other => {
                warn!(error = %other, "Session validation failed");
                SessionError::InvalidSession(other.to_string())
            }
        })?;
    drop(persistence);

    debug!(user_id = actor.user_id, "Session validated");
    Ok(SessionActor(actor, token))
}

impl FromRequestParts<AppState> for SessionActor {
    type Rejection = SessionError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token: String = bearer_token(parts)?.ok_or_else(|| {
            debug!("Missing Authorization header");
            SessionError::MissingAuthorizationHeader
        })?;
        resolve(state, token).await
    }
}

impl OptionalFromRequestParts<AppState> for SessionActor {
    type Rejection = SessionError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        match bearer_token(parts)? {
            Some(token) => resolve(state, token).await.map(Some),
            None => Ok(None),
        }
    }
}

/// Session extraction errors.
#[derive(Debug)]
pub enum SessionError {
    /// Authorization header is missing.
    MissingAuthorizationHeader,
    /// Authorization header format is invalid.
    InvalidAuthorizationHeader,
    /// Session validation failed.
    InvalidSession(String),
    /// The session store could not be read.
    Internal(String),
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let (status, message): (StatusCode, String) = match self {
            Self::MissingAuthorizationHeader => (
                StatusCode::UNAUTHORIZED,
                String::from("Missing Authorization header"),
            ),
            Self::InvalidAuthorizationHeader => (
                StatusCode::UNAUTHORIZED,
                String::from("Invalid Authorization header format. Expected: 'Bearer <token>'"),
            ),
            Self::InvalidSession(reason) => (StatusCode::UNAUTHORIZED, reason),
            Self::Internal(message) => {
                error!(error = %message, "Session lookup failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    String::from("Internal server error"),
                )
            }
        };

        (
            status,
            Json(ErrorResponse {
                error: true,
                message,
                errors: None,
            }),
        )
            .into_response()
    }
}
