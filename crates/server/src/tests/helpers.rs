// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use appraisal_api::AuthenticationService;
use appraisal_persistence::{NewUser, Persistence};
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower::ServiceExt;

use crate::{AppState, build_router};

pub const TEST_PASSWORD: &str = "Correct-Horse-42";

pub fn create_test_app_state() -> AppState {
    let persistence: Persistence =
        Persistence::new_in_memory().expect("Failed to create in-memory persistence");
    AppState {
        persistence: Arc::new(Mutex::new(persistence)),
        session_ttl: AuthenticationService::DEFAULT_SESSION_TTL,
    }
}

/// Ids of the seeded directory.
pub struct Seeded {
    pub hr: i64,
    pub manager: i64,
    pub employee: i64,
    pub other_manager: i64,
}

/// Seeds an HR admin, two managers, and an employee reporting to `manager`.
pub async fn seed_directory(app_state: &AppState) -> Seeded {
    let mut persistence = app_state.persistence.lock().await;
    let mut add = |login: &str, roles: &[&str], manager_id: Option<i64>| -> i64 {
        let roles: Vec<String> = roles.iter().map(|r| (*r).to_string()).collect();
        persistence
            .create_user(&NewUser {
                login_name: login,
                display_name: login,
                password: TEST_PASSWORD,
                roles: &roles,
                manager_id,
            })
            .unwrap()
    };

    let hr: i64 = add("hr", &["hr_admin"], None);
    let manager: i64 = add("manager", &["employee", "manager"], None);
    let other_manager: i64 = add("other-manager", &["employee", "manager"], None);
    let employee: i64 = add("employee", &["employee"], Some(manager));

    Seeded {
        hr,
        manager,
        employee,
        other_manager,
    }
}

/// Sends a request and returns the status and parsed JSON body.
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request: Request<Body> = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status: StatusCode = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value: Value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

pub async fn login(app: &Router, login_name: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "loginName": login_name, "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["sessionToken"].as_str().unwrap().to_string()
}

pub fn valid_targets() -> Value {
    json!([
        {
            "taskDescription": "Deliver the quarterly planning report",
            "kpi": "Accepted by leadership",
            "weight": 40,
            "difficulty": "L1"
        },
        {
            "taskDescription": "Reduce open support tickets",
            "kpi": "Backlog under 20",
            "weight": 35,
            "difficulty": "L2"
        },
        {
            "taskDescription": "Mentor a new team member",
            "kpi": "Onboarding completed",
            "weight": 25,
            "difficulty": "L3"
        }
    ])
}

/// A fresh app with a seeded directory.
pub async fn create_test_app() -> (Router, Seeded) {
    let app_state: AppState = create_test_app_state();
    let seeded: Seeded = seed_directory(&app_state).await;
    (build_router(app_state), seeded)
}

/// Creates a draft as `token` and returns its id.
pub async fn create_draft(app: &Router, token: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/targets",
        Some(token),
        Some(json!({ "cycleYear": 2026, "targets": valid_targets() })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    body["targetSetting"]["id"].as_str().unwrap().to_string()
}
