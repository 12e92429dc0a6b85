// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use appraisal_api::AuthenticationService;
use appraisal_persistence::Persistence;
use axum::{Router, http::StatusCode};
use diesel::{Connection, RunQueryDsl, SqliteConnection};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::helpers::{
    TEST_PASSWORD, create_test_app, create_test_app_state, login, seed_directory, send,
};
use crate::{AppState, build_router};

fn user_body(login_name: &str, roles: &[&str], manager_id: Option<i64>) -> serde_json::Value {
    json!({
        "loginName": login_name,
        "displayName": login_name,
        "password": TEST_PASSWORD,
        "passwordConfirmation": TEST_PASSWORD,
        "roles": roles,
        "managerId": manager_id
    })
}

#[tokio::test]
async fn test_health() {
    let (app, _) = create_test_app().await;

    let (status, body) = send(&app, "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_bootstrap_first_hr_admin() {
    let app: Router = build_router(create_test_app_state());

    let (status, body) = send(&app, "POST", "/users", None, Some(user_body("admin", &["hr_admin"], None))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["loginName"], "admin");

    // The directory is no longer empty.
    let (status, _) = send(&app, "POST", "/users", None, Some(user_body("second", &["employee"], None))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token: String = login(&app, "admin").await;
    let (status, _) = send(
        &app,
        "POST",
        "/users",
        Some(&token),
        Some(user_body("second", &["employee"], None)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_login_me_logout() {
    let (app, seeded) = create_test_app().await;
    let token: String = login(&app, "employee").await;

    let (status, me) = send(&app, "GET", "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["userId"], seeded.employee);
    assert_eq!(me["managerId"], seeded.manager);

    let (status, _) = send(&app, "POST", "/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bad_credentials_are_unauthorized() {
    let (app, _) = create_test_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "loginName": "employee", "password": "Wrong-Password-1" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], true);
}

#[tokio::test]
async fn test_unreadable_session_store_is_server_error() {
    let path = std::env::temp_dir().join(format!(
        "appraisal_server_session_store_{}.db",
        uuid::Uuid::new_v4().simple()
    ));
    let app_state: AppState = AppState {
        persistence: Arc::new(Mutex::new(Persistence::new_with_file(&path).unwrap())),
        session_ttl: AuthenticationService::DEFAULT_SESSION_TTL,
    };
    seed_directory(&app_state).await;
    let app: Router = build_router(app_state);
    let token: String = login(&app, "employee").await;

    let mut conn: SqliteConnection = SqliteConnection::establish(path.to_str().unwrap()).unwrap();
    diesel::sql_query("DROP TABLE sessions")
        .execute(&mut conn)
        .unwrap();
    drop(conn);

    let (status, body) = send(&app, "GET", "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Internal server error");

    let (status, body) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "loginName": "employee", "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Internal server error");

    drop(app);
    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn test_directory_is_hr_only() {
    let (app, seeded) = create_test_app().await;
    let employee: String = login(&app, "employee").await;
    let hr: String = login(&app, "hr").await;

    let (status, _) = send(&app, "GET", "/users", Some(&employee), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "GET", "/users", Some(&hr), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["users"].as_array().unwrap().len(), 4);

    let (status, _) = send(
        &app,
        "POST",
        "/users",
        Some(&hr),
        Some(user_body("report", &["employee"], Some(seeded.other_manager))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app,
        "POST",
        "/users",
        Some(&hr),
        Some(user_body("report", &["employee"], None)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_deactivation_revokes_access() {
    let (app, seeded) = create_test_app().await;
    let employee: String = login(&app, "employee").await;
    let hr: String = login(&app, "hr").await;

    let (status, _) = send(
        &app,
        "POST",
        &format!("/users/{}/deactivate", seeded.employee),
        Some(&hr),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", "/targets", Some(&employee), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        "POST",
        &format!("/users/{}/deactivate", seeded.hr),
        Some(&hr),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
