use std::sync::Mutex;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tempfile::tempdir;
use tower::ServiceExt;

use faltasi_server::{api::app_router, build_state, config::Config};

// Config::from_env reads process-wide env vars, so app construction is
// serialized across tests.
static ENV_LOCK: Mutex<()> = Mutex::new(());

async fn test_app() -> (tempfile::TempDir, Router) {
    let tmp = tempdir().unwrap();
    let app = {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("FT_DB_PATH", tmp.path().join("test.db"));
        std::env::set_var("FT_JWT_SECRET", "unit-test-jwt-secret-0123456789!");
        std::env::remove_var("FT_ADMIN_PHONE");
        std::env::remove_var("FT_ADMIN_PASSWORD");
        let config = Config::from_env();
        let state = build_state(&config).await.unwrap();
        app_router(state, &config)
    };
    (tmp, app)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register_and_login(app: &Router, phone: &str, password: &str) -> String {
    let (status, _) = send(
        app,
        "POST",
        "/api/v1/auth/register",
        None,
        Some(json!({"name": "Asha", "phone": phone, "password": password})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, tokens) = send(
        app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({"phone": phone, "password": password})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    tokens["accessToken"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn password_change_rotates_the_login_credential() {
    let (_tmp, app) = test_app().await;
    let access = register_and_login(&app, "+255730000001", "first-password").await;

    let (status, _) = send(
        &app,
        "PUT",
        "/api/v1/auth/password",
        Some(&access),
        Some(json!({"currentPassword": "first-password", "newPassword": "second-password"})),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The old credential stops working and the new one signs in
    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({"phone": "+255730000001", "password": "first-password"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({"phone": "+255730000001", "password": "second-password"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn password_change_requires_the_current_password() {
    let (_tmp, app) = test_app().await;
    let access = register_and_login(&app, "+255730000002", "first-password").await;

    let (status, _) = send(
        &app,
        "PUT",
        "/api/v1/auth/password",
        Some(&access),
        Some(json!({"currentPassword": "wrong-password", "newPassword": "second-password"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({"phone": "+255730000002", "password": "first-password"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn password_change_rejects_short_passwords() {
    let (_tmp, app) = test_app().await;
    let access = register_and_login(&app, "+255730000003", "first-password").await;

    let (status, _) = send(
        &app,
        "PUT",
        "/api/v1/auth/password",
        Some(&access),
        Some(json!({"currentPassword": "first-password", "newPassword": "short"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
