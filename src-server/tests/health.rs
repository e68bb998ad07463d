use std::sync::Mutex;

use axum::{
    body::Body,
    http::{header, Request},
    Router,
};
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

#[tokio::test]
async fn healthz_works() {
    let (_tmp, app) = test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let (_tmp, app) = test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/portfolio")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn provider_callback_is_public_and_always_acknowledged() {
    let (_tmp, app) = test_app().await;

    let body = r#"{"transactionId":"no-such-transaction","status":"completed"}"#;
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/payments/callback")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}
