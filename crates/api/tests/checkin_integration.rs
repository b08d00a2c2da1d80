//! Integration tests for check-in endpoints.
//!
//! These tests require a running PostgreSQL instance.
//! Set TEST_DATABASE_URL environment variable or use docker-compose.

mod common;

use axum::http::{Method, StatusCode};
use common::{
    admin_token, create_test_app, create_test_pool, get_request_with_auth, json_request_with_auth,
    member_token, parse_response_body, run_migrations, test_config, TestEvent, TestMember,
};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

/// Register a member and return the ticket token.
async fn register_ticket(
    app: &axum::Router,
    config: &society_events_api::config::Config,
    event_id: Uuid,
    user_id: Uuid,
) -> String {
    let response = app
        .clone()
        .oneshot(json_request_with_auth(
            Method::POST,
            &format!("/api/v1/events/{}/register", event_id),
            json!({}),
            &member_token(config, user_id),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = parse_response_body(response).await;
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_check_in_happy_path() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;

    let config = test_config();
    let app = create_test_app(config.clone(), pool.clone());

    let event_id = TestEvent::free().insert(&pool).await;
    let user_id = TestMember::new().insert(&pool).await;
    let token = register_ticket(&app, &config, event_id, user_id).await;

    let scanner = Uuid::new_v4();
    let response = app
        .oneshot(json_request_with_auth(
            Method::POST,
            "/api/v1/check-in",
            json!({ "token": token, "location": "Main hall", "device_info": "Front desk tablet" }),
            &admin_token(&config, scanner),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "checked_in");
    assert_eq!(body["ticket"]["checked_in"], true);
    assert!(body["ticket"]["checked_in_at"].is_string());
    // Attendance log carries the scanner
    let (scanned_by, log_count): (Uuid, i64) = sqlx::query_as(
        "SELECT al.scanned_by, COUNT(*) OVER ()
         FROM attendance_logs al
         JOIN tickets t ON t.id = al.ticket_id
         WHERE t.token = $1",
    )
    .bind(&token)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(scanned_by, scanner);
    assert_eq!(log_count, 1);
}

#[tokio::test]
async fn test_check_in_twice_conflicts_and_logs_once() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;

    let config = test_config();
    let app = create_test_app(config.clone(), pool.clone());

    let event_id = TestEvent::free().insert(&pool).await;
    let user_id = TestMember::new().insert(&pool).await;
    let token = register_ticket(&app, &config, event_id, user_id).await;
    let admin = admin_token(&config, Uuid::new_v4());

    let first = app
        .clone()
        .oneshot(json_request_with_auth(
            Method::POST,
            "/api/v1/check-in",
            json!({ "token": token }),
            &admin,
        ))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .oneshot(json_request_with_auth(
            Method::POST,
            "/api/v1/check-in",
            json!({ "token": token }),
            &admin,
        ))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let body = parse_response_body(second).await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Already checked in at "));

    // The repeat scan must not add an attendance log
    let log_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM attendance_logs al
         JOIN tickets t ON t.id = al.ticket_id
         WHERE t.token = $1",
    )
    .bind(&token)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(log_count, 1);
}

#[tokio::test]
async fn test_check_in_unknown_token_is_not_found() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;

    let config = test_config();
    let app = create_test_app(config.clone(), pool.clone());

    let response = app
        .oneshot(json_request_with_auth(
            Method::POST,
            "/api/v1/check-in",
            json!({ "token": "EVT-ZZZZZZZZ" }),
            &admin_token(&config, Uuid::new_v4()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_check_in_malformed_token_is_rejected() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;

    let config = test_config();
    let app = create_test_app(config.clone(), pool.clone());

    let response = app
        .oneshot(json_request_with_auth(
            Method::POST,
            "/api/v1/check-in",
            json!({ "token": "not-a-token" }),
            &admin_token(&config, Uuid::new_v4()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_check_in_requires_admin() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;

    let config = test_config();
    let app = create_test_app(config.clone(), pool.clone());

    let user_id = TestMember::new().insert(&pool).await;
    let response = app
        .oneshot(json_request_with_auth(
            Method::POST,
            "/api/v1/check-in",
            json!({ "token": "EVT-A1B2C3D4" }),
            &member_token(&config, user_id),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_validate_ticket_does_not_mutate() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;

    let config = test_config();
    let app = create_test_app(config.clone(), pool.clone());

    let event_id = TestEvent::free().insert(&pool).await;
    let user_id = TestMember::new().insert(&pool).await;
    let token = register_ticket(&app, &config, event_id, user_id).await;
    let admin = admin_token(&config, Uuid::new_v4());

    let response = app
        .clone()
        .oneshot(get_request_with_auth(
            &format!("/api/v1/check-in/validate/{}", token),
            &admin,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["valid"], true);
    assert_eq!(body["checked_in"], false);

    // Still not checked in
    let checked_in: bool = sqlx::query_scalar("SELECT checked_in FROM tickets WHERE token = $1")
        .bind(&token)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(!checked_in);
}

#[tokio::test]
async fn test_validate_unknown_token_is_not_found() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;

    let config = test_config();
    let app = create_test_app(config.clone(), pool.clone());

    let response = app
        .oneshot(get_request_with_auth(
            "/api/v1/check-in/validate/EVT-QQQQQQQQ",
            &admin_token(&config, Uuid::new_v4()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
