//! Integration tests for pricing quotes and coupon endpoints.
//!
//! These tests require a running PostgreSQL instance.
//! Set TEST_DATABASE_URL environment variable or use docker-compose.

mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use common::{
    admin_token, create_test_app, create_test_pool, delete_request_with_auth, get_request,
    get_request_with_auth, insert_coupon, json_request, json_request_with_auth, member_token,
    parse_response_body, run_migrations, test_config, TestEvent, TestMember,
};
use rust_decimal::Decimal;
use serde_json::json;
use std::str::FromStr;
use tower::ServiceExt;
use uuid::Uuid;

fn decimal(value: &serde_json::Value) -> Decimal {
    Decimal::from_str(value.as_str().expect("decimal serialized as string")).unwrap()
}

#[tokio::test]
async fn test_anonymous_price_quote_is_regular_tier() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;

    let config = test_config();
    let app = create_test_app(config, pool.clone());

    let event_id = TestEvent::paid().insert(&pool).await;

    let response = app
        .oneshot(get_request(&format!("/api/v1/events/{}/price", event_id)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["tier"], "regular");
    assert_eq!(body["is_free"], false);
    assert_eq!(body["early_bird"], false);
    assert_eq!(decimal(&body["amount"]), Decimal::new(20000, 2));
}

#[tokio::test]
async fn test_price_quote_uses_early_bird_before_deadline() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;

    let config = test_config();
    let app = create_test_app(config.clone(), pool.clone());

    let event_id = TestEvent::paid()
        .with_early_bird(Utc::now() + Duration::days(7))
        .insert(&pool)
        .await;
    let user_id = TestMember::paid_dentist().insert(&pool).await;

    let response = app
        .oneshot(get_request_with_auth(
            &format!("/api/v1/events/{}/price", event_id),
            &member_token(&config, user_id),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["tier"], "member");
    assert_eq!(body["early_bird"], true);
    assert_eq!(decimal(&body["amount"]), Decimal::new(9000, 2));
}

#[tokio::test]
async fn test_price_quote_free_event() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;

    let config = test_config();
    let app = create_test_app(config, pool.clone());

    let event_id = TestEvent::free().insert(&pool).await;

    let response = app
        .oneshot(get_request(&format!("/api/v1/events/{}/price", event_id)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["is_free"], true);
}

#[tokio::test]
async fn test_apply_fixed_coupon_previews_discount() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;

    let config = test_config();
    let app = create_test_app(config, pool.clone());

    let event_id = TestEvent::paid().insert(&pool).await;
    insert_coupon(
        &pool,
        Some(event_id),
        &format!("SAVE20-{}", &event_id.simple().to_string()[..8]),
        "fixed",
        Decimal::new(2000, 2),
        None,
    )
    .await;
    let code = sqlx::query_scalar::<_, String>("SELECT code FROM coupons WHERE event_id = $1")
        .bind(event_id)
        .fetch_one(&pool)
        .await
        .unwrap();

    // Anonymous caller previews against the regular price, lowercase code accepted
    let response = app
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/events/{}/apply-coupon", event_id),
            json!({ "code": code.to_lowercase() }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["code"], code);
    assert_eq!(body["discount_type"], "fixed");
    assert_eq!(decimal(&body["base_amount"]), Decimal::new(20000, 2));
    assert_eq!(decimal(&body["discount_amount"]), Decimal::new(2000, 2));
    assert_eq!(decimal(&body["final_amount"]), Decimal::new(18000, 2));
}

#[tokio::test]
async fn test_apply_percentage_coupon_previews_discount() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;

    let config = test_config();
    let app = create_test_app(config, pool.clone());

    let event_id = TestEvent::paid().insert(&pool).await;
    let code = format!("PCT25-{}", &event_id.simple().to_string()[..8]);
    insert_coupon(
        &pool,
        Some(event_id),
        &code,
        "percentage",
        Decimal::new(2500, 2),
        None,
    )
    .await;

    let response = app
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/events/{}/apply-coupon", event_id),
            json!({ "code": code }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    // 25% off 200.00
    assert_eq!(decimal(&body["discount_amount"]), Decimal::new(5000, 2));
    assert_eq!(decimal(&body["final_amount"]), Decimal::new(15000, 2));
}

#[tokio::test]
async fn test_apply_coupon_rejected_on_free_event() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;

    let config = test_config();
    let app = create_test_app(config, pool.clone());

    let event_id = TestEvent::free().insert(&pool).await;

    let response = app
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/events/{}/apply-coupon", event_id),
            json!({ "code": "ANY-CODE" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert_eq!(body["message"], "Coupons do not apply to free registrations");
}

#[tokio::test]
async fn test_apply_coupon_scoped_to_other_event_is_rejected() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;

    let config = test_config();
    let app = create_test_app(config, pool.clone());

    let event_id = TestEvent::paid().insert(&pool).await;
    let other_event_id = TestEvent::paid().insert(&pool).await;
    let code = format!("OTHER-{}", &event_id.simple().to_string()[..8]);
    insert_coupon(
        &pool,
        Some(other_event_id),
        &code,
        "fixed",
        Decimal::new(1000, 2),
        None,
    )
    .await;

    let response = app
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/events/{}/apply-coupon", event_id),
            json!({ "code": code }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_exhausted_coupon_is_rejected_at_registration() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;

    let config = test_config();
    let app = create_test_app(config.clone(), pool.clone());

    let event_id = TestEvent::paid().insert(&pool).await;
    let code = format!("ONCE-{}", &event_id.simple().to_string()[..8]);
    insert_coupon(
        &pool,
        Some(event_id),
        &code,
        "fixed",
        Decimal::new(1000, 2),
        Some(1),
    )
    .await;

    let first_user = TestMember::new().insert(&pool).await;
    let second_user = TestMember::new().insert(&pool).await;

    let first = app
        .clone()
        .oneshot(json_request_with_auth(
            Method::POST,
            &format!("/api/v1/events/{}/register", event_id),
            json!({ "coupon_code": code }),
            &member_token(&config, first_user),
        ))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);
    let first_body = parse_response_body(first).await;
    // 200.00 regular price minus 10.00
    assert_eq!(decimal(&first_body["price_paid"]), Decimal::new(19000, 2));

    let second = app
        .oneshot(json_request_with_auth(
            Method::POST,
            &format!("/api/v1/events/{}/register", event_id),
            json!({ "coupon_code": code }),
            &member_token(&config, second_user),
        ))
        .await
        .unwrap();
    // Exhaustion is resource state, not malformed input
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let second_body = parse_response_body(second).await;
    assert_eq!(second_body["error"], "conflict");
    assert_eq!(second_body["message"], "Coupon usage limit reached");
}

#[tokio::test]
async fn test_unknown_coupon_code_is_not_found() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;

    let config = test_config();
    let app = create_test_app(config, pool.clone());

    let event_id = TestEvent::paid().insert(&pool).await;

    let response = app
        .oneshot(json_request(
            Method::POST,
            &format!("/api/v1/events/{}/apply-coupon", event_id),
            json!({ "code": "NO-SUCH-CODE" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "not_found");
    assert_eq!(body["message"], "Coupon not found");
}

#[tokio::test]
async fn test_create_list_and_delete_coupon() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;

    let config = test_config();
    let app = create_test_app(config.clone(), pool.clone());

    let event_id = TestEvent::paid().insert(&pool).await;
    let admin = admin_token(&config, Uuid::new_v4());
    let code = format!("admin-{}", &event_id.simple().to_string()[..8]);

    let created = app
        .clone()
        .oneshot(json_request_with_auth(
            Method::POST,
            &format!("/api/v1/events/{}/coupons", event_id),
            json!({
                "code": code,
                "discount_type": "percentage",
                "discount_value": "10",
                "max_uses": 100
            }),
            &admin,
        ))
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);
    let created_body = parse_response_body(created).await;
    // Codes are stored uppercase
    assert_eq!(created_body["code"], code.to_uppercase());
    assert_eq!(created_body["event_id"], event_id.to_string());
    let coupon_id = created_body["id"].as_i64().unwrap();

    let listed = app
        .clone()
        .oneshot(get_request_with_auth(
            &format!("/api/v1/events/{}/coupons", event_id),
            &admin,
        ))
        .await
        .unwrap();
    assert_eq!(listed.status(), StatusCode::OK);
    let listed_body = parse_response_body(listed).await;
    assert_eq!(listed_body["total"], 1);

    let deleted = app
        .clone()
        .oneshot(delete_request_with_auth(
            &format!("/api/v1/coupons/{}", coupon_id),
            &admin,
        ))
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let deleted_again = app
        .oneshot(delete_request_with_auth(
            &format!("/api/v1/coupons/{}", coupon_id),
            &admin,
        ))
        .await
        .unwrap();
    assert_eq!(deleted_again.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_coupon_rejects_bad_percentage() {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;

    let config = test_config();
    let app = create_test_app(config.clone(), pool.clone());

    let event_id = TestEvent::paid().insert(&pool).await;

    let response = app
        .oneshot(json_request_with_auth(
            Method::POST,
            &format!("/api/v1/events/{}/coupons", event_id),
            json!({
                "code": "TOOMUCH-10",
                "discount_type": "percentage",
                "discount_value": "150"
            }),
            &admin_token(&config, Uuid::new_v4()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
