//! Event endpoint handlers.
//!
//! Public read model of scheduled events, admin event creation, and the
//! price-quote / coupon-preview endpoints that mirror what the registration
//! flow will charge without persisting anything.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::OptionalUserAuth;
use crate::middleware::metrics::record_coupon_validation;
use domain::models::{Event, Member, PricingProfile};
use domain::services::{
    apply_discount, resolve_price, validate_coupon, CouponError, PriceTier, ResolvedPrice,
};
use persistence::repositories::{CouponRepository, EventRepository, MemberRepository, NewEvent};
use shared::validation::{normalize_coupon_code, validate_coupon_code};

/// Event details returned by the read endpoints.
#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub status: String,
    pub capacity: Option<i32>,
    pub is_paid: bool,
    pub early_bird_deadline: Option<DateTime<Utc>>,
    pub regular_price: Option<Decimal>,
    pub member_price: Option<Decimal>,
    pub student_price: Option<Decimal>,
    pub hygienist_price: Option<Decimal>,
}

impl From<Event> for EventResponse {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            title: event.title,
            description: event.description,
            starts_at: event.starts_at,
            status: event.status.as_str().to_string(),
            capacity: event.capacity,
            is_paid: event.is_paid,
            early_bird_deadline: event.early_bird_deadline,
            regular_price: event.regular_price,
            member_price: event.member_price,
            student_price: event.student_price,
            hygienist_price: event.hygienist_price,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListEventsResponse {
    pub events: Vec<EventResponse>,
    pub total: usize,
}

#[derive(Debug, Deserialize)]
pub struct ListEventsQuery {
    pub limit: Option<i64>,
}

/// List upcoming scheduled events.
///
/// GET /api/v1/events
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<ListEventsQuery>,
) -> Result<Json<ListEventsResponse>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(state.config.limits.upcoming_events_limit)
        .clamp(1, state.config.limits.upcoming_events_limit);

    let repo = EventRepository::new(state.pool.clone());
    let entities = repo.list_upcoming(limit).await?;

    let events: Vec<EventResponse> = entities
        .into_iter()
        .map(|e| {
            let event: Event = e.into();
            event.into()
        })
        .collect();
    let total = events.len();

    Ok(Json(ListEventsResponse { events, total }))
}

/// Get a single event by ID.
///
/// GET /api/v1/events/:event_id
pub async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<EventResponse>, ApiError> {
    let event = load_event(&state.pool, event_id).await?;
    Ok(Json(event.into()))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateEventRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(max = 2000, message = "Description too long"))]
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    #[validate(range(min = 1, message = "Capacity must be positive"))]
    pub capacity: Option<i32>,
    #[serde(default)]
    pub is_paid: bool,
    pub early_bird_deadline: Option<DateTime<Utc>>,
    pub regular_price: Option<Decimal>,
    pub member_price: Option<Decimal>,
    pub student_price: Option<Decimal>,
    pub hygienist_price: Option<Decimal>,
    pub early_bird_regular_price: Option<Decimal>,
    pub early_bird_member_price: Option<Decimal>,
    pub early_bird_student_price: Option<Decimal>,
    pub early_bird_hygienist_price: Option<Decimal>,
}

/// Create a new event.
///
/// POST /api/v1/events (admin)
pub async fn create_event(
    State(state): State<AppState>,
    Json(request): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<EventResponse>), ApiError> {
    request.validate()?;

    for price in [
        request.regular_price,
        request.member_price,
        request.student_price,
        request.hygienist_price,
        request.early_bird_regular_price,
        request.early_bird_member_price,
        request.early_bird_student_price,
        request.early_bird_hygienist_price,
    ]
    .into_iter()
    .flatten()
    {
        if price < Decimal::ZERO {
            return Err(ApiError::Validation(
                "Prices cannot be negative".to_string(),
            ));
        }
    }

    let repo = EventRepository::new(state.pool.clone());
    let entity = repo
        .create(NewEvent {
            title: request.title,
            description: request.description,
            starts_at: request.starts_at,
            capacity: request.capacity,
            is_paid: request.is_paid,
            early_bird_deadline: request.early_bird_deadline,
            regular_price: request.regular_price,
            member_price: request.member_price,
            student_price: request.student_price,
            hygienist_price: request.hygienist_price,
            early_bird_regular_price: request.early_bird_regular_price,
            early_bird_member_price: request.early_bird_member_price,
            early_bird_student_price: request.early_bird_student_price,
            early_bird_hygienist_price: request.early_bird_hygienist_price,
        })
        .await?;

    let event: Event = entity.into();

    info!(event_id = %event.id, title = %event.title, "Event created");

    Ok((StatusCode::CREATED, Json(event.into())))
}

/// Resolved price quote for the caller.
#[derive(Debug, Serialize)]
pub struct PriceQuoteResponse {
    pub amount: Decimal,
    pub tier: PriceTier,
    pub is_free: bool,
    pub early_bird: bool,
}

/// Quote the price the caller would pay for an event.
///
/// GET /api/v1/events/:event_id/price
///
/// Anonymous callers are quoted the regular tier.
pub async fn get_event_price(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    OptionalUserAuth(auth): OptionalUserAuth,
) -> Result<Json<PriceQuoteResponse>, ApiError> {
    let event = load_event(&state.pool, event_id).await?;
    let profile = load_pricing_profile(&state.pool, auth.map(|a| a.user_id)).await?;

    let resolved = resolve_price(&event, &profile, Utc::now());

    Ok(Json(PriceQuoteResponse {
        amount: resolved.amount,
        tier: resolved.tier,
        is_free: resolved.is_free,
        early_bird: resolved.early_bird,
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ApplyCouponRequest {
    #[validate(custom(function = "validate_coupon_code"))]
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct ApplyCouponResponse {
    pub code: String,
    pub discount_type: String,
    pub base_amount: Decimal,
    pub discount_amount: Decimal,
    pub final_amount: Decimal,
}

/// Preview a coupon against the caller's resolved price, without persisting.
///
/// POST /api/v1/events/:event_id/apply-coupon
pub async fn apply_coupon(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    OptionalUserAuth(auth): OptionalUserAuth,
    Json(request): Json<ApplyCouponRequest>,
) -> Result<Json<ApplyCouponResponse>, ApiError> {
    request.validate()?;

    let event = load_event(&state.pool, event_id).await?;
    let profile = load_pricing_profile(&state.pool, auth.map(|a| a.user_id)).await?;

    let now = Utc::now();
    let resolved = resolve_price(&event, &profile, now);
    if resolved.is_free {
        return Err(ApiError::Validation(
            "Coupons do not apply to free registrations".to_string(),
        ));
    }

    let coupon = validated_coupon(&state.pool, &request.code, event_id, now).await?;
    let final_amount = apply_discount(resolved.amount, &coupon);

    Ok(Json(ApplyCouponResponse {
        code: coupon.code,
        discount_type: coupon.discount_type.as_str().to_string(),
        base_amount: resolved.amount,
        discount_amount: resolved.amount - final_amount,
        final_amount,
    }))
}

/// Load an event or return 404.
pub(crate) async fn load_event(pool: &PgPool, event_id: Uuid) -> Result<Event, ApiError> {
    let repo = EventRepository::new(pool.clone());
    let entity = repo
        .find_by_id(event_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;
    Ok(entity.into())
}

/// Pricing attributes for a caller; anonymous callers get the default
/// (regular-tier) profile.
pub(crate) async fn load_pricing_profile(
    pool: &PgPool,
    user_id: Option<Uuid>,
) -> Result<PricingProfile, ApiError> {
    let Some(user_id) = user_id else {
        return Ok(PricingProfile::default());
    };

    let repo = MemberRepository::new(pool.clone());
    match repo.find_by_id(user_id).await? {
        Some(entity) => {
            let member: Member = entity.into();
            Ok(member.pricing_profile())
        }
        None => Ok(PricingProfile::default()),
    }
}

/// Look up a coupon by code and validate it against the event and clock.
pub(crate) async fn validated_coupon(
    pool: &PgPool,
    code: &str,
    event_id: Uuid,
    now: DateTime<Utc>,
) -> Result<domain::models::Coupon, ApiError> {
    let normalized = normalize_coupon_code(code);

    let repo = CouponRepository::new(pool.clone());
    let entity = repo.find_by_code(&normalized).await?.ok_or_else(|| {
        record_coupon_validation("not_found");
        ApiError::from(CouponError::NotFound)
    })?;

    let used_count = repo.usage_count(entity.id).await?;
    let coupon: domain::models::Coupon = entity.into();

    if let Err(e) = validate_coupon(&coupon, event_id, used_count, now) {
        record_coupon_validation(e.as_label());
        return Err(e.into());
    }

    record_coupon_validation("accepted");
    Ok(coupon)
}

/// Convenience used by the registration flow: the full quote-then-discount
/// pipeline for one member.
pub(crate) async fn resolve_member_price(
    pool: &PgPool,
    event: &Event,
    user_id: Uuid,
    coupon: Option<&domain::models::Coupon>,
    now: DateTime<Utc>,
) -> Result<(ResolvedPrice, Decimal), ApiError> {
    let profile = load_pricing_profile(pool, Some(user_id)).await?;
    let resolved = resolve_price(event, &profile, now);

    let final_amount = match coupon {
        Some(coupon) if !resolved.is_free => apply_discount(resolved.amount, coupon),
        _ => resolved.amount,
    };

    Ok((resolved, final_amount))
}
