//! Coupon administration endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::routes::events::load_event;
use domain::models::{Coupon, DiscountType};
use persistence::repositories::{CouponRepository, NewCoupon};
use shared::validation::{normalize_coupon_code, validate_coupon_code};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCouponRequest {
    #[validate(custom(function = "validate_coupon_code"))]
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub max_uses: Option<i32>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// When true the coupon applies to every event, not just this one.
    #[serde(default)]
    pub global: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct CouponResponse {
    pub id: i64,
    pub event_id: Option<Uuid>,
    pub code: String,
    pub discount_type: String,
    pub discount_value: Decimal,
    pub max_uses: Option<i32>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl From<Coupon> for CouponResponse {
    fn from(coupon: Coupon) -> Self {
        Self {
            id: coupon.id,
            event_id: coupon.event_id,
            code: coupon.code,
            discount_type: coupon.discount_type.as_str().to_string(),
            discount_value: coupon.discount_value,
            max_uses: coupon.max_uses,
            valid_from: coupon.valid_from,
            valid_until: coupon.valid_until,
            is_active: coupon.is_active,
        }
    }
}

/// Create a coupon scoped to an event (or global).
///
/// POST /api/v1/events/:event_id/coupons (admin)
pub async fn create_coupon(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Json(request): Json<CreateCouponRequest>,
) -> Result<(StatusCode, Json<CouponResponse>), ApiError> {
    request.validate()?;

    if request.discount_value <= Decimal::ZERO {
        return Err(ApiError::Validation(
            "Discount value must be positive".to_string(),
        ));
    }
    if request.discount_type == DiscountType::Percentage
        && request.discount_value > Decimal::from(100)
    {
        return Err(ApiError::Validation(
            "Percentage discount cannot exceed 100".to_string(),
        ));
    }
    if let (Some(from), Some(until)) = (request.valid_from, request.valid_until) {
        if from > until {
            return Err(ApiError::Validation(
                "valid_from must not be after valid_until".to_string(),
            ));
        }
    }

    load_event(&state.pool, event_id).await?;

    let repo = CouponRepository::new(state.pool.clone());
    let entity = repo
        .create(NewCoupon {
            event_id: if request.global { None } else { Some(event_id) },
            code: normalize_coupon_code(&request.code),
            discount_type: request.discount_type.as_str().to_string(),
            discount_value: request.discount_value,
            max_uses: request.max_uses,
            valid_from: request.valid_from,
            valid_until: request.valid_until,
            is_active: request.is_active,
        })
        .await?;

    let coupon: Coupon = entity.into();

    info!(coupon_id = coupon.id, code = %coupon.code, "Coupon created");

    Ok((StatusCode::CREATED, Json(coupon.into())))
}

#[derive(Debug, Serialize)]
pub struct ListCouponsResponse {
    pub coupons: Vec<CouponResponse>,
    pub total: usize,
}

/// List coupons applicable to an event (scoped plus global).
///
/// GET /api/v1/events/:event_id/coupons (admin)
pub async fn list_coupons(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<ListCouponsResponse>, ApiError> {
    load_event(&state.pool, event_id).await?;

    let repo = CouponRepository::new(state.pool.clone());
    let entities = repo.list_for_event(event_id).await?;

    let coupons: Vec<CouponResponse> = entities
        .into_iter()
        .map(|e| {
            let coupon: Coupon = e.into();
            coupon.into()
        })
        .collect();
    let total = coupons.len();

    Ok(Json(ListCouponsResponse { coupons, total }))
}

/// Delete a coupon.
///
/// DELETE /api/v1/coupons/:coupon_id (admin)
pub async fn delete_coupon(
    State(state): State<AppState>,
    Path(coupon_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let repo = CouponRepository::new(state.pool.clone());
    let deleted = repo.delete(coupon_id).await?;

    if !deleted {
        return Err(ApiError::NotFound("Coupon not found".to_string()));
    }

    info!(coupon_id = coupon_id, "Coupon deleted");
    Ok(StatusCode::NO_CONTENT)
}
