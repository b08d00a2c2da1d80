//! Registration endpoint handlers.
//!
//! Registration resolves the caller's price, applies an optional coupon,
//! and persists a ticket carrying the price and tier as a snapshot. The
//! capacity and duplicate invariants live in the ticket repository.

use axum::{
    extract::{Path, Query, State},
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
use crate::extractors::UserAuth;
use crate::middleware::metrics::record_registration;
use crate::routes::events::{load_event, resolve_member_price, validated_coupon};
use domain::models::{Member, PaymentStatus, Ticket};
use persistence::entities::TicketEntity;
use persistence::repositories::{MemberRepository, NewTicket, TicketRepository};
use shared::pagination::{decode_cursor, encode_cursor};
use shared::validation::validate_coupon_code;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(custom(function = "validate_coupon_code"))]
    pub coupon_code: Option<String>,
}

/// A ticket as returned to callers.
#[derive(Debug, Serialize)]
pub struct TicketResponse {
    pub ticket_id: i64,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub price_paid: Option<Decimal>,
    pub price_tier: String,
    pub payment_status: String,
    pub checked_in: bool,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub joined_at: DateTime<Utc>,
}

impl From<Ticket> for TicketResponse {
    fn from(ticket: Ticket) -> Self {
        Self {
            ticket_id: ticket.id,
            event_id: ticket.event_id,
            user_id: ticket.user_id,
            token: ticket.token,
            price_paid: ticket.price_paid,
            price_tier: ticket.price_tier,
            payment_status: ticket.payment_status.as_str().to_string(),
            checked_in: ticket.checked_in,
            checked_in_at: ticket.checked_in_at,
            joined_at: ticket.joined_at,
        }
    }
}

impl From<TicketEntity> for TicketResponse {
    fn from(entity: TicketEntity) -> Self {
        Ticket::from(entity).into()
    }
}

/// Register the authenticated member for an event.
///
/// POST /api/v1/events/:event_id/register
pub async fn register(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    auth: UserAuth,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<TicketResponse>), ApiError> {
    request.validate()?;

    let event = load_event(&state.pool, event_id).await?;
    if !event.accepts_registrations() {
        return Err(ApiError::Conflict(
            "Event is not accepting registrations".to_string(),
        ));
    }

    let member = load_member(&state.pool, auth.user_id).await?;
    if let Some(ref member) = member {
        if !member.can_register() {
            return Err(ApiError::Forbidden(
                "Membership is blocked from registering".to_string(),
            ));
        }
    }

    let now = Utc::now();
    let coupon = match request.coupon_code.as_deref() {
        Some(code) => Some(validated_coupon(&state.pool, code, event_id, now).await?),
        None => None,
    };

    let (resolved, final_amount) =
        resolve_member_price(&state.pool, &event, auth.user_id, coupon.as_ref(), now).await?;

    let is_free = resolved.is_free || final_amount == Decimal::ZERO;
    let payment_status = if is_free {
        PaymentStatus::Free
    } else {
        PaymentStatus::Pending
    };

    let repo = TicketRepository::new(state.pool.clone());
    let ticket = repo
        .register(
            event_id,
            NewTicket {
                user_id: auth.user_id,
                price_paid: Some(final_amount),
                price_tier: resolved.tier.as_str().to_string(),
                payment_status: payment_status.as_str().to_string(),
                is_member: member.is_some(),
                coupon_id: coupon.as_ref().map(|c| c.id),
            },
        )
        .await?;

    record_registration(&ticket.price_tier, &ticket.payment_status);
    info!(
        event_id = %event_id,
        user_id = %auth.user_id,
        tier = %ticket.price_tier,
        payment_status = %ticket.payment_status,
        "Member registered"
    );

    Ok((StatusCode::CREATED, Json(ticket.into())))
}

#[derive(Debug, Deserialize, Validate)]
pub struct BulkRegisterRequest {
    #[validate(length(min = 1, message = "At least one user is required"))]
    pub user_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct BulkRegisterResponse {
    pub registered: Vec<TicketResponse>,
    pub skipped: usize,
}

/// Register several members for an event in one shot.
///
/// POST /api/v1/events/:event_id/register/bulk (admin)
///
/// Members who already hold a ticket are skipped rather than failing the
/// whole batch; coupons are not applicable in bulk.
pub async fn register_bulk(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Json(request): Json<BulkRegisterRequest>,
) -> Result<(StatusCode, Json<BulkRegisterResponse>), ApiError> {
    request.validate()?;

    if request.user_ids.len() > state.config.limits.max_bulk_registrations {
        return Err(ApiError::Validation(format!(
            "At most {} registrations per request",
            state.config.limits.max_bulk_registrations
        )));
    }

    let event = load_event(&state.pool, event_id).await?;
    if !event.accepts_registrations() {
        return Err(ApiError::Conflict(
            "Event is not accepting registrations".to_string(),
        ));
    }

    let now = Utc::now();
    let mut tickets = Vec::with_capacity(request.user_ids.len());
    for user_id in &request.user_ids {
        let member = load_member(&state.pool, *user_id).await?;
        let (resolved, amount) =
            resolve_member_price(&state.pool, &event, *user_id, None, now).await?;

        let payment_status = if resolved.is_free {
            PaymentStatus::Free
        } else {
            PaymentStatus::Pending
        };

        tickets.push(NewTicket {
            user_id: *user_id,
            price_paid: Some(amount),
            price_tier: resolved.tier.as_str().to_string(),
            payment_status: payment_status.as_str().to_string(),
            is_member: member.is_some(),
            coupon_id: None,
        });
    }

    let requested = request.user_ids.len();
    let repo = TicketRepository::new(state.pool.clone());
    let created = repo.register_bulk(event_id, tickets).await?;

    for ticket in &created {
        record_registration(&ticket.price_tier, &ticket.payment_status);
    }
    info!(
        event_id = %event_id,
        requested = requested,
        registered = created.len(),
        "Bulk registration completed"
    );

    let skipped = requested - created.len();
    Ok((
        StatusCode::CREATED,
        Json(BulkRegisterResponse {
            registered: created.into_iter().map(Into::into).collect(),
            skipped,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct ListRegistrationsQuery {
    pub cursor: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ListRegistrationsResponse {
    pub registrations: Vec<TicketResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// List an event's registrations for the front-desk roster.
///
/// GET /api/v1/events/:event_id/registrations (admin)
pub async fn list_registrations(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Query(query): Query<ListRegistrationsQuery>,
) -> Result<Json<ListRegistrationsResponse>, ApiError> {
    // 404 for unknown events rather than an empty page
    load_event(&state.pool, event_id).await?;

    let limit = query
        .limit
        .unwrap_or(state.config.limits.default_page_size)
        .clamp(1, state.config.limits.max_page_size);

    let after = match query.cursor.as_deref() {
        Some(cursor) => Some(
            decode_cursor(cursor).map_err(|e| ApiError::Validation(e.to_string()))?,
        ),
        None => None,
    };

    let repo = TicketRepository::new(state.pool.clone());
    let page = repo.list_for_event(event_id, after, limit).await?;

    Ok(Json(ListRegistrationsResponse {
        registrations: page.tickets.into_iter().map(Into::into).collect(),
        next_cursor: page
            .next_cursor
            .map(|(joined_at, id)| encode_cursor(joined_at, id)),
    }))
}

/// Load a member row if the identity sync has one for this user.
async fn load_member(
    pool: &sqlx::PgPool,
    user_id: Uuid,
) -> Result<Option<Member>, ApiError> {
    let repo = MemberRepository::new(pool.clone());
    Ok(repo.find_by_id(user_id).await?.map(Into::into))
}
