//! Check-in endpoint handlers.
//!
//! A ticket moves REGISTERED -> CHECKED_IN exactly once; the first scan
//! wins and repeat scans are rejected with the original check-in time.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::middleware::metrics::record_check_in;
use crate::routes::registrations::TicketResponse;
use domain::models::AttendanceLog;
use persistence::repositories::{CheckInError, TicketRepository};
use shared::validation::{validate_scan_metadata, validate_ticket_token};

#[derive(Debug, Deserialize, Validate)]
pub struct CheckInRequest {
    #[validate(custom(function = "validate_ticket_token"))]
    pub token: String,
    #[validate(custom(function = "validate_scan_metadata"))]
    pub location: Option<String>,
    #[validate(custom(function = "validate_scan_metadata"))]
    pub device_info: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckInResponse {
    pub status: String,
    pub scan_time: DateTime<Utc>,
    pub ticket: TicketResponse,
}

/// Check a ticket in by its token.
///
/// POST /api/v1/check-in (admin)
pub async fn check_in(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<CheckInRequest>,
) -> Result<Json<CheckInResponse>, ApiError> {
    request.validate()?;

    let repo = TicketRepository::new(state.pool.clone());
    let result = repo
        .check_in(
            &request.token,
            auth.user_id,
            request.location.as_deref(),
            request.device_info.as_deref(),
        )
        .await;

    match result {
        Ok((ticket, log)) => {
            let log: AttendanceLog = log.into();
            record_check_in("checked_in");
            info!(
                ticket_id = ticket.id,
                scanned_by = %log.scanned_by,
                "Ticket checked in"
            );
            Ok(Json(CheckInResponse {
                status: "checked_in".to_string(),
                scan_time: log.scan_time,
                ticket: ticket.into(),
            }))
        }
        Err(CheckInError::NotFound) => {
            record_check_in("not_found");
            Err(ApiError::NotFound("Ticket not found".to_string()))
        }
        Err(CheckInError::AlreadyCheckedIn(existing)) => {
            record_check_in("already_checked_in");
            warn!(
                ticket_id = existing.id,
                scanned_by = %auth.user_id,
                "Repeat scan rejected"
            );
            let at = existing
                .checked_in_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_default();
            Err(ApiError::Conflict(format!("Already checked in at {}", at)))
        }
        Err(CheckInError::Database(e)) => Err(e.into()),
    }
}

#[derive(Debug, Serialize)]
pub struct ValidateTicketResponse {
    pub valid: bool,
    pub checked_in: bool,
    pub ticket: TicketResponse,
}

/// Dry-run lookup of a ticket by token, without mutating anything.
///
/// GET /api/v1/check-in/validate/:token (admin)
pub async fn validate_ticket(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<ValidateTicketResponse>, ApiError> {
    validate_ticket_token(&token)
        .map_err(|_| ApiError::Validation("Malformed ticket token".to_string()))?;

    let repo = TicketRepository::new(state.pool.clone());
    let ticket = repo
        .find_by_token(&token)
        .await?
        .ok_or_else(|| ApiError::NotFound("Ticket not found".to_string()))?;

    Ok(Json(ValidateTicketResponse {
        valid: true,
        checked_in: ticket.checked_in,
        ticket: ticket.into(),
    }))
}
