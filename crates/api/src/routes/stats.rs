//! Event statistics endpoint.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::routes::events::load_event;
use persistence::repositories::TicketRepository;

#[derive(Debug, Serialize)]
pub struct EventStatsResponse {
    pub event_id: Uuid,
    pub total_members: i64,
    pub checked_in_members: i64,
    pub paid_members: i64,
    pub payment_pending: i64,
    /// None when the event has unlimited capacity.
    pub remaining_capacity: Option<i64>,
    /// Percentage of registrations checked in, one decimal place.
    pub checkin_rate: f64,
    pub attendance_logs: i64,
    pub recent_checkins: i64,
}

/// Attendance and payment statistics for an event.
///
/// GET /api/v1/events/:event_id/stats (admin)
pub async fn event_stats(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<EventStatsResponse>, ApiError> {
    let event = load_event(&state.pool, event_id).await?;

    let repo = TicketRepository::new(state.pool.clone());
    let stats = repo.get_event_stats(event_id).await?;

    let remaining_capacity = event
        .capacity
        .map(|capacity| (i64::from(capacity) - stats.total_members).max(0));

    let checkin_rate = if stats.total_members > 0 {
        let rate = stats.checked_in_members as f64 / stats.total_members as f64 * 100.0;
        (rate * 10.0).round() / 10.0
    } else {
        0.0
    };

    Ok(Json(EventStatsResponse {
        event_id,
        total_members: stats.total_members,
        checked_in_members: stats.checked_in_members,
        paid_members: stats.paid_members,
        payment_pending: stats.payment_pending,
        remaining_capacity,
        checkin_rate,
        attendance_logs: stats.attendance_logs,
        recent_checkins: stats.recent_checkins,
    }))
}
