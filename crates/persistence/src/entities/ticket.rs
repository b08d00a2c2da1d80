//! Ticket entity (database row mapping).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::ticket::PaymentStatus;

/// Database row mapping for the tickets table.
#[derive(Debug, Clone, FromRow)]
pub struct TicketEntity {
    pub id: i64,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub price_paid: Option<Decimal>,
    pub price_tier: String,
    pub payment_status: String,
    pub is_member: bool,
    pub coupon_id: Option<i64>,
    pub checked_in: bool,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub joined_at: DateTime<Utc>,
}

impl From<TicketEntity> for domain::models::Ticket {
    fn from(entity: TicketEntity) -> Self {
        Self {
            id: entity.id,
            event_id: entity.event_id,
            user_id: entity.user_id,
            token: entity.token,
            price_paid: entity.price_paid,
            price_tier: entity.price_tier,
            // Values are constrained by a CHECK on the column.
            payment_status: PaymentStatus::parse(&entity.payment_status)
                .unwrap_or(PaymentStatus::Pending),
            is_member: entity.is_member,
            coupon_id: entity.coupon_id,
            checked_in: entity.checked_in,
            checked_in_at: entity.checked_in_at,
            joined_at: entity.joined_at,
        }
    }
}
