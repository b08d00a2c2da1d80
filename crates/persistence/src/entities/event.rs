//! Event entity (database row mapping).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::event::EventStatus;

/// Database row mapping for the events table.
#[derive(Debug, Clone, FromRow)]
pub struct EventEntity {
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
    pub early_bird_regular_price: Option<Decimal>,
    pub early_bird_member_price: Option<Decimal>,
    pub early_bird_student_price: Option<Decimal>,
    pub early_bird_hygienist_price: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EventEntity> for domain::models::Event {
    fn from(entity: EventEntity) -> Self {
        Self {
            id: entity.id,
            title: entity.title,
            description: entity.description,
            starts_at: entity.starts_at,
            // Values are constrained by a CHECK on the column.
            status: EventStatus::parse(&entity.status).unwrap_or(EventStatus::Scheduled),
            capacity: entity.capacity,
            is_paid: entity.is_paid,
            early_bird_deadline: entity.early_bird_deadline,
            regular_price: entity.regular_price,
            member_price: entity.member_price,
            student_price: entity.student_price,
            hygienist_price: entity.hygienist_price,
            early_bird_regular_price: entity.early_bird_regular_price,
            early_bird_member_price: entity.early_bird_member_price,
            early_bird_student_price: entity.early_bird_student_price,
            early_bird_hygienist_price: entity.early_bird_hygienist_price,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
