//! Event repository for database operations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::EventEntity;

const EVENT_COLUMNS: &str = r#"
    id, title, description, starts_at, status, capacity, is_paid, early_bird_deadline,
    member_price, regular_price, student_price, hygienist_price,
    early_bird_member_price, early_bird_regular_price,
    early_bird_student_price, early_bird_hygienist_price,
    created_at, updated_at
"#;

/// Fields for an event to be created.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub capacity: Option<i32>,
    pub is_paid: bool,
    pub early_bird_deadline: Option<DateTime<Utc>>,
    pub member_price: Option<Decimal>,
    pub regular_price: Option<Decimal>,
    pub student_price: Option<Decimal>,
    pub hygienist_price: Option<Decimal>,
    pub early_bird_member_price: Option<Decimal>,
    pub early_bird_regular_price: Option<Decimal>,
    pub early_bird_student_price: Option<Decimal>,
    pub early_bird_hygienist_price: Option<Decimal>,
}

/// Repository for event-related database operations.
#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    /// Creates a new EventRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find an event by id.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<EventEntity>, sqlx::Error> {
        sqlx::query_as::<_, EventEntity>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// List scheduled events that have not started yet, soonest first.
    pub async fn list_upcoming(&self, limit: i64) -> Result<Vec<EventEntity>, sqlx::Error> {
        sqlx::query_as::<_, EventEntity>(&format!(
            r#"
            SELECT {EVENT_COLUMNS} FROM events
            WHERE status = 'scheduled' AND starts_at > NOW()
            ORDER BY starts_at ASC
            LIMIT $1
            "#
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    /// Create an event in the scheduled state.
    pub async fn create(&self, event: NewEvent) -> Result<EventEntity, sqlx::Error> {
        sqlx::query_as::<_, EventEntity>(&format!(
            r#"
            INSERT INTO events (id, title, description, starts_at, status, capacity, is_paid,
                                early_bird_deadline,
                                member_price, regular_price, student_price, hygienist_price,
                                early_bird_member_price, early_bird_regular_price,
                                early_bird_student_price, early_bird_hygienist_price,
                                created_at, updated_at)
            VALUES ($1, $2, $3, $4, 'scheduled', $5, $6, $7,
                    $8, $9, $10, $11, $12, $13, $14, $15, NOW(), NOW())
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.starts_at)
        .bind(event.capacity)
        .bind(event.is_paid)
        .bind(event.early_bird_deadline)
        .bind(event.member_price)
        .bind(event.regular_price)
        .bind(event.student_price)
        .bind(event.hygienist_price)
        .bind(event.early_bird_member_price)
        .bind(event.early_bird_regular_price)
        .bind(event.early_bird_student_price)
        .bind(event.early_bird_hygienist_price)
        .fetch_one(&self.pool)
        .await
    }
}
