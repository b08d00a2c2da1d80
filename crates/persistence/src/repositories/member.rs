//! Member repository for database operations.
//!
//! The members table is a read model synced from the identity service;
//! this crate only reads it.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::MemberEntity;

/// Repository for member-related database operations.
#[derive(Clone)]
pub struct MemberRepository {
    pool: PgPool,
}

impl MemberRepository {
    /// Creates a new MemberRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a member by id.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<MemberEntity>, sqlx::Error> {
        sqlx::query_as::<_, MemberEntity>(
            r#"
            SELECT id, full_name, email, category, position, specialty,
                   membership_type, membership_status, membership_expiry_date, created_at
            FROM members
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }
}
