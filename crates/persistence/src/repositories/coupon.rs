//! Coupon repository for database operations.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::CouponEntity;

/// Fields for a coupon to be created.
#[derive(Debug, Clone)]
pub struct NewCoupon {
    pub event_id: Option<Uuid>,
    pub code: String,
    pub discount_type: String,
    pub discount_value: Decimal,
    pub max_uses: Option<i32>,
    pub valid_from: Option<chrono::DateTime<chrono::Utc>>,
    pub valid_until: Option<chrono::DateTime<chrono::Utc>>,
    pub is_active: bool,
}

/// Repository for coupon-related database operations.
#[derive(Clone)]
pub struct CouponRepository {
    pool: PgPool,
}

impl CouponRepository {
    /// Creates a new CouponRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a coupon by its code, case-insensitively.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<CouponEntity>, sqlx::Error> {
        sqlx::query_as::<_, CouponEntity>(
            r#"
            SELECT id, event_id, code, discount_type, discount_value, max_uses,
                   valid_from, valid_until, is_active, created_at
            FROM coupons
            WHERE code = UPPER($1)
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
    }

    /// Find a coupon by id.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<CouponEntity>, sqlx::Error> {
        sqlx::query_as::<_, CouponEntity>(
            r#"
            SELECT id, event_id, code, discount_type, discount_value, max_uses,
                   valid_from, valid_until, is_active, created_at
            FROM coupons
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Count how many tickets were issued against a coupon.
    ///
    /// Usage is derived from tickets rather than kept as a counter column,
    /// so a failed registration can never leave a phantom redemption.
    pub async fn usage_count(&self, coupon_id: i64) -> Result<i64, sqlx::Error> {
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) as count
            FROM tickets
            WHERE coupon_id = $1
            "#,
        )
        .bind(coupon_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count.0)
    }

    /// Create a coupon; the code is stored uppercase.
    pub async fn create(&self, coupon: NewCoupon) -> Result<CouponEntity, sqlx::Error> {
        sqlx::query_as::<_, CouponEntity>(
            r#"
            INSERT INTO coupons (event_id, code, discount_type, discount_value, max_uses,
                                 valid_from, valid_until, is_active, created_at)
            VALUES ($1, UPPER($2), $3, $4, $5, $6, $7, $8, NOW())
            RETURNING id, event_id, code, discount_type, discount_value, max_uses,
                      valid_from, valid_until, is_active, created_at
            "#,
        )
        .bind(coupon.event_id)
        .bind(&coupon.code)
        .bind(&coupon.discount_type)
        .bind(coupon.discount_value)
        .bind(coupon.max_uses)
        .bind(coupon.valid_from)
        .bind(coupon.valid_until)
        .bind(coupon.is_active)
        .fetch_one(&self.pool)
        .await
    }

    /// List coupons scoped to an event, plus site-wide coupons.
    pub async fn list_for_event(&self, event_id: Uuid) -> Result<Vec<CouponEntity>, sqlx::Error> {
        sqlx::query_as::<_, CouponEntity>(
            r#"
            SELECT id, event_id, code, discount_type, discount_value, max_uses,
                   valid_from, valid_until, is_active, created_at
            FROM coupons
            WHERE event_id = $1 OR event_id IS NULL
            ORDER BY created_at DESC
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Delete a coupon. Tickets that used it keep their price; the foreign
    /// key nulls their coupon reference.
    pub async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM coupons WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
