//! Coupon entity (database row mapping).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::coupon::DiscountType;

/// Database row mapping for the coupons table.
#[derive(Debug, Clone, FromRow)]
pub struct CouponEntity {
    pub id: i64,
    pub event_id: Option<Uuid>,
    pub code: String,
    pub discount_type: String,
    pub discount_value: Decimal,
    pub max_uses: Option<i32>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<CouponEntity> for domain::models::Coupon {
    fn from(entity: CouponEntity) -> Self {
        Self {
            id: entity.id,
            event_id: entity.event_id,
            code: entity.code,
            // Values are constrained by a CHECK on the column.
            discount_type: DiscountType::parse(&entity.discount_type)
                .unwrap_or(DiscountType::Fixed),
            discount_value: entity.discount_value,
            max_uses: entity.max_uses,
            valid_from: entity.valid_from,
            valid_until: entity.valid_until,
            is_active: entity.is_active,
            created_at: entity.created_at,
        }
    }
}
