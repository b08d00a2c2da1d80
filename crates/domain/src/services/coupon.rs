//! Coupon validation and discount application.
//!
//! Validation is a pure function over a coupon row, the target event, and a
//! usage count supplied by the caller (derived from redeemed tickets, never
//! a stored counter).

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;
use uuid::Uuid;

use crate::models::coupon::{Coupon, DiscountType};

/// Minor-unit precision for amounts (2 decimal places).
const AMOUNT_SCALE: u32 = 2;

/// Reasons a coupon cannot be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CouponError {
    #[error("Coupon not found")]
    NotFound,
    #[error("Coupon is not active")]
    Inactive,
    #[error("Coupon has expired")]
    Expired,
    #[error("Coupon is not active yet")]
    NotYetValid,
    #[error("Coupon is not valid for this event")]
    WrongEvent,
    #[error("Coupon usage limit reached")]
    Exhausted,
}

impl CouponError {
    /// Stable snake_case label for logs and metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Inactive => "inactive",
            Self::Expired => "expired",
            Self::NotYetValid => "not_yet_valid",
            Self::WrongEvent => "wrong_event",
            Self::Exhausted => "exhausted",
        }
    }
}

/// Validate a coupon's applicability to an event at a given instant.
///
/// `used_count` is the number of finalized redemptions, supplied by the
/// caller. A `max_uses` of None or a non-positive value means unlimited.
pub fn validate_coupon(
    coupon: &Coupon,
    event_id: Uuid,
    used_count: i64,
    now: DateTime<Utc>,
) -> Result<(), CouponError> {
    if !coupon.is_active {
        return Err(CouponError::Inactive);
    }

    if let Some(scoped_event) = coupon.event_id {
        if scoped_event != event_id {
            return Err(CouponError::WrongEvent);
        }
    }

    if let Some(valid_from) = coupon.valid_from {
        if now < valid_from {
            return Err(CouponError::NotYetValid);
        }
    }

    if let Some(valid_until) = coupon.valid_until {
        if now > valid_until {
            return Err(CouponError::Expired);
        }
    }

    if let Some(max_uses) = coupon.max_uses {
        if max_uses > 0 && used_count >= i64::from(max_uses) {
            return Err(CouponError::Exhausted);
        }
    }

    Ok(())
}

/// Apply a coupon's discount to an amount.
///
/// Fixed discounts subtract the value; percentage discounts scale the
/// amount. The result is floored at zero and rounded half-up to two
/// decimals. Monotonic: the result never exceeds the input.
pub fn apply_discount(amount: Decimal, coupon: &Coupon) -> Decimal {
    let discount = match coupon.discount_type {
        DiscountType::Fixed => coupon.discount_value,
        DiscountType::Percentage => amount * coupon.discount_value / Decimal::from(100),
    };

    // Negative or zero discount values are invalid configuration; treat
    // them as no discount rather than inflating the price.
    let discount = discount.max(Decimal::ZERO);

    (amount - discount)
        .max(Decimal::ZERO)
        .round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn coupon(discount_type: DiscountType, value: Decimal) -> Coupon {
        Coupon {
            id: 1,
            event_id: None,
            code: "SAVE10".to_string(),
            discount_type,
            discount_value: value,
            max_uses: None,
            valid_from: None,
            valid_until: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_global_coupon_valid_for_any_event() {
        let c = coupon(DiscountType::Fixed, dec!(10));
        assert!(validate_coupon(&c, Uuid::new_v4(), 0, Utc::now()).is_ok());
    }

    #[test]
    fn test_inactive_coupon_rejected() {
        let mut c = coupon(DiscountType::Fixed, dec!(10));
        c.is_active = false;
        assert_eq!(
            validate_coupon(&c, Uuid::new_v4(), 0, Utc::now()),
            Err(CouponError::Inactive)
        );
    }

    #[test]
    fn test_event_scoped_coupon() {
        let event_id = Uuid::new_v4();
        let mut c = coupon(DiscountType::Fixed, dec!(10));
        c.event_id = Some(event_id);

        assert!(validate_coupon(&c, event_id, 0, Utc::now()).is_ok());
        assert_eq!(
            validate_coupon(&c, Uuid::new_v4(), 0, Utc::now()),
            Err(CouponError::WrongEvent)
        );
    }

    #[test]
    fn test_validity_window() {
        let now = Utc::now();
        let mut c = coupon(DiscountType::Fixed, dec!(10));
        c.valid_from = Some(now + Duration::days(1));
        assert_eq!(
            validate_coupon(&c, Uuid::new_v4(), 0, now),
            Err(CouponError::NotYetValid)
        );

        c.valid_from = Some(now - Duration::days(2));
        c.valid_until = Some(now - Duration::days(1));
        assert_eq!(
            validate_coupon(&c, Uuid::new_v4(), 0, now),
            Err(CouponError::Expired)
        );

        c.valid_until = Some(now + Duration::days(1));
        assert!(validate_coupon(&c, Uuid::new_v4(), 0, now).is_ok());
    }

    #[test]
    fn test_usage_cap() {
        let mut c = coupon(DiscountType::Fixed, dec!(10));
        c.max_uses = Some(3);

        assert!(validate_coupon(&c, Uuid::new_v4(), 2, Utc::now()).is_ok());
        assert_eq!(
            validate_coupon(&c, Uuid::new_v4(), 3, Utc::now()),
            Err(CouponError::Exhausted)
        );
        assert_eq!(
            validate_coupon(&c, Uuid::new_v4(), 4, Utc::now()),
            Err(CouponError::Exhausted)
        );
    }

    #[test]
    fn test_non_positive_max_uses_means_unlimited() {
        let mut c = coupon(DiscountType::Fixed, dec!(10));
        c.max_uses = Some(0);
        assert!(validate_coupon(&c, Uuid::new_v4(), 1_000_000, Utc::now()).is_ok());

        c.max_uses = Some(-1);
        assert!(validate_coupon(&c, Uuid::new_v4(), 1_000_000, Utc::now()).is_ok());
    }

    #[test]
    fn test_fixed_discount() {
        // fixed 10 off 25.00 -> 15.00
        let c = coupon(DiscountType::Fixed, dec!(10));
        assert_eq!(apply_discount(dec!(25.00), &c), dec!(15.00));
    }

    #[test]
    fn test_percentage_discount() {
        // 50% off 40.00 -> 20.00
        let c = coupon(DiscountType::Percentage, dec!(50));
        assert_eq!(apply_discount(dec!(40.00), &c), dec!(20.00));
    }

    #[test]
    fn test_fixed_discount_floors_at_zero() {
        let c = coupon(DiscountType::Fixed, dec!(30));
        assert_eq!(apply_discount(dec!(25.00), &c), dec!(0.00));
    }

    #[test]
    fn test_hundred_percent_discount() {
        let c = coupon(DiscountType::Percentage, dec!(100));
        assert_eq!(apply_discount(dec!(25.00), &c), dec!(0.00));
    }

    #[test]
    fn test_percentage_rounds_to_minor_units() {
        let c = coupon(DiscountType::Percentage, dec!(33));
        // 10.00 * 0.67 = 6.70; 9.99 * 0.67 = 6.6933 -> 6.69
        assert_eq!(apply_discount(dec!(10.00), &c), dec!(6.70));
        assert_eq!(apply_discount(dec!(9.99), &c), dec!(6.69));
    }

    #[test]
    fn test_discount_monotonic_and_non_negative() {
        let amounts = [dec!(0.00), dec!(0.01), dec!(5.50), dec!(100.00)];
        let coupons = [
            coupon(DiscountType::Fixed, dec!(10)),
            coupon(DiscountType::Percentage, dec!(25)),
            coupon(DiscountType::Percentage, dec!(100)),
        ];
        for amount in amounts {
            for c in &coupons {
                let discounted = apply_discount(amount, c);
                assert!(discounted <= amount);
                assert!(discounted >= Decimal::ZERO);
            }
        }
    }

    #[test]
    fn test_negative_discount_value_treated_as_no_discount() {
        let c = coupon(DiscountType::Fixed, dec!(-5));
        assert_eq!(apply_discount(dec!(25.00), &c), dec!(25.00));
    }
}
