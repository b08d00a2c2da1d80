//! Pure business services.

pub mod coupon;
pub mod pricing;

pub use coupon::{apply_discount, validate_coupon, CouponError};
pub use pricing::{resolve_price, PriceTier, ResolvedPrice};
