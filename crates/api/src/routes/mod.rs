//! HTTP route handlers.

pub mod checkin;
pub mod coupons;
pub mod events;
pub mod health;
pub mod registrations;
pub mod stats;
