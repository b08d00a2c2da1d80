//! Domain models for the Society Events backend.

pub mod attendance;
pub mod coupon;
pub mod event;
pub mod member;
pub mod ticket;

pub use attendance::AttendanceLog;
pub use coupon::{Coupon, DiscountType};
pub use event::{Event, EventStatus};
pub use member::{Member, MembershipStatus, MembershipType, PricingProfile};
pub use ticket::{generate_ticket_token, PaymentStatus, Ticket, TICKET_TOKEN_PREFIX};
