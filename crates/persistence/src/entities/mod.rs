//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod attendance_log;
pub mod coupon;
pub mod event;
pub mod member;
pub mod ticket;

pub use attendance_log::AttendanceLogEntity;
pub use coupon::CouponEntity;
pub use event::EventEntity;
pub use member::MemberEntity;
pub use ticket::TicketEntity;
