//! Repository implementations for database access.

pub mod coupon;
pub mod event;
pub mod member;
pub mod ticket;

pub use coupon::{CouponRepository, NewCoupon};
pub use event::{EventRepository, NewEvent};
pub use member::MemberRepository;
pub use ticket::{
    CheckInError, EventStats, NewTicket, RegistrationError, TicketPage, TicketRepository,
};
