//! Domain layer for the Society Events backend.
//!
//! This crate contains:
//! - Domain models (Event, Member, Ticket, Coupon, AttendanceLog)
//! - Pure business services (pricing resolution, coupon validation)
//! - Domain error types

pub mod models;
pub mod services;
