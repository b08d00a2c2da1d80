//! Shared utilities and common types for the Society Events backend.
//!
//! This crate provides common functionality used across all other crates:
//! - JWT verification for the identity service's bearer tokens
//! - Common validation logic (coupon codes, check-in tokens)
//! - Cursor pagination for listing endpoints

pub mod jwt;
pub mod pagination;
pub mod validation;
