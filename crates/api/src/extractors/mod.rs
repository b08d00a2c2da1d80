//! Request extractors.

pub mod user_auth;

#[allow(unused_imports)] // Re-exports for downstream use
pub use user_auth::{OptionalUserAuth, UserAuth};
