//! Ticket domain model and check-in token generation.

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Check-in token prefix.
pub const TICKET_TOKEN_PREFIX: &str = "EVT-";

/// Length of the random portion of a check-in token.
const TOKEN_RANDOM_CHARS: usize = 8;

/// Alphabet for check-in tokens. Uppercase alphanumeric so tokens survive
/// being read aloud at the front desk and typed back in.
const TOKEN_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// A member's registration record for a specific event.
///
/// Invariants (enforced by the schema and the check-in repository):
/// - `token` is globally unique
/// - at most one ticket per (event_id, user_id)
/// - `checked_in_at` is non-null iff `checked_in` is true
/// - `payment_status == Free` implies `price_paid` is zero or null
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub price_paid: Option<Decimal>,
    /// Pricing tier snapshot taken at registration time.
    pub price_tier: String,
    pub payment_status: PaymentStatus,
    /// Snapshot of the member's paid-membership flag at registration time.
    pub is_member: bool,
    /// Coupon redeemed at registration, if any. Usage caps are enforced by
    /// counting tickets carrying the coupon.
    pub coupon_id: Option<i64>,
    pub checked_in: bool,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub joined_at: DateTime<Utc>,
}

/// Payment state of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Free,
    Failed,
}

impl PaymentStatus {
    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Free => "free",
            Self::Failed => "failed",
        }
    }

    /// Parse from database string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            "free" => Some(Self::Free),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Generate a new check-in token.
///
/// Collisions are possible; callers must insert under the unique constraint
/// and retry on conflict rather than assuming uniqueness from randomness.
pub fn generate_ticket_token() -> String {
    let mut rng = rand::thread_rng();
    let random: String = (0..TOKEN_RANDOM_CHARS)
        .map(|_| TOKEN_ALPHABET[rng.gen_range(0..TOKEN_ALPHABET.len())] as char)
        .collect();
    format!("{}{}", TICKET_TOKEN_PREFIX, random)
}
