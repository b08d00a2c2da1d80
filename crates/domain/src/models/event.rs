//! Event domain model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::pricing::PriceTier;

/// An event published by the society.
///
/// Pricing is a matrix of category tiers, each with an optional base price
/// and an optional early-bird variant that applies before
/// `early_bird_deadline`. A missing tier price falls back to the regular
/// price at resolution time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub status: EventStatus,
    /// None means unlimited capacity.
    pub capacity: Option<i32>,
    pub is_paid: bool,
    pub early_bird_deadline: Option<DateTime<Utc>>,
    pub regular_price: Option<Decimal>,
    pub member_price: Option<Decimal>,
    pub student_price: Option<Decimal>,
    pub hygienist_price: Option<Decimal>,
    pub early_bird_regular_price: Option<Decimal>,
    pub early_bird_member_price: Option<Decimal>,
    pub early_bird_student_price: Option<Decimal>,
    pub early_bird_hygienist_price: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Base price for a tier, before fallback and early-bird substitution.
    pub fn base_price(&self, tier: PriceTier) -> Option<Decimal> {
        match tier {
            PriceTier::Free => None,
            PriceTier::Regular => self.regular_price,
            PriceTier::Member => self.member_price,
            PriceTier::Student => self.student_price,
            PriceTier::Hygienist => self.hygienist_price,
        }
    }

    /// Early-bird variant price for a tier, if configured.
    pub fn early_bird_price(&self, tier: PriceTier) -> Option<Decimal> {
        match tier {
            PriceTier::Free => None,
            PriceTier::Regular => self.early_bird_regular_price,
            PriceTier::Member => self.early_bird_member_price,
            PriceTier::Student => self.early_bird_student_price,
            PriceTier::Hygienist => self.early_bird_hygienist_price,
        }
    }

    /// Whether the early-bird window is open at `now`.
    pub fn early_bird_open(&self, now: DateTime<Utc>) -> bool {
        self.early_bird_deadline
            .map(|deadline| now < deadline)
            .unwrap_or(false)
    }

    /// Whether registrations are still accepted.
    pub fn accepts_registrations(&self) -> bool {
        self.status == EventStatus::Scheduled
    }
}

/// Lifecycle status of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Scheduled,
    Cancelled,
    Completed,
}

impl EventStatus {
    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    /// Parse from database string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(Self::Scheduled),
            "cancelled" => Some(Self::Cancelled),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn paid_event() -> Event {
        Event {
            id: Uuid::new_v4(),
            title: "Annual Conference".to_string(),
            description: None,
            starts_at: Utc::now() + Duration::days(30),
            status: EventStatus::Scheduled,
            capacity: Some(100),
            is_paid: true,
            early_bird_deadline: Some(Utc::now() + Duration::days(7)),
            regular_price: Some(dec!(20.00)),
            member_price: Some(dec!(15.00)),
            student_price: Some(dec!(5.00)),
            hygienist_price: None,
            early_bird_regular_price: Some(dec!(18.00)),
            early_bird_member_price: None,
            early_bird_student_price: None,
            early_bird_hygienist_price: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_base_price_per_tier() {
        let event = paid_event();
        assert_eq!(event.base_price(PriceTier::Regular), Some(dec!(20.00)));
        assert_eq!(event.base_price(PriceTier::Member), Some(dec!(15.00)));
        assert_eq!(event.base_price(PriceTier::Student), Some(dec!(5.00)));
        assert_eq!(event.base_price(PriceTier::Hygienist), None);
        assert_eq!(event.base_price(PriceTier::Free), None);
    }

    #[test]
    fn test_early_bird_open() {
        let mut event = paid_event();
        assert!(event.early_bird_open(Utc::now()));
        assert!(!event.early_bird_open(Utc::now() + Duration::days(8)));

        event.early_bird_deadline = None;
        assert!(!event.early_bird_open(Utc::now()));
    }

    #[test]
    fn test_early_bird_deadline_is_exclusive() {
        let event = paid_event();
        let deadline = event.early_bird_deadline.unwrap();
        assert!(!event.early_bird_open(deadline));
    }

    #[test]
    fn test_accepts_registrations() {
        let mut event = paid_event();
        assert!(event.accepts_registrations());
        event.status = EventStatus::Cancelled;
        assert!(!event.accepts_registrations());
        event.status = EventStatus::Completed;
        assert!(!event.accepts_registrations());
    }

    #[test]
    fn test_status_roundtrip() {
        for status in [
            EventStatus::Scheduled,
            EventStatus::Cancelled,
            EventStatus::Completed,
        ] {
            assert_eq!(EventStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(EventStatus::parse("archived"), None);
    }
}
