//! Event pricing resolution.
//!
//! Determines the price a member owes for an event based on their
//! professional category, membership tier, and the early-bird window.
//!
//! Tier precedence is an explicit ordered table of (tier, predicate) pairs
//! evaluated top to bottom: student > hygienist > member > regular. Changing
//! precedence is a table edit, not a logic change.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::event::Event;
use crate::models::member::{MembershipType, PricingProfile};

/// Pricing category a member qualifies for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceTier {
    Free,
    Regular,
    Member,
    Student,
    Hygienist,
}

impl PriceTier {
    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Regular => "regular",
            Self::Member => "member",
            Self::Student => "student",
            Self::Hygienist => "hygienist",
        }
    }
}

impl std::fmt::Display for PriceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of resolving a member's price for an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPrice {
    pub amount: Decimal,
    pub tier: PriceTier,
    /// True for free events and for comped categories on paid events
    /// (resolved amount of zero or no price configured).
    pub is_free: bool,
    /// Whether the early-bird variant was applied.
    pub early_bird: bool,
}

/// Ordered tier precedence table. Evaluated top to bottom; the first
/// matching predicate wins, falling through to Regular.
static TIER_PRECEDENCE: &[(PriceTier, fn(&PricingProfile) -> bool)] = &[
    (PriceTier::Student, is_student),
    (PriceTier::Hygienist, is_hygienist),
    (PriceTier::Member, is_paid_member_dentist),
];

fn field_contains(field: &Option<String>, needles: &[&str]) -> bool {
    field
        .as_deref()
        .map(|value| {
            let value = value.to_lowercase();
            needles.iter().any(|needle| value.contains(needle))
        })
        .unwrap_or(false)
}

fn is_student(profile: &PricingProfile) -> bool {
    field_contains(
        &profile.category,
        &["student", "undergraduate", "postgraduate"],
    ) || profile
        .position
        .as_deref()
        .map(|p| p.eq_ignore_ascii_case("student"))
        .unwrap_or(false)
}

fn is_hygienist(profile: &PricingProfile) -> bool {
    let needles = ["hygienist", "assistant", "technician", "technologist"];
    field_contains(&profile.category, &needles) || field_contains(&profile.position, &needles)
}

fn is_paid_member_dentist(profile: &PricingProfile) -> bool {
    if profile.membership_type != MembershipType::Paid {
        return false;
    }
    field_contains(&profile.category, &["dentist"])
        || field_contains(
            &profile.position,
            &[
                "dentist",
                "specialist",
                "consultant",
                "resident",
                "intern",
                "faculty",
                "lecturer",
                "hod",
                "lead",
            ],
        )
}

/// Determine the tier a member qualifies for.
pub fn resolve_tier(profile: &PricingProfile) -> PriceTier {
    for (tier, applies) in TIER_PRECEDENCE {
        if applies(profile) {
            return *tier;
        }
    }
    PriceTier::Regular
}

/// Resolve the price a member owes for an event at a given instant.
///
/// Pure function of (event, profile, now); no side effects. The returned
/// amount is never negative, and early-bird substitution only lowers or
/// preserves the tier's base price when events are configured sanely.
pub fn resolve_price(event: &Event, profile: &PricingProfile, now: DateTime<Utc>) -> ResolvedPrice {
    if !event.is_paid {
        return ResolvedPrice {
            amount: Decimal::ZERO,
            tier: PriceTier::Free,
            is_free: true,
            early_bird: false,
        };
    }

    let tier = resolve_tier(profile);

    // Missing tier price falls back to the regular price.
    let base = event.base_price(tier).or(event.regular_price);

    // Early-bird substitution applies to the resolved tier's variant only.
    let (amount, early_bird) = if event.early_bird_open(now) {
        match event.early_bird_price(tier) {
            Some(variant) => (Some(variant), true),
            None => (base, false),
        }
    } else {
        (base, false)
    };

    match amount {
        Some(amount) if amount > Decimal::ZERO => ResolvedPrice {
            amount,
            tier,
            is_free: false,
            early_bird,
        },
        // Zero, negative, or unset price on a paid event: comped category.
        _ => ResolvedPrice {
            amount: Decimal::ZERO,
            tier,
            is_free: true,
            early_bird,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::EventStatus;
    use chrono::Duration;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn event() -> Event {
        Event {
            id: Uuid::new_v4(),
            title: "Scientific Meeting".to_string(),
            description: None,
            starts_at: Utc::now() + Duration::days(30),
            status: EventStatus::Scheduled,
            capacity: None,
            is_paid: true,
            early_bird_deadline: None,
            regular_price: Some(dec!(20.00)),
            member_price: Some(dec!(12.00)),
            student_price: Some(dec!(5.00)),
            hygienist_price: Some(dec!(8.00)),
            early_bird_regular_price: None,
            early_bird_member_price: None,
            early_bird_student_price: None,
            early_bird_hygienist_price: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn profile(category: &str, position: &str, membership: MembershipType) -> PricingProfile {
        PricingProfile {
            category: Some(category.to_string()),
            position: Some(position.to_string()),
            membership_type: membership,
        }
    }

    #[test]
    fn test_free_event_is_free_for_everyone() {
        let mut event = event();
        event.is_paid = false;
        let resolved = resolve_price(
            &event,
            &profile("Dentist", "Consultant", MembershipType::Paid),
            Utc::now(),
        );
        assert_eq!(resolved.amount, Decimal::ZERO);
        assert_eq!(resolved.tier, PriceTier::Free);
        assert!(resolved.is_free);
    }

    #[test]
    fn test_student_gets_student_price() {
        // student_price=5.00, regular_price=20.00 -> 5.00, "student"
        let resolved = resolve_price(
            &event(),
            &profile("Undergraduate Student", "Student", MembershipType::Free),
            Utc::now(),
        );
        assert_eq!(resolved.amount, dec!(5.00));
        assert_eq!(resolved.tier, PriceTier::Student);
        assert!(!resolved.is_free);
    }

    #[test]
    fn test_hygienist_tier_matches_category_or_position() {
        let by_category = resolve_price(
            &event(),
            &profile("Dental Hygienist", "", MembershipType::Free),
            Utc::now(),
        );
        assert_eq!(by_category.tier, PriceTier::Hygienist);
        assert_eq!(by_category.amount, dec!(8.00));

        let by_position = resolve_price(
            &event(),
            &profile("Others", "Lab Technician", MembershipType::Free),
            Utc::now(),
        );
        assert_eq!(by_position.tier, PriceTier::Hygienist);
    }

    #[test]
    fn test_paid_dentist_gets_member_price() {
        let resolved = resolve_price(
            &event(),
            &profile("Dentist", "Consultant", MembershipType::Paid),
            Utc::now(),
        );
        assert_eq!(resolved.tier, PriceTier::Member);
        assert_eq!(resolved.amount, dec!(12.00));
    }

    #[test]
    fn test_department_heads_and_leads_get_member_price() {
        for position in ["HOD", "Team Lead"] {
            let resolved = resolve_price(
                &event(),
                &profile("Faculty Member", position, MembershipType::Paid),
                Utc::now(),
            );
            assert_eq!(resolved.tier, PriceTier::Member, "position {position}");
            assert_eq!(resolved.amount, dec!(12.00));
        }
    }

    #[test]
    fn test_free_membership_dentist_pays_regular() {
        let resolved = resolve_price(
            &event(),
            &profile("Dentist", "Consultant", MembershipType::Free),
            Utc::now(),
        );
        assert_eq!(resolved.tier, PriceTier::Regular);
        assert_eq!(resolved.amount, dec!(20.00));
    }

    #[test]
    fn test_student_precedence_over_member() {
        // A paid member who is also a student gets the student tier.
        let resolved = resolve_price(
            &event(),
            &profile("Postgraduate Student", "Resident", MembershipType::Paid),
            Utc::now(),
        );
        assert_eq!(resolved.tier, PriceTier::Student);
    }

    #[test]
    fn test_missing_tier_price_falls_back_to_regular() {
        let mut event = event();
        event.student_price = None;
        let resolved = resolve_price(
            &event,
            &profile("Student", "Student", MembershipType::Free),
            Utc::now(),
        );
        assert_eq!(resolved.tier, PriceTier::Student);
        assert_eq!(resolved.amount, dec!(20.00));
    }

    #[test]
    fn test_early_bird_substitution_before_deadline() {
        let mut event = event();
        event.early_bird_deadline = Some(Utc::now() + Duration::days(3));
        event.early_bird_member_price = Some(dec!(10.00));

        let before = resolve_price(
            &event,
            &profile("Dentist", "Consultant", MembershipType::Paid),
            Utc::now(),
        );
        assert_eq!(before.amount, dec!(10.00));
        assert!(before.early_bird);

        let after = resolve_price(
            &event,
            &profile("Dentist", "Consultant", MembershipType::Paid),
            Utc::now() + Duration::days(4),
        );
        assert_eq!(after.amount, dec!(12.00));
        assert!(!after.early_bird);

        // Early-bird is never more expensive than standard here.
        assert!(before.amount <= after.amount);
    }

    #[test]
    fn test_early_bird_without_variant_keeps_base_price() {
        let mut event = event();
        event.early_bird_deadline = Some(Utc::now() + Duration::days(3));

        let resolved = resolve_price(
            &event,
            &profile("Dentist", "Consultant", MembershipType::Paid),
            Utc::now(),
        );
        assert_eq!(resolved.amount, dec!(12.00));
        assert!(!resolved.early_bird);
    }

    #[test]
    fn test_paid_event_with_no_prices_is_comped() {
        let mut event = event();
        event.regular_price = None;
        event.member_price = None;
        event.student_price = None;
        event.hygienist_price = None;

        let resolved = resolve_price(
            &event,
            &profile("Dentist", "Consultant", MembershipType::Free),
            Utc::now(),
        );
        assert!(resolved.is_free);
        assert_eq!(resolved.amount, Decimal::ZERO);
        assert_eq!(resolved.tier, PriceTier::Regular);
    }

    #[test]
    fn test_zero_tier_price_is_comped() {
        let mut event = event();
        event.student_price = Some(Decimal::ZERO);
        let resolved = resolve_price(
            &event,
            &profile("Student", "Student", MembershipType::Free),
            Utc::now(),
        );
        assert!(resolved.is_free);
        assert_eq!(resolved.amount, Decimal::ZERO);
    }

    #[test]
    fn test_amount_never_negative() {
        let mut event = event();
        // Misconfigured negative price is clamped to a comped registration.
        event.regular_price = Some(dec!(-3.00));
        event.member_price = None;
        let resolved = resolve_price(
            &event,
            &profile("Other", "", MembershipType::Free),
            Utc::now(),
        );
        assert!(resolved.amount >= Decimal::ZERO);
        assert!(resolved.is_free);
    }

    #[test]
    fn test_empty_profile_is_regular() {
        let resolved = resolve_price(&event(), &PricingProfile::default(), Utc::now());
        assert_eq!(resolved.tier, PriceTier::Regular);
        assert_eq!(resolved.amount, dec!(20.00));
    }

    #[test]
    fn test_tier_display() {
        assert_eq!(PriceTier::Student.to_string(), "student");
        assert_eq!(PriceTier::Hygienist.as_str(), "hygienist");
    }
}
