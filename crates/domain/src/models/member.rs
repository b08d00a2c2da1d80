//! Member domain model.
//!
//! Members are owned by the identity subsystem; this backend reads only the
//! fields that drive pricing and registration eligibility.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A society member as seen by the registration core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    /// Professional category from the member profile (e.g. "Dentist",
    /// "Undergraduate Student", "Dental Hygienist").
    pub category: Option<String>,
    /// Position within the profession (e.g. "Consultant", "Student").
    pub position: Option<String>,
    pub specialty: Option<String>,
    pub membership_type: MembershipType,
    pub membership_status: MembershipStatus,
    pub membership_expiry_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Member {
    /// The subset of fields the pricing resolver looks at.
    pub fn pricing_profile(&self) -> PricingProfile {
        PricingProfile {
            category: self.category.clone(),
            position: self.position.clone(),
            membership_type: self.membership_type,
        }
    }

    /// Whether the member may register for events at all.
    pub fn can_register(&self) -> bool {
        !matches!(self.membership_status, MembershipStatus::Blocked)
    }
}

/// Pricing-relevant attributes, decoupled from the full member record so the
/// pricing resolver stays a pure function over supplied data.
#[derive(Debug, Clone, Default)]
pub struct PricingProfile {
    pub category: Option<String>,
    pub position: Option<String>,
    pub membership_type: MembershipType,
}

/// Membership tier of a member.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipType {
    #[default]
    Free,
    Paid,
}

impl MembershipType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Paid => "paid",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "free" => Some(Self::Free),
            "paid" => Some(Self::Paid),
            _ => None,
        }
    }
}

/// Administrative status of a membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    Active,
    Pending,
    Inactive,
    Blocked,
}

impl MembershipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Pending => "pending",
            Self::Inactive => "inactive",
            Self::Blocked => "blocked",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "pending" => Some(Self::Pending),
            "inactive" => Some(Self::Inactive),
            "blocked" => Some(Self::Blocked),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(status: MembershipStatus) -> Member {
        Member {
            id: Uuid::new_v4(),
            full_name: "Test Member".to_string(),
            email: "member@example.com".to_string(),
            category: Some("Dentist".to_string()),
            position: Some("Consultant".to_string()),
            specialty: None,
            membership_type: MembershipType::Paid,
            membership_status: status,
            membership_expiry_date: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_pricing_profile_extraction() {
        let m = member(MembershipStatus::Active);
        let profile = m.pricing_profile();
        assert_eq!(profile.category.as_deref(), Some("Dentist"));
        assert_eq!(profile.position.as_deref(), Some("Consultant"));
        assert_eq!(profile.membership_type, MembershipType::Paid);
    }

    #[test]
    fn test_blocked_member_cannot_register() {
        assert!(member(MembershipStatus::Active).can_register());
        assert!(member(MembershipStatus::Pending).can_register());
        assert!(member(MembershipStatus::Inactive).can_register());
        assert!(!member(MembershipStatus::Blocked).can_register());
    }

    #[test]
    fn test_membership_type_roundtrip() {
        assert_eq!(MembershipType::parse("paid"), Some(MembershipType::Paid));
        assert_eq!(MembershipType::parse("free"), Some(MembershipType::Free));
        assert_eq!(MembershipType::parse("gold"), None);
    }

    #[test]
    fn test_membership_status_roundtrip() {
        for status in [
            MembershipStatus::Active,
            MembershipStatus::Pending,
            MembershipStatus::Inactive,
            MembershipStatus::Blocked,
        ] {
            assert_eq!(MembershipStatus::parse(status.as_str()), Some(status));
        }
    }
}
