//! Member entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::member::{MembershipStatus, MembershipType};

/// Database row mapping for the members table.
#[derive(Debug, Clone, FromRow)]
pub struct MemberEntity {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub category: Option<String>,
    pub position: Option<String>,
    pub specialty: Option<String>,
    pub membership_type: String,
    pub membership_status: String,
    pub membership_expiry_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<MemberEntity> for domain::models::Member {
    fn from(entity: MemberEntity) -> Self {
        Self {
            id: entity.id,
            full_name: entity.full_name,
            email: entity.email,
            category: entity.category,
            position: entity.position,
            specialty: entity.specialty,
            // Values are constrained by CHECKs on the columns.
            membership_type: MembershipType::parse(&entity.membership_type)
                .unwrap_or(MembershipType::Free),
            membership_status: MembershipStatus::parse(&entity.membership_status)
                .unwrap_or(MembershipStatus::Pending),
            membership_expiry_date: entity.membership_expiry_date,
            created_at: entity.created_at,
        }
    }
}
