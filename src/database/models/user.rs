use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub membership_tier: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Membership tiers, ordered by privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MembershipTier {
    Free,
    Basic,
    Premium,
}

impl MembershipTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipTier::Free => "Free",
            MembershipTier::Basic => "Basic",
            MembershipTier::Premium => "Premium",
        }
    }

    /// Parse the tier string stored on the user record. Unknown values read
    /// as Free rather than failing the request.
    pub fn from_record(value: &str) -> Self {
        match value {
            "Basic" => MembershipTier::Basic,
            "Premium" => MembershipTier::Premium,
            _ => MembershipTier::Free,
        }
    }

    /// Parse a client-supplied upgrade target. Only paid tiers are valid.
    pub fn parse_upgrade(value: &str) -> Option<Self> {
        match value {
            "Basic" => Some(MembershipTier::Basic),
            "Premium" => Some(MembershipTier::Premium),
            _ => None,
        }
    }
}

impl std::fmt::Display for MembershipTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_ordering_gates_premium() {
        assert!(MembershipTier::Premium > MembershipTier::Basic);
        assert!(MembershipTier::Basic > MembershipTier::Free);
    }

    #[test]
    fn unknown_record_value_reads_as_free() {
        assert_eq!(MembershipTier::from_record("Gold"), MembershipTier::Free);
        assert_eq!(MembershipTier::from_record(""), MembershipTier::Free);
    }

    #[test]
    fn upgrade_target_must_be_paid_tier() {
        assert_eq!(
            MembershipTier::parse_upgrade("Premium"),
            Some(MembershipTier::Premium)
        );
        assert_eq!(MembershipTier::parse_upgrade("Free"), None);
        assert_eq!(MembershipTier::parse_upgrade("premium"), None);
    }
}
