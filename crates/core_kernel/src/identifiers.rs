//! Strongly-typed identifiers for domain entities
//!
//! Every aggregate in the engagement engine is addressed by its own newtype
//! so a `ClaimId` can never be passed where a `ComplianceId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates a new time-ordered identifier (v7)
            pub fn new_v7() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates from an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Returns the identifier prefix for display
            pub fn prefix() -> &'static str {
                $prefix
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                // Strip prefix if present
                let uuid_str = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(uuid_str)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

// Engagement identifiers
define_id!(HiringId, "HIR");
define_id!(QuotationId, "QUO");
define_id!(DeliverableId, "DLV");
define_id!(ServiceId, "SRV");

// Dispute identifiers
define_id!(ClaimId, "CLM");
define_id!(ComplianceId, "CMP");
define_id!(SubmissionId, "SUB");

// Party identifiers
define_id!(UserId, "USR");

// Payment identifiers
define_id!(PaymentEventId, "PEV");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hiring_id_display() {
        let id = HiringId::new();
        assert!(id.to_string().starts_with("HIR-"));
    }

    #[test]
    fn test_id_parsing_accepts_bare_uuid() {
        let original = SubmissionId::new_v7();
        let bare = original.as_uuid().to_string();
        let parsed: SubmissionId = bare.parse().unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_uuid_conversion() {
        let uuid = Uuid::new_v4();
        let claim_id = ClaimId::from(uuid);
        let back: Uuid = claim_id.into();
        assert_eq!(uuid, back);
    }
}
