//! Pre-built Test Fixtures
//!
//! Consistent, predictable data for unit and scenario tests.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal_macros::dec;

use core_kernel::{Currency, Money, UserId};
use domain_claims::{
    ClaimFiling, ClaimType, ClientClaimType, ComplianceRequest, ComplianceType, ProviderClaimType,
};

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// Typical quoted price
    pub fn usd_quote() -> Money {
        Money::new(dec!(250.00), Currency::USD)
    }

    /// Partial refund ordered by a moderator
    pub fn usd_partial_refund() -> Money {
        Money::new(dec!(75.00), Currency::USD)
    }

    /// Quote in a zero-decimal currency
    pub fn clp_quote() -> Money {
        Money::new(dec!(180000), Currency::CLP)
    }

    pub fn usd_zero() -> Money {
        Money::zero(Currency::USD)
    }
}

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// Start of every harness clock
    pub fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 7, 9, 0, 0).unwrap()
    }
}

/// Claim filings for both sides
pub struct FilingFixtures;

impl FilingFixtures {
    pub fn not_delivered() -> ClaimFiling {
        ClaimFiling {
            claim_type: ClaimType::Client(ClientClaimType::NotDelivered),
            description: "nothing was delivered by the agreed date".into(),
            evidence_urls: vec!["https://files.example/thread.png".into()],
        }
    }

    pub fn poor_quality() -> ClaimFiling {
        ClaimFiling {
            claim_type: ClaimType::Client(ClientClaimType::PoorQuality),
            description: "the logo files are low resolution".into(),
            evidence_urls: Vec::new(),
        }
    }

    pub fn scope_creep() -> ClaimFiling {
        ClaimFiling {
            claim_type: ClaimType::Provider(ProviderClaimType::ScopeCreep),
            description: "client keeps adding pages outside the quote".into(),
            evidence_urls: Vec::new(),
        }
    }

    pub fn client_other(reason: &str) -> ClaimFiling {
        ClaimFiling {
            claim_type: ClaimType::Client(ClientClaimType::Other {
                reason: reason.to_string(),
            }),
            description: "see reason".into(),
            evidence_urls: Vec::new(),
        }
    }
}

/// Compliance requests a moderator attaches to a resolution
pub struct ComplianceFixtures;

impl ComplianceFixtures {
    pub fn request(responsible: UserId, compliance_type: ComplianceType, deadline_days: u32) -> ComplianceRequest {
        ComplianceRequest {
            responsible_user_id: responsible,
            compliance_type,
            instructions: "upload proof once done".into(),
            deadline_days,
        }
    }

    pub fn partial_refund(responsible: UserId, deadline_days: u32) -> ComplianceRequest {
        Self::request(
            responsible,
            ComplianceType::PartialRefund {
                amount: MoneyFixtures::usd_partial_refund(),
            },
            deadline_days,
        )
    }

    pub fn redeliver(responsible: UserId, deadline_days: u32) -> ComplianceRequest {
        Self::request(responsible, ComplianceType::RedeliverFiles, deadline_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_fixtures() {
        assert!(MoneyFixtures::usd_quote().is_positive());
        assert!(MoneyFixtures::usd_zero().is_zero());
        assert_eq!(MoneyFixtures::clp_quote().currency(), Currency::CLP);
    }

    #[test]
    fn test_filings_are_on_the_expected_side() {
        use domain_party::PartyRole;
        assert_eq!(FilingFixtures::not_delivered().claim_type.role(), PartyRole::Client);
        assert_eq!(FilingFixtures::scope_creep().claim_type.role(), PartyRole::Provider);
    }
}
