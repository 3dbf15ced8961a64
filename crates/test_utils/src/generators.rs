//! Property-Based Test Generators
//!
//! proptest strategies for domain values, plus `fake`-backed helpers for
//! free-text fields whose content does not matter to the test.

use chrono::{DateTime, Duration, Utc};
use fake::faker::internet::en::DomainSuffix;
use fake::faker::lorem::en::{Sentence, Word};
use fake::Fake;
use proptest::prelude::*;
use rust_decimal::Decimal;

use core_kernel::{Currency, Money};
use domain_claims::{ClaimType, ClientClaimType, ProviderClaimType};
use domain_hiring::{QuoteTerms, TimeUnit};

use crate::fixtures::TemporalFixtures;

/// Strategy for the supported currencies
pub fn currency_strategy() -> impl Strategy<Value = Currency> {
    prop_oneof![
        Just(Currency::USD),
        Just(Currency::EUR),
        Just(Currency::ARS),
        Just(Currency::BRL),
        Just(Currency::CLP),
        Just(Currency::COP),
        Just(Currency::MXN),
        Just(Currency::PEN),
        Just(Currency::UYU),
    ]
}

/// Strategy for positive amounts in minor units
pub fn positive_amount_minor_strategy() -> impl Strategy<Value = i64> {
    1i64..1_000_000_000i64
}

/// Strategy for Money values with positive amounts
pub fn positive_money_strategy() -> impl Strategy<Value = Money> {
    (positive_amount_minor_strategy(), currency_strategy())
        .prop_map(|(amount, currency)| Money::from_minor(amount, currency))
}

/// Strategy for Money values that are zero or negative
pub fn non_positive_money_strategy() -> impl Strategy<Value = Money> {
    (-1_000_000i64..=0i64, currency_strategy())
        .prop_map(|(amount, currency)| Money::from_minor(amount, currency))
}

pub fn time_unit_strategy() -> impl Strategy<Value = TimeUnit> {
    prop_oneof![Just(TimeUnit::Hours), Just(TimeUnit::Days), Just(TimeUnit::Weeks)]
}

/// Strategy for quote terms the aggregate accepts
pub fn quote_terms_strategy() -> impl Strategy<Value = QuoteTerms> {
    (
        positive_money_strategy(),
        (1i64..10_000i64).prop_map(|n| Decimal::new(n, 1)),
        time_unit_strategy(),
        proptest::option::of(1u32..=90u32),
    )
        .prop_map(|(price, estimated_hours, estimated_time_unit, validity_days)| QuoteTerms {
            price,
            estimated_hours,
            estimated_time_unit,
            notes: None,
            validity_days,
            deliverables: Vec::new(),
        })
}

/// Strategy for claim types of either side, `Other` excluded
pub fn claim_type_strategy() -> impl Strategy<Value = ClaimType> {
    prop_oneof![
        Just(ClaimType::Client(ClientClaimType::NotDelivered)),
        Just(ClaimType::Client(ClientClaimType::LateDelivery)),
        Just(ClaimType::Client(ClientClaimType::PoorQuality)),
        Just(ClaimType::Client(ClientClaimType::IncompleteWork)),
        Just(ClaimType::Client(ClientClaimType::NotAsDescribed)),
        Just(ClaimType::Client(ClientClaimType::ProviderUnresponsive)),
        Just(ClaimType::Provider(ProviderClaimType::ClientUnresponsive)),
        Just(ClaimType::Provider(ProviderClaimType::ScopeCreep)),
        Just(ClaimType::Provider(ProviderClaimType::ExcessiveRevisions)),
        Just(ClaimType::Provider(ProviderClaimType::MissingRequirements)),
        Just(ClaimType::Provider(ProviderClaimType::AbusiveBehavior)),
    ]
}

/// Strategy for status strings the gateway is known to send
pub fn gateway_status_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "approved",
        "accredited",
        "pending",
        "in_process",
        "authorized",
        "in_mediation",
        "rejected",
        "cancelled",
        "refunded",
        "charged_back",
    ])
}

/// Strategy for instants within the month after the harness start
pub fn instant_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..30 * 24 * 60).prop_map(|minutes| TemporalFixtures::t0() + Duration::minutes(minutes))
}

/// Throwaway prose for descriptions and notes
pub fn fake_description() -> String {
    Sentence(4..10).fake()
}

/// Throwaway evidence URLs
pub fn fake_evidence_urls(count: usize) -> Vec<String> {
    (0..count)
        .map(|_| {
            let name: String = Word().fake();
            let suffix: String = DomainSuffix().fake();
            format!("https://evidence.example.{suffix}/{name}.png")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_billing::normalize_status;
    use domain_hiring::Quotation;

    proptest! {
        #[test]
        fn positive_money_is_always_positive(money in positive_money_strategy()) {
            prop_assert!(money.is_positive());
        }

        #[test]
        fn generated_terms_issue_a_quotation(terms in quote_terms_strategy(), now in instant_strategy()) {
            let quotation = Quotation::issue(terms.clone(), now, 7).unwrap();
            let days = i64::from(terms.validity_days.unwrap_or(7));
            prop_assert_eq!(quotation.expires_at, now + Duration::days(days));
        }

        #[test]
        fn non_positive_price_is_refused(price in non_positive_money_strategy(), now in instant_strategy()) {
            let terms = QuoteTerms {
                price,
                estimated_hours: Decimal::ONE,
                estimated_time_unit: TimeUnit::Hours,
                notes: None,
                validity_days: None,
                deliverables: Vec::new(),
            };
            prop_assert!(Quotation::issue(terms, now, 7).is_err());
        }

        #[test]
        fn known_gateway_statuses_normalize(status in gateway_status_strategy()) {
            prop_assert!(normalize_status(status).is_some());
        }
    }

    #[test]
    fn test_fake_evidence_urls_are_https() {
        let urls = fake_evidence_urls(3);
        assert_eq!(urls.len(), 3);
        assert!(urls.iter().all(|u| u.starts_with("https://")));
        assert!(!fake_description().is_empty());
    }
}
