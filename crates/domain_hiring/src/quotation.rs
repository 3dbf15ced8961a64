//! Quotations and milestone deliverables
//!
//! A quotation is a priced, time-boxed offer from the provider. Quotations
//! are never edited after issue; a re-quote supersedes the current one and
//! a fresh quotation is appended to the hiring's history.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{DeliverableId, Money, QuotationId, ValidityWindow};

use crate::error::HiringError;

/// Unit the estimated effort is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Hours,
    Days,
    Weeks,
}

impl TimeUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Hours => "hours",
            TimeUnit::Days => "days",
            TimeUnit::Weeks => "weeks",
        }
    }
}

impl FromStr for TimeUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hours" => Ok(TimeUnit::Hours),
            "days" => Ok(TimeUnit::Days),
            "weeks" => Ok(TimeUnit::Weeks),
            other => Err(format!("unknown time unit: {other}")),
        }
    }
}

/// Quotation lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotationStatus {
    /// Offered and awaiting checkout
    Quoted,
    /// Taken to checkout by the client
    Accepted,
    /// Replaced after a re-quote
    Superseded,
}

impl QuotationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuotationStatus::Quoted => "quoted",
            QuotationStatus::Accepted => "accepted",
            QuotationStatus::Superseded => "superseded",
        }
    }
}

impl fmt::Display for QuotationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuotationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quoted" => Ok(QuotationStatus::Quoted),
            "accepted" => Ok(QuotationStatus::Accepted),
            "superseded" => Ok(QuotationStatus::Superseded),
            other => Err(format!("unknown quotation status: {other}")),
        }
    }
}

/// One milestone of a quotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deliverable {
    pub id: DeliverableId,
    pub title: String,
    pub description: Option<String>,
    pub price: Money,
    pub estimated_date: Option<NaiveDate>,
}

/// Provider-supplied milestone terms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverableTerms {
    pub title: String,
    pub description: Option<String>,
    pub price: Money,
    pub estimated_date: Option<NaiveDate>,
}

/// Provider-supplied quotation terms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteTerms {
    pub price: Money,
    pub estimated_hours: Decimal,
    pub estimated_time_unit: TimeUnit,
    pub notes: Option<String>,
    /// Falls back to the engine default when absent
    pub validity_days: Option<u32>,
    #[serde(default)]
    pub deliverables: Vec<DeliverableTerms>,
}

/// A priced, time-boxed offer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quotation {
    pub id: QuotationId,
    pub quoted_price: Money,
    pub estimated_hours: Decimal,
    pub estimated_time_unit: TimeUnit,
    pub notes: Option<String>,
    pub validity_days: u32,
    pub quoted_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: QuotationStatus,
    pub deliverables: Vec<Deliverable>,
}

impl Quotation {
    /// Validates `terms` and issues a quotation at `now`
    ///
    /// # Errors
    ///
    /// Returns `HiringError::Validation` when the price or effort is not
    /// positive, the validity is zero days, or the deliverables do not add
    /// up to the quoted price.
    pub fn issue(
        terms: QuoteTerms,
        now: DateTime<Utc>,
        default_validity_days: u32,
    ) -> Result<Self, HiringError> {
        if !terms.price.is_positive() {
            return Err(HiringError::validation("quoted price must be greater than zero"));
        }
        if terms.estimated_hours <= Decimal::ZERO {
            return Err(HiringError::validation("estimated time must be greater than zero"));
        }
        let validity_days = terms.validity_days.unwrap_or(default_validity_days);
        let window = ValidityWindow::days_from(now, validity_days)?;

        let deliverables = validate_deliverables(&terms.price, terms.deliverables)?;

        Ok(Self {
            id: QuotationId::new_v7(),
            quoted_price: terms.price,
            estimated_hours: terms.estimated_hours,
            estimated_time_unit: terms.estimated_time_unit,
            notes: terms.notes.filter(|n| !n.trim().is_empty()),
            validity_days,
            quoted_at: window.start,
            expires_at: window.end,
            status: QuotationStatus::Quoted,
            deliverables,
        })
    }

    /// The half-open window during which the quotation can be accepted
    pub fn validity(&self) -> ValidityWindow {
        ValidityWindow {
            start: self.quoted_at,
            end: self.expires_at,
        }
    }

    /// True once `now` has reached `expires_at`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.validity().has_expired(now)
    }
}

fn validate_deliverables(
    price: &Money,
    terms: Vec<DeliverableTerms>,
) -> Result<Vec<Deliverable>, HiringError> {
    if terms.is_empty() {
        return Ok(Vec::new());
    }

    let mut deliverables = Vec::with_capacity(terms.len());
    for (index, item) in terms.into_iter().enumerate() {
        if item.title.trim().is_empty() {
            return Err(HiringError::validation(format!(
                "deliverable {} needs a title",
                index + 1
            )));
        }
        if !item.price.is_positive() {
            return Err(HiringError::validation(format!(
                "deliverable '{}' must have a positive price",
                item.title
            )));
        }
        deliverables.push(Deliverable {
            id: DeliverableId::new_v7(),
            title: item.title,
            description: item.description,
            price: item.price,
            estimated_date: item.estimated_date,
        });
    }

    let total = Money::sum(price.currency(), deliverables.iter().map(|d| &d.price))?;
    if total != *price {
        return Err(HiringError::validation(format!(
            "deliverable prices add up to {total}, quoted price is {price}"
        )));
    }
    Ok(deliverables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use core_kernel::{Classify, Currency, ErrorKind};
    use rust_decimal_macros::dec;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 10, 9, 0, 0).unwrap()
    }

    fn terms(price: Money) -> QuoteTerms {
        QuoteTerms {
            price,
            estimated_hours: dec!(12),
            estimated_time_unit: TimeUnit::Hours,
            notes: Some("two revisions included".to_string()),
            validity_days: Some(3),
            deliverables: Vec::new(),
        }
    }

    fn milestone(title: &str, amount: Decimal) -> DeliverableTerms {
        DeliverableTerms {
            title: title.to_string(),
            description: None,
            price: Money::new(amount, Currency::ARS),
            estimated_date: None,
        }
    }

    #[test]
    fn test_issue_computes_expiry() {
        let q = Quotation::issue(terms(Money::new(dec!(900), Currency::ARS)), t0(), 7).unwrap();
        assert_eq!(q.expires_at, t0() + Duration::days(3));
        assert_eq!(q.status, QuotationStatus::Quoted);
        assert!(!q.is_expired(t0() + Duration::days(2)));
        assert!(q.is_expired(q.expires_at));
    }

    #[test]
    fn test_default_validity_used_when_absent() {
        let mut t = terms(Money::new(dec!(900), Currency::ARS));
        t.validity_days = None;
        let q = Quotation::issue(t, t0(), 7).unwrap();
        assert_eq!(q.validity_days, 7);
    }

    #[test]
    fn test_zero_price_rejected() {
        let err = Quotation::issue(terms(Money::zero(Currency::ARS)), t0(), 7).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_zero_validity_rejected() {
        let mut t = terms(Money::new(dec!(900), Currency::ARS));
        t.validity_days = Some(0);
        let err = Quotation::issue(t, t0(), 7).unwrap_err();
        assert!(matches!(err, HiringError::Temporal(_)));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_deliverables_must_sum_to_price() {
        let mut t = terms(Money::new(dec!(900), Currency::ARS));
        t.deliverables = vec![milestone("Design", dec!(400)), milestone("Build", dec!(400))];
        assert!(Quotation::issue(t.clone(), t0(), 7).is_err());

        t.deliverables.push(milestone("Handover", dec!(100)));
        let q = Quotation::issue(t, t0(), 7).unwrap();
        assert_eq!(q.deliverables.len(), 3);
    }

    #[test]
    fn test_deliverable_currency_must_match() {
        let mut t = terms(Money::new(dec!(900), Currency::ARS));
        t.deliverables = vec![DeliverableTerms {
            title: "All".to_string(),
            description: None,
            price: Money::new(dec!(900), Currency::USD),
            estimated_date: None,
        }];
        let err = Quotation::issue(t, t0(), 7).unwrap_err();
        assert!(matches!(err, HiringError::Money(_)));
    }
}
