//! Test Data Builders
//!
//! Builders with sensible defaults, so tests only spell out the fields
//! they care about. `HiringBuilder` drives a real aggregate through its own
//! transitions rather than setting fields, so every built hiring is one the
//! lifecycle could actually produce.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{Money, ServiceId, UserId};
use domain_billing::PaymentWebhookEvent;
use domain_hiring::{DeliverableTerms, DeliveryEvent, Hiring, Quotation, QuoteTerms, TimeUnit};

use crate::fixtures::{MoneyFixtures, TemporalFixtures};

/// Builder for provider quote terms
#[derive(Debug, Clone)]
pub struct QuoteTermsBuilder {
    price: Money,
    estimated_hours: Decimal,
    estimated_time_unit: TimeUnit,
    notes: Option<String>,
    validity_days: Option<u32>,
    deliverables: Vec<DeliverableTerms>,
}

impl Default for QuoteTermsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl QuoteTermsBuilder {
    pub fn new() -> Self {
        Self {
            price: MoneyFixtures::usd_quote(),
            estimated_hours: dec!(12),
            estimated_time_unit: TimeUnit::Hours,
            notes: None,
            validity_days: Some(7),
            deliverables: Vec::new(),
        }
    }

    pub fn with_price(mut self, price: Money) -> Self {
        self.price = price;
        self
    }

    pub fn with_hours(mut self, hours: Decimal) -> Self {
        self.estimated_hours = hours;
        self
    }

    pub fn with_validity_days(mut self, days: u32) -> Self {
        self.validity_days = Some(days);
        self
    }

    /// Leaves validity to the engine default
    pub fn with_default_validity(mut self) -> Self {
        self.validity_days = None;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Adds a milestone priced in the quote's currency
    pub fn with_deliverable(mut self, title: impl Into<String>, amount: Decimal) -> Self {
        self.deliverables.push(DeliverableTerms {
            title: title.into(),
            description: None,
            price: Money::new(amount, self.price.currency()),
            estimated_date: None,
        });
        self
    }

    pub fn build(self) -> QuoteTerms {
        QuoteTerms {
            price: self.price,
            estimated_hours: self.estimated_hours,
            estimated_time_unit: self.estimated_time_unit,
            notes: self.notes,
            validity_days: self.validity_days,
            deliverables: self.deliverables,
        }
    }
}

/// Lifecycle point a built hiring is left at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HiringStage {
    PendingQuote,
    Quoted,
    PaymentPending,
    PaymentRejected,
    Paid,
    InProgress,
    Delivered,
}

/// Builder for hirings at a given stage
#[derive(Debug, Clone)]
pub struct HiringBuilder {
    client_id: UserId,
    provider_id: UserId,
    service_id: ServiceId,
    terms: QuoteTermsBuilder,
    stage: HiringStage,
    at: DateTime<Utc>,
    preference_id: String,
    payment_id: String,
}

impl Default for HiringBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HiringBuilder {
    pub fn new() -> Self {
        Self {
            client_id: UserId::new(),
            provider_id: UserId::new(),
            service_id: ServiceId::new(),
            terms: QuoteTermsBuilder::new(),
            stage: HiringStage::PendingQuote,
            at: TemporalFixtures::t0(),
            preference_id: "pref-builder".into(),
            payment_id: "pay-builder".into(),
        }
    }

    pub fn with_parties(mut self, client_id: UserId, provider_id: UserId) -> Self {
        self.client_id = client_id;
        self.provider_id = provider_id;
        self
    }

    pub fn with_terms(mut self, terms: QuoteTermsBuilder) -> Self {
        self.terms = terms;
        self
    }

    pub fn with_preference(mut self, preference_id: impl Into<String>) -> Self {
        self.preference_id = preference_id.into();
        self
    }

    pub fn with_payment(mut self, payment_id: impl Into<String>) -> Self {
        self.payment_id = payment_id.into();
        self
    }

    /// Instant every transition is applied at
    pub fn at(mut self, at: DateTime<Utc>) -> Self {
        self.at = at;
        self
    }

    pub fn stage(mut self, stage: HiringStage) -> Self {
        self.stage = stage;
        self
    }

    pub fn quoted(self) -> Self {
        self.stage(HiringStage::Quoted)
    }

    pub fn paid(self) -> Self {
        self.stage(HiringStage::Paid)
    }

    pub fn delivered(self) -> Self {
        self.stage(HiringStage::Delivered)
    }

    /// Builds the hiring with its events drained
    ///
    /// # Panics
    ///
    /// Panics if the configured terms are rejected by the aggregate
    pub fn build(self) -> Hiring {
        use HiringStage::*;

        let now = self.at;
        let mut hiring = Hiring::new(self.client_id, self.provider_id, self.service_id, now)
            .expect("builder parties must differ");

        if self.stage != PendingQuote {
            let quotation = Quotation::issue(self.terms.build(), now, 7).expect("builder terms must be valid");
            hiring.attach_quotation(quotation, now).expect("pending hiring accepts a quotation");
        }
        if matches!(self.stage, PaymentPending | PaymentRejected | Paid | InProgress | Delivered) {
            hiring
                .start_checkout(self.preference_id.clone(), now)
                .expect("quoted hiring accepts checkout");
        }
        match self.stage {
            PaymentRejected => hiring
                .reject_payment(&self.payment_id, now)
                .expect("pending payment can be rejected"),
            Paid | InProgress | Delivered => hiring
                .confirm_payment(&self.payment_id, now)
                .expect("pending payment can be confirmed"),
            _ => {}
        }
        if matches!(self.stage, InProgress | Delivered) {
            hiring
                .apply_delivery_event(DeliveryEvent::Started, now)
                .expect("paid hiring can start");
        }
        if self.stage == Delivered {
            hiring
                .apply_delivery_event(DeliveryEvent::Delivered, now)
                .expect("started hiring can deliver");
        }

        hiring.take_events();
        hiring
    }
}

/// Builder for gateway webhook events
#[derive(Debug, Clone)]
pub struct WebhookEventBuilder {
    event: PaymentWebhookEvent,
}

impl WebhookEventBuilder {
    /// Event referencing a hiring by id
    pub fn for_hiring(hiring: &Hiring) -> Self {
        Self {
            event: PaymentWebhookEvent::new("pay-1", "approved", hiring.id.as_uuid().to_string()),
        }
    }

    /// Event referencing only a checkout preference
    pub fn for_preference(preference_id: impl Into<String>) -> Self {
        Self {
            event: PaymentWebhookEvent::new("pay-1", "approved", "").with_preference(preference_id),
        }
    }

    pub fn payment_id(mut self, payment_id: impl Into<String>) -> Self {
        self.event.payment_id = payment_id.into();
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.event.status = status.into();
        self
    }

    pub fn merchant_order(mut self, merchant_order_id: impl Into<String>) -> Self {
        self.event = self.event.with_merchant_order(merchant_order_id);
        self
    }

    pub fn build(self) -> PaymentWebhookEvent {
        self.event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_hiring::{HiringStatus, PaymentStatus};

    #[test]
    fn test_builder_reaches_each_stage() {
        let cases = [
            (HiringStage::PendingQuote, HiringStatus::PendingQuote),
            (HiringStage::Quoted, HiringStatus::Quoted),
            (HiringStage::PaymentPending, HiringStatus::PaymentPending),
            (HiringStage::PaymentRejected, HiringStatus::PaymentRejected),
            (HiringStage::Paid, HiringStatus::Paid),
            (HiringStage::InProgress, HiringStatus::InProgress),
            (HiringStage::Delivered, HiringStatus::Delivered),
        ];
        for (stage, status) in cases {
            assert_eq!(HiringBuilder::new().stage(stage).build().status, status);
        }
    }

    #[test]
    fn test_paid_hiring_carries_payment() {
        let hiring = HiringBuilder::new().with_payment("pay-77").paid().build();
        assert_eq!(hiring.payment_id.as_deref(), Some("pay-77"));
        assert_eq!(hiring.payment_status, Some(PaymentStatus::Confirmed));
    }

    #[test]
    fn test_webhook_builder_by_preference() {
        let event = WebhookEventBuilder::for_preference("pref-9").status("rejected").build();
        assert_eq!(event.preference_id.as_deref(), Some("pref-9"));
        assert!(event.external_reference.is_empty());
        assert_eq!(event.status, "rejected");
    }
}
