//! Hiring Aggregate Root
//!
//! The Hiring aggregate is the consistency boundary for one client/provider
//! engagement on one service. Every status change goes through a single
//! transition table so that an out-of-order request is always reported as
//! `InvalidTransition` instead of being silently applied.
//!
//! # Invariants
//!
//! - `retry_count` never exceeds the configured re-quote limit
//! - `payment_id` is only set by a confirmed gateway event
//! - At most one quotation is current; the history is append-only
//! - Client and provider are different users
//!
//! # State Machine
//!
//! ```text
//! pending_quote -> quoted -> payment_pending -> paid -> in_progress -> delivered -> completed
//!      ^             |             |  ^           \          |  ^          |
//!      +--requote----+             v  |            \         |  +-revision-+
//!                            payment_rejected       +----> disputed <------+
//!                                                            |
//!                       restore | resolved_completed | resolved_cancelled
//!
//! pending_quote | quoted | payment_rejected -> cancelled
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{ClaimId, HiringId, QuotationId, ServiceId, UserId};

use crate::error::HiringError;
use crate::events::HiringEvent;
use crate::quotation::{Quotation, QuotationStatus};

/// Hiring lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HiringStatus {
    /// Waiting for the provider to quote (new, or after a re-quote)
    PendingQuote,
    /// A current quotation is on offer
    Quoted,
    /// Client started checkout; waiting for the gateway
    PaymentPending,
    /// Gateway rejected or cancelled the payment; checkout may be retried
    PaymentRejected,
    Paid,
    InProgress,
    Delivered,
    Completed,
    /// A claim is open against the hiring
    Disputed,
    /// Claim resolved in the provider's favour
    ResolvedCompleted,
    /// Claim resolved by partial agreement; engagement ends
    ResolvedCancelled,
    /// Abandoned by either party before payment
    Cancelled,
}

impl HiringStatus {
    pub const ALL: [HiringStatus; 12] = [
        HiringStatus::PendingQuote,
        HiringStatus::Quoted,
        HiringStatus::PaymentPending,
        HiringStatus::PaymentRejected,
        HiringStatus::Paid,
        HiringStatus::InProgress,
        HiringStatus::Delivered,
        HiringStatus::Completed,
        HiringStatus::Disputed,
        HiringStatus::ResolvedCompleted,
        HiringStatus::ResolvedCancelled,
        HiringStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HiringStatus::PendingQuote => "pending_quote",
            HiringStatus::Quoted => "quoted",
            HiringStatus::PaymentPending => "payment_pending",
            HiringStatus::PaymentRejected => "payment_rejected",
            HiringStatus::Paid => "paid",
            HiringStatus::InProgress => "in_progress",
            HiringStatus::Delivered => "delivered",
            HiringStatus::Completed => "completed",
            HiringStatus::Disputed => "disputed",
            HiringStatus::ResolvedCompleted => "resolved_completed",
            HiringStatus::ResolvedCancelled => "resolved_cancelled",
            HiringStatus::Cancelled => "cancelled",
        }
    }

    /// No further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            HiringStatus::Completed
                | HiringStatus::ResolvedCompleted
                | HiringStatus::ResolvedCancelled
                | HiringStatus::Cancelled
        )
    }

    /// A claim may be filed from these states
    pub fn is_dispute_eligible(&self) -> bool {
        matches!(
            self,
            HiringStatus::Paid | HiringStatus::InProgress | HiringStatus::Delivered
        )
    }

    /// The lifecycle table
    pub fn can_transition_to(&self, target: HiringStatus) -> bool {
        use HiringStatus::*;
        matches!(
            (*self, target),
            (PendingQuote, Quoted) |
            (PendingQuote, Cancelled) |
            (Quoted, PendingQuote) |
            (Quoted, PaymentPending) |
            (Quoted, Cancelled) |
            (PaymentPending, Paid) |
            (PaymentPending, PaymentRejected) |
            (PaymentRejected, PaymentPending) |
            (PaymentRejected, Cancelled) |
            (Paid, InProgress) |
            (Paid, Disputed) |
            (InProgress, Delivered) |
            (InProgress, Disputed) |
            (Delivered, InProgress) |
            (Delivered, Completed) |
            (Delivered, Disputed) |
            (Disputed, Paid) |
            (Disputed, InProgress) |
            (Disputed, Delivered) |
            (Disputed, ResolvedCompleted) |
            (Disputed, ResolvedCancelled)
        )
    }
}

impl fmt::Display for HiringStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HiringStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HiringStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown hiring status: {s}"))
    }
}

/// Normalised payment status as recorded on the hiring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Confirmed,
    Rejected,
    /// Refunded or charged back after confirmation
    Reversed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Confirmed => "confirmed",
            PaymentStatus::Rejected => "rejected",
            PaymentStatus::Reversed => "reversed",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "confirmed" => Ok(PaymentStatus::Confirmed),
            "rejected" => Ok(PaymentStatus::Rejected),
            "reversed" => Ok(PaymentStatus::Reversed),
            other => Err(format!("unknown payment status: {other}")),
        }
    }
}

/// Progress reported by the delivery subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryEvent {
    Started,
    Delivered,
    RevisionRequested,
    Accepted,
}

impl DeliveryEvent {
    /// The only (source, target) pair each event may drive
    pub fn transition(&self) -> (HiringStatus, HiringStatus) {
        match self {
            DeliveryEvent::Started => (HiringStatus::Paid, HiringStatus::InProgress),
            DeliveryEvent::Delivered => (HiringStatus::InProgress, HiringStatus::Delivered),
            DeliveryEvent::RevisionRequested => (HiringStatus::Delivered, HiringStatus::InProgress),
            DeliveryEvent::Accepted => (HiringStatus::Delivered, HiringStatus::Completed),
        }
    }
}

/// One gateway event applied to the hiring
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedPayment {
    pub payment_id: String,
    pub status: PaymentStatus,
    /// Checkout the event was applied under
    pub preference_id: Option<String>,
    pub applied_at: DateTime<Utc>,
}

/// How a closed dispute leaves the hiring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeOutcome {
    /// Back to the status the hiring had when the claim was filed
    Restore,
    /// Terminal `resolved_completed`
    Complete,
    /// Terminal `resolved_cancelled`
    Cancel,
}

/// The Hiring aggregate root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hiring {
    pub id: HiringId,
    pub client_id: UserId,
    pub provider_id: UserId,
    pub service_id: ServiceId,
    pub status: HiringStatus,
    /// Checkout reference handed out by the gateway
    pub preference_id: Option<String>,
    /// Gateway payment id; set only on confirmation
    pub payment_id: Option<String>,
    pub payment_status: Option<PaymentStatus>,
    pub paid_at: Option<DateTime<Utc>>,
    /// Every gateway event applied, oldest first
    pub payment_history: Vec<AppliedPayment>,
    pub retry_count: u32,
    pub pre_dispute_status: Option<HiringStatus>,
    pub dispute_claim_id: Option<ClaimId>,
    /// Every quotation ever issued, oldest first
    pub quotations: Vec<Quotation>,
    pub current_quotation_id: Option<QuotationId>,
    /// Version for optimistic concurrency
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<HiringEvent>,
}

impl Hiring {
    /// Creates a hiring waiting for its first quotation
    ///
    /// # Errors
    ///
    /// Returns a validation error when client and provider are the same user
    pub fn new(
        client_id: UserId,
        provider_id: UserId,
        service_id: ServiceId,
        now: DateTime<Utc>,
    ) -> Result<Self, HiringError> {
        if client_id == provider_id {
            return Err(HiringError::validation("a user cannot hire themselves"));
        }
        let id = HiringId::new_v7();
        Ok(Self {
            id,
            client_id,
            provider_id,
            service_id,
            status: HiringStatus::PendingQuote,
            preference_id: None,
            payment_id: None,
            payment_status: None,
            paid_at: None,
            payment_history: Vec::new(),
            retry_count: 0,
            pre_dispute_status: None,
            dispute_claim_id: None,
            quotations: Vec::new(),
            current_quotation_id: None,
            version: 1,
            created_at: now,
            updated_at: now,
            events: vec![HiringEvent::HiringCreated {
                hiring_id: id,
                client_id,
                provider_id,
                timestamp: now,
            }],
        })
    }

    /// Returns accumulated domain events and clears them
    pub fn take_events(&mut self) -> Vec<HiringEvent> {
        std::mem::take(&mut self.events)
    }

    /// The quotation the current pointer refers to
    pub fn current_quotation(&self) -> Option<&Quotation> {
        let id = self.current_quotation_id?;
        self.quotations.iter().find(|q| q.id == id)
    }

    fn current_quotation_mut(&mut self) -> Option<&mut Quotation> {
        let id = self.current_quotation_id?;
        self.quotations.iter_mut().find(|q| q.id == id)
    }

    pub fn is_client(&self, user_id: UserId) -> bool {
        self.client_id == user_id
    }

    pub fn is_provider(&self, user_id: UserId) -> bool {
        self.provider_id == user_id
    }

    pub fn is_party(&self, user_id: UserId) -> bool {
        self.is_client(user_id) || self.is_provider(user_id)
    }

    /// A confirmed payment was applied at some point; later gateway noise
    /// must not move the hiring backwards
    pub fn has_been_paid(&self) -> bool {
        self.paid_at.is_some()
    }

    fn transition(&mut self, to: HiringStatus, now: DateTime<Utc>) -> Result<(), HiringError> {
        if !self.status.can_transition_to(to) {
            tracing::warn!(
                hiring_id = %self.id,
                from = %self.status,
                to = %to,
                "rejected hiring transition"
            );
            return Err(HiringError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.updated_at = now;
        Ok(())
    }

    fn invalid_state(&self, action: &'static str, reason: impl Into<String>) -> HiringError {
        HiringError::InvalidState {
            hiring_id: self.id,
            status: self.status,
            action,
            reason: reason.into(),
        }
    }

    /// Appends a freshly issued quotation and makes it current
    pub fn attach_quotation(
        &mut self,
        quotation: Quotation,
        now: DateTime<Utc>,
    ) -> Result<(), HiringError> {
        if self.status != HiringStatus::PendingQuote {
            let reason = match self.current_quotation() {
                Some(q) if !q.is_expired(now) => {
                    format!("quotation {} is valid until {}", q.id, q.expires_at)
                }
                Some(q) if q.status == QuotationStatus::Quoted => {
                    format!("quotation {} expired; the client must request a re-quote", q.id)
                }
                _ => "hiring is not awaiting a quotation".to_string(),
            };
            return Err(self.invalid_state("quote", reason));
        }

        let quotation_id = quotation.id;
        let expires_at = quotation.expires_at;
        self.transition(HiringStatus::Quoted, now)?;
        self.quotations.push(quotation);
        self.current_quotation_id = Some(quotation_id);

        self.events.push(HiringEvent::QuotationIssued {
            hiring_id: self.id,
            quotation_id,
            expires_at,
            timestamp: now,
        });
        Ok(())
    }

    /// Supersedes the expired current quotation and waits for a new one
    ///
    /// Checks run in order: the quotation must be `quoted`, then expired,
    /// then the counter must be below `limit`.
    pub fn request_requote(&mut self, limit: u32, now: DateTime<Utc>) -> Result<u32, HiringError> {
        let (quotation_id, expires_at, status) = match self.current_quotation() {
            Some(q) => (q.id, q.expires_at, q.status),
            None => return Err(self.invalid_state("re-quote", "there is no current quotation")),
        };
        if status != QuotationStatus::Quoted || self.status != HiringStatus::Quoted {
            return Err(self.invalid_state(
                "re-quote",
                format!("quotation {quotation_id} is {status}"),
            ));
        }
        if now < expires_at {
            return Err(HiringError::QuotationNotExpired {
                quotation_id,
                expires_at,
            });
        }
        if self.retry_count >= limit {
            return Err(HiringError::RequoteLimitReached {
                hiring_id: self.id,
                limit,
            });
        }

        self.transition(HiringStatus::PendingQuote, now)?;
        if let Some(q) = self.current_quotation_mut() {
            q.status = QuotationStatus::Superseded;
        }
        self.current_quotation_id = None;
        self.retry_count += 1;

        self.events.push(HiringEvent::RequoteRequested {
            hiring_id: self.id,
            superseded_quotation_id: quotation_id,
            retry_count: self.retry_count,
            timestamp: now,
        });
        Ok(self.retry_count)
    }

    /// Moves to `payment_pending` with the gateway's checkout reference
    ///
    /// From `quoted` the current quotation must still be inside its window
    /// and becomes accepted. From `payment_rejected` the accepted quotation
    /// is reused without a new quote.
    pub fn start_checkout(
        &mut self,
        preference_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), HiringError> {
        let preference_id = preference_id.into();
        if preference_id.trim().is_empty() {
            return Err(HiringError::validation("preference_id must not be blank"));
        }

        if self.status == HiringStatus::Quoted {
            let quotation = self
                .current_quotation()
                .ok_or_else(|| self.invalid_state("check out", "there is no current quotation"))?;
            if quotation.is_expired(now) {
                return Err(HiringError::QuotationExpired {
                    quotation_id: quotation.id,
                    expired_at: quotation.expires_at,
                });
            }
        }

        self.transition(HiringStatus::PaymentPending, now)?;
        if let Some(q) = self.current_quotation_mut() {
            q.status = QuotationStatus::Accepted;
        }
        self.preference_id = Some(preference_id.clone());
        self.payment_status = Some(PaymentStatus::Pending);

        self.events.push(HiringEvent::CheckoutStarted {
            hiring_id: self.id,
            preference_id,
            timestamp: now,
        });
        Ok(())
    }

    /// True when this (payment id, status) pair was applied at any point
    ///
    /// A confirmation carrying the payment id that paid the hiring counts
    /// as applied even after later events on the same payment.
    pub fn has_applied_payment_event(&self, payment_id: &str, status: PaymentStatus) -> bool {
        let paid_by = status == PaymentStatus::Confirmed
            && self.has_been_paid()
            && self.payment_id.as_deref() == Some(payment_id);
        paid_by
            || self
                .payment_history
                .iter()
                .any(|p| p.payment_id == payment_id && p.status == status)
    }

    /// True when `payment_id` was only ever applied under an earlier checkout
    pub fn is_stale_payment(&self, payment_id: &str) -> bool {
        let mut seen = self
            .payment_history
            .iter()
            .filter(|p| p.payment_id == payment_id)
            .peekable();
        seen.peek().is_some() && seen.all(|p| p.preference_id != self.preference_id)
    }

    fn record_payment_event(&mut self, payment_id: &str, status: PaymentStatus, now: DateTime<Utc>) {
        self.payment_history.push(AppliedPayment {
            payment_id: payment_id.to_string(),
            status,
            preference_id: self.preference_id.clone(),
            applied_at: now,
        });
        self.payment_status = Some(status);
        self.updated_at = now;
        self.events.push(HiringEvent::PaymentStatusChanged {
            hiring_id: self.id,
            payment_id: payment_id.to_string(),
            payment_status: status,
            timestamp: now,
        });
    }

    /// `payment_pending -> paid`
    pub fn confirm_payment(&mut self, payment_id: &str, now: DateTime<Utc>) -> Result<(), HiringError> {
        self.transition(HiringStatus::Paid, now)?;
        self.payment_id = Some(payment_id.to_string());
        self.paid_at = Some(now);
        self.record_payment_event(payment_id, PaymentStatus::Confirmed, now);
        Ok(())
    }

    /// `payment_pending -> payment_rejected`
    pub fn reject_payment(&mut self, payment_id: &str, now: DateTime<Utc>) -> Result<(), HiringError> {
        self.transition(HiringStatus::PaymentRejected, now)?;
        self.record_payment_event(payment_id, PaymentStatus::Rejected, now);
        Ok(())
    }

    /// Records a still-pending gateway status without changing the hiring status
    pub fn note_payment_pending(&mut self, payment_id: &str, now: DateTime<Utc>) {
        self.record_payment_event(payment_id, PaymentStatus::Pending, now);
    }

    /// Records a refund or chargeback on a paid hiring; status never regresses
    pub fn record_reversal(&mut self, payment_id: &str, now: DateTime<Utc>) {
        self.record_payment_event(payment_id, PaymentStatus::Reversed, now);
    }

    /// Applies a delivery-subsystem event
    pub fn apply_delivery_event(
        &mut self,
        event: DeliveryEvent,
        now: DateTime<Utc>,
    ) -> Result<(), HiringError> {
        let (from, to) = event.transition();
        if self.status != from {
            tracing::warn!(
                hiring_id = %self.id,
                current = %self.status,
                ?event,
                "delivery event does not match hiring status"
            );
            return Err(HiringError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.transition(to, now)?;
        self.events.push(HiringEvent::StatusChanged {
            hiring_id: self.id,
            from,
            to,
            timestamp: now,
        });
        Ok(())
    }

    /// Ends the engagement before payment
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), HiringError> {
        let from = self.status;
        self.transition(HiringStatus::Cancelled, now)?;
        if let Some(q) = self.current_quotation_mut() {
            if q.status == QuotationStatus::Quoted {
                q.status = QuotationStatus::Superseded;
            }
        }
        self.events.push(HiringEvent::StatusChanged {
            hiring_id: self.id,
            from,
            to: HiringStatus::Cancelled,
            timestamp: now,
        });
        Ok(())
    }

    /// Enters `disputed`, remembering where to return to
    pub fn open_dispute(&mut self, claim_id: ClaimId, now: DateTime<Utc>) -> Result<(), HiringError> {
        if !self.status.is_dispute_eligible() {
            return Err(self.invalid_state(
                "dispute",
                "claims can only be filed on paid, in-progress or delivered hirings",
            ));
        }
        let pre_dispute_status = self.status;
        self.transition(HiringStatus::Disputed, now)?;
        self.pre_dispute_status = Some(pre_dispute_status);
        self.dispute_claim_id = Some(claim_id);

        self.events.push(HiringEvent::DisputeOpened {
            hiring_id: self.id,
            claim_id,
            pre_dispute_status,
            timestamp: now,
        });
        Ok(())
    }

    /// Leaves `disputed` according to the claim outcome
    pub fn close_dispute(
        &mut self,
        outcome: DisputeOutcome,
        now: DateTime<Utc>,
    ) -> Result<HiringStatus, HiringError> {
        if self.status != HiringStatus::Disputed {
            return Err(self.invalid_state("close dispute", "hiring is not disputed"));
        }
        let target = match outcome {
            DisputeOutcome::Restore => self
                .pre_dispute_status
                .ok_or_else(|| self.invalid_state("close dispute", "pre-dispute status was not recorded"))?,
            DisputeOutcome::Complete => HiringStatus::ResolvedCompleted,
            DisputeOutcome::Cancel => HiringStatus::ResolvedCancelled,
        };
        self.transition(target, now)?;
        let claim_id = self.dispute_claim_id.take();
        self.pre_dispute_status = None;

        self.events.push(HiringEvent::DisputeClosed {
            hiring_id: self.id,
            claim_id,
            outcome_status: target,
            timestamp: now,
        });
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quotation::{QuoteTerms, TimeUnit};
    use chrono::{Duration, TimeZone};
    use core_kernel::{Currency, Money};
    use rust_decimal_macros::dec;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, 10, 0, 0).unwrap()
    }

    fn quote(now: DateTime<Utc>, days: u32) -> Quotation {
        Quotation::issue(
            QuoteTerms {
                price: Money::new(dec!(1500), Currency::BRL),
                estimated_hours: dec!(3),
                estimated_time_unit: TimeUnit::Days,
                notes: None,
                validity_days: Some(days),
                deliverables: Vec::new(),
            },
            now,
            7,
        )
        .unwrap()
    }

    fn quoted_hiring() -> Hiring {
        let mut hiring = Hiring::new(UserId::new(), UserId::new(), ServiceId::new(), t0()).unwrap();
        hiring.attach_quotation(quote(t0(), 3), t0()).unwrap();
        hiring
    }

    fn paid_hiring() -> Hiring {
        let mut hiring = quoted_hiring();
        hiring.start_checkout("pref-1", t0()).unwrap();
        hiring.confirm_payment("pay-1", t0()).unwrap();
        hiring
    }

    #[test]
    fn test_self_hire_rejected() {
        let user = UserId::new();
        assert!(Hiring::new(user, user, ServiceId::new(), t0()).is_err());
    }

    #[test]
    fn test_transition_table_has_no_exit_from_terminal_states() {
        for from in HiringStatus::ALL.iter().filter(|s| s.is_terminal()) {
            for to in HiringStatus::ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_status_text_round_trip() {
        for status in HiringStatus::ALL {
            assert_eq!(status.as_str().parse::<HiringStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_requote_boundary_at_expiry_counts_as_expired() {
        let mut hiring = quoted_hiring();
        let expires_at = hiring.current_quotation().unwrap().expires_at;

        let err = hiring
            .request_requote(3, expires_at - Duration::seconds(1))
            .unwrap_err();
        assert!(matches!(err, HiringError::QuotationNotExpired { .. }));

        assert_eq!(hiring.request_requote(3, expires_at).unwrap(), 1);
        assert_eq!(hiring.status, HiringStatus::PendingQuote);
        assert!(hiring.current_quotation().is_none());
        assert_eq!(hiring.quotations[0].status, QuotationStatus::Superseded);
    }

    #[test]
    fn test_checkout_rejects_expired_quotation() {
        let mut hiring = quoted_hiring();
        let err = hiring.start_checkout("pref", t0() + Duration::days(3)).unwrap_err();
        assert!(matches!(err, HiringError::QuotationExpired { .. }));
    }

    #[test]
    fn test_confirm_outside_payment_pending_is_invalid_transition() {
        let mut hiring = quoted_hiring();
        let err = hiring.confirm_payment("pay", t0()).unwrap_err();
        assert!(matches!(
            err,
            HiringError::InvalidTransition { from: HiringStatus::Quoted, to: HiringStatus::Paid }
        ));
    }

    #[test]
    fn test_retry_after_rejection_keeps_quotation() {
        let mut hiring = quoted_hiring();
        hiring.start_checkout("pref-1", t0()).unwrap();
        hiring.reject_payment("pay-1", t0()).unwrap();
        assert_eq!(hiring.status, HiringStatus::PaymentRejected);

        hiring.start_checkout("pref-2", t0() + Duration::days(10)).unwrap();
        assert_eq!(hiring.status, HiringStatus::PaymentPending);
        assert_eq!(hiring.quotations.len(), 1);
        assert_eq!(hiring.preference_id.as_deref(), Some("pref-2"));
    }

    #[test]
    fn test_payment_history_spans_checkout_attempts() {
        let mut hiring = quoted_hiring();
        hiring.start_checkout("pref-1", t0()).unwrap();
        hiring.reject_payment("pay-1", t0()).unwrap();
        hiring.start_checkout("pref-2", t0()).unwrap();

        assert!(hiring.has_applied_payment_event("pay-1", PaymentStatus::Rejected));
        assert!(hiring.is_stale_payment("pay-1"));
        assert!(!hiring.is_stale_payment("pay-2"));

        hiring.note_payment_pending("pay-2", t0());
        assert!(!hiring.is_stale_payment("pay-2"));
        assert_eq!(hiring.payment_history.len(), 2);
        assert_eq!(hiring.payment_history[0].preference_id.as_deref(), Some("pref-1"));
    }

    #[test]
    fn test_confirmation_of_paying_payment_stays_applied_after_reversal() {
        let mut hiring = paid_hiring();
        hiring.record_reversal("pay-1", t0());

        assert!(hiring.has_applied_payment_event("pay-1", PaymentStatus::Confirmed));
        assert!(!hiring.has_applied_payment_event("pay-2", PaymentStatus::Confirmed));
    }

    #[test]
    fn test_delivery_events_follow_their_source() {
        let mut hiring = paid_hiring();
        assert!(hiring.apply_delivery_event(DeliveryEvent::RevisionRequested, t0()).is_err());
        hiring.apply_delivery_event(DeliveryEvent::Started, t0()).unwrap();
        hiring.apply_delivery_event(DeliveryEvent::Delivered, t0()).unwrap();
        hiring.apply_delivery_event(DeliveryEvent::RevisionRequested, t0()).unwrap();
        hiring.apply_delivery_event(DeliveryEvent::Delivered, t0()).unwrap();
        hiring.apply_delivery_event(DeliveryEvent::Accepted, t0()).unwrap();
        assert_eq!(hiring.status, HiringStatus::Completed);
    }

    #[test]
    fn test_dispute_restores_pre_dispute_status() {
        let mut hiring = paid_hiring();
        hiring.apply_delivery_event(DeliveryEvent::Started, t0()).unwrap();
        hiring.open_dispute(ClaimId::new(), t0()).unwrap();
        assert_eq!(hiring.pre_dispute_status, Some(HiringStatus::InProgress));

        let restored = hiring.close_dispute(DisputeOutcome::Restore, t0()).unwrap();
        assert_eq!(restored, HiringStatus::InProgress);
        assert!(hiring.dispute_claim_id.is_none());
    }

    #[test]
    fn test_dispute_not_allowed_before_payment() {
        let mut hiring = quoted_hiring();
        let err = hiring.open_dispute(ClaimId::new(), t0()).unwrap_err();
        assert!(matches!(err, HiringError::InvalidState { .. }));
    }

    #[test]
    fn test_cancel_only_before_payment() {
        let mut hiring = quoted_hiring();
        hiring.cancel(t0()).unwrap();
        assert_eq!(hiring.status, HiringStatus::Cancelled);

        let mut paid = paid_hiring();
        assert!(paid.cancel(t0()).is_err());
    }

    #[test]
    fn test_events_are_drained() {
        let mut hiring = quoted_hiring();
        let events = hiring.take_events();
        assert_eq!(events.len(), 2);
        assert!(hiring.take_events().is_empty());
    }
}
