//! Domain events for the hiring aggregate
//!
//! Events are accumulated on the aggregate while it is mutated and drained
//! by the services after a successful save. They are used for:
//! - Audit trails in the structured log
//! - Event-driven integrations (notifications, analytics)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{ClaimId, HiringId, QuotationId, UserId};

use crate::hiring::{HiringStatus, PaymentStatus};

/// Domain events emitted by the Hiring aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HiringEvent {
    HiringCreated {
        hiring_id: HiringId,
        client_id: UserId,
        provider_id: UserId,
        timestamp: DateTime<Utc>,
    },

    QuotationIssued {
        hiring_id: HiringId,
        quotation_id: QuotationId,
        expires_at: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    },

    RequoteRequested {
        hiring_id: HiringId,
        superseded_quotation_id: QuotationId,
        retry_count: u32,
        timestamp: DateTime<Utc>,
    },

    CheckoutStarted {
        hiring_id: HiringId,
        preference_id: String,
        timestamp: DateTime<Utc>,
    },

    /// The gateway reported a payment status change
    PaymentStatusChanged {
        hiring_id: HiringId,
        payment_id: String,
        payment_status: PaymentStatus,
        timestamp: DateTime<Utc>,
    },

    /// Any status change not covered by a more specific event
    StatusChanged {
        hiring_id: HiringId,
        from: HiringStatus,
        to: HiringStatus,
        timestamp: DateTime<Utc>,
    },

    DisputeOpened {
        hiring_id: HiringId,
        claim_id: ClaimId,
        pre_dispute_status: HiringStatus,
        timestamp: DateTime<Utc>,
    },

    DisputeClosed {
        hiring_id: HiringId,
        claim_id: Option<ClaimId>,
        outcome_status: HiringStatus,
        timestamp: DateTime<Utc>,
    },
}

impl HiringEvent {
    /// Short name used as the `event` field in logs
    pub fn name(&self) -> &'static str {
        match self {
            HiringEvent::HiringCreated { .. } => "hiring_created",
            HiringEvent::QuotationIssued { .. } => "quotation_issued",
            HiringEvent::RequoteRequested { .. } => "requote_requested",
            HiringEvent::CheckoutStarted { .. } => "checkout_started",
            HiringEvent::PaymentStatusChanged { .. } => "payment_status_changed",
            HiringEvent::StatusChanged { .. } => "status_changed",
            HiringEvent::DisputeOpened { .. } => "dispute_opened",
            HiringEvent::DisputeClosed { .. } => "dispute_closed",
        }
    }

    /// The hiring the event belongs to
    pub fn hiring_id(&self) -> HiringId {
        match self {
            HiringEvent::HiringCreated { hiring_id, .. }
            | HiringEvent::QuotationIssued { hiring_id, .. }
            | HiringEvent::RequoteRequested { hiring_id, .. }
            | HiringEvent::CheckoutStarted { hiring_id, .. }
            | HiringEvent::PaymentStatusChanged { hiring_id, .. }
            | HiringEvent::StatusChanged { hiring_id, .. }
            | HiringEvent::DisputeOpened { hiring_id, .. }
            | HiringEvent::DisputeClosed { hiring_id, .. } => *hiring_id,
        }
    }
}

/// Writes drained events to the structured log
pub fn publish(events: Vec<HiringEvent>) {
    for event in events {
        tracing::info!(
            hiring_id = %event.hiring_id(),
            event = event.name(),
            detail = ?event,
            "hiring event"
        );
    }
}
