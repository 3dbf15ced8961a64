//! Payment reconciliation
//!
//! Applies gateway webhook events to hirings. Gateways deliver at least
//! once and out of order, so the reconciler is idempotent on every
//! (payment id, status) pair the hiring has seen, ignores events left over
//! from an earlier checkout attempt and never moves a paid hiring backwards.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use core_kernel::{Classify, HiringId};
use domain_hiring::{Hiring, HiringContext, HiringStatus, PaymentStatus};

use crate::error::BillingError;
use crate::gateway::PaymentWebhookEvent;
use crate::ports::{PaymentAuditLog, PaymentAuditRecord};

/// What a successfully handled event did to the hiring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// Status change applied and saved
    Applied,
    /// Same payment and status as an event applied before
    AlreadyApplied,
    /// Pending or rejected after the hiring was paid; ignored
    IgnoredAfterPaid,
    /// Pending or rejected for a payment of an earlier checkout; ignored
    IgnoredStaleAttempt,
    /// Refund or chargeback recorded; status unchanged
    ReversalRecorded,
}

impl ReconcileOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcileOutcome::Applied => "applied",
            ReconcileOutcome::AlreadyApplied => "already_applied",
            ReconcileOutcome::IgnoredAfterPaid => "ignored_after_paid",
            ReconcileOutcome::IgnoredStaleAttempt => "ignored_stale_attempt",
            ReconcileOutcome::ReversalRecorded => "reversal_recorded",
        }
    }
}

impl fmt::Display for ReconcileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of reconciling one event
#[derive(Debug, Clone, Serialize)]
pub struct Reconciliation {
    pub hiring_id: HiringId,
    pub outcome: ReconcileOutcome,
    pub hiring_status: HiringStatus,
    pub payment_status: Option<PaymentStatus>,
}

pub struct PaymentReconciler {
    ctx: HiringContext,
    audit: Arc<dyn PaymentAuditLog>,
}

impl PaymentReconciler {
    pub fn new(ctx: HiringContext, audit: Arc<dyn PaymentAuditLog>) -> Self {
        Self { ctx, audit }
    }

    /// Applies one webhook event and appends it to the audit log
    ///
    /// The audit record is written for every event, including unknown
    /// statuses and unmatched references.
    #[instrument(skip(self, event), fields(payment_id = %event.payment_id, status = %event.status))]
    pub async fn reconcile(&self, event: PaymentWebhookEvent) -> Result<Reconciliation, BillingError> {
        let received_at = self.ctx.clock.now();
        let mut matched = None;
        let result = self.apply(&event, &mut matched).await;

        let outcome = match &result {
            Ok(r) => r.outcome.as_str(),
            Err(e) => e.kind().as_str(),
        };
        let record = PaymentAuditRecord::from_event(&event, matched, outcome, received_at);
        if let Err(e) = self.audit.append(&record).await {
            error!(error = %e, payment_id = %event.payment_id, "failed to append payment audit record");
        }

        result
    }

    async fn apply(
        &self,
        event: &PaymentWebhookEvent,
        matched: &mut Option<HiringId>,
    ) -> Result<Reconciliation, BillingError> {
        event.validate()?;
        let hiring_id = self.locate(event).await?;
        *matched = Some(hiring_id);

        let status = event.normalized_status().inspect_err(|_| {
            warn!(hiring_id = %hiring_id, raw_status = %event.status, "unknown gateway status");
        })?;

        let _guard = self.ctx.locks.lock(hiring_id).await;
        let mut hiring = self.ctx.load(hiring_id).await?;

        if hiring.has_applied_payment_event(&event.payment_id, status) {
            debug!(hiring_id = %hiring_id, %status, "payment event already applied");
            return Ok(summary(&hiring, ReconcileOutcome::AlreadyApplied));
        }

        let now = self.ctx.clock.now();
        let payment_id = event.payment_id.as_str();
        let outcome = match status {
            PaymentStatus::Confirmed => {
                hiring.confirm_payment(payment_id, now)?;
                ReconcileOutcome::Applied
            }
            PaymentStatus::Pending | PaymentStatus::Rejected if hiring.has_been_paid() => {
                warn!(
                    hiring_id = %hiring_id,
                    %status,
                    hiring_status = %hiring.status,
                    "ignoring payment event for an already paid hiring"
                );
                return Ok(summary(&hiring, ReconcileOutcome::IgnoredAfterPaid));
            }
            PaymentStatus::Pending | PaymentStatus::Rejected if hiring.is_stale_payment(payment_id) => {
                warn!(
                    hiring_id = %hiring_id,
                    %status,
                    preference_id = ?hiring.preference_id,
                    "ignoring payment event from an earlier checkout"
                );
                return Ok(summary(&hiring, ReconcileOutcome::IgnoredStaleAttempt));
            }
            PaymentStatus::Rejected => {
                hiring.reject_payment(payment_id, now)?;
                ReconcileOutcome::Applied
            }
            PaymentStatus::Pending => {
                hiring.note_payment_pending(payment_id, now);
                ReconcileOutcome::Applied
            }
            PaymentStatus::Reversed => {
                warn!(
                    hiring_id = %hiring_id,
                    hiring_status = %hiring.status,
                    "payment reversed by gateway"
                );
                hiring.record_reversal(payment_id, now);
                ReconcileOutcome::ReversalRecorded
            }
        };

        self.ctx.commit(&mut hiring).await?;
        info!(hiring_id = %hiring_id, %status, hiring_status = %hiring.status, "payment event reconciled");
        Ok(summary(&hiring, outcome))
    }

    /// Preference id first, then the external reference as a hiring id,
    /// then the external reference as a preference id
    async fn locate(&self, event: &PaymentWebhookEvent) -> Result<HiringId, BillingError> {
        if let Some(preference_id) = event.preference_id.as_deref().filter(|p| !p.trim().is_empty()) {
            if let Some(hiring) = self.ctx.hirings.find_by_preference(preference_id).await? {
                return Ok(hiring.id);
            }
        }

        let reference = event.external_reference.trim();
        if !reference.is_empty() {
            if let Ok(id) = reference.parse::<HiringId>() {
                match self.ctx.hirings.get(id).await {
                    Ok(hiring) => return Ok(hiring.id),
                    Err(e) if e.is_not_found() => {}
                    Err(e) => return Err(e.into()),
                }
            }
            if let Some(hiring) = self.ctx.hirings.find_by_preference(reference).await? {
                return Ok(hiring.id);
            }
        }

        let reference = event
            .preference_id
            .clone()
            .filter(|_| reference.is_empty())
            .unwrap_or_else(|| reference.to_string());
        warn!(%reference, payment_id = %event.payment_id, "payment event matches no hiring");
        Err(BillingError::HiringNotFound { reference })
    }
}

fn summary(hiring: &Hiring, outcome: ReconcileOutcome) -> Reconciliation {
    Reconciliation {
        hiring_id: hiring.id,
        outcome,
        hiring_status: hiring.status,
        payment_status: hiring.payment_status,
    }
}
