//! Domain events for claims and compliances

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{ClaimId, ComplianceId, HiringId, SubmissionId, UserId};
use domain_hiring::DisputeOutcome;

use crate::claim::Verdict;
use crate::compliance::ComplianceStatus;
use crate::submission::SubmissionStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClaimEvent {
    ClaimFiled {
        claim_id: ClaimId,
        hiring_id: HiringId,
        claimant_id: UserId,
        claim_type: String,
        timestamp: DateTime<Utc>,
    },

    ReviewStarted {
        claim_id: ClaimId,
        moderator_id: UserId,
        timestamp: DateTime<Utc>,
    },

    ClaimResolved {
        claim_id: ClaimId,
        hiring_id: HiringId,
        verdict: Verdict,
        compliance_count: usize,
        timestamp: DateTime<Utc>,
    },

    SubmissionReceived {
        claim_id: ClaimId,
        compliance_id: ComplianceId,
        submission_id: SubmissionId,
        attempt_number: u32,
        timestamp: DateTime<Utc>,
    },

    SubmissionReviewed {
        claim_id: ClaimId,
        compliance_id: ComplianceId,
        submission_id: SubmissionId,
        submission_status: SubmissionStatus,
        compliance_status: ComplianceStatus,
        timestamp: DateTime<Utc>,
    },

    ComplianceAbandoned {
        claim_id: ClaimId,
        compliance_id: ComplianceId,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    ClaimClosed {
        claim_id: ClaimId,
        hiring_id: HiringId,
        outcome: DisputeOutcome,
        timestamp: DateTime<Utc>,
    },
}

impl ClaimEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ClaimEvent::ClaimFiled { .. } => "claim_filed",
            ClaimEvent::ReviewStarted { .. } => "review_started",
            ClaimEvent::ClaimResolved { .. } => "claim_resolved",
            ClaimEvent::SubmissionReceived { .. } => "submission_received",
            ClaimEvent::SubmissionReviewed { .. } => "submission_reviewed",
            ClaimEvent::ComplianceAbandoned { .. } => "compliance_abandoned",
            ClaimEvent::ClaimClosed { .. } => "claim_closed",
        }
    }

    pub fn claim_id(&self) -> ClaimId {
        match self {
            ClaimEvent::ClaimFiled { claim_id, .. }
            | ClaimEvent::ReviewStarted { claim_id, .. }
            | ClaimEvent::ClaimResolved { claim_id, .. }
            | ClaimEvent::SubmissionReceived { claim_id, .. }
            | ClaimEvent::SubmissionReviewed { claim_id, .. }
            | ClaimEvent::ComplianceAbandoned { claim_id, .. }
            | ClaimEvent::ClaimClosed { claim_id, .. } => *claim_id,
        }
    }
}

/// Writes drained events to the structured log
pub fn publish(events: Vec<ClaimEvent>) {
    for event in events {
        tracing::info!(
            claim_id = %event.claim_id(),
            event = event.name(),
            detail = ?event,
            "claim event"
        );
    }
}
