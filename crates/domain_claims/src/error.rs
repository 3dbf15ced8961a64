//! Claims domain errors

use chrono::{DateTime, Utc};
use thiserror::Error;

use core_kernel::{
    Classify, ClaimId, ComplianceId, ErrorKind, HiringId, MoneyError, PortError, SubmissionId,
    UserId,
};
use domain_hiring::HiringError;
use domain_party::PartyError;

use crate::claim::ClaimStatus;
use crate::compliance::ComplianceStatus;

/// Errors that can occur in the claims domain
#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("Claim not found: {0}")]
    ClaimNotFound(ClaimId),

    #[error("Compliance not found: {0}")]
    ComplianceNotFound(ComplianceId),

    #[error("Submission not found: {0}")]
    SubmissionNotFound(SubmissionId),

    /// The hiring already has an open or in-review claim
    #[error("Hiring {hiring_id} already has an open claim: {claim_id}")]
    ClaimAlreadyOpen {
        hiring_id: HiringId,
        claim_id: ClaimId,
    },

    #[error("User {user_id} may not {action}")]
    Forbidden {
        user_id: UserId,
        action: &'static str,
    },

    #[error("Cannot {action} claim {claim_id} in status {status}")]
    ClaimInvalidState {
        claim_id: ClaimId,
        status: ClaimStatus,
        action: &'static str,
    },

    #[error("Cannot {action} compliance {compliance_id} in status {status}")]
    ComplianceInvalidState {
        compliance_id: ComplianceId,
        status: ComplianceStatus,
        action: &'static str,
    },

    #[error("Compliance {compliance_id} was due at {due_at}")]
    DeadlineExceeded {
        compliance_id: ComplianceId,
        due_at: DateTime<Utc>,
    },

    #[error("Compliance {compliance_id} used all {limit} submission attempts")]
    AttemptLimitReached {
        compliance_id: ComplianceId,
        limit: u32,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Hiring(#[from] HiringError),

    #[error(transparent)]
    Party(#[from] PartyError),

    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    #[error("Storage error: {0}")]
    Port(#[from] PortError),
}

impl ClaimError {
    pub fn validation(message: impl Into<String>) -> Self {
        ClaimError::Validation(message.into())
    }
}

impl Classify for ClaimError {
    fn kind(&self) -> ErrorKind {
        match self {
            ClaimError::ClaimNotFound(_)
            | ClaimError::ComplianceNotFound(_)
            | ClaimError::SubmissionNotFound(_) => ErrorKind::NotFound,
            ClaimError::ClaimAlreadyOpen { .. } => ErrorKind::Conflict,
            ClaimError::Forbidden { .. } => ErrorKind::Forbidden,
            ClaimError::ClaimInvalidState { .. } | ClaimError::ComplianceInvalidState { .. } => {
                ErrorKind::InvalidState
            }
            ClaimError::DeadlineExceeded { .. } => ErrorKind::DeadlineExceeded,
            ClaimError::AttemptLimitReached { .. } => ErrorKind::AttemptLimitReached,
            ClaimError::Validation(_) | ClaimError::Money(_) => ErrorKind::Validation,
            ClaimError::Hiring(e) => e.kind(),
            ClaimError::Party(e) => e.kind(),
            ClaimError::Port(e) => e.kind(),
        }
    }
}
