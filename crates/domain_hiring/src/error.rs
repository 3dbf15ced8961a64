//! Hiring domain errors
//!
//! Every failure carries the ids, current status and limits a caller needs
//! to render an actionable message.

use chrono::{DateTime, Utc};
use thiserror::Error;

use core_kernel::{
    Classify, ErrorKind, HiringId, MoneyError, PortError, QuotationId, ServiceId,
    TemporalError, UserId,
};
use domain_party::PartyError;

use crate::hiring::HiringStatus;

/// Errors that can occur in the hiring domain
#[derive(Debug, Error)]
pub enum HiringError {
    /// Hiring does not exist
    #[error("Hiring not found: {0}")]
    NotFound(HiringId),

    /// Caller is not the party allowed to perform the action
    #[error("User {user_id} may not {action} on hiring {hiring_id}")]
    Forbidden {
        hiring_id: HiringId,
        user_id: UserId,
        action: &'static str,
    },

    /// Operation not valid from the current status
    #[error("Cannot {action} hiring {hiring_id} in status {status}: {reason}")]
    InvalidState {
        hiring_id: HiringId,
        status: HiringStatus,
        action: &'static str,
        reason: String,
    },

    /// Requested transition is not in the lifecycle table
    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition {
        from: HiringStatus,
        to: HiringStatus,
    },

    /// Re-quote requested while the quotation is still valid
    #[error("Quotation {quotation_id} is valid until {expires_at}")]
    QuotationNotExpired {
        quotation_id: QuotationId,
        expires_at: DateTime<Utc>,
    },

    /// Checkout attempted on a quotation past its window
    #[error("Quotation {quotation_id} expired at {expired_at}")]
    QuotationExpired {
        quotation_id: QuotationId,
        expired_at: DateTime<Utc>,
    },

    /// Re-quote counter is exhausted; the hiring has to be cancelled
    #[error("Hiring {hiring_id} reached the re-quote limit of {limit}")]
    RequoteLimitReached {
        hiring_id: HiringId,
        limit: u32,
    },

    /// Another non-terminal hiring already covers the same engagement
    #[error("Client {client_id} already has an active hiring with {provider_id} for {service_id}")]
    DuplicateActiveHiring {
        client_id: UserId,
        provider_id: UserId,
        service_id: ServiceId,
    },

    /// Malformed or missing input
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Party(#[from] PartyError),

    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    #[error("Time error: {0}")]
    Temporal(#[from] TemporalError),

    #[error("Storage error: {0}")]
    Port(#[from] PortError),
}

impl HiringError {
    /// Creates a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        HiringError::Validation(message.into())
    }

    /// Maps a missing-row port error onto `NotFound` for this hiring
    pub fn from_lookup(id: HiringId, error: PortError) -> Self {
        if error.is_not_found() {
            HiringError::NotFound(id)
        } else {
            HiringError::Port(error)
        }
    }
}

impl Classify for HiringError {
    fn kind(&self) -> ErrorKind {
        match self {
            HiringError::NotFound(_) => ErrorKind::NotFound,
            HiringError::Forbidden { .. } => ErrorKind::Forbidden,
            HiringError::InvalidState { .. } => ErrorKind::InvalidState,
            HiringError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            HiringError::QuotationNotExpired { .. } => ErrorKind::NotExpired,
            HiringError::QuotationExpired { .. } => ErrorKind::DeadlineExceeded,
            HiringError::RequoteLimitReached { .. } => ErrorKind::LimitReached,
            HiringError::DuplicateActiveHiring { .. } => ErrorKind::Conflict,
            HiringError::Validation(_)
            | HiringError::Money(_)
            | HiringError::Temporal(_) => ErrorKind::Validation,
            HiringError::Party(e) => e.kind(),
            HiringError::Port(e) => e.kind(),
        }
    }
}
