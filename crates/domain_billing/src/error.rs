//! Billing domain errors

use thiserror::Error;

use core_kernel::{Classify, ErrorKind, PortError};
use domain_hiring::HiringError;

/// Errors that can occur while reconciling gateway events
#[derive(Debug, Error)]
pub enum BillingError {
    /// Neither the preference nor the external reference matched a hiring
    #[error("No hiring matches payment reference: {reference}")]
    HiringNotFound { reference: String },

    /// Gateway sent a status outside the known vocabulary
    #[error("Unknown payment status from gateway: {raw}")]
    UnknownStatus { raw: String },

    /// Event is missing a field the reconciler needs
    #[error("Invalid payment event: {0}")]
    InvalidEvent(String),

    #[error(transparent)]
    Hiring(#[from] HiringError),

    #[error("Storage error: {0}")]
    Port(#[from] PortError),
}

impl Classify for BillingError {
    fn kind(&self) -> ErrorKind {
        match self {
            BillingError::HiringNotFound { .. } => ErrorKind::NotFound,
            BillingError::UnknownStatus { .. } | BillingError::InvalidEvent(_) => {
                ErrorKind::Validation
            }
            BillingError::Hiring(e) => e.kind(),
            BillingError::Port(e) => e.kind(),
        }
    }
}
