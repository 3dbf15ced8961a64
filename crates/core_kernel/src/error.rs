//! Core error types used across the system

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::money::MoneyError;

/// Caller-facing failure classification
///
/// Every domain error maps onto exactly one kind. Transports decide how to
/// render a kind (HTTP status, CLI exit code); the domain only decides which
/// kind a failure is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or missing field given the current state
    Validation,
    /// Wrong actor for the action
    Forbidden,
    /// Operation not valid from the current status
    InvalidState,
    /// Requested transition is not reachable from the current status
    InvalidTransition,
    /// Time window has not elapsed yet
    NotExpired,
    /// Time window has already elapsed
    DeadlineExceeded,
    /// Bounded retry exhausted
    LimitReached,
    /// Bounded submission attempts exhausted
    AttemptLimitReached,
    /// Entity does not exist
    NotFound,
    /// Duplicate or concurrent modification
    Conflict,
    /// A collaborator (store, identity service) is unreachable
    Unavailable,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation_error",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::InvalidState => "invalid_state",
            ErrorKind::InvalidTransition => "invalid_transition",
            ErrorKind::NotExpired => "not_expired",
            ErrorKind::DeadlineExceeded => "deadline_exceeded",
            ErrorKind::LimitReached => "limit_reached",
            ErrorKind::AttemptLimitReached => "attempt_limit_reached",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Implemented by every domain error so callers can branch on the taxonomy
/// without matching on crate-specific variants
pub trait Classify {
    fn kind(&self) -> ErrorKind;
}

/// Core error type for the kernel
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        CoreError::Validation(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        CoreError::Configuration(message.into())
    }
}

impl Classify for CoreError {
    fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Money(_) | CoreError::Validation(_) => ErrorKind::Validation,
            CoreError::Configuration(_) => ErrorKind::Unavailable,
        }
    }
}
