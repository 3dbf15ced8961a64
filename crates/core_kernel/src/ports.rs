//! Ports and Adapters Infrastructure
//!
//! Shared building blocks for the hexagonal layout used by every domain
//! crate. Each domain declares its own port traits (hiring store, claim
//! store, identity lookup, payment audit log) that extend the marker traits
//! here; `infra_db` supplies PostgreSQL adapters and each domain ships an
//! in-memory adapter behind its `mock` feature.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │   Domain services (negotiator, reconciler,   │
//! │   claim engine, compliance tracker)          │
//! └──────────────────────────────────────────────┘
//!                      │
//!                      ▼
//! ┌──────────────────────────────────────────────┐
//! │  Port traits (HiringRepository, ...)         │
//! └──────────────────────────────────────────────┘
//!           ▲                         ▲
//!  ┌────────┴────────┐       ┌────────┴────────┐
//!  │ PostgreSQL      │       │ In-memory mock  │
//!  │ (infra_db)      │       │ (feature mock)  │
//!  └─────────────────┘       └─────────────────┘
//! ```

use std::fmt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{Classify, ErrorKind};

/// Error type for port operations
///
/// Provides a unified error type that all port implementations must use,
/// ensuring consistent error handling across adapters.
#[derive(Debug, Error)]
pub enum PortError {
    /// The requested entity was not found
    #[error("Not found: {entity_type} with id {id}")]
    NotFound {
        entity_type: String,
        id: String,
    },

    /// A validation error occurred
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// The operation conflicts with existing data (duplicate key, stale version)
    #[error("Conflict: {message}")]
    Conflict {
        message: String,
    },

    /// Connection to the underlying system failed
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The external system is unavailable
    #[error("Service unavailable: {service}")]
    ServiceUnavailable {
        service: String,
    },

    /// A stored value could not be mapped back to a domain type
    #[error("Transformation error: {message}")]
    Transformation {
        message: String,
    },

    /// An internal error occurred
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl PortError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Creates a Conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        PortError::Conflict {
            message: message.into(),
        }
    }

    /// Creates a stale-version conflict for an aggregate
    pub fn stale_version(entity_type: &str, id: impl fmt::Display, expected: u32) -> Self {
        PortError::Conflict {
            message: format!(
                "{} {} was modified concurrently (expected version {})",
                entity_type, id, expected
            ),
        }
    }

    /// Creates a Connection error
    pub fn connection(message: impl Into<String>) -> Self {
        PortError::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a Transformation error
    pub fn transformation(message: impl Into<String>) -> Self {
        PortError::Transformation {
            message: message.into(),
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        PortError::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Returns true if this error indicates a transient failure that may succeed on retry
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PortError::Connection { .. } | PortError::ServiceUnavailable { .. }
        )
    }

    /// Returns true if this error indicates the entity was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }

    /// Returns true if this error is a duplicate or stale-version conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, PortError::Conflict { .. })
    }
}

impl Classify for PortError {
    fn kind(&self) -> ErrorKind {
        match self {
            PortError::NotFound { .. } => ErrorKind::NotFound,
            PortError::Validation { .. } => ErrorKind::Validation,
            PortError::Conflict { .. } => ErrorKind::Conflict,
            PortError::Connection { .. }
            | PortError::ServiceUnavailable { .. }
            | PortError::Transformation { .. }
            | PortError::Internal { .. } => ErrorKind::Unavailable,
        }
    }
}

/// Marker trait for all domain ports
///
/// All port traits extend this marker so they are thread-safe and usable
/// behind `Arc<dyn ...>` in async services.
pub trait DomainPort: Send + Sync + 'static {}

/// Health status for an adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterHealth {
    /// Adapter is healthy and operational
    Healthy,
    /// Adapter is degraded but operational
    Degraded,
    /// Adapter is unhealthy and not operational
    Unhealthy,
}

/// Health check result for an adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    /// Adapter identifier
    pub adapter_id: String,
    /// Current health status
    pub status: AdapterHealth,
    /// Latency of the health check in milliseconds
    pub latency_ms: u64,
    /// Optional message with additional details
    pub message: Option<String>,
    /// Timestamp of the health check
    pub checked_at: chrono::DateTime<chrono::Utc>,
}

/// Trait for adapters that support health checks
#[async_trait::async_trait]
pub trait HealthCheckable: Send + Sync {
    /// Performs a health check on the adapter
    async fn health_check(&self) -> HealthCheckResult;
}
