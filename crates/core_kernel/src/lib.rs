//! Core Kernel - Foundational types shared by the hiring and claims engine
//!
//! This crate provides the building blocks used across all domain crates:
//! - Money types with precise decimal arithmetic
//! - Strongly typed identifiers
//! - Clock abstraction, validity windows and deadlines
//! - The caller-facing error taxonomy and port infrastructure
//! - Keyed async locks for per-aggregate serialization
//! - Engine settings

pub mod money;
pub mod temporal;
pub mod identifiers;
pub mod error;
pub mod ports;
pub mod locks;
pub mod settings;

pub use money::{Money, Currency, MoneyError};
pub use temporal::{Clock, SystemClock, ManualClock, ValidityWindow, Deadline, TemporalError};
pub use identifiers::{
    HiringId, QuotationId, DeliverableId, ServiceId, ClaimId, ComplianceId,
    SubmissionId, UserId, PaymentEventId,
};
pub use error::{Classify, CoreError, ErrorKind};
pub use ports::{AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, PortError};
pub use locks::{KeyGuard, KeyedLocks};
pub use settings::EngineSettings;
