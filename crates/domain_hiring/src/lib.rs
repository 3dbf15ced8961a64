//! Hiring Lifecycle Domain
//!
//! This crate implements the engagement lifecycle between a client and a
//! provider: quotation, re-quote, checkout, payment outcome, delivery and
//! the dispute hooks used by the claims domain.
//!
//! # Architecture
//!
//! - **Aggregate**: `Hiring` owns its quotation history and the lifecycle
//!   table (`HiringStatus::can_transition_to`)
//! - **Value Objects**: `Quotation`, `Deliverable`, `QuoteTerms`
//! - **Domain Services**: `QuotationNegotiator`, `HiringService`
//! - **Domain Events**: `HiringEvent`, published to the structured log
//!
//! # Hiring Lifecycle
//!
//! ```text
//! PendingQuote -> Quoted -> PaymentPending -> Paid -> InProgress -> Delivered -> Completed
//!                              \-> PaymentRejected -> PaymentPending
//! Paid | InProgress | Delivered -> Disputed -> (restored) | ResolvedCompleted | ResolvedCancelled
//! PendingQuote | Quoted | PaymentRejected -> Cancelled
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! let negotiator = QuotationNegotiator::new(ctx.clone());
//! let hiring = negotiator.create_quotation(hiring_id, &provider, terms).await?;
//! assert_eq!(hiring.status, HiringStatus::Quoted);
//! ```

pub mod hiring;
pub mod quotation;
pub mod events;
pub mod error;
pub mod ports;
pub mod services;
pub mod negotiator;

pub use hiring::{AppliedPayment, DeliveryEvent, DisputeOutcome, Hiring, HiringStatus, PaymentStatus};
pub use quotation::{
    Deliverable, DeliverableTerms, QuoteTerms, Quotation, QuotationStatus, TimeUnit,
};
pub use events::HiringEvent;
pub use error::HiringError;
pub use ports::HiringRepository;
#[cfg(any(test, feature = "mock"))]
pub use ports::mock::MockHiringRepository;
pub use services::{HiringContext, HiringService};
pub use negotiator::QuotationNegotiator;
