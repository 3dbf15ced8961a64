//! Billing Domain - Payment Reconciliation
//!
//! This crate turns payment gateway webhooks into hiring transitions and
//! keeps an append-only audit trail of every event received.
//!
//! # Status Mapping
//!
//! | Gateway status                                       | Normalised  |
//! |------------------------------------------------------|-------------|
//! | `approved`, `accredited`                             | confirmed   |
//! | `pending`, `in_process`, `authorized`, `in_mediation` | pending     |
//! | `rejected`, `cancelled`                              | rejected    |
//! | `refunded`, `charged_back`                           | reversed    |
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_billing::{PaymentReconciler, PaymentWebhookEvent};
//!
//! let reconciler = PaymentReconciler::new(ctx, audit_log);
//! let event = PaymentWebhookEvent::new("991", "approved", hiring_id.to_string());
//! let result = reconciler.reconcile(event).await?;
//! ```

pub mod gateway;
pub mod reconciler;
pub mod ports;
pub mod error;

pub use gateway::{normalize_status, PaymentWebhookEvent};
pub use reconciler::{PaymentReconciler, ReconcileOutcome, Reconciliation};
pub use ports::{PaymentAuditLog, PaymentAuditRecord};
#[cfg(any(test, feature = "mock"))]
pub use ports::mock::MockPaymentAuditLog;
pub use error::BillingError;
