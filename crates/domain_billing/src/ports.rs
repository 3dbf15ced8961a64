//! Billing Domain Ports
//!
//! The payment audit log is append-only: one record per webhook received,
//! whatever the outcome. The PostgreSQL adapter lives in `infra_db`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{DomainPort, HealthCheckable, HiringId, PaymentEventId, PortError};

use crate::gateway::PaymentWebhookEvent;

/// One received gateway notification and what the engine did with it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAuditRecord {
    pub id: PaymentEventId,
    /// Set when the event could be matched to a hiring
    pub hiring_id: Option<HiringId>,
    pub payment_id: String,
    pub raw_status: String,
    pub external_reference: String,
    pub merchant_order_id: Option<String>,
    pub preference_id: Option<String>,
    /// Reconcile outcome or error kind, e.g. `applied` or `not_found`
    pub outcome: String,
    pub received_at: DateTime<Utc>,
}

impl PaymentAuditRecord {
    pub fn from_event(
        event: &PaymentWebhookEvent,
        hiring_id: Option<HiringId>,
        outcome: impl Into<String>,
        received_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PaymentEventId::new_v7(),
            hiring_id,
            payment_id: event.payment_id.clone(),
            raw_status: event.status.clone(),
            external_reference: event.external_reference.clone(),
            merchant_order_id: event.merchant_order_id.clone(),
            preference_id: event.preference_id.clone(),
            outcome: outcome.into(),
            received_at,
        }
    }
}

/// Append-only store of received payment events
#[async_trait]
pub trait PaymentAuditLog: DomainPort + HealthCheckable {
    async fn append(&self, record: &PaymentAuditRecord) -> Result<(), PortError>;

    /// Records for a hiring, oldest first
    async fn list_for_hiring(&self, hiring_id: HiringId) -> Result<Vec<PaymentAuditRecord>, PortError>;
}

/// Mock implementation of PaymentAuditLog for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use core_kernel::{AdapterHealth, HealthCheckResult};

    #[derive(Debug, Default, Clone)]
    pub struct MockPaymentAuditLog {
        records: Arc<RwLock<Vec<PaymentAuditRecord>>>,
    }

    impl MockPaymentAuditLog {
        pub fn new() -> Self {
            Self::default()
        }

        /// Every record appended so far
        pub async fn records(&self) -> Vec<PaymentAuditRecord> {
            self.records.read().await.clone()
        }
    }

    impl DomainPort for MockPaymentAuditLog {}

    #[async_trait]
    impl HealthCheckable for MockPaymentAuditLog {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult {
                adapter_id: "mock-payment-audit-log".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms: 0,
                message: None,
                checked_at: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl PaymentAuditLog for MockPaymentAuditLog {
        async fn append(&self, record: &PaymentAuditRecord) -> Result<(), PortError> {
            self.records.write().await.push(record.clone());
            Ok(())
        }

        async fn list_for_hiring(
            &self,
            hiring_id: HiringId,
        ) -> Result<Vec<PaymentAuditRecord>, PortError> {
            Ok(self
                .records
                .read()
                .await
                .iter()
                .filter(|r| r.hiring_id == Some(hiring_id))
                .cloned()
                .collect())
        }
    }
}
