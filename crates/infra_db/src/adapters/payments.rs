//! PostgreSQL Payment Audit Adapter

use async_trait::async_trait;
use sqlx::PgPool;

use core_kernel::{DomainPort, HealthCheckResult, HealthCheckable, HiringId, PaymentEventId, PortError};
use domain_billing::{PaymentAuditLog, PaymentAuditRecord};

use crate::repositories::payments::{PaymentEventRow, PaymentEventsRepository};

#[derive(Debug, Clone)]
pub struct PostgresPaymentAuditAdapter {
    repository: PaymentEventsRepository,
}

impl PostgresPaymentAuditAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: PaymentEventsRepository::new(pool),
        }
    }
}

impl DomainPort for PostgresPaymentAuditAdapter {}

#[async_trait]
impl HealthCheckable for PostgresPaymentAuditAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        super::ping(self.repository.pool(), "postgres-payment-audit-adapter").await
    }
}

#[async_trait]
impl PaymentAuditLog for PostgresPaymentAuditAdapter {
    async fn append(&self, record: &PaymentAuditRecord) -> Result<(), PortError> {
        self.repository.insert(&to_row(record)).await?;
        Ok(())
    }

    async fn list_for_hiring(&self, hiring_id: HiringId) -> Result<Vec<PaymentAuditRecord>, PortError> {
        let rows = self.repository.for_hiring(*hiring_id.as_uuid()).await?;
        Ok(rows.into_iter().map(from_row).collect())
    }
}

fn to_row(record: &PaymentAuditRecord) -> PaymentEventRow {
    PaymentEventRow {
        event_id: *record.id.as_uuid(),
        hiring_id: record.hiring_id.map(|id| *id.as_uuid()),
        payment_id: record.payment_id.clone(),
        raw_status: record.raw_status.clone(),
        external_reference: record.external_reference.clone(),
        merchant_order_id: record.merchant_order_id.clone(),
        preference_id: record.preference_id.clone(),
        outcome: record.outcome.clone(),
        received_at: record.received_at,
    }
}

fn from_row(row: PaymentEventRow) -> PaymentAuditRecord {
    PaymentAuditRecord {
        id: PaymentEventId::from_uuid(row.event_id),
        hiring_id: row.hiring_id.map(HiringId::from_uuid),
        payment_id: row.payment_id,
        raw_status: row.raw_status,
        external_reference: row.external_reference,
        merchant_order_id: row.merchant_order_id,
        preference_id: row.preference_id,
        outcome: row.outcome,
        received_at: row.received_at,
    }
}
