//! Payment events repository
//!
//! Append-only audit of every webhook the reconciler received.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::DatabaseError;

#[derive(Debug, Clone, FromRow)]
pub struct PaymentEventRow {
    pub event_id: Uuid,
    pub hiring_id: Option<Uuid>,
    pub payment_id: String,
    pub raw_status: String,
    pub external_reference: String,
    pub merchant_order_id: Option<String>,
    pub preference_id: Option<String>,
    pub outcome: String,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PaymentEventsRepository {
    pool: PgPool,
}

impl PaymentEventsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn insert(&self, row: &PaymentEventRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO payment_events (
                event_id, hiring_id, payment_id, raw_status, external_reference,
                merchant_order_id, preference_id, outcome, received_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(row.event_id)
        .bind(row.hiring_id)
        .bind(&row.payment_id)
        .bind(&row.raw_status)
        .bind(&row.external_reference)
        .bind(&row.merchant_order_id)
        .bind(&row.preference_id)
        .bind(&row.outcome)
        .bind(row.received_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn for_hiring(&self, hiring_id: Uuid) -> Result<Vec<PaymentEventRow>, DatabaseError> {
        Ok(sqlx::query_as::<_, PaymentEventRow>(
            r#"
            SELECT event_id, hiring_id, payment_id, raw_status, external_reference,
                   merchant_order_id, preference_id, outcome, received_at
            FROM payment_events
            WHERE hiring_id = $1
            ORDER BY received_at
            "#,
        )
        .bind(hiring_id)
        .fetch_all(&self.pool)
        .await?)
    }
}
