//! Hirings repository
//!
//! Tables: `hirings`, `quotations` and `quotation_deliverables`. Quotations
//! are append-only apart from their status column.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::error::DatabaseError;

#[derive(Debug, Clone, FromRow)]
pub struct HiringRow {
    pub hiring_id: Uuid,
    pub client_id: Uuid,
    pub provider_id: Uuid,
    pub service_id: Uuid,
    pub status: String,
    pub preference_id: Option<String>,
    pub payment_id: Option<String>,
    pub payment_status: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    /// Applied gateway events as a JSON array
    pub payment_history: serde_json::Value,
    pub retry_count: i32,
    pub pre_dispute_status: Option<String>,
    pub dispute_claim_id: Option<Uuid>,
    pub current_quotation_id: Option<Uuid>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct QuotationRow {
    pub quotation_id: Uuid,
    pub hiring_id: Uuid,
    pub sequence: i32,
    pub quoted_price: Decimal,
    pub currency: String,
    pub estimated_hours: Decimal,
    pub estimated_time_unit: String,
    pub notes: Option<String>,
    pub validity_days: i32,
    pub quoted_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct DeliverableRow {
    pub deliverable_id: Uuid,
    pub quotation_id: Uuid,
    pub position: i32,
    pub title: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub currency: String,
    pub estimated_date: Option<NaiveDate>,
}

const HIRING_COLUMNS: &str = "hiring_id, client_id, provider_id, service_id, status, \
    preference_id, payment_id, payment_status, paid_at, payment_history, retry_count, \
    pre_dispute_status, dispute_claim_id, current_quotation_id, version, created_at, updated_at";

const TERMINAL_STATUSES: &str = "('completed', 'resolved_completed', 'resolved_cancelled', 'cancelled')";

/// Repository for hiring rows and their quotation history
#[derive(Debug, Clone)]
pub struct HiringsRepository {
    pool: PgPool,
}

impl HiringsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn find(&self, hiring_id: Uuid) -> Result<Option<HiringRow>, DatabaseError> {
        let sql = format!("SELECT {HIRING_COLUMNS} FROM hirings WHERE hiring_id = $1");
        Ok(sqlx::query_as::<_, HiringRow>(&sql)
            .bind(hiring_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn find_by_preference(&self, preference_id: &str) -> Result<Option<HiringRow>, DatabaseError> {
        let sql = format!("SELECT {HIRING_COLUMNS} FROM hirings WHERE preference_id = $1");
        Ok(sqlx::query_as::<_, HiringRow>(&sql)
            .bind(preference_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn find_active_for(
        &self,
        client_id: Uuid,
        provider_id: Uuid,
        service_id: Uuid,
    ) -> Result<Option<HiringRow>, DatabaseError> {
        let sql = format!(
            "SELECT {HIRING_COLUMNS} FROM hirings \
             WHERE client_id = $1 AND provider_id = $2 AND service_id = $3 \
             AND status NOT IN {TERMINAL_STATUSES}"
        );
        Ok(sqlx::query_as::<_, HiringRow>(&sql)
            .bind(client_id)
            .bind(provider_id)
            .bind(service_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Quotations of a hiring, oldest first
    pub async fn quotations(&self, hiring_id: Uuid) -> Result<Vec<QuotationRow>, DatabaseError> {
        Ok(sqlx::query_as::<_, QuotationRow>(
            r#"
            SELECT quotation_id, hiring_id, sequence, quoted_price, currency, estimated_hours,
                   estimated_time_unit, notes, validity_days, quoted_at, expires_at, status
            FROM quotations
            WHERE hiring_id = $1
            ORDER BY sequence
            "#,
        )
        .bind(hiring_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Deliverables of every quotation of a hiring, in position order
    pub async fn deliverables(&self, hiring_id: Uuid) -> Result<Vec<DeliverableRow>, DatabaseError> {
        Ok(sqlx::query_as::<_, DeliverableRow>(
            r#"
            SELECT d.deliverable_id, d.quotation_id, d.position, d.title, d.description,
                   d.price, d.currency, d.estimated_date
            FROM quotation_deliverables d
            JOIN quotations q ON q.quotation_id = d.quotation_id
            WHERE q.hiring_id = $1
            ORDER BY q.sequence, d.position
            "#,
        )
        .bind(hiring_id)
        .fetch_all(&self.pool)
        .await?)
    }

    pub async fn insert(conn: &mut PgConnection, row: &HiringRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO hirings (
                hiring_id, client_id, provider_id, service_id, status, preference_id,
                payment_id, payment_status, paid_at, payment_history, retry_count,
                pre_dispute_status, dispute_claim_id, current_quotation_id, version,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(row.hiring_id)
        .bind(row.client_id)
        .bind(row.provider_id)
        .bind(row.service_id)
        .bind(&row.status)
        .bind(&row.preference_id)
        .bind(&row.payment_id)
        .bind(&row.payment_status)
        .bind(row.paid_at)
        .bind(&row.payment_history)
        .bind(row.retry_count)
        .bind(&row.pre_dispute_status)
        .bind(row.dispute_claim_id)
        .bind(row.current_quotation_id)
        .bind(row.version)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Writes every mutable column and bumps the version
    ///
    /// Returns the number of rows updated: zero when `row.version` is stale.
    pub async fn update(conn: &mut PgConnection, row: &HiringRow) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE hirings SET
                status = $3,
                preference_id = $4,
                payment_id = $5,
                payment_status = $6,
                paid_at = $7,
                payment_history = $8,
                retry_count = $9,
                pre_dispute_status = $10,
                dispute_claim_id = $11,
                current_quotation_id = $12,
                updated_at = $13,
                version = version + 1
            WHERE hiring_id = $1 AND version = $2
            "#,
        )
        .bind(row.hiring_id)
        .bind(row.version)
        .bind(&row.status)
        .bind(&row.preference_id)
        .bind(&row.payment_id)
        .bind(&row.payment_status)
        .bind(row.paid_at)
        .bind(&row.payment_history)
        .bind(row.retry_count)
        .bind(&row.pre_dispute_status)
        .bind(row.dispute_claim_id)
        .bind(row.current_quotation_id)
        .bind(row.updated_at)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Inserts a quotation, or refreshes the status of a stored one
    pub async fn upsert_quotation(conn: &mut PgConnection, row: &QuotationRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO quotations (
                quotation_id, hiring_id, sequence, quoted_price, currency, estimated_hours,
                estimated_time_unit, notes, validity_days, quoted_at, expires_at, status
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (quotation_id) DO UPDATE SET status = EXCLUDED.status
            "#,
        )
        .bind(row.quotation_id)
        .bind(row.hiring_id)
        .bind(row.sequence)
        .bind(row.quoted_price)
        .bind(&row.currency)
        .bind(row.estimated_hours)
        .bind(&row.estimated_time_unit)
        .bind(&row.notes)
        .bind(row.validity_days)
        .bind(row.quoted_at)
        .bind(row.expires_at)
        .bind(&row.status)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn insert_deliverable(conn: &mut PgConnection, row: &DeliverableRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO quotation_deliverables (
                deliverable_id, quotation_id, position, title, description, price,
                currency, estimated_date
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (deliverable_id) DO NOTHING
            "#,
        )
        .bind(row.deliverable_id)
        .bind(row.quotation_id)
        .bind(row.position)
        .bind(&row.title)
        .bind(&row.description)
        .bind(row.price)
        .bind(&row.currency)
        .bind(row.estimated_date)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn exists(&self, hiring_id: Uuid) -> Result<bool, DatabaseError> {
        Ok(sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM hirings WHERE hiring_id = $1)")
            .bind(hiring_id)
            .fetch_one(&self.pool)
            .await?)
    }
}
