//! Claims repository
//!
//! Tables: `claims`, `claim_compliances` and
//! `claim_compliance_submissions`. The unique index on
//! `(compliance_id, attempt_number)` backs the gap-free attempt numbering.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::error::DatabaseError;

#[derive(Debug, Clone, FromRow)]
pub struct ClaimRow {
    pub claim_id: Uuid,
    pub hiring_id: Uuid,
    pub claimant_id: Uuid,
    pub claimant_role: String,
    pub claim_type: String,
    pub other_reason: Option<String>,
    pub description: String,
    pub evidence_urls: Vec<String>,
    pub status: String,
    pub reviewer_id: Option<Uuid>,
    pub resolution_type: Option<String>,
    pub resolution_text: Option<String>,
    pub resolved_by: Option<Uuid>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ComplianceRow {
    pub compliance_id: Uuid,
    pub claim_id: Uuid,
    pub hiring_id: Uuid,
    pub responsible_user_id: Uuid,
    pub compliance_type: String,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub description: Option<String>,
    pub instructions: String,
    pub deadline_days: i32,
    pub position: i32,
    pub status: String,
    pub deadline_anchor: DateTime<Utc>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct SubmissionRow {
    pub submission_id: Uuid,
    pub compliance_id: Uuid,
    pub attempt_number: i32,
    pub status: String,
    pub submitted_by: Uuid,
    pub evidence_urls: Vec<String>,
    pub user_notes: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_by: Option<Uuid>,
    pub decision: Option<String>,
    pub review_notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub peer_reviewed_by: Option<Uuid>,
    pub peer_approved: Option<bool>,
    pub peer_review_reason: Option<String>,
    pub peer_reviewed_at: Option<DateTime<Utc>>,
}

const CLAIM_COLUMNS: &str = "claim_id, hiring_id, claimant_id, claimant_role, claim_type, \
    other_reason, description, evidence_urls, status, reviewer_id, resolution_type, \
    resolution_text, resolved_by, resolved_at, closed_at, version, created_at, updated_at";

const COMPLIANCE_COLUMNS: &str = "compliance_id, claim_id, hiring_id, responsible_user_id, \
    compliance_type, amount, currency, description, instructions, deadline_days, position, \
    status, deadline_anchor, version, created_at, updated_at";

const SUBMISSION_COLUMNS: &str = "submission_id, compliance_id, attempt_number, status, \
    submitted_by, evidence_urls, user_notes, submitted_at, reviewed_by, decision, review_notes, \
    rejection_reason, reviewed_at, peer_reviewed_by, peer_approved, peer_review_reason, \
    peer_reviewed_at";

/// Repository for claims, their compliances and submissions
#[derive(Debug, Clone)]
pub struct ClaimsRepository {
    pool: PgPool,
}

impl ClaimsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn find_claim(&self, claim_id: Uuid) -> Result<Option<ClaimRow>, DatabaseError> {
        let sql = format!("SELECT {CLAIM_COLUMNS} FROM claims WHERE claim_id = $1");
        Ok(sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(claim_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn find_active_claim(&self, hiring_id: Uuid) -> Result<Option<ClaimRow>, DatabaseError> {
        let sql = format!(
            "SELECT {CLAIM_COLUMNS} FROM claims \
             WHERE hiring_id = $1 AND status IN ('open', 'in_review')"
        );
        Ok(sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(hiring_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn claims_for_hiring(&self, hiring_id: Uuid) -> Result<Vec<ClaimRow>, DatabaseError> {
        let sql = format!("SELECT {CLAIM_COLUMNS} FROM claims WHERE hiring_id = $1 ORDER BY created_at");
        Ok(sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(hiring_id)
            .fetch_all(&self.pool)
            .await?)
    }

    /// Decided claims with no `closed_at` yet
    pub async fn unclosed_decided_claims(&self) -> Result<Vec<ClaimRow>, DatabaseError> {
        let sql = format!(
            "SELECT {CLAIM_COLUMNS} FROM claims \
             WHERE status IN ('resolved', 'rejected') AND closed_at IS NULL \
             ORDER BY created_at"
        );
        Ok(sqlx::query_as::<_, ClaimRow>(&sql).fetch_all(&self.pool).await?)
    }

    pub async fn insert_claim(conn: &mut PgConnection, row: &ClaimRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO claims (
                claim_id, hiring_id, claimant_id, claimant_role, claim_type, other_reason,
                description, evidence_urls, status, reviewer_id, resolution_type,
                resolution_text, resolved_by, resolved_at, closed_at, version, created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(row.claim_id)
        .bind(row.hiring_id)
        .bind(row.claimant_id)
        .bind(&row.claimant_role)
        .bind(&row.claim_type)
        .bind(&row.other_reason)
        .bind(&row.description)
        .bind(&row.evidence_urls)
        .bind(&row.status)
        .bind(row.reviewer_id)
        .bind(&row.resolution_type)
        .bind(&row.resolution_text)
        .bind(row.resolved_by)
        .bind(row.resolved_at)
        .bind(row.closed_at)
        .bind(row.version)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Returns the number of rows updated: zero when `row.version` is stale
    pub async fn update_claim(conn: &mut PgConnection, row: &ClaimRow) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE claims SET
                status = $3,
                reviewer_id = $4,
                resolution_type = $5,
                resolution_text = $6,
                resolved_by = $7,
                resolved_at = $8,
                closed_at = $9,
                updated_at = $10,
                version = version + 1
            WHERE claim_id = $1 AND version = $2
            "#,
        )
        .bind(row.claim_id)
        .bind(row.version)
        .bind(&row.status)
        .bind(row.reviewer_id)
        .bind(&row.resolution_type)
        .bind(&row.resolution_text)
        .bind(row.resolved_by)
        .bind(row.resolved_at)
        .bind(row.closed_at)
        .bind(row.updated_at)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn find_compliance(&self, compliance_id: Uuid) -> Result<Option<ComplianceRow>, DatabaseError> {
        let sql = format!("SELECT {COMPLIANCE_COLUMNS} FROM claim_compliances WHERE compliance_id = $1");
        Ok(sqlx::query_as::<_, ComplianceRow>(&sql)
            .bind(compliance_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn compliances_for_claim(&self, claim_id: Uuid) -> Result<Vec<ComplianceRow>, DatabaseError> {
        let sql = format!(
            "SELECT {COMPLIANCE_COLUMNS} FROM claim_compliances WHERE claim_id = $1 ORDER BY position"
        );
        Ok(sqlx::query_as::<_, ComplianceRow>(&sql)
            .bind(claim_id)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn pending_compliances(&self) -> Result<Vec<ComplianceRow>, DatabaseError> {
        let sql = format!(
            "SELECT {COMPLIANCE_COLUMNS} FROM claim_compliances \
             WHERE status = 'pending' ORDER BY deadline_anchor"
        );
        Ok(sqlx::query_as::<_, ComplianceRow>(&sql).fetch_all(&self.pool).await?)
    }

    pub async fn compliance_of_submission(&self, submission_id: Uuid) -> Result<Option<Uuid>, DatabaseError> {
        Ok(sqlx::query_scalar::<_, Uuid>(
            "SELECT compliance_id FROM claim_compliance_submissions WHERE submission_id = $1",
        )
        .bind(submission_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    /// Submissions of the given compliances, ordered by attempt
    pub async fn submissions_for(&self, compliance_ids: &[Uuid]) -> Result<Vec<SubmissionRow>, DatabaseError> {
        let sql = format!(
            "SELECT {SUBMISSION_COLUMNS} FROM claim_compliance_submissions \
             WHERE compliance_id = ANY($1) ORDER BY compliance_id, attempt_number"
        );
        Ok(sqlx::query_as::<_, SubmissionRow>(&sql)
            .bind(compliance_ids)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn insert_compliance(conn: &mut PgConnection, row: &ComplianceRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO claim_compliances (
                compliance_id, claim_id, hiring_id, responsible_user_id, compliance_type,
                amount, currency, description, instructions, deadline_days, position, status,
                deadline_anchor, version, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(row.compliance_id)
        .bind(row.claim_id)
        .bind(row.hiring_id)
        .bind(row.responsible_user_id)
        .bind(&row.compliance_type)
        .bind(row.amount)
        .bind(&row.currency)
        .bind(&row.description)
        .bind(&row.instructions)
        .bind(row.deadline_days)
        .bind(row.position)
        .bind(&row.status)
        .bind(row.deadline_anchor)
        .bind(row.version)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Returns the number of rows updated: zero when `row.version` is stale
    pub async fn update_compliance(conn: &mut PgConnection, row: &ComplianceRow) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE claim_compliances SET
                status = $3,
                deadline_anchor = $4,
                updated_at = $5,
                version = version + 1
            WHERE compliance_id = $1 AND version = $2
            "#,
        )
        .bind(row.compliance_id)
        .bind(row.version)
        .bind(&row.status)
        .bind(row.deadline_anchor)
        .bind(row.updated_at)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Appends a new attempt or records reviews on an existing one
    ///
    /// A new row reusing an attempt number fails on the unique index.
    pub async fn upsert_submission(conn: &mut PgConnection, row: &SubmissionRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO claim_compliance_submissions (
                submission_id, compliance_id, attempt_number, status, submitted_by,
                evidence_urls, user_notes, submitted_at, reviewed_by, decision, review_notes,
                rejection_reason, reviewed_at, peer_reviewed_by, peer_approved,
                peer_review_reason, peer_reviewed_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            ON CONFLICT (submission_id) DO UPDATE SET
                status = EXCLUDED.status,
                reviewed_by = EXCLUDED.reviewed_by,
                decision = EXCLUDED.decision,
                review_notes = EXCLUDED.review_notes,
                rejection_reason = EXCLUDED.rejection_reason,
                reviewed_at = EXCLUDED.reviewed_at,
                peer_reviewed_by = EXCLUDED.peer_reviewed_by,
                peer_approved = EXCLUDED.peer_approved,
                peer_review_reason = EXCLUDED.peer_review_reason,
                peer_reviewed_at = EXCLUDED.peer_reviewed_at
            "#,
        )
        .bind(row.submission_id)
        .bind(row.compliance_id)
        .bind(row.attempt_number)
        .bind(&row.status)
        .bind(row.submitted_by)
        .bind(&row.evidence_urls)
        .bind(&row.user_notes)
        .bind(row.submitted_at)
        .bind(row.reviewed_by)
        .bind(&row.decision)
        .bind(&row.review_notes)
        .bind(&row.rejection_reason)
        .bind(row.reviewed_at)
        .bind(row.peer_reviewed_by)
        .bind(row.peer_approved)
        .bind(&row.peer_review_reason)
        .bind(row.peer_reviewed_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn claim_exists(&self, claim_id: Uuid) -> Result<bool, DatabaseError> {
        Ok(sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM claims WHERE claim_id = $1)")
            .bind(claim_id)
            .fetch_one(&self.pool)
            .await?)
    }

    pub async fn compliance_exists(&self, compliance_id: Uuid) -> Result<bool, DatabaseError> {
        Ok(sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM claim_compliances WHERE compliance_id = $1)",
        )
        .bind(compliance_id)
        .fetch_one(&self.pool)
        .await?)
    }
}
