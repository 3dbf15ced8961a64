//! PostgreSQL Claim Adapter
//!
//! Implements `ClaimRepository`. Compliances are always returned with their
//! full submission history. Saving a compliance upserts every submission it
//! holds; reusing an attempt number trips the unique index and surfaces as
//! `PortError::Conflict`.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use core_kernel::{
    ClaimId, ComplianceId, DomainPort, HealthCheckResult, HealthCheckable, HiringId, Money,
    PortError, SubmissionId, UserId,
};
use domain_claims::{
    Claim, ClaimCompliance, ClaimFiling, ClaimRepository, ClaimStatus, ClaimType,
    ComplianceRequest, ComplianceSubmission, ComplianceType, ModeratorReview, PeerReview,
    Resolution, ReviewDecision, Verdict,
};
use domain_party::PartyRole;

use crate::error::DatabaseError;
use crate::repositories::claims::{ClaimRow, ClaimsRepository, ComplianceRow, SubmissionRow};
use crate::repositories::{parse_column, unsigned};

#[derive(Debug, Clone)]
pub struct PostgresClaimAdapter {
    repository: ClaimsRepository,
}

impl PostgresClaimAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: ClaimsRepository::new(pool),
        }
    }

    pub fn repository(&self) -> &ClaimsRepository {
        &self.repository
    }

    async fn with_submissions(&self, rows: Vec<ComplianceRow>) -> Result<Vec<ClaimCompliance>, DatabaseError> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.compliance_id).collect();
        let submissions = self.repository.submissions_for(&ids).await?;
        rows.into_iter()
            .map(|row| {
                let own: Vec<&SubmissionRow> = submissions
                    .iter()
                    .filter(|s| s.compliance_id == row.compliance_id)
                    .collect();
                row_to_compliance(row, &own)
            })
            .collect()
    }

    async fn stale_or_missing_claim(&self, claim: &Claim) -> DatabaseError {
        match self.repository.claim_exists(*claim.id.as_uuid()).await {
            Ok(true) => DatabaseError::stale("Claim", claim.id, claim.version),
            Ok(false) => DatabaseError::not_found("Claim", claim.id),
            Err(e) => e,
        }
    }
}

impl DomainPort for PostgresClaimAdapter {}

#[async_trait]
impl HealthCheckable for PostgresClaimAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        super::ping(self.repository.pool(), "postgres-claim-adapter").await
    }
}

#[async_trait]
impl ClaimRepository for PostgresClaimAdapter {
    async fn get_claim(&self, id: ClaimId) -> Result<Claim, PortError> {
        let row = self
            .repository
            .find_claim(*id.as_uuid())
            .await?
            .ok_or_else(|| DatabaseError::not_found("Claim", id))?;
        Ok(row_to_claim(row)?)
    }

    async fn find_active_for_hiring(&self, hiring_id: HiringId) -> Result<Option<Claim>, PortError> {
        match self.repository.find_active_claim(*hiring_id.as_uuid()).await? {
            Some(row) => Ok(Some(row_to_claim(row)?)),
            None => Ok(None),
        }
    }

    async fn list_for_hiring(&self, hiring_id: HiringId) -> Result<Vec<Claim>, PortError> {
        let rows = self.repository.claims_for_hiring(*hiring_id.as_uuid()).await?;
        Ok(rows.into_iter().map(row_to_claim).collect::<Result<_, _>>()?)
    }

    async fn list_awaiting_closure(&self) -> Result<Vec<Claim>, PortError> {
        let rows = self.repository.unclosed_decided_claims().await?;
        Ok(rows.into_iter().map(row_to_claim).collect::<Result<_, _>>()?)
    }

    #[instrument(skip(self, claim), fields(claim_id = %claim.id, hiring_id = %claim.hiring_id))]
    async fn insert_claim(&self, claim: &Claim) -> Result<(), PortError> {
        let mut conn = self.repository.pool().acquire().await.map_err(DatabaseError::from)?;
        ClaimsRepository::insert_claim(&mut conn, &claim_row(claim)).await?;
        Ok(())
    }

    #[instrument(skip(self, claim), fields(claim_id = %claim.id, version = claim.version))]
    async fn save_claim(&self, claim: &mut Claim) -> Result<(), PortError> {
        let mut conn = self.repository.pool().acquire().await.map_err(DatabaseError::from)?;
        if ClaimsRepository::update_claim(&mut conn, &claim_row(claim)).await? == 0 {
            return Err(self.stale_or_missing_claim(claim).await.into());
        }
        claim.version += 1;
        Ok(())
    }

    #[instrument(skip(self, claim, compliances), fields(claim_id = %claim.id, count = compliances.len()))]
    async fn save_resolution(
        &self,
        claim: &mut Claim,
        compliances: &[ClaimCompliance],
    ) -> Result<(), PortError> {
        let mut tx = self.repository.pool().begin().await.map_err(DatabaseError::from)?;
        if ClaimsRepository::update_claim(&mut *tx, &claim_row(claim)).await? == 0 {
            tx.rollback().await.map_err(DatabaseError::from)?;
            return Err(self.stale_or_missing_claim(claim).await.into());
        }
        for compliance in compliances {
            ClaimsRepository::insert_compliance(&mut *tx, &compliance_row(compliance)).await?;
        }
        tx.commit().await.map_err(DatabaseError::from)?;
        claim.version += 1;
        Ok(())
    }

    async fn list_compliances(&self, claim_id: ClaimId) -> Result<Vec<ClaimCompliance>, PortError> {
        let rows = self.repository.compliances_for_claim(*claim_id.as_uuid()).await?;
        Ok(self.with_submissions(rows).await?)
    }

    async fn get_compliance(&self, id: ComplianceId) -> Result<ClaimCompliance, PortError> {
        let row = self
            .repository
            .find_compliance(*id.as_uuid())
            .await?
            .ok_or_else(|| DatabaseError::not_found("ClaimCompliance", id))?;
        let mut loaded = self.with_submissions(vec![row]).await?;
        loaded
            .pop()
            .ok_or_else(|| DatabaseError::not_found("ClaimCompliance", id).into())
    }

    async fn find_compliance_by_submission(
        &self,
        submission_id: SubmissionId,
    ) -> Result<ClaimCompliance, PortError> {
        let compliance_id = self
            .repository
            .compliance_of_submission(*submission_id.as_uuid())
            .await?
            .ok_or_else(|| DatabaseError::not_found("ComplianceSubmission", submission_id))?;
        self.get_compliance(ComplianceId::from_uuid(compliance_id)).await
    }

    async fn list_pending_compliances(&self) -> Result<Vec<ClaimCompliance>, PortError> {
        let rows = self.repository.pending_compliances().await?;
        Ok(self.with_submissions(rows).await?)
    }

    #[instrument(skip(self, compliance), fields(compliance_id = %compliance.id, version = compliance.version))]
    async fn save_compliance(&self, compliance: &mut ClaimCompliance) -> Result<(), PortError> {
        let mut tx = self.repository.pool().begin().await.map_err(DatabaseError::from)?;
        if ClaimsRepository::update_compliance(&mut *tx, &compliance_row(compliance)).await? == 0 {
            tx.rollback().await.map_err(DatabaseError::from)?;
            let exists = self.repository.compliance_exists(*compliance.id.as_uuid()).await?;
            return Err(if exists {
                DatabaseError::stale("ClaimCompliance", compliance.id, compliance.version)
            } else {
                DatabaseError::not_found("ClaimCompliance", compliance.id)
            }
            .into());
        }
        for submission in &compliance.submissions {
            ClaimsRepository::upsert_submission(&mut *tx, &submission_row(submission)).await?;
        }
        tx.commit().await.map_err(DatabaseError::from)?;
        compliance.version += 1;
        Ok(())
    }
}

fn role_str(role: PartyRole) -> &'static str {
    match role {
        PartyRole::Client => "client",
        PartyRole::Provider => "provider",
    }
}

fn parse_role(value: &str) -> Result<PartyRole, DatabaseError> {
    match value {
        "client" => Ok(PartyRole::Client),
        "provider" => Ok(PartyRole::Provider),
        other => Err(DatabaseError::corrupt(format!("column claims.claimant_role: {other}"))),
    }
}

fn claim_row(claim: &Claim) -> ClaimRow {
    let resolution = claim.resolution.as_ref();
    ClaimRow {
        claim_id: *claim.id.as_uuid(),
        hiring_id: *claim.hiring_id.as_uuid(),
        claimant_id: *claim.claimant_id.as_uuid(),
        claimant_role: role_str(claim.claim_type.role()).to_string(),
        claim_type: claim.claim_type.code().to_string(),
        other_reason: claim.claim_type.other_reason().map(str::to_string),
        description: claim.description.clone(),
        evidence_urls: claim.evidence_urls.clone(),
        status: claim.status.as_str().to_string(),
        reviewer_id: claim.reviewer_id.map(|id| *id.as_uuid()),
        resolution_type: resolution
            .and_then(|r| r.verdict.resolution_type())
            .map(|t| t.as_str().to_string()),
        resolution_text: resolution.map(|r| r.text.clone()),
        resolved_by: resolution.map(|r| *r.moderator_id.as_uuid()),
        resolved_at: resolution.map(|r| r.resolved_at),
        closed_at: claim.closed_at,
        version: claim.version as i32,
        created_at: claim.created_at,
        updated_at: claim.updated_at,
    }
}

fn row_to_claim(row: ClaimRow) -> Result<Claim, DatabaseError> {
    let corrupt = |e: domain_claims::ClaimError| DatabaseError::corrupt(format!("claim {}: {e}", row.claim_id));

    let role = parse_role(&row.claimant_role)?;
    let claim_type = ClaimType::from_parts(role, &row.claim_type, row.other_reason.clone()).map_err(corrupt)?;
    let status: ClaimStatus = parse_column("claims.status", &row.status)?;

    let resolution = match (row.resolved_by, row.resolved_at) {
        (Some(moderator), Some(resolved_at)) => {
            let resolution_type = row
                .resolution_type
                .as_deref()
                .map(|t| parse_column("claims.resolution_type", t))
                .transpose()?;
            Some(Resolution {
                verdict: Verdict::from_parts(status, resolution_type).map_err(corrupt)?,
                text: row.resolution_text.clone().unwrap_or_default(),
                moderator_id: UserId::from_uuid(moderator),
                resolved_at,
            })
        }
        _ => None,
    };

    let filing = ClaimFiling {
        claim_type,
        description: row.description.clone(),
        evidence_urls: row.evidence_urls.clone(),
    };
    let mut claim = Claim::file(
        HiringId::from_uuid(row.hiring_id),
        UserId::from_uuid(row.claimant_id),
        filing,
        usize::MAX,
        row.created_at,
    )
    .map_err(corrupt)?;
    claim.take_events();

    claim.id = ClaimId::from_uuid(row.claim_id);
    claim.status = status;
    claim.reviewer_id = row.reviewer_id.map(UserId::from_uuid);
    claim.resolution = resolution;
    claim.closed_at = row.closed_at;
    claim.version = unsigned("claims.version", row.version)?;
    claim.updated_at = row.updated_at;
    Ok(claim)
}

fn compliance_row(compliance: &ClaimCompliance) -> ComplianceRow {
    let amount = compliance.compliance_type.amount();
    ComplianceRow {
        compliance_id: *compliance.id.as_uuid(),
        claim_id: *compliance.claim_id.as_uuid(),
        hiring_id: *compliance.hiring_id.as_uuid(),
        responsible_user_id: *compliance.responsible_user_id.as_uuid(),
        compliance_type: compliance.compliance_type.code().to_string(),
        amount: amount.map(|m| m.amount()),
        currency: amount.map(|m| m.currency().code().to_string()),
        description: compliance.compliance_type.description().map(str::to_string),
        instructions: compliance.instructions.clone(),
        deadline_days: compliance.deadline_days as i32,
        position: compliance.order as i32,
        status: compliance.status.as_str().to_string(),
        deadline_anchor: compliance.deadline_anchor,
        version: compliance.version as i32,
        created_at: compliance.created_at,
        updated_at: compliance.updated_at,
    }
}

fn row_to_compliance(row: ComplianceRow, submissions: &[&SubmissionRow]) -> Result<ClaimCompliance, DatabaseError> {
    let corrupt =
        |e: domain_claims::ClaimError| DatabaseError::corrupt(format!("compliance {}: {e}", row.compliance_id));

    let amount = match (row.amount, row.currency.as_deref()) {
        (Some(amount), Some(currency)) => Some(Money::new(amount, parse_column("claim_compliances.currency", currency)?)),
        _ => None,
    };
    let compliance_type =
        ComplianceType::from_parts(&row.compliance_type, amount, row.description.clone()).map_err(corrupt)?;
    let request = ComplianceRequest {
        responsible_user_id: UserId::from_uuid(row.responsible_user_id),
        compliance_type,
        instructions: row.instructions.clone(),
        deadline_days: unsigned("claim_compliances.deadline_days", row.deadline_days)?,
    };
    let mut compliance = ClaimCompliance::new(
        ClaimId::from_uuid(row.claim_id),
        HiringId::from_uuid(row.hiring_id),
        unsigned("claim_compliances.position", row.position)?,
        request,
        row.created_at,
    )
    .map_err(corrupt)?;
    compliance.take_events();

    compliance.id = ComplianceId::from_uuid(row.compliance_id);
    compliance.status = parse_column("claim_compliances.status", &row.status)?;
    compliance.deadline_anchor = row.deadline_anchor;
    compliance.version = unsigned("claim_compliances.version", row.version)?;
    compliance.updated_at = row.updated_at;
    compliance.submissions = submissions
        .iter()
        .map(|s| row_to_submission(s))
        .collect::<Result<_, _>>()?;
    Ok(compliance)
}

fn submission_row(submission: &ComplianceSubmission) -> SubmissionRow {
    let review = submission.review.as_ref();
    let peer = submission.peer_review.as_ref();
    SubmissionRow {
        submission_id: *submission.id.as_uuid(),
        compliance_id: *submission.compliance_id.as_uuid(),
        attempt_number: submission.attempt_number as i32,
        status: submission.status.as_str().to_string(),
        submitted_by: *submission.submitted_by.as_uuid(),
        evidence_urls: submission.evidence_urls.clone(),
        user_notes: submission.user_notes.clone(),
        submitted_at: submission.submitted_at,
        reviewed_by: review.map(|r| *r.reviewed_by.as_uuid()),
        decision: review.map(|r| r.decision.as_str().to_string()),
        review_notes: review.and_then(|r| r.notes.clone()),
        rejection_reason: review.and_then(|r| r.decision.rejection_reason().map(str::to_string)),
        reviewed_at: review.map(|r| r.reviewed_at),
        peer_reviewed_by: peer.map(|p| *p.peer_reviewed_by.as_uuid()),
        peer_approved: peer.map(|p| p.peer_approved),
        peer_review_reason: peer.and_then(|p| p.peer_review_reason.clone()),
        peer_reviewed_at: peer.map(|p| p.peer_reviewed_at),
    }
}

fn row_to_submission(row: &SubmissionRow) -> Result<ComplianceSubmission, DatabaseError> {
    let review = match (row.reviewed_by, row.decision.as_deref(), row.reviewed_at) {
        (Some(reviewed_by), Some(decision), Some(reviewed_at)) => Some(ModeratorReview {
            reviewed_by: UserId::from_uuid(reviewed_by),
            decision: ReviewDecision::from_parts(decision, row.rejection_reason.clone()).map_err(|e| {
                DatabaseError::corrupt(format!("submission {}: {e}", row.submission_id))
            })?,
            notes: row.review_notes.clone(),
            reviewed_at,
        }),
        _ => None,
    };
    let peer_review = match (row.peer_reviewed_by, row.peer_reviewed_at) {
        (Some(by), Some(at)) => Some(PeerReview {
            peer_reviewed_by: UserId::from_uuid(by),
            peer_approved: row.peer_approved.unwrap_or(false),
            peer_review_reason: row.peer_review_reason.clone(),
            peer_reviewed_at: at,
        }),
        _ => None,
    };

    Ok(ComplianceSubmission {
        id: SubmissionId::from_uuid(row.submission_id),
        compliance_id: ComplianceId::from_uuid(row.compliance_id),
        attempt_number: unsigned("claim_compliance_submissions.attempt_number", row.attempt_number)?,
        status: parse_column("claim_compliance_submissions.status", &row.status)?,
        submitted_by: UserId::from_uuid(row.submitted_by),
        evidence_urls: row.evidence_urls.clone(),
        user_notes: row.user_notes.clone(),
        submitted_at: row.submitted_at,
        review,
        peer_review,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use core_kernel::Currency;
    use domain_claims::{ClientClaimType, ResolutionType};
    use rust_decimal_macros::dec;

    #[test]
    fn test_resolved_claim_survives_rows() {
        let now = Utc.with_ymd_and_hms(2025, 5, 20, 16, 0, 0).unwrap();
        let mut claim = Claim::file(
            HiringId::new(),
            UserId::new(),
            ClaimFiling {
                claim_type: ClaimType::Client(ClientClaimType::Other {
                    reason: "wrong language".into(),
                }),
                description: "the copy was delivered in Spanish".into(),
                evidence_urls: vec!["https://e/1".into()],
            },
            10,
            now,
        )
        .unwrap();
        claim
            .resolve(Verdict::Resolved(ResolutionType::PartialAgreement), "split", UserId::new(), 0, now)
            .unwrap();

        let rebuilt = row_to_claim(claim_row(&claim)).unwrap();
        assert_eq!(rebuilt.id, claim.id);
        assert_eq!(rebuilt.claim_type, claim.claim_type);
        assert_eq!(rebuilt.resolution, claim.resolution);
        assert_eq!(rebuilt.status, ClaimStatus::Resolved);
    }

    #[test]
    fn test_rejected_submission_keeps_reason() {
        let now = Utc::now();
        let user = UserId::new();
        let mut compliance = ClaimCompliance::new(
            ClaimId::new(),
            HiringId::new(),
            2,
            ComplianceRequest {
                responsible_user_id: user,
                compliance_type: ComplianceType::PartialRefund {
                    amount: Money::new(dec!(12.5), Currency::USD),
                },
                instructions: "refund the rush fee".into(),
                deadline_days: 3,
            },
            now,
        )
        .unwrap();
        let id = compliance.submit(user, Vec::new(), None, None, now).unwrap().id;
        compliance
            .review(
                id,
                UserId::new(),
                ReviewDecision::Reject {
                    rejection_reason: "receipt unreadable".into(),
                },
                None,
                None,
                now,
            )
            .unwrap();

        let subs: Vec<SubmissionRow> = compliance.submissions.iter().map(submission_row).collect();
        let refs: Vec<&SubmissionRow> = subs.iter().collect();
        let rebuilt = row_to_compliance(compliance_row(&compliance), &refs).unwrap();

        assert_eq!(rebuilt.compliance_type, compliance.compliance_type);
        assert_eq!(rebuilt.order, 2);
        assert_eq!(rebuilt.submissions, compliance.submissions);
    }
}
