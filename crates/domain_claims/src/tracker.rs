//! Compliance tracker
//!
//! Runs the submission cycle of each compliance. Operations on one
//! compliance are serialized on its id so attempt numbers stay unique and
//! gap-free; a compliance reaching a terminal status asks the engine to
//! close the claim. A closure that fails there is retried by the sweep.

use tracing::{error, info, instrument, warn};

use core_kernel::{ComplianceId, PortError, SubmissionId};
use domain_party::{ensure_active, Actor, PartyRole};

use crate::claim::validate_evidence;
use crate::compliance::ClaimCompliance;
use crate::engine::{require_moderator, ClaimEngine};
use crate::error::ClaimError;
use crate::events;
use crate::submission::{ComplianceSubmission, ReviewDecision};

pub struct ComplianceTracker {
    engine: ClaimEngine,
}

impl ComplianceTracker {
    pub fn new(engine: ClaimEngine) -> Self {
        Self { engine }
    }

    async fn load(&self, id: ComplianceId) -> Result<ClaimCompliance, ClaimError> {
        self.engine.claims().get_compliance(id).await.map_err(|e| {
            if e.is_not_found() {
                ClaimError::ComplianceNotFound(id)
            } else {
                ClaimError::Port(e)
            }
        })
    }

    async fn owner_of(&self, submission_id: SubmissionId) -> Result<ComplianceId, ClaimError> {
        self.engine
            .claims()
            .find_compliance_by_submission(submission_id)
            .await
            .map(|c| c.id)
            .map_err(|e| submission_lookup(submission_id, e))
    }

    async fn save(&self, compliance: &mut ClaimCompliance) -> Result<(), ClaimError> {
        self.engine.claims().save_compliance(compliance).await?;
        events::publish(compliance.take_events());
        Ok(())
    }

    /// The responsible user submits evidence for the next attempt
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the actor is the responsible user
    /// - `ComplianceInvalidState` unless the compliance is `pending`
    /// - `DeadlineExceeded` past `deadline_anchor + deadline_days`
    /// - `AttemptLimitReached` when the configured attempts are used up
    #[instrument(skip(self, evidence_urls, user_notes), fields(user_id = %actor.user_id))]
    pub async fn submit(
        &self,
        compliance_id: ComplianceId,
        actor: &Actor,
        evidence_urls: Vec<String>,
        user_notes: Option<String>,
    ) -> Result<ComplianceSubmission, ClaimError> {
        let ctx = self.engine.ctx();
        let _guard = ctx.locks.lock(compliance_id).await;
        let mut compliance = self.load(compliance_id).await?;

        if compliance.responsible_user_id != actor.user_id {
            return Err(ClaimError::Forbidden {
                user_id: actor.user_id,
                action: "submit for a compliance assigned to someone else",
            });
        }
        let hiring = ctx.load(compliance.hiring_id).await?;
        let role = if hiring.is_client(actor.user_id) {
            PartyRole::Client
        } else {
            PartyRole::Provider
        };
        ensure_active(ctx.identity.as_ref(), actor.user_id, role, true).await?;
        validate_evidence(&evidence_urls, ctx.settings.max_evidence_urls)?;

        let submission = compliance
            .submit(
                actor.user_id,
                evidence_urls,
                user_notes,
                ctx.settings.max_submission_attempts,
                ctx.clock.now(),
            )?
            .clone();
        self.save(&mut compliance).await?;

        info!(
            compliance_id = %compliance_id,
            attempt_number = submission.attempt_number,
            "compliance submission received"
        );
        Ok(submission)
    }

    /// A moderator approves, rejects or asks for adjustment of a submission
    #[instrument(skip(self, decision, notes), fields(moderator_id = %moderator.user_id))]
    pub async fn review_submission(
        &self,
        submission_id: SubmissionId,
        moderator: &Actor,
        decision: ReviewDecision,
        notes: Option<String>,
    ) -> Result<ClaimCompliance, ClaimError> {
        require_moderator(moderator, "review compliance submissions")?;
        let ctx = self.engine.ctx();
        let compliance_id = self.owner_of(submission_id).await?;
        let _guard = ctx.locks.lock(compliance_id).await;
        let mut compliance = self.load(compliance_id).await?;

        let status = compliance.review(
            submission_id,
            moderator.user_id,
            decision,
            notes,
            ctx.settings.max_submission_attempts,
            ctx.clock.now(),
        )?;
        self.save(&mut compliance).await?;
        info!(compliance_id = %compliance_id, %status, "submission reviewed");

        if status.is_terminal() {
            if let Err(e) = self.engine.check_closure(compliance.claim_id).await {
                error!(
                    claim_id = %compliance.claim_id,
                    error = %e,
                    "closure check failed after review; left for the sweep"
                );
            }
        }
        Ok(compliance)
    }

    /// Records an advisory peer opinion on a submission
    ///
    /// Only a party of the hiring other than the submitter, or a moderator,
    /// may take the single peer-review slot.
    #[instrument(skip(self, reason), fields(reviewer_id = %reviewer.user_id))]
    pub async fn peer_review(
        &self,
        submission_id: SubmissionId,
        reviewer: &Actor,
        peer_approved: bool,
        reason: Option<String>,
    ) -> Result<ComplianceSubmission, ClaimError> {
        let ctx = self.engine.ctx();
        let compliance_id = self.owner_of(submission_id).await?;
        let _guard = ctx.locks.lock(compliance_id).await;
        let mut compliance = self.load(compliance_id).await?;

        let hiring = ctx.load(compliance.hiring_id).await?;
        if !hiring.is_party(reviewer.user_id) && !reviewer.can_moderate() {
            warn!(submission_id = %submission_id, "peer review by a non-party refused");
            return Err(ClaimError::Forbidden {
                user_id: reviewer.user_id,
                action: "peer-review a submission outside their hiring",
            });
        }

        let submission = compliance
            .peer_review(submission_id, reviewer.user_id, peer_approved, reason, ctx.clock.now())?
            .clone();
        self.save(&mut compliance).await?;
        info!(submission_id = %submission_id, peer_approved, "peer review recorded");
        Ok(submission)
    }

    /// Abandons pending compliances whose deadline has passed, then closes
    /// every decided claim that is left unclosed and fully discharged
    ///
    /// Returns the ids that were abandoned. A failure on one compliance or
    /// claim is logged and does not stop the sweep.
    #[instrument(skip(self))]
    pub async fn sweep_overdue(&self) -> Result<Vec<ComplianceId>, ClaimError> {
        let ctx = self.engine.ctx();
        let now = ctx.clock.now();
        let candidates = self.engine.claims().list_pending_compliances().await?;

        let mut abandoned = Vec::new();
        for candidate in candidates.into_iter().filter(|c| c.is_overdue(now)) {
            let claim_id = candidate.claim_id;
            let result = async {
                let _guard = ctx.locks.lock(candidate.id).await;
                let mut compliance = self.load(candidate.id).await?;
                if !compliance.is_overdue(now) {
                    return Ok(false);
                }
                compliance.abandon("deadline exceeded", now)?;
                self.save(&mut compliance).await?;
                Ok::<_, ClaimError>(true)
            }
            .await;

            match result {
                Ok(true) => {
                    warn!(compliance_id = %candidate.id, %claim_id, "overdue compliance abandoned");
                    abandoned.push(candidate.id);
                }
                Ok(false) => {}
                Err(e) => error!(compliance_id = %candidate.id, error = %e, "sweep failed for compliance"),
            }
        }

        for claim in self.engine.claims().list_awaiting_closure().await? {
            match self.engine.check_closure(claim.id).await {
                Ok(true) => info!(claim_id = %claim.id, "claim closed by sweep"),
                Ok(false) => {}
                Err(e) => error!(claim_id = %claim.id, error = %e, "closure check failed during sweep"),
            }
        }
        Ok(abandoned)
    }
}

fn submission_lookup(id: SubmissionId, error: PortError) -> ClaimError {
    if error.is_not_found() {
        ClaimError::SubmissionNotFound(id)
    } else {
        ClaimError::Port(error)
    }
}
