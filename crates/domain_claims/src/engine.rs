//! Claim engine
//!
//! Files claims against paid hirings, records moderator verdicts and
//! releases the hiring from `disputed` once the verdict is final.
//!
//! Every operation here holds the lock of the claim's hiring. Compliance
//! work in the tracker locks the compliance first and only then reaches the
//! hiring lock through [`ClaimEngine::check_closure`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};

use core_kernel::{ClaimId, HiringId, PortError};
use domain_hiring::{DisputeOutcome, Hiring, HiringContext, HiringError, HiringStatus};
use domain_party::{ensure_active, Actor, PartyRole};

use crate::claim::{Claim, ClaimFiling, Verdict};
use crate::compliance::{ClaimCompliance, ComplianceRequest};
use crate::error::ClaimError;
use crate::events;
use crate::ports::ClaimRepository;

/// What `resolve_claim` produced
#[derive(Debug, Clone, Serialize)]
pub struct ClaimResolution {
    pub claim: Claim,
    pub compliances: Vec<ClaimCompliance>,
    pub hiring_status: HiringStatus,
}

#[derive(Clone)]
pub struct ClaimEngine {
    ctx: HiringContext,
    claims: Arc<dyn ClaimRepository>,
}

impl ClaimEngine {
    pub fn new(ctx: HiringContext, claims: Arc<dyn ClaimRepository>) -> Self {
        Self { ctx, claims }
    }

    pub(crate) fn ctx(&self) -> &HiringContext {
        &self.ctx
    }

    pub(crate) fn claims(&self) -> &dyn ClaimRepository {
        self.claims.as_ref()
    }

    async fn load_claim(&self, id: ClaimId) -> Result<Claim, ClaimError> {
        self.claims.get_claim(id).await.map_err(|e| claim_lookup(id, e))
    }

    /// A party of a paid hiring opens a dispute
    ///
    /// Checks, in order: the claimant is on the side the claim type belongs
    /// to, no claim is already active on the hiring, the claimant is
    /// active, the hiring is paid, in progress or delivered, and the filing
    /// itself is valid.
    #[instrument(skip(self, filing), fields(claimant_id = %claimant.user_id))]
    pub async fn file_claim(
        &self,
        hiring_id: HiringId,
        claimant: &Actor,
        filing: ClaimFiling,
    ) -> Result<Claim, ClaimError> {
        let _guard = self.ctx.locks.lock(hiring_id).await;
        let mut hiring = self.ctx.load(hiring_id).await?;

        let role = filing.claim_type.role();
        let on_side = match role {
            PartyRole::Client => hiring.is_client(claimant.user_id),
            PartyRole::Provider => hiring.is_provider(claimant.user_id),
        };
        if !on_side {
            return Err(ClaimError::Forbidden {
                user_id: claimant.user_id,
                action: "file this claim type on the hiring",
            });
        }
        if let Some(existing) = self.claims.find_active_for_hiring(hiring_id).await? {
            return Err(ClaimError::ClaimAlreadyOpen {
                hiring_id,
                claim_id: existing.id,
            });
        }
        ensure_active(self.ctx.identity.as_ref(), claimant.user_id, role, true).await?;
        if !hiring.status.is_dispute_eligible() {
            return Err(HiringError::InvalidState {
                hiring_id,
                status: hiring.status,
                action: "dispute",
                reason: "claims can only be filed on paid, in-progress or delivered hirings".into(),
            }
            .into());
        }

        let now = self.ctx.clock.now();
        let mut claim = Claim::file(
            hiring_id,
            claimant.user_id,
            filing,
            self.ctx.settings.max_evidence_urls,
            now,
        )?;
        hiring.open_dispute(claim.id, now)?;
        self.ctx.commit(&mut hiring).await?;

        if let Err(e) = self.claims.insert_claim(&claim).await {
            warn!(hiring_id = %hiring_id, error = %e, "claim insert failed, releasing dispute");
            self.release_unfiled(&mut hiring, now).await;
            return Err(e.into());
        }

        events::publish(claim.take_events());
        info!(claim_id = %claim.id, hiring_id = %hiring_id, "claim filed");
        Ok(claim)
    }

    async fn release_unfiled(&self, hiring: &mut Hiring, now: DateTime<Utc>) {
        let restored = hiring
            .close_dispute(DisputeOutcome::Restore, now)
            .map_err(ClaimError::from);
        let result = match restored {
            Ok(_) => self.ctx.commit(hiring).await.map_err(ClaimError::from),
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            tracing::error!(hiring_id = %hiring.id, error = %e, "could not release dispute after failed claim insert");
        }
    }

    /// Moves an open claim into moderator review
    #[instrument(skip(self), fields(moderator_id = %moderator.user_id))]
    pub async fn start_review(&self, claim_id: ClaimId, moderator: &Actor) -> Result<Claim, ClaimError> {
        require_moderator(moderator, "review claims")?;
        let hiring_id = self.load_claim(claim_id).await?.hiring_id;
        let _guard = self.ctx.locks.lock(hiring_id).await;

        let mut claim = self.load_claim(claim_id).await?;
        claim.start_review(moderator.user_id, self.ctx.clock.now())?;
        self.claims.save_claim(&mut claim).await?;
        events::publish(claim.take_events());
        Ok(claim)
    }

    /// Records the moderator's verdict and any compliances it imposes
    ///
    /// A rejection, or a resolution without compliances, closes the claim
    /// at once. Otherwise closure waits for every compliance to finish.
    ///
    /// # Errors
    ///
    /// - `Forbidden` unless the actor is a moderator or admin
    /// - `Validation` for compliances on a rejection, more compliances than
    ///   allowed, or a compliance bound to someone outside the hiring
    /// - `ClaimInvalidState` when the claim already has a verdict
    #[instrument(skip(self, resolution, requests), fields(moderator_id = %moderator.user_id))]
    pub async fn resolve_claim(
        &self,
        claim_id: ClaimId,
        moderator: &Actor,
        verdict: Verdict,
        resolution: String,
        requests: Vec<ComplianceRequest>,
    ) -> Result<ClaimResolution, ClaimError> {
        require_moderator(moderator, "resolve claims")?;
        if verdict == Verdict::Rejected && !requests.is_empty() {
            return Err(ClaimError::validation("a rejected claim cannot carry compliances"));
        }
        let limit = self.ctx.settings.max_compliances_per_claim;
        if requests.len() > limit {
            return Err(ClaimError::validation(format!(
                "at most {limit} compliances per claim, got {}",
                requests.len()
            )));
        }

        let hiring_id = self.load_claim(claim_id).await?.hiring_id;
        let _guard = self.ctx.locks.lock(hiring_id).await;
        let mut claim = self.load_claim(claim_id).await?;
        if !claim.status.is_active() {
            return Err(ClaimError::ClaimInvalidState {
                claim_id,
                status: claim.status,
                action: "resolve",
            });
        }
        let mut hiring = self.ctx.load(hiring_id).await?;

        let now = self.ctx.clock.now();
        let mut compliances = Vec::with_capacity(requests.len());
        for (index, request) in requests.into_iter().enumerate() {
            if !hiring.is_party(request.responsible_user_id) {
                return Err(ClaimError::validation(format!(
                    "compliance {} is assigned to {}, who is not a party of hiring {hiring_id}",
                    index + 1,
                    request.responsible_user_id
                )));
            }
            compliances.push(ClaimCompliance::new(claim.id, hiring_id, index as u32 + 1, request, now)?);
        }

        claim.resolve(verdict, resolution, moderator.user_id, compliances.len(), now)?;
        self.claims.save_resolution(&mut claim, &compliances).await?;
        events::publish(claim.take_events());
        info!(claim_id = %claim_id, ?verdict, compliances = compliances.len(), "claim resolved");

        if compliances.is_empty() {
            self.close_locked(&mut claim, &mut hiring, now).await?;
        }

        Ok(ClaimResolution {
            claim,
            compliances,
            hiring_status: hiring.status,
        })
    }

    /// Releases the hiring and marks the claim closed; caller holds the
    /// hiring lock. Does nothing for an already closed claim.
    async fn close_locked(
        &self,
        claim: &mut Claim,
        hiring: &mut Hiring,
        now: DateTime<Utc>,
    ) -> Result<(), ClaimError> {
        if claim.is_closed() {
            return Ok(());
        }
        let verdict = claim.verdict().ok_or(ClaimError::ClaimInvalidState {
            claim_id: claim.id,
            status: claim.status,
            action: "close",
        })?;

        if hiring.status == HiringStatus::Disputed && hiring.dispute_claim_id == Some(claim.id) {
            hiring.close_dispute(verdict.dispute_outcome(), now)?;
            self.ctx.commit(hiring).await?;
        } else {
            warn!(
                claim_id = %claim.id,
                hiring_id = %hiring.id,
                hiring_status = %hiring.status,
                "hiring is no longer held by this claim"
            );
        }

        claim.close(now)?;
        self.claims.save_claim(claim).await?;
        events::publish(claim.take_events());
        info!(claim_id = %claim.id, hiring_status = %hiring.status, "claim closed");
        Ok(())
    }

    /// Closes the claim if its verdict is final; returns whether it is closed
    ///
    /// Safe to call repeatedly and from several compliances at once.
    pub async fn check_closure(&self, claim_id: ClaimId) -> Result<bool, ClaimError> {
        let hiring_id = self.load_claim(claim_id).await?.hiring_id;
        let _guard = self.ctx.locks.lock(hiring_id).await;

        let mut claim = self.load_claim(claim_id).await?;
        if claim.is_closed() {
            return Ok(true);
        }
        if !self.discharged(&claim).await? {
            return Ok(false);
        }
        let mut hiring = self.ctx.load(hiring_id).await?;
        self.close_locked(&mut claim, &mut hiring, self.ctx.clock.now()).await?;
        Ok(true)
    }

    async fn discharged(&self, claim: &Claim) -> Result<bool, ClaimError> {
        Ok(match claim.verdict() {
            None => false,
            Some(Verdict::Rejected) => true,
            Some(Verdict::Resolved(_)) => self
                .claims
                .list_compliances(claim.id)
                .await?
                .iter()
                .all(|c| c.status.is_terminal()),
        })
    }

    /// True once the claim has a verdict and every compliance is terminal
    pub async fn is_fully_discharged(&self, claim_id: ClaimId) -> Result<bool, ClaimError> {
        let claim = self.load_claim(claim_id).await?;
        self.discharged(&claim).await
    }

    pub async fn get_claim(&self, claim_id: ClaimId) -> Result<Claim, ClaimError> {
        self.load_claim(claim_id).await
    }

    pub async fn list_compliances(&self, claim_id: ClaimId) -> Result<Vec<ClaimCompliance>, ClaimError> {
        self.load_claim(claim_id).await?;
        Ok(self.claims.list_compliances(claim_id).await?)
    }

    pub async fn claims_for_hiring(&self, hiring_id: HiringId) -> Result<Vec<Claim>, ClaimError> {
        self.ctx.load(hiring_id).await?;
        Ok(self.claims.list_for_hiring(hiring_id).await?)
    }
}

pub(crate) fn require_moderator(actor: &Actor, action: &'static str) -> Result<(), ClaimError> {
    if actor.can_moderate() {
        Ok(())
    } else {
        Err(ClaimError::Forbidden {
            user_id: actor.user_id,
            action,
        })
    }
}

fn claim_lookup(id: ClaimId, error: PortError) -> ClaimError {
    if error.is_not_found() {
        ClaimError::ClaimNotFound(id)
    } else {
        ClaimError::Port(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claim::{ClaimStatus, ClaimType, ProviderClaimType, ResolutionType};
    use crate::compliance::{ComplianceStatus, ComplianceType};
    use crate::submission::ReviewDecision;
    use crate::test_support::{harness, not_delivered, paid_hiring, request};
    use core_kernel::{Classify, ErrorKind, UserId};
    use domain_hiring::HiringRepository;
    use domain_party::AccountStatus;

    fn moderator() -> Actor {
        Actor::moderator(UserId::new())
    }

    #[tokio::test]
    async fn test_second_claim_on_disputed_hiring_conflicts() {
        let h = harness();
        let hiring = paid_hiring(&h).await;
        let client = Actor::user(hiring.client_id);

        let first = h.engine.file_claim(hiring.id, &client, not_delivered()).await.unwrap();
        assert_eq!(first.status, ClaimStatus::Open);
        let stored = h.hirings.get(hiring.id).await.unwrap();
        assert_eq!(stored.status, HiringStatus::Disputed);
        assert_eq!(stored.dispute_claim_id, Some(first.id));

        let err = h
            .engine
            .file_claim(hiring.id, &client, not_delivered())
            .await
            .unwrap_err();
        assert!(matches!(err, ClaimError::ClaimAlreadyOpen { claim_id, .. } if claim_id == first.id));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_claim_type_must_match_claimant_side() {
        let h = harness();
        let hiring = paid_hiring(&h).await;
        let provider = Actor::user(hiring.provider_id);

        let err = h
            .engine
            .file_claim(hiring.id, &provider, not_delivered())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let filing = ClaimFiling {
            claim_type: ClaimType::Provider(ProviderClaimType::ClientUnresponsive),
            description: "client stopped answering".into(),
            evidence_urls: Vec::new(),
        };
        let claim = h.engine.file_claim(hiring.id, &provider, filing).await.unwrap();
        assert_eq!(claim.claimant_id, hiring.provider_id);
    }

    #[tokio::test]
    async fn test_inactive_claimant_is_forbidden() {
        let h = harness();
        let hiring = paid_hiring(&h).await;
        h.identity.set_status(hiring.client_id, AccountStatus::Banned).await;

        let err = h
            .engine
            .file_claim(hiring.id, &Actor::user(hiring.client_id), not_delivered())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(h.hirings.get(hiring.id).await.unwrap().status, HiringStatus::Paid);
    }

    #[tokio::test]
    async fn test_client_favor_without_compliances_restores_hiring() {
        let h = harness();
        let hiring = paid_hiring(&h).await;
        let claim = h
            .engine
            .file_claim(hiring.id, &Actor::user(hiring.client_id), not_delivered())
            .await
            .unwrap();

        let outcome = h
            .engine
            .resolve_claim(
                claim.id,
                &moderator(),
                Verdict::Resolved(ResolutionType::ClientFavor),
                "provider agreed to deliver".into(),
                Vec::new(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.hiring_status, HiringStatus::Paid);
        assert!(outcome.claim.is_closed());
        let stored = h.hirings.get(hiring.id).await.unwrap();
        assert_eq!(stored.status, HiringStatus::Paid);
        assert_eq!(stored.dispute_claim_id, None);

        // the hiring is open to a new claim again
        assert!(h
            .engine
            .file_claim(hiring.id, &Actor::user(hiring.client_id), not_delivered())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_rejection_restores_and_refuses_compliances() {
        let h = harness();
        let hiring = paid_hiring(&h).await;
        let claim = h
            .engine
            .file_claim(hiring.id, &Actor::user(hiring.client_id), not_delivered())
            .await
            .unwrap();

        let err = h
            .engine
            .resolve_claim(
                claim.id,
                &moderator(),
                Verdict::Rejected,
                "no grounds".into(),
                vec![request(hiring.client_id, ComplianceType::ConfirmationOnly, 3)],
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let outcome = h
            .engine
            .resolve_claim(claim.id, &moderator(), Verdict::Rejected, "no grounds".into(), Vec::new())
            .await
            .unwrap();
        assert_eq!(outcome.claim.status, ClaimStatus::Rejected);
        assert_eq!(outcome.hiring_status, HiringStatus::Paid);
    }

    #[tokio::test]
    async fn test_outcomes_follow_resolution_type() {
        for (resolution, expected) in [
            (ResolutionType::ProviderFavor, HiringStatus::ResolvedCompleted),
            (ResolutionType::PartialAgreement, HiringStatus::ResolvedCancelled),
        ] {
            let h = harness();
            let hiring = paid_hiring(&h).await;
            let claim = h
                .engine
                .file_claim(hiring.id, &Actor::user(hiring.client_id), not_delivered())
                .await
                .unwrap();
            let outcome = h
                .engine
                .resolve_claim(claim.id, &moderator(), Verdict::Resolved(resolution), "settled".into(), Vec::new())
                .await
                .unwrap();
            assert_eq!(outcome.hiring_status, expected);
        }
    }

    #[tokio::test]
    async fn test_claim_stays_open_until_every_compliance_is_terminal() {
        let h = harness();
        let hiring = paid_hiring(&h).await;
        let claim = h
            .engine
            .file_claim(hiring.id, &Actor::user(hiring.client_id), not_delivered())
            .await
            .unwrap();
        let mod_actor = moderator();

        let outcome = h
            .engine
            .resolve_claim(
                claim.id,
                &mod_actor,
                Verdict::Resolved(ResolutionType::ClientFavor),
                "deliver, then confirm".into(),
                vec![
                    request(hiring.provider_id, ComplianceType::DeliverFiles, 5),
                    request(hiring.client_id, ComplianceType::ConfirmationOnly, 5),
                ],
            )
            .await
            .unwrap();
        assert_eq!(outcome.hiring_status, HiringStatus::Disputed);
        assert_eq!(outcome.compliances.len(), 2);
        assert_eq!(outcome.compliances[1].order, 2);

        let deliver = &outcome.compliances[0];
        let sub = h
            .tracker
            .submit(deliver.id, &Actor::user(hiring.provider_id), vec!["https://f/zip".into()], None)
            .await
            .unwrap();
        h.tracker
            .review_submission(sub.id, &mod_actor, ReviewDecision::Approve, None)
            .await
            .unwrap();

        assert!(!h.engine.is_fully_discharged(claim.id).await.unwrap());
        assert!(!h.engine.get_claim(claim.id).await.unwrap().is_closed());
        assert_eq!(h.hirings.get(hiring.id).await.unwrap().status, HiringStatus::Disputed);

        let confirm = &outcome.compliances[1];
        let sub = h
            .tracker
            .submit(confirm.id, &Actor::user(hiring.client_id), Vec::new(), Some("received".into()))
            .await
            .unwrap();
        let done = h
            .tracker
            .review_submission(sub.id, &mod_actor, ReviewDecision::Approve, None)
            .await
            .unwrap();
        assert_eq!(done.status, ComplianceStatus::Approved);

        assert!(h.engine.is_fully_discharged(claim.id).await.unwrap());
        assert!(h.engine.get_claim(claim.id).await.unwrap().is_closed());
        assert_eq!(h.hirings.get(hiring.id).await.unwrap().status, HiringStatus::Paid);
    }

    #[tokio::test]
    async fn test_compliance_for_outsider_is_rejected() {
        let h = harness();
        let hiring = paid_hiring(&h).await;
        let claim = h
            .engine
            .file_claim(hiring.id, &Actor::user(hiring.client_id), not_delivered())
            .await
            .unwrap();

        let err = h
            .engine
            .resolve_claim(
                claim.id,
                &moderator(),
                Verdict::Resolved(ResolutionType::ClientFavor),
                "refund".into(),
                vec![request(UserId::new(), ComplianceType::FullRefund, 3)],
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(h.engine.get_claim(claim.id).await.unwrap().status, ClaimStatus::Open);
    }

    #[tokio::test]
    async fn test_only_moderators_review_and_resolve() {
        let h = harness();
        let hiring = paid_hiring(&h).await;
        let client = Actor::user(hiring.client_id);
        let claim = h.engine.file_claim(hiring.id, &client, not_delivered()).await.unwrap();

        assert_eq!(
            h.engine.start_review(claim.id, &client).await.unwrap_err().kind(),
            ErrorKind::Forbidden
        );
        let err = h
            .engine
            .resolve_claim(claim.id, &client, Verdict::Rejected, "mine".into(), Vec::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let reviewed = h.engine.start_review(claim.id, &moderator()).await.unwrap();
        assert_eq!(reviewed.status, ClaimStatus::InReview);
    }

    #[tokio::test]
    async fn test_resolving_twice_is_invalid_state() {
        let h = harness();
        let hiring = paid_hiring(&h).await;
        let claim = h
            .engine
            .file_claim(hiring.id, &Actor::user(hiring.client_id), not_delivered())
            .await
            .unwrap();
        h.engine
            .resolve_claim(claim.id, &moderator(), Verdict::Rejected, "no".into(), Vec::new())
            .await
            .unwrap();

        let err = h
            .engine
            .resolve_claim(claim.id, &moderator(), Verdict::Rejected, "no".into(), Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ClaimError::ClaimInvalidState { .. }));
        assert_eq!(h.engine.claims_for_hiring(hiring.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_claim_is_not_found() {
        let h = harness();
        let err = h.engine.get_claim(ClaimId::new()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
