//! Claims Domain Ports
//!
//! `ClaimRepository` stores claims together with their compliances and the
//! full submission history. Saves are version-checked like the hiring store.
//! Storage must also reject a second submission with the same
//! (compliance, attempt number) pair.

use async_trait::async_trait;

use core_kernel::{
    ClaimId, ComplianceId, DomainPort, HealthCheckable, HiringId, PortError, SubmissionId,
};

use crate::claim::Claim;
use crate::compliance::ClaimCompliance;

#[async_trait]
pub trait ClaimRepository: DomainPort + HealthCheckable {
    async fn get_claim(&self, id: ClaimId) -> Result<Claim, PortError>;

    /// The open or in-review claim on a hiring, if any
    async fn find_active_for_hiring(&self, hiring_id: HiringId) -> Result<Option<Claim>, PortError>;

    /// All claims ever filed on a hiring, oldest first
    async fn list_for_hiring(&self, hiring_id: HiringId) -> Result<Vec<Claim>, PortError>;

    /// Resolved or rejected claims that are not closed yet
    async fn list_awaiting_closure(&self) -> Result<Vec<Claim>, PortError>;

    /// `Conflict` when the hiring already has an active claim
    async fn insert_claim(&self, claim: &Claim) -> Result<(), PortError>;

    async fn save_claim(&self, claim: &mut Claim) -> Result<(), PortError>;

    /// Saves a resolved claim and inserts its compliances atomically
    async fn save_resolution(
        &self,
        claim: &mut Claim,
        compliances: &[ClaimCompliance],
    ) -> Result<(), PortError>;

    /// Compliances of a claim ordered by `order`, with submissions
    async fn list_compliances(&self, claim_id: ClaimId) -> Result<Vec<ClaimCompliance>, PortError>;

    async fn get_compliance(&self, id: ComplianceId) -> Result<ClaimCompliance, PortError>;

    async fn find_compliance_by_submission(
        &self,
        submission_id: SubmissionId,
    ) -> Result<ClaimCompliance, PortError>;

    /// Every compliance still in `pending`, for the overdue sweep
    async fn list_pending_compliances(&self) -> Result<Vec<ClaimCompliance>, PortError>;

    /// Persists status changes and appends new submissions
    async fn save_compliance(&self, compliance: &mut ClaimCompliance) -> Result<(), PortError>;
}

/// Mock implementation of ClaimRepository for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use chrono::Utc;
    use std::collections::{HashMap, HashSet};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use core_kernel::{AdapterHealth, HealthCheckResult};

    #[derive(Debug, Default)]
    struct Store {
        claims: HashMap<ClaimId, Claim>,
        compliances: HashMap<ComplianceId, ClaimCompliance>,
        /// Mirrors the (compliance_id, attempt_number) unique index
        attempts: HashSet<(ComplianceId, u32)>,
    }

    #[derive(Debug, Default, Clone)]
    pub struct MockClaimRepository {
        store: Arc<RwLock<Store>>,
    }

    impl MockClaimRepository {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl DomainPort for MockClaimRepository {}

    #[async_trait]
    impl HealthCheckable for MockClaimRepository {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult {
                adapter_id: "mock-claim-repository".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms: 0,
                message: Some("Mock adapter always healthy".to_string()),
                checked_at: Utc::now(),
            }
        }
    }

    fn save_claim_in(store: &mut Store, claim: &mut Claim) -> Result<(), PortError> {
        let stored = store
            .claims
            .get(&claim.id)
            .ok_or_else(|| PortError::not_found("Claim", claim.id))?;
        if stored.version != claim.version {
            return Err(PortError::stale_version("Claim", claim.id, claim.version));
        }
        claim.version += 1;
        let mut snapshot = claim.clone();
        snapshot.take_events();
        store.claims.insert(claim.id, snapshot);
        Ok(())
    }

    fn snapshot(compliance: &ClaimCompliance) -> ClaimCompliance {
        let mut copy = compliance.clone();
        copy.take_events();
        copy
    }

    #[async_trait]
    impl ClaimRepository for MockClaimRepository {
        async fn get_claim(&self, id: ClaimId) -> Result<Claim, PortError> {
            self.store
                .read()
                .await
                .claims
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Claim", id))
        }

        async fn find_active_for_hiring(&self, hiring_id: HiringId) -> Result<Option<Claim>, PortError> {
            Ok(self
                .store
                .read()
                .await
                .claims
                .values()
                .find(|c| c.hiring_id == hiring_id && c.status.is_active())
                .cloned())
        }

        async fn list_for_hiring(&self, hiring_id: HiringId) -> Result<Vec<Claim>, PortError> {
            let mut claims: Vec<Claim> = self
                .store
                .read()
                .await
                .claims
                .values()
                .filter(|c| c.hiring_id == hiring_id)
                .cloned()
                .collect();
            claims.sort_by_key(|c| c.created_at);
            Ok(claims)
        }

        async fn list_awaiting_closure(&self) -> Result<Vec<Claim>, PortError> {
            let mut claims: Vec<Claim> = self
                .store
                .read()
                .await
                .claims
                .values()
                .filter(|c| c.verdict().is_some() && !c.is_closed())
                .cloned()
                .collect();
            claims.sort_by_key(|c| c.created_at);
            Ok(claims)
        }

        async fn insert_claim(&self, claim: &Claim) -> Result<(), PortError> {
            let mut store = self.store.write().await;
            let active = store
                .claims
                .values()
                .any(|c| c.hiring_id == claim.hiring_id && c.status.is_active());
            if active || store.claims.contains_key(&claim.id) {
                return Err(PortError::conflict(format!(
                    "hiring {} already has an active claim",
                    claim.hiring_id
                )));
            }
            let mut snapshot = claim.clone();
            snapshot.take_events();
            store.claims.insert(claim.id, snapshot);
            Ok(())
        }

        async fn save_claim(&self, claim: &mut Claim) -> Result<(), PortError> {
            save_claim_in(&mut *self.store.write().await, claim)
        }

        async fn save_resolution(
            &self,
            claim: &mut Claim,
            compliances: &[ClaimCompliance],
        ) -> Result<(), PortError> {
            let mut store = self.store.write().await;
            if compliances.iter().any(|c| store.compliances.contains_key(&c.id)) {
                return Err(PortError::conflict("compliance already exists"));
            }
            save_claim_in(&mut store, claim)?;
            for compliance in compliances {
                store.compliances.insert(compliance.id, snapshot(compliance));
            }
            Ok(())
        }

        async fn list_compliances(&self, claim_id: ClaimId) -> Result<Vec<ClaimCompliance>, PortError> {
            let mut list: Vec<ClaimCompliance> = self
                .store
                .read()
                .await
                .compliances
                .values()
                .filter(|c| c.claim_id == claim_id)
                .cloned()
                .collect();
            list.sort_by_key(|c| c.order);
            Ok(list)
        }

        async fn get_compliance(&self, id: ComplianceId) -> Result<ClaimCompliance, PortError> {
            self.store
                .read()
                .await
                .compliances
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("ClaimCompliance", id))
        }

        async fn find_compliance_by_submission(
            &self,
            submission_id: SubmissionId,
        ) -> Result<ClaimCompliance, PortError> {
            self.store
                .read()
                .await
                .compliances
                .values()
                .find(|c| c.submissions.iter().any(|s| s.id == submission_id))
                .cloned()
                .ok_or_else(|| PortError::not_found("ComplianceSubmission", submission_id))
        }

        async fn list_pending_compliances(&self) -> Result<Vec<ClaimCompliance>, PortError> {
            Ok(self
                .store
                .read()
                .await
                .compliances
                .values()
                .filter(|c| c.status == crate::compliance::ComplianceStatus::Pending)
                .cloned()
                .collect())
        }

        async fn save_compliance(&self, compliance: &mut ClaimCompliance) -> Result<(), PortError> {
            let mut store = self.store.write().await;
            let stored = store
                .compliances
                .get(&compliance.id)
                .ok_or_else(|| PortError::not_found("ClaimCompliance", compliance.id))?;
            if stored.version != compliance.version {
                return Err(PortError::stale_version(
                    "ClaimCompliance",
                    compliance.id,
                    compliance.version,
                ));
            }
            let known: HashSet<_> = stored.submissions.iter().map(|s| s.id).collect();
            let new_attempts: Vec<(ComplianceId, u32)> = compliance
                .submissions
                .iter()
                .filter(|s| !known.contains(&s.id))
                .map(|s| (compliance.id, s.attempt_number))
                .collect();
            if new_attempts.iter().any(|key| store.attempts.contains(key)) {
                return Err(PortError::conflict(format!(
                    "duplicate attempt number on compliance {}",
                    compliance.id
                )));
            }
            store.attempts.extend(new_attempts);
            compliance.version += 1;
            store.compliances.insert(compliance.id, snapshot(compliance));
            Ok(())
        }
    }
}
