//! Hiring Domain Ports
//!
//! `HiringRepository` is the persistence seam for the Hiring aggregate,
//! including its quotation history. The PostgreSQL adapter lives in
//! `infra_db`; the `mock` module provides an in-memory adapter for tests.
//!
//! `save` implements optimistic concurrency: the caller's `version` must
//! match the stored one, and on success both are bumped by one.

use async_trait::async_trait;

use core_kernel::{DomainPort, HealthCheckable, HiringId, PortError, ServiceId, UserId};

use crate::hiring::Hiring;

/// Storage operations required by the hiring services
#[async_trait]
pub trait HiringRepository: DomainPort + HealthCheckable {
    /// Loads a hiring with its full quotation history
    async fn get(&self, id: HiringId) -> Result<Hiring, PortError>;

    /// Finds the hiring a checkout preference was issued for
    async fn find_by_preference(&self, preference_id: &str) -> Result<Option<Hiring>, PortError>;

    /// Finds the non-terminal hiring for an engagement triple, if any
    async fn find_active_for(
        &self,
        client_id: UserId,
        provider_id: UserId,
        service_id: ServiceId,
    ) -> Result<Option<Hiring>, PortError>;

    /// Stores a new hiring; `Conflict` if the id or active triple exists
    async fn insert(&self, hiring: &Hiring) -> Result<(), PortError>;

    /// Persists changes; `Conflict` when the stored version moved on
    async fn save(&self, hiring: &mut Hiring) -> Result<(), PortError>;
}

/// Mock implementation of HiringRepository for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use core_kernel::{AdapterHealth, HealthCheckResult};

    /// In-memory mock implementation of HiringRepository
    #[derive(Debug, Default, Clone)]
    pub struct MockHiringRepository {
        hirings: Arc<RwLock<HashMap<HiringId, Hiring>>>,
        fail_next_save: Arc<AtomicBool>,
    }

    impl MockHiringRepository {
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes the next `save` fail with a connection error
        pub fn fail_next_save(&self) {
            self.fail_next_save.store(true, Ordering::SeqCst);
        }

        /// Number of stored hirings
        pub async fn len(&self) -> usize {
            self.hirings.read().await.len()
        }
    }

    impl DomainPort for MockHiringRepository {}

    #[async_trait]
    impl HealthCheckable for MockHiringRepository {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult {
                adapter_id: "mock-hiring-repository".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms: 0,
                message: Some("Mock adapter always healthy".to_string()),
                checked_at: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl HiringRepository for MockHiringRepository {
        async fn get(&self, id: HiringId) -> Result<Hiring, PortError> {
            self.hirings
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Hiring", id))
        }

        async fn find_by_preference(&self, preference_id: &str) -> Result<Option<Hiring>, PortError> {
            Ok(self
                .hirings
                .read()
                .await
                .values()
                .find(|h| h.preference_id.as_deref() == Some(preference_id))
                .cloned())
        }

        async fn find_active_for(
            &self,
            client_id: UserId,
            provider_id: UserId,
            service_id: ServiceId,
        ) -> Result<Option<Hiring>, PortError> {
            Ok(self
                .hirings
                .read()
                .await
                .values()
                .find(|h| {
                    h.client_id == client_id
                        && h.provider_id == provider_id
                        && h.service_id == service_id
                        && !h.status.is_terminal()
                })
                .cloned())
        }

        async fn insert(&self, hiring: &Hiring) -> Result<(), PortError> {
            let mut hirings = self.hirings.write().await;
            if hirings.contains_key(&hiring.id) {
                return Err(PortError::conflict(format!("hiring {} already exists", hiring.id)));
            }
            let duplicate = hirings.values().any(|h| {
                h.client_id == hiring.client_id
                    && h.provider_id == hiring.provider_id
                    && h.service_id == hiring.service_id
                    && !h.status.is_terminal()
            });
            if duplicate {
                return Err(PortError::conflict("an active hiring already exists for this engagement"));
            }
            hirings.insert(hiring.id, hiring.clone());
            Ok(())
        }

        async fn save(&self, hiring: &mut Hiring) -> Result<(), PortError> {
            if self.fail_next_save.swap(false, Ordering::SeqCst) {
                return Err(PortError::connection("simulated storage outage"));
            }
            let mut hirings = self.hirings.write().await;
            let stored = hirings
                .get(&hiring.id)
                .ok_or_else(|| PortError::not_found("Hiring", hiring.id))?;
            if stored.version != hiring.version {
                return Err(PortError::stale_version("Hiring", hiring.id, hiring.version));
            }
            hiring.version += 1;
            let mut snapshot = hiring.clone();
            snapshot.take_events();
            hirings.insert(hiring.id, snapshot);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockHiringRepository;
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_stale_save_is_conflict() {
        let repo = MockHiringRepository::new();
        let hiring = Hiring::new(UserId::new(), UserId::new(), ServiceId::new(), Utc::now()).unwrap();
        repo.insert(&hiring).await.unwrap();

        let mut first = repo.get(hiring.id).await.unwrap();
        let mut second = repo.get(hiring.id).await.unwrap();
        repo.save(&mut first).await.unwrap();
        assert_eq!(first.version, 2);

        let err = repo.save(&mut second).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_duplicate_active_triple_is_conflict() {
        let repo = MockHiringRepository::new();
        let (client, provider, service) = (UserId::new(), UserId::new(), ServiceId::new());
        let first = Hiring::new(client, provider, service, Utc::now()).unwrap();
        let second = Hiring::new(client, provider, service, Utc::now()).unwrap();
        repo.insert(&first).await.unwrap();
        assert!(repo.insert(&second).await.unwrap_err().is_conflict());
        assert!(repo.find_active_for(client, provider, service).await.unwrap().is_some());
    }
}
