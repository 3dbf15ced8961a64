//! PostgreSQL Identity Adapter
//!
//! Reads account standings from the `user_accounts` mirror.

use async_trait::async_trait;
use sqlx::PgPool;

use core_kernel::{DomainPort, HealthCheckResult, HealthCheckable, PortError, UserId};
use domain_party::{AccountStatus, IdentityPort};

use crate::error::DatabaseError;
use crate::repositories::accounts::AccountsRepository;
use crate::repositories::parse_column;

#[derive(Debug, Clone)]
pub struct PostgresIdentityAdapter {
    repository: AccountsRepository,
}

impl PostgresIdentityAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: AccountsRepository::new(pool),
        }
    }

    /// Records an account standing pushed by the user service
    pub async fn set_status(&self, user_id: UserId, status: AccountStatus) -> Result<(), PortError> {
        self.repository.upsert(*user_id.as_uuid(), status.as_str()).await?;
        Ok(())
    }
}

impl DomainPort for PostgresIdentityAdapter {}

#[async_trait]
impl HealthCheckable for PostgresIdentityAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        super::ping(self.repository.pool(), "postgres-identity-adapter").await
    }
}

#[async_trait]
impl IdentityPort for PostgresIdentityAdapter {
    async fn account_status(&self, user_id: UserId) -> Result<AccountStatus, PortError> {
        let status = self
            .repository
            .status(*user_id.as_uuid())
            .await?
            .ok_or_else(|| DatabaseError::not_found("UserAccount", user_id))?;
        Ok(parse_column("user_accounts.status", &status)?)
    }
}
