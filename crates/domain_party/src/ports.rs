//! Party Domain Ports
//!
//! The engine consults an identity service before honouring re-quote,
//! checkout and claim actions. `IdentityPort` is the seam; `infra_db`
//! provides a PostgreSQL adapter over the `user_accounts` table and the
//! `mock` module an in-memory one.
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_party::ports::{ensure_active, IdentityPort};
//! use domain_party::PartyRole;
//!
//! ensure_active(identity.as_ref(), hiring.client_id, PartyRole::Client, true).await?;
//! ```

use async_trait::async_trait;

use core_kernel::{DomainPort, HealthCheckable, PortError, UserId};

use crate::account::{AccountStatus, PartyRole};
use crate::error::PartyError;

/// Read-only view of user account standing
#[async_trait]
pub trait IdentityPort: DomainPort + HealthCheckable {
    /// Returns the current standing of an account, or `PortError::NotFound`
    async fn account_status(&self, user_id: UserId) -> Result<AccountStatus, PortError>;
}

/// Fails unless `user_id` is active
///
/// `acting` is true when the user is the caller of the operation and false
/// when they are the counterpart; it only changes how the failure is
/// classified.
pub async fn ensure_active(
    identity: &dyn IdentityPort,
    user_id: UserId,
    role: PartyRole,
    acting: bool,
) -> Result<(), PartyError> {
    match identity.account_status(user_id).await? {
        AccountStatus::Active => Ok(()),
        AccountStatus::Suspended => Err(PartyError::AccountSuspended {
            user_id,
            role,
            acting,
        }),
        status @ (AccountStatus::Banned | AccountStatus::Deleted) => {
            Err(PartyError::UserBannedOrDeleted {
                user_id,
                role,
                status,
                acting,
            })
        }
    }
}

/// Mock implementation of IdentityPort for testing
///
/// Accounts are held in memory. Unknown users are reported as not found
/// unless the port was built with [`MockIdentityPort::permissive`].
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use core_kernel::{AdapterHealth, HealthCheckResult};

    #[derive(Debug, Default, Clone)]
    pub struct MockIdentityPort {
        accounts: Arc<RwLock<HashMap<UserId, AccountStatus>>>,
        default_active: bool,
    }

    impl MockIdentityPort {
        pub fn new() -> Self {
            Self::default()
        }

        /// Treats every unknown user as active
        pub fn permissive() -> Self {
            Self {
                accounts: Arc::default(),
                default_active: true,
            }
        }

        /// Pre-populates account standings
        pub async fn with_accounts(accounts: Vec<(UserId, AccountStatus)>) -> Self {
            let port = Self::new();
            {
                let mut map = port.accounts.write().await;
                map.extend(accounts);
            }
            port
        }

        /// Changes (or registers) the standing of one account
        pub async fn set_status(&self, user_id: UserId, status: AccountStatus) {
            self.accounts.write().await.insert(user_id, status);
        }
    }

    impl DomainPort for MockIdentityPort {}

    #[async_trait]
    impl HealthCheckable for MockIdentityPort {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult {
                adapter_id: "mock-identity-port".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms: 0,
                message: Some("Mock adapter always healthy".to_string()),
                checked_at: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl IdentityPort for MockIdentityPort {
        async fn account_status(&self, user_id: UserId) -> Result<AccountStatus, PortError> {
            match self.accounts.read().await.get(&user_id) {
                Some(status) => Ok(*status),
                None if self.default_active => Ok(AccountStatus::Active),
                None => Err(PortError::not_found("Account", user_id)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockIdentityPort;
    use super::*;
    use core_kernel::{Classify, ErrorKind};

    #[tokio::test]
    async fn test_active_user_passes() {
        let user = UserId::new();
        let port = MockIdentityPort::with_accounts(vec![(user, AccountStatus::Active)]).await;
        assert!(ensure_active(&port, user, PartyRole::Client, true).await.is_ok());
    }

    #[tokio::test]
    async fn test_banned_actor_is_forbidden() {
        let user = UserId::new();
        let port = MockIdentityPort::with_accounts(vec![(user, AccountStatus::Banned)]).await;
        let err = ensure_active(&port, user, PartyRole::Client, true).await.unwrap_err();
        assert!(matches!(err, PartyError::UserBannedOrDeleted { .. }));
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn test_deleted_counterpart_is_bad_request() {
        let user = UserId::new();
        let port = MockIdentityPort::with_accounts(vec![(user, AccountStatus::Deleted)]).await;
        let err = ensure_active(&port, user, PartyRole::Provider, false).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let port = MockIdentityPort::new();
        let err = ensure_active(&port, UserId::new(), PartyRole::Client, true).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_permissive_mock_defaults_to_active() {
        let port = MockIdentityPort::permissive();
        assert_eq!(
            port.account_status(UserId::new()).await.unwrap(),
            AccountStatus::Active
        );
    }
}
