//! Party domain errors

use thiserror::Error;

use core_kernel::{Classify, ErrorKind, PortError, UserId};

use crate::account::{AccountStatus, PartyRole};

/// Errors raised while checking whether a party may act
#[derive(Debug, Error)]
pub enum PartyError {
    /// The account can no longer take part in engagements
    #[error("User {user_id} ({role}) is {status} and cannot take part in this action")]
    UserBannedOrDeleted {
        user_id: UserId,
        role: PartyRole,
        status: AccountStatus,
        acting: bool,
    },

    /// The account is temporarily prevented from acting
    #[error("User {user_id} ({role}) is suspended")]
    AccountSuspended {
        user_id: UserId,
        role: PartyRole,
        acting: bool,
    },

    /// The identity service could not answer
    #[error("Identity lookup failed: {0}")]
    Identity(#[from] PortError),
}

impl Classify for PartyError {
    /// The acting side's own standing is a permission problem; the
    /// counterpart's standing makes the request itself unservable.
    fn kind(&self) -> ErrorKind {
        match self {
            PartyError::UserBannedOrDeleted { acting, .. }
            | PartyError::AccountSuspended { acting, .. } => {
                if *acting {
                    ErrorKind::Forbidden
                } else {
                    ErrorKind::Validation
                }
            }
            PartyError::Identity(e) => e.kind(),
        }
    }
}
