//! Party Domain
//!
//! Account standing and acting roles for the hiring engine. User records
//! live in an external identity service; this crate only models what the
//! engine needs to know about a caller:
//!
//! - **AccountStatus**: whether the account may act (active, suspended,
//!   banned, deleted)
//! - **PartyRole**: which side of a hiring the user is on
//! - **Actor**: the authenticated caller and their platform role
//!
//! # Examples
//!
//! ```rust
//! use core_kernel::UserId;
//! use domain_party::{Actor, AccountStatus};
//!
//! let moderator = Actor::moderator(UserId::new());
//! assert!(moderator.can_moderate());
//! assert!(!AccountStatus::Banned.is_active());
//! ```

pub mod account;
pub mod error;
pub mod ports;

pub use account::{AccountStatus, Actor, ActorRole, PartyRole};
pub use error::PartyError;
pub use ports::{ensure_active, IdentityPort};
#[cfg(any(test, feature = "mock"))]
pub use ports::mock::MockIdentityPort;
