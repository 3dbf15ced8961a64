//! Claims Domain
//!
//! Disputes raised by either party of a paid hiring, their resolution by a
//! moderator, and the compliances a resolution imposes on the parties.
//!
//! # Architecture
//!
//! - **Aggregates**: `Claim` and `ClaimCompliance` (which owns its
//!   append-only submission history)
//! - **Domain Services**: `ClaimEngine` for filing and resolving,
//!   `ComplianceTracker` for the submission cycle and the overdue sweep
//! - **Domain Events**: `ClaimEvent`, published to the structured log
//!
//! # Claim Lifecycle
//!
//! ```text
//! open -> in_review -> resolved | rejected
//!   \_______________/^
//! ```
//!
//! Filing a claim moves the hiring into `disputed`. The hiring leaves it
//! once the claim is rejected, or resolved and every compliance has been
//! approved or abandoned.

pub mod claim;
pub mod compliance;
pub mod submission;
pub mod events;
pub mod error;
pub mod ports;
pub mod engine;
pub mod tracker;

#[cfg(test)]
mod test_support;

pub use claim::{
    Claim, ClaimFiling, ClaimStatus, ClaimType, ClientClaimType, ProviderClaimType, Resolution,
    ResolutionType, Verdict,
};
pub use compliance::{ClaimCompliance, ComplianceRequest, ComplianceStatus, ComplianceType};
pub use submission::{
    ComplianceSubmission, ModeratorReview, PeerReview, ReviewDecision, SubmissionStatus,
};
pub use events::ClaimEvent;
pub use error::ClaimError;
pub use ports::ClaimRepository;
#[cfg(any(test, feature = "mock"))]
pub use ports::mock::MockClaimRepository;
pub use engine::{ClaimEngine, ClaimResolution};
pub use tracker::ComplianceTracker;
