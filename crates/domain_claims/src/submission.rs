//! Compliance submissions
//!
//! Each attempt at meeting a compliance is kept forever, together with the
//! moderator's review and an optional advisory peer review.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{ComplianceId, SubmissionId, UserId};

use crate::error::ClaimError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    PendingReview,
    Approved,
    Rejected,
    RequiresAdjustment,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::PendingReview => "pending_review",
            SubmissionStatus::Approved => "approved",
            SubmissionStatus::Rejected => "rejected",
            SubmissionStatus::RequiresAdjustment => "requires_adjustment",
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending_review" => Ok(SubmissionStatus::PendingReview),
            "approved" => Ok(SubmissionStatus::Approved),
            "rejected" => Ok(SubmissionStatus::Rejected),
            "requires_adjustment" => Ok(SubmissionStatus::RequiresAdjustment),
            other => Err(format!("unknown submission status: {other}")),
        }
    }
}

/// Moderator decision on a submission
///
/// A rejection always carries its reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum ReviewDecision {
    Approve,
    Reject { rejection_reason: String },
    Adjust,
}

impl ReviewDecision {
    /// Builds a decision from its transport form
    pub fn from_parts(decision: &str, rejection_reason: Option<String>) -> Result<Self, ClaimError> {
        match decision {
            "approve" => Ok(ReviewDecision::Approve),
            "adjust" => Ok(ReviewDecision::Adjust),
            "reject" => match rejection_reason {
                Some(reason) if !reason.trim().is_empty() => Ok(ReviewDecision::Reject {
                    rejection_reason: reason,
                }),
                _ => Err(ClaimError::validation("rejecting a submission requires a rejection_reason")),
            },
            other => Err(ClaimError::validation(format!("unknown review decision: {other}"))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewDecision::Approve => "approve",
            ReviewDecision::Reject { .. } => "reject",
            ReviewDecision::Adjust => "adjust",
        }
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        match self {
            ReviewDecision::Reject { rejection_reason } => Some(rejection_reason),
            _ => None,
        }
    }

    pub(crate) fn submission_status(&self) -> SubmissionStatus {
        match self {
            ReviewDecision::Approve => SubmissionStatus::Approved,
            ReviewDecision::Reject { .. } => SubmissionStatus::Rejected,
            ReviewDecision::Adjust => SubmissionStatus::RequiresAdjustment,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeratorReview {
    pub reviewed_by: UserId,
    pub decision: ReviewDecision,
    pub notes: Option<String>,
    pub reviewed_at: DateTime<Utc>,
}

/// Advisory second opinion; never changes a status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerReview {
    pub peer_reviewed_by: UserId,
    pub peer_approved: bool,
    pub peer_review_reason: Option<String>,
    pub peer_reviewed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceSubmission {
    pub id: SubmissionId,
    pub compliance_id: ComplianceId,
    /// 1-based, gap-free per compliance
    pub attempt_number: u32,
    pub status: SubmissionStatus,
    pub submitted_by: UserId,
    pub evidence_urls: Vec<String>,
    pub user_notes: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub review: Option<ModeratorReview>,
    pub peer_review: Option<PeerReview>,
}

impl ComplianceSubmission {
    pub(crate) fn new(
        compliance_id: ComplianceId,
        attempt_number: u32,
        submitted_by: UserId,
        evidence_urls: Vec<String>,
        user_notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: SubmissionId::new_v7(),
            compliance_id,
            attempt_number,
            status: SubmissionStatus::PendingReview,
            submitted_by,
            evidence_urls,
            user_notes,
            submitted_at: now,
            review: None,
            peer_review: None,
        }
    }

    pub fn is_pending_review(&self) -> bool {
        self.status == SubmissionStatus::PendingReview
    }
}
