//! Claim compliances
//!
//! A compliance is an obligation a resolution imposes on one party of the
//! hiring: refund, pay, redo work, upload evidence or just confirm. Its
//! submissions form an append-only attempt history.
//!
//! ```text
//! pending --submit--> under_review --approve--> approved
//!    ^                     |
//!    +---reject/adjust-----+          (deadline anchor reset)
//!
//! pending | under_review --attempts exhausted / overdue--> abandoned
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{ClaimId, ComplianceId, Deadline, HiringId, Money, SubmissionId, UserId};

use crate::error::ClaimError;
use crate::events::ClaimEvent;
use crate::submission::{ComplianceSubmission, PeerReview, ReviewDecision, ModeratorReview};

/// What the responsible user has to do
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComplianceType {
    FullRefund,
    PartialRefund { amount: Money },
    FullPayment,
    PartialPayment { amount: Money },
    CompleteWork,
    ReviseWork,
    DeliverFiles,
    RedeliverFiles,
    UploadEvidence,
    ConfirmationOnly,
    Other { description: String },
}

impl ComplianceType {
    pub fn code(&self) -> &'static str {
        match self {
            ComplianceType::FullRefund => "full_refund",
            ComplianceType::PartialRefund { .. } => "partial_refund",
            ComplianceType::FullPayment => "full_payment",
            ComplianceType::PartialPayment { .. } => "partial_payment",
            ComplianceType::CompleteWork => "complete_work",
            ComplianceType::ReviseWork => "revise_work",
            ComplianceType::DeliverFiles => "deliver_files",
            ComplianceType::RedeliverFiles => "redeliver_files",
            ComplianceType::UploadEvidence => "upload_evidence",
            ComplianceType::ConfirmationOnly => "confirmation_only",
            ComplianceType::Other { .. } => "other",
        }
    }

    pub fn amount(&self) -> Option<Money> {
        match self {
            ComplianceType::PartialRefund { amount } | ComplianceType::PartialPayment { amount } => {
                Some(*amount)
            }
            _ => None,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            ComplianceType::Other { description } => Some(description),
            _ => None,
        }
    }

    /// Rebuilds a compliance type from its stored parts
    pub fn from_parts(
        code: &str,
        amount: Option<Money>,
        description: Option<String>,
    ) -> Result<Self, ClaimError> {
        let amount = || {
            amount.ok_or_else(|| ClaimError::validation(format!("compliance type {code} requires an amount")))
        };
        Ok(match code {
            "full_refund" => ComplianceType::FullRefund,
            "partial_refund" => ComplianceType::PartialRefund { amount: amount()? },
            "full_payment" => ComplianceType::FullPayment,
            "partial_payment" => ComplianceType::PartialPayment { amount: amount()? },
            "complete_work" => ComplianceType::CompleteWork,
            "revise_work" => ComplianceType::ReviseWork,
            "deliver_files" => ComplianceType::DeliverFiles,
            "redeliver_files" => ComplianceType::RedeliverFiles,
            "upload_evidence" => ComplianceType::UploadEvidence,
            "confirmation_only" => ComplianceType::ConfirmationOnly,
            "other" => ComplianceType::Other {
                description: description
                    .ok_or_else(|| ClaimError::validation("compliance type 'other' requires a description"))?,
            },
            other => return Err(ClaimError::validation(format!("unknown compliance type: {other}"))),
        })
    }

    fn validate(&self) -> Result<(), ClaimError> {
        if let Some(amount) = self.amount() {
            if !amount.is_positive() {
                return Err(ClaimError::validation("compliance amount must be positive"));
            }
        }
        if self.description().is_some_and(|d| d.trim().is_empty()) {
            return Err(ClaimError::validation("compliance type 'other' requires a description"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    Pending,
    UnderReview,
    Approved,
    Abandoned,
}

impl ComplianceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceStatus::Pending => "pending",
            ComplianceStatus::UnderReview => "under_review",
            ComplianceStatus::Approved => "approved",
            ComplianceStatus::Abandoned => "abandoned",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ComplianceStatus::Approved | ComplianceStatus::Abandoned)
    }
}

impl fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComplianceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ComplianceStatus::Pending),
            "under_review" => Ok(ComplianceStatus::UnderReview),
            "approved" => Ok(ComplianceStatus::Approved),
            "abandoned" => Ok(ComplianceStatus::Abandoned),
            other => Err(format!("unknown compliance status: {other}")),
        }
    }
}

/// A compliance requested by the moderator when resolving a claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceRequest {
    pub responsible_user_id: UserId,
    pub compliance_type: ComplianceType,
    pub instructions: String,
    pub deadline_days: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimCompliance {
    pub id: ComplianceId,
    pub claim_id: ClaimId,
    pub hiring_id: HiringId,
    pub responsible_user_id: UserId,
    pub compliance_type: ComplianceType,
    pub instructions: String,
    pub deadline_days: u32,
    /// Position within the resolution, starting at 1
    pub order: u32,
    pub status: ComplianceStatus,
    /// Start of the current deadline; moves on every rejection or adjustment
    pub deadline_anchor: DateTime<Utc>,
    pub submissions: Vec<ComplianceSubmission>,
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<ClaimEvent>,
}

impl ClaimCompliance {
    pub fn new(
        claim_id: ClaimId,
        hiring_id: HiringId,
        order: u32,
        request: ComplianceRequest,
        now: DateTime<Utc>,
    ) -> Result<Self, ClaimError> {
        if request.deadline_days < 1 {
            return Err(ClaimError::validation("deadline_days must be at least 1"));
        }
        if request.instructions.trim().is_empty() {
            return Err(ClaimError::validation("compliance instructions must not be blank"));
        }
        request.compliance_type.validate()?;

        Ok(Self {
            id: ComplianceId::new_v7(),
            claim_id,
            hiring_id,
            responsible_user_id: request.responsible_user_id,
            compliance_type: request.compliance_type,
            instructions: request.instructions,
            deadline_days: request.deadline_days,
            order,
            status: ComplianceStatus::Pending,
            deadline_anchor: now,
            submissions: Vec::new(),
            version: 1,
            created_at: now,
            updated_at: now,
            events: Vec::new(),
        })
    }

    pub fn take_events(&mut self) -> Vec<ClaimEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn deadline(&self) -> Deadline {
        Deadline::new(self.deadline_anchor, self.deadline_days)
    }

    /// Still pending and past its deadline
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == ComplianceStatus::Pending && self.deadline().is_exceeded(now)
    }

    pub fn latest_submission(&self) -> Option<&ComplianceSubmission> {
        self.submissions.iter().max_by_key(|s| s.attempt_number)
    }

    /// Satisfied only when the latest attempt was approved
    pub fn is_satisfied(&self) -> bool {
        self.latest_submission()
            .is_some_and(|s| s.status == crate::submission::SubmissionStatus::Approved)
    }

    pub fn attempts_used(&self) -> u32 {
        self.submissions.len() as u32
    }

    pub fn submission(&self, id: SubmissionId) -> Option<&ComplianceSubmission> {
        self.submissions.iter().find(|s| s.id == id)
    }

    fn submission_mut(&mut self, id: SubmissionId) -> Result<&mut ComplianceSubmission, ClaimError> {
        self.submissions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(ClaimError::SubmissionNotFound(id))
    }

    fn invalid_state(&self, action: &'static str) -> ClaimError {
        ClaimError::ComplianceInvalidState {
            compliance_id: self.id,
            status: self.status,
            action,
        }
    }

    /// Appends the next attempt and puts the compliance under review
    ///
    /// Checks in order: status is `pending`, deadline not passed, attempt
    /// budget not consumed.
    pub fn submit(
        &mut self,
        submitted_by: UserId,
        evidence_urls: Vec<String>,
        user_notes: Option<String>,
        max_attempts: Option<u32>,
        now: DateTime<Utc>,
    ) -> Result<&ComplianceSubmission, ClaimError> {
        if self.status != ComplianceStatus::Pending {
            return Err(self.invalid_state("submit to"));
        }
        let deadline = self.deadline();
        if deadline.is_exceeded(now) {
            return Err(ClaimError::DeadlineExceeded {
                compliance_id: self.id,
                due_at: deadline.due_at(),
            });
        }
        if let Some(limit) = max_attempts {
            if self.attempts_used() >= limit {
                return Err(ClaimError::AttemptLimitReached {
                    compliance_id: self.id,
                    limit,
                });
            }
        }

        let attempt_number = self
            .submissions
            .iter()
            .map(|s| s.attempt_number)
            .max()
            .unwrap_or(0)
            + 1;
        let submission = ComplianceSubmission::new(
            self.id,
            attempt_number,
            submitted_by,
            evidence_urls,
            user_notes,
            now,
        );
        self.events.push(ClaimEvent::SubmissionReceived {
            claim_id: self.claim_id,
            compliance_id: self.id,
            submission_id: submission.id,
            attempt_number,
            timestamp: now,
        });
        self.submissions.push(submission);
        self.status = ComplianceStatus::UnderReview;
        self.updated_at = now;

        let last = self.submissions.len() - 1;
        Ok(&self.submissions[last])
    }

    /// Applies the moderator's decision to a pending submission
    ///
    /// Reject and adjust reopen the compliance with a fresh deadline, unless
    /// the attempt budget is spent, in which case it is abandoned.
    pub fn review(
        &mut self,
        submission_id: SubmissionId,
        reviewed_by: UserId,
        decision: ReviewDecision,
        notes: Option<String>,
        max_attempts: Option<u32>,
        now: DateTime<Utc>,
    ) -> Result<ComplianceStatus, ClaimError> {
        if self.status != ComplianceStatus::UnderReview {
            return Err(self.invalid_state("review"));
        }
        let compliance_id = self.id;
        let submission = self.submission_mut(submission_id)?;
        if !submission.is_pending_review() {
            return Err(ClaimError::validation(format!(
                "submission {submission_id} was already reviewed as {}",
                submission.status
            )));
        }
        submission.status = decision.submission_status();
        submission.review = Some(ModeratorReview {
            reviewed_by,
            decision: decision.clone(),
            notes,
            reviewed_at: now,
        });
        let submission_status = submission.status;

        self.status = match decision {
            ReviewDecision::Approve => ComplianceStatus::Approved,
            _ if max_attempts.is_some_and(|limit| self.attempts_used() >= limit) => {
                tracing::warn!(%compliance_id, attempts = self.attempts_used(), "compliance attempts exhausted");
                ComplianceStatus::Abandoned
            }
            _ => {
                self.deadline_anchor = now;
                ComplianceStatus::Pending
            }
        };
        self.updated_at = now;

        self.events.push(ClaimEvent::SubmissionReviewed {
            claim_id: self.claim_id,
            compliance_id,
            submission_id,
            submission_status,
            compliance_status: self.status,
            timestamp: now,
        });
        Ok(self.status)
    }

    /// Records a peer opinion next to the moderator's review
    pub fn peer_review(
        &mut self,
        submission_id: SubmissionId,
        reviewer: UserId,
        peer_approved: bool,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<&ComplianceSubmission, ClaimError> {
        let submission = self.submission_mut(submission_id)?;
        if submission.submitted_by == reviewer {
            return Err(ClaimError::Forbidden {
                user_id: reviewer,
                action: "peer review their own submission",
            });
        }
        if submission.peer_review.is_some() {
            return Err(ClaimError::validation(format!(
                "submission {submission_id} already has a peer review"
            )));
        }
        submission.peer_review = Some(PeerReview {
            peer_reviewed_by: reviewer,
            peer_approved,
            peer_review_reason: reason,
            peer_reviewed_at: now,
        });
        self.updated_at = now;
        self.submission(submission_id)
            .ok_or(ClaimError::SubmissionNotFound(submission_id))
    }

    /// Forces the compliance into `abandoned`
    pub fn abandon(&mut self, reason: &'static str, now: DateTime<Utc>) -> Result<(), ClaimError> {
        if self.status.is_terminal() {
            return Err(self.invalid_state("abandon"));
        }
        self.status = ComplianceStatus::Abandoned;
        self.updated_at = now;
        self.events.push(ClaimEvent::ComplianceAbandoned {
            claim_id: self.claim_id,
            compliance_id: self.id,
            reason: reason.to_string(),
            timestamp: now,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submission::SubmissionStatus;
    use chrono::{Duration, TimeZone};
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 1, 9, 0, 0).unwrap()
    }

    fn compliance(deadline_days: u32) -> (ClaimCompliance, UserId) {
        let user = UserId::new();
        let c = ClaimCompliance::new(
            ClaimId::new(),
            HiringId::new(),
            1,
            ComplianceRequest {
                responsible_user_id: user,
                compliance_type: ComplianceType::PartialRefund {
                    amount: Money::new(dec!(40), Currency::USD),
                },
                instructions: "refund the second milestone".into(),
                deadline_days,
            },
            t0(),
        )
        .unwrap();
        (c, user)
    }

    fn reject() -> ReviewDecision {
        ReviewDecision::Reject {
            rejection_reason: "receipt missing".into(),
        }
    }

    #[test]
    fn test_submission_after_deadline_fails() {
        let (mut c, user) = compliance(5);
        let err = c
            .submit(user, vec![], None, None, t0() + Duration::days(6))
            .unwrap_err();
        assert!(matches!(err, ClaimError::DeadlineExceeded { .. }));
        assert!(c.submit(user, vec![], None, None, t0() + Duration::days(5)).is_ok());
    }

    #[test]
    fn test_rejection_reopens_with_new_anchor() {
        let (mut c, user) = compliance(2);
        let first = c.submit(user, vec!["https://r/1".into()], None, None, t0()).unwrap().id;
        let later = t0() + Duration::days(2);
        let status = c.review(first, UserId::new(), reject(), None, None, later).unwrap();

        assert_eq!(status, ComplianceStatus::Pending);
        assert_eq!(c.deadline_anchor, later);
        assert_eq!(c.submissions[0].status, SubmissionStatus::Rejected);

        let second = c.submit(user, vec![], None, None, later + Duration::days(1)).unwrap();
        assert_eq!(second.attempt_number, 2);
    }

    #[test]
    fn test_exhausted_attempts_abandon() {
        let (mut c, user) = compliance(3);
        let id = c.submit(user, vec![], None, Some(1), t0()).unwrap().id;
        let status = c
            .review(id, UserId::new(), ReviewDecision::Adjust, None, Some(1), t0())
            .unwrap();
        assert_eq!(status, ComplianceStatus::Abandoned);
        assert!(!c.is_satisfied());
    }

    #[test]
    fn test_submit_while_under_review_is_invalid_state() {
        let (mut c, user) = compliance(3);
        c.submit(user, vec![], None, None, t0()).unwrap();
        let err = c.submit(user, vec![], None, None, t0()).unwrap_err();
        assert!(matches!(err, ClaimError::ComplianceInvalidState { .. }));
    }

    #[test]
    fn test_peer_review_does_not_change_status() {
        let (mut c, user) = compliance(3);
        let id = c.submit(user, vec![], None, None, t0()).unwrap().id;

        let err = c.peer_review(id, user, true, None, t0()).unwrap_err();
        assert!(matches!(err, ClaimError::Forbidden { .. }));

        c.peer_review(id, UserId::new(), false, Some("looks edited".into()), t0()).unwrap();
        assert_eq!(c.status, ComplianceStatus::UnderReview);
        assert_eq!(c.submissions[0].status, SubmissionStatus::PendingReview);
    }

    #[test]
    fn test_approval_is_terminal() {
        let (mut c, user) = compliance(3);
        let id = c.submit(user, vec![], None, None, t0()).unwrap().id;
        c.review(id, UserId::new(), ReviewDecision::Approve, None, None, t0()).unwrap();
        assert!(c.status.is_terminal());
        assert!(c.is_satisfied());
        assert!(c.abandon("overdue", t0()).is_err());
    }

    #[test]
    fn test_invalid_requests_rejected() {
        let mut request = ComplianceRequest {
            responsible_user_id: UserId::new(),
            compliance_type: ComplianceType::Other { description: " ".into() },
            instructions: "explain".into(),
            deadline_days: 3,
        };
        assert!(ClaimCompliance::new(ClaimId::new(), HiringId::new(), 1, request.clone(), t0()).is_err());

        request.compliance_type = ComplianceType::ConfirmationOnly;
        request.deadline_days = 0;
        assert!(ClaimCompliance::new(ClaimId::new(), HiringId::new(), 1, request, t0()).is_err());
    }
}
