//! Tests for the claim and compliance aggregates through the public API

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal_macros::dec;

use core_kernel::{Classify, ClaimId, Currency, ErrorKind, HiringId, Money, UserId};
use domain_hiring::DisputeOutcome;
use domain_party::PartyRole;

use domain_claims::{
    Claim, ClaimCompliance, ClaimError, ClaimFiling, ClaimStatus, ClaimType, ClientClaimType,
    ComplianceRequest, ComplianceStatus, ComplianceType, ProviderClaimType, ResolutionType,
    ReviewDecision, SubmissionStatus, Verdict,
};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 14, 8, 30, 0).unwrap()
}

fn filing(claim_type: ClaimType) -> ClaimFiling {
    ClaimFiling {
        claim_type,
        description: "the logo files were never sent".into(),
        evidence_urls: vec!["https://evidence.example/1.png".into()],
    }
}

// ============================================================================
// Claim aggregate
// ============================================================================

mod claim_lifecycle {
    use super::*;

    fn open_claim() -> Claim {
        Claim::file(
            HiringId::new(),
            UserId::new(),
            filing(ClaimType::Client(ClientClaimType::NotDelivered)),
            10,
            t0(),
        )
        .unwrap()
    }

    #[test]
    fn test_filed_claim_is_open() {
        let mut claim = open_claim();
        assert_eq!(claim.status, ClaimStatus::Open);
        assert!(claim.status.is_active());
        assert!(claim.verdict().is_none());
        assert_eq!(claim.take_events().len(), 1);
    }

    #[test]
    fn test_blank_description_and_evidence_limit() {
        let mut f = filing(ClaimType::Client(ClientClaimType::PoorQuality));
        f.description = "   ".into();
        let err = Claim::file(HiringId::new(), UserId::new(), f, 10, t0()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let mut f = filing(ClaimType::Client(ClientClaimType::PoorQuality));
        f.evidence_urls = (0..4).map(|i| format!("https://e/{i}")).collect();
        assert!(Claim::file(HiringId::new(), UserId::new(), f, 3, t0()).is_err());
    }

    #[test]
    fn test_other_requires_reason() {
        let f = filing(ClaimType::Provider(ProviderClaimType::Other { reason: "".into() }));
        assert!(Claim::file(HiringId::new(), UserId::new(), f, 10, t0()).is_err());
    }

    #[test]
    fn test_resolve_from_open_or_in_review() {
        let moderator = UserId::new();

        let mut direct = open_claim();
        direct
            .resolve(Verdict::Resolved(ResolutionType::ProviderFavor), "work was done", moderator, 0, t0())
            .unwrap();
        assert_eq!(direct.status, ClaimStatus::Resolved);
        assert_eq!(direct.reviewer_id, Some(moderator));

        let mut reviewed = open_claim();
        reviewed.start_review(moderator, t0()).unwrap();
        reviewed.resolve(Verdict::Rejected, "no evidence", moderator, 0, t0()).unwrap();
        assert_eq!(reviewed.status, ClaimStatus::Rejected);
        assert!(reviewed.start_review(moderator, t0()).is_err());
    }

    #[test]
    fn test_close_reports_outcome_once_resolved() {
        let mut claim = open_claim();
        assert!(matches!(claim.close(t0()), Err(ClaimError::ClaimInvalidState { .. })));

        claim
            .resolve(Verdict::Resolved(ResolutionType::PartialAgreement), "split", UserId::new(), 0, t0())
            .unwrap();
        assert_eq!(claim.close(t0()).unwrap(), DisputeOutcome::Cancel);
        assert!(claim.is_closed());
    }

    #[test]
    fn test_verdict_outcomes() {
        assert_eq!(Verdict::Rejected.dispute_outcome(), DisputeOutcome::Restore);
        assert_eq!(
            Verdict::Resolved(ResolutionType::ClientFavor).dispute_outcome(),
            DisputeOutcome::Restore
        );
        assert_eq!(
            Verdict::Resolved(ResolutionType::ProviderFavor).dispute_outcome(),
            DisputeOutcome::Complete
        );
    }

    #[test]
    fn test_verdict_from_parts() {
        assert_eq!(
            Verdict::from_parts(ClaimStatus::Resolved, Some(ResolutionType::ClientFavor)).unwrap(),
            Verdict::Resolved(ResolutionType::ClientFavor)
        );
        assert!(Verdict::from_parts(ClaimStatus::Resolved, None).is_err());
        assert!(Verdict::from_parts(ClaimStatus::Rejected, Some(ResolutionType::ClientFavor)).is_err());
        assert!(Verdict::from_parts(ClaimStatus::InReview, None).is_err());
    }

    #[test]
    fn test_claim_type_codes_round_trip_through_parts() {
        let provider = ClaimType::from_parts(PartyRole::Provider, "scope_creep", None).unwrap();
        assert_eq!(provider, ClaimType::Provider(ProviderClaimType::ScopeCreep));
        assert_eq!(provider.role(), PartyRole::Provider);

        // client codes are not valid on the provider side
        assert!(ClaimType::from_parts(PartyRole::Provider, "not_delivered", None).is_err());
        assert!(ClaimType::from_parts(PartyRole::Client, "other", None).is_err());
    }
}

// ============================================================================
// Compliance aggregate
// ============================================================================

mod compliance_cycle {
    use super::*;

    fn compliance(responsible: UserId, days: u32) -> ClaimCompliance {
        ClaimCompliance::new(
            ClaimId::new(),
            HiringId::new(),
            1,
            ComplianceRequest {
                responsible_user_id: responsible,
                compliance_type: ComplianceType::PartialPayment {
                    amount: Money::new(dec!(75.50), Currency::EUR),
                },
                instructions: "pay the remaining milestone".into(),
                deadline_days: days,
            },
            t0(),
        )
        .unwrap()
    }

    #[test]
    fn test_deadline_boundary_is_inclusive() {
        let user = UserId::new();
        let mut c = compliance(user, 5);
        assert!(!c.is_overdue(t0() + Duration::days(5)));
        assert!(c.is_overdue(t0() + Duration::days(5) + Duration::seconds(1)));

        let err = c
            .submit(user, Vec::new(), None, None, t0() + Duration::days(6))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DeadlineExceeded);
    }

    #[test]
    fn test_attempts_keep_history() {
        let user = UserId::new();
        let moderator = UserId::new();
        let mut c = compliance(user, 3);

        let first = c.submit(user, Vec::new(), None, None, t0()).unwrap().id;
        c.review(first, moderator, ReviewDecision::Adjust, Some("add receipt".into()), None, t0())
            .unwrap();
        let second = c.submit(user, Vec::new(), None, None, t0()).unwrap().id;
        c.review(second, moderator, ReviewDecision::Approve, None, None, t0()).unwrap();

        assert_eq!(c.status, ComplianceStatus::Approved);
        assert_eq!(c.attempts_used(), 2);
        assert_eq!(c.submissions[0].status, SubmissionStatus::RequiresAdjustment);
        assert_eq!(c.latest_submission().map(|s| s.attempt_number), Some(2));
        assert!(c.is_satisfied());
    }

    #[test]
    fn test_reviewing_twice_is_refused() {
        let user = UserId::new();
        let mut c = compliance(user, 3);
        let id = c.submit(user, Vec::new(), None, None, t0()).unwrap().id;
        c.review(id, UserId::new(), ReviewDecision::Approve, None, None, t0()).unwrap();
        assert!(c
            .review(id, UserId::new(), ReviewDecision::Approve, None, None, t0())
            .is_err());
    }

    #[test]
    fn test_review_decision_from_parts() {
        assert_eq!(ReviewDecision::from_parts("approve", None).unwrap(), ReviewDecision::Approve);
        assert!(ReviewDecision::from_parts("reject", None).is_err());
        assert_eq!(
            ReviewDecision::from_parts("reject", Some("blurry".into()))
                .unwrap()
                .rejection_reason(),
            Some("blurry")
        );
        assert!(ReviewDecision::from_parts("escalate", None).is_err());
    }

    #[test]
    fn test_partial_amounts_must_be_positive() {
        let request = ComplianceRequest {
            responsible_user_id: UserId::new(),
            compliance_type: ComplianceType::PartialRefund {
                amount: Money::zero(Currency::USD),
            },
            instructions: "refund".into(),
            deadline_days: 2,
        };
        assert!(ClaimCompliance::new(ClaimId::new(), HiringId::new(), 1, request, t0()).is_err());
        assert!(ComplianceType::from_parts("partial_refund", None, None).is_err());
    }
}
