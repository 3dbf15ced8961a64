//! Cross-domain scenarios
//!
//! Each test drives the hiring, billing and claims services together over
//! the in-memory harness and a manual clock.

use rust_decimal_macros::dec;

use core_kernel::{EngineSettings, ErrorKind, Money};
use domain_billing::{PaymentWebhookEvent, ReconcileOutcome};
use domain_claims::{ComplianceStatus, ComplianceType, ResolutionType, ReviewDecision, Verdict};
use domain_hiring::{DeliveryEvent, HiringStatus, PaymentStatus};
use domain_party::AccountStatus;
use test_utils::{
    assert_attempts_contiguous, assert_error_kind, assert_hiring_status, ComplianceFixtures,
    FilingFixtures, QuoteTermsBuilder, TestEngine, WebhookEventBuilder,
};

mod quotation_window {
    use super::*;

    /// A three-day quote cannot be re-quoted after two days, only after it lapses
    #[tokio::test]
    async fn test_requote_waits_for_expiry() {
        let engine = TestEngine::new();
        let hiring = engine
            .quoted_hiring(QuoteTermsBuilder::new().with_validity_days(3))
            .await;
        assert_eq!(hiring.retry_count, 0);

        engine.advance_days(2);
        let early = engine.negotiator.request_requote(hiring.id, &engine.client).await;
        assert_error_kind(&early, ErrorKind::NotExpired);

        engine.advance_days(2);
        let requoted = engine
            .negotiator
            .request_requote(hiring.id, &engine.client)
            .await
            .unwrap();
        assert_hiring_status(&requoted, HiringStatus::PendingQuote);
        assert_eq!(requoted.retry_count, 1);
        assert!(requoted.current_quotation().is_none());
    }

    #[tokio::test]
    async fn test_requote_limit_is_enforced() {
        let engine = TestEngine::with_settings(EngineSettings::default().with_requote_limit(1));
        let hiring = engine
            .quoted_hiring(QuoteTermsBuilder::new().with_validity_days(1))
            .await;

        engine.advance_days(1);
        engine
            .negotiator
            .request_requote(hiring.id, &engine.client)
            .await
            .unwrap();
        engine
            .negotiator
            .create_quotation(
                hiring.id,
                &engine.provider,
                QuoteTermsBuilder::new().with_validity_days(1).build(),
            )
            .await
            .unwrap();

        engine.advance_days(1);
        let second = engine.negotiator.request_requote(hiring.id, &engine.client).await;
        assert_error_kind(&second, ErrorKind::LimitReached);

        let stored = engine.hiring(hiring.id).await;
        assert_eq!(stored.retry_count, 1);
        assert_eq!(stored.quotations.len(), 2);
    }

    #[tokio::test]
    async fn test_checkout_refused_once_quote_expires() {
        let engine = TestEngine::new();
        let hiring = engine
            .quoted_hiring(QuoteTermsBuilder::new().with_validity_days(2))
            .await;

        engine.advance_days(2);
        let result = engine
            .hirings
            .initiate_checkout(hiring.id, &engine.client, "pref-late".into())
            .await;
        assert!(result.is_err());
        assert_hiring_status(&engine.hiring(hiring.id).await, HiringStatus::Quoted);
    }
}

mod payment_reconciliation {
    use super::*;

    /// A late rejection never takes a paid hiring back
    #[tokio::test]
    async fn test_rejection_after_payment_is_ignored() {
        let engine = TestEngine::new();
        let hiring = engine.paid_hiring().await;

        let result = engine
            .webhook(
                WebhookEventBuilder::for_hiring(&hiring)
                    .payment_id("pay-late")
                    .status("rejected")
                    .build(),
            )
            .await
            .unwrap();
        assert_eq!(result.outcome, ReconcileOutcome::IgnoredAfterPaid);
        assert_eq!(result.hiring_status, HiringStatus::Paid);

        let stored = engine.hiring(hiring.id).await;
        assert_hiring_status(&stored, HiringStatus::Paid);
        assert_eq!(stored.payment_status, Some(PaymentStatus::Confirmed));
    }

    #[tokio::test]
    async fn test_replayed_approval_is_idempotent() {
        let engine = TestEngine::new();
        let hiring = engine.checked_out_hiring().await;
        let event = WebhookEventBuilder::for_hiring(&hiring).payment_id("pay-42").build();

        let first = engine.webhook(event.clone()).await.unwrap();
        let version_after_first = engine.hiring(hiring.id).await.version;
        let replay = engine.webhook(event).await.unwrap();

        assert_eq!(first.outcome, ReconcileOutcome::Applied);
        assert_eq!(replay.outcome, ReconcileOutcome::AlreadyApplied);
        assert_eq!(engine.hiring(hiring.id).await.version, version_after_first);
        assert_eq!(engine.audit.records().await.len(), 2);
    }

    #[tokio::test]
    async fn test_rejected_then_retried_checkout_gets_paid() {
        let engine = TestEngine::new();
        let hiring = engine.checked_out_hiring().await;

        let rejection = WebhookEventBuilder::for_hiring(&hiring).status("rejected").build();
        let rejected = engine.webhook(rejection.clone()).await.unwrap();
        assert_eq!(rejected.hiring_status, HiringStatus::PaymentRejected);

        engine
            .hirings
            .initiate_checkout(hiring.id, &engine.client, "pref-retry".into())
            .await
            .unwrap();
        let redelivered = engine.webhook(rejection).await.unwrap();
        assert_eq!(redelivered.outcome, ReconcileOutcome::AlreadyApplied);
        assert_eq!(redelivered.hiring_status, HiringStatus::PaymentPending);

        let approved = engine
            .webhook(WebhookEventBuilder::for_preference("pref-retry").payment_id("pay-2").build())
            .await
            .unwrap();
        assert_eq!(approved.hiring_status, HiringStatus::Paid);
    }

    #[tokio::test]
    async fn test_unmatched_event_is_still_audited() {
        let engine = TestEngine::new();
        let result = engine
            .webhook(PaymentWebhookEvent::new("pay-x", "approved", "not-a-hiring"))
            .await;

        assert_error_kind(&result, ErrorKind::NotFound);
        let records = engine.audit.records().await;
        assert_eq!(records.len(), 1);
        assert!(records[0].hiring_id.is_none());
    }
}

mod claim_lifecycle {
    use super::*;

    #[tokio::test]
    async fn test_second_claim_while_one_is_open_conflicts() {
        let engine = TestEngine::new();
        let (hiring, _claim) = engine.disputed_hiring(FilingFixtures::not_delivered()).await;
        assert_hiring_status(&hiring, HiringStatus::Disputed);

        let second = engine
            .claims
            .file_claim(hiring.id, &engine.provider, FilingFixtures::scope_creep())
            .await;
        assert_error_kind(&second, ErrorKind::Conflict);
        assert_eq!(engine.claims.claims_for_hiring(hiring.id).await.unwrap().len(), 1);
    }

    /// A client-favoured verdict with no follow-up hands the hiring back as it was
    #[tokio::test]
    async fn test_client_favor_restores_prior_status() {
        let engine = TestEngine::new();
        let (hiring, claim) = engine.disputed_hiring(FilingFixtures::poor_quality()).await;

        let resolution = engine
            .resolve(&claim, Verdict::Resolved(ResolutionType::ClientFavor), Vec::new())
            .await;
        assert_eq!(resolution.hiring_status, HiringStatus::Paid);

        let stored = engine.hiring(hiring.id).await;
        assert_hiring_status(&stored, HiringStatus::Paid);
        assert!(stored.dispute_claim_id.is_none());
        assert!(engine.claims.get_claim(claim.id).await.unwrap().is_closed());

        // the hiring can move on once released
        let started = engine
            .hirings
            .apply_delivery_event(hiring.id, DeliveryEvent::Started)
            .await
            .unwrap();
        assert_hiring_status(&started, HiringStatus::InProgress);
    }

    #[tokio::test]
    async fn test_suspended_client_cannot_file() {
        let engine = TestEngine::new();
        let hiring = engine.paid_hiring().await;
        engine
            .set_account(engine.client.user_id, AccountStatus::Suspended)
            .await;

        let result = engine
            .claims
            .file_claim(hiring.id, &engine.client, FilingFixtures::not_delivered())
            .await;
        assert!(result.is_err());
        assert_hiring_status(&engine.hiring(hiring.id).await, HiringStatus::Paid);
    }
}

mod compliance_tracking {
    use super::*;

    /// A submission one day past a five-day deadline is refused
    #[tokio::test]
    async fn test_submission_after_deadline_is_refused() {
        let engine = TestEngine::new();
        let (_, claim) = engine.disputed_hiring(FilingFixtures::not_delivered()).await;
        let resolution = engine
            .resolve(
                &claim,
                Verdict::Resolved(ResolutionType::ClientFavor),
                vec![ComplianceFixtures::redeliver(engine.provider.user_id, 5)],
            )
            .await;
        let compliance = &resolution.compliances[0];

        engine.advance_days(6);
        let late = engine
            .tracker
            .submit(compliance.id, &engine.provider, vec!["https://files.example/v2.zip".into()], None)
            .await;
        assert_error_kind(&late, ErrorKind::DeadlineExceeded);
        assert!(!engine.claims.is_fully_discharged(claim.id).await.unwrap());
    }

    /// Two obligations must both be approved before the claim closes
    #[tokio::test]
    async fn test_claim_closes_when_every_compliance_is_approved() {
        let engine = TestEngine::new();
        let (hiring, claim) = engine.disputed_hiring(FilingFixtures::poor_quality()).await;
        let resolution = engine
            .resolve(
                &claim,
                Verdict::Resolved(ResolutionType::PartialAgreement),
                vec![
                    ComplianceFixtures::partial_refund(engine.provider.user_id, 5),
                    ComplianceFixtures::request(
                        engine.client.user_id,
                        ComplianceType::ConfirmationOnly,
                        3,
                    ),
                ],
            )
            .await;
        assert_eq!(resolution.compliances.len(), 2);
        assert_eq!(resolution.hiring_status, HiringStatus::Disputed);

        let refund = engine
            .tracker
            .submit(
                resolution.compliances[0].id,
                &engine.provider,
                vec!["https://files.example/refund-receipt.pdf".into()],
                Some("refunded through the gateway".into()),
            )
            .await
            .unwrap();
        engine
            .tracker
            .review_submission(refund.id, &engine.moderator, ReviewDecision::Approve, None)
            .await
            .unwrap();
        assert!(!engine.claims.is_fully_discharged(claim.id).await.unwrap());
        assert_hiring_status(&engine.hiring(hiring.id).await, HiringStatus::Disputed);

        let confirmation = engine
            .tracker
            .submit(resolution.compliances[1].id, &engine.client, Vec::new(), Some("received".into()))
            .await
            .unwrap();
        let approved = engine
            .tracker
            .review_submission(confirmation.id, &engine.moderator, ReviewDecision::Approve, None)
            .await
            .unwrap();
        assert_eq!(approved.status, ComplianceStatus::Approved);

        assert!(engine.claims.is_fully_discharged(claim.id).await.unwrap());
        assert!(engine.claims.get_claim(claim.id).await.unwrap().is_closed());
        assert_hiring_status(&engine.hiring(hiring.id).await, HiringStatus::ResolvedCancelled);
    }

    #[tokio::test]
    async fn test_rejected_submission_allows_a_second_attempt() {
        let engine = TestEngine::new();
        let (_, claim) = engine.disputed_hiring(FilingFixtures::not_delivered()).await;
        let resolution = engine
            .resolve(
                &claim,
                Verdict::Resolved(ResolutionType::ProviderFavor),
                vec![ComplianceFixtures::redeliver(engine.provider.user_id, 5)],
            )
            .await;
        let compliance_id = resolution.compliances[0].id;

        let first = engine
            .tracker
            .submit(compliance_id, &engine.provider, vec!["https://files.example/a.zip".into()], None)
            .await
            .unwrap();
        engine
            .tracker
            .review_submission(
                first.id,
                &engine.moderator,
                ReviewDecision::Reject {
                    rejection_reason: "archive is empty".into(),
                },
                None,
            )
            .await
            .unwrap();

        engine.advance_days(4);
        let second = engine
            .tracker
            .submit(compliance_id, &engine.provider, vec!["https://files.example/b.zip".into()], None)
            .await
            .unwrap();
        assert_eq!(second.attempt_number, 2);

        let compliances = engine.claims.list_compliances(claim.id).await.unwrap();
        assert_attempts_contiguous(&compliances[0]);
    }

    #[tokio::test]
    async fn test_attempt_cap_abandons_compliance() {
        let engine = TestEngine::with_settings(
            EngineSettings::default().with_max_submission_attempts(Some(1)),
        );
        let (hiring, claim) = engine.disputed_hiring(FilingFixtures::not_delivered()).await;
        let resolution = engine
            .resolve(
                &claim,
                Verdict::Resolved(ResolutionType::ProviderFavor),
                vec![ComplianceFixtures::redeliver(engine.provider.user_id, 5)],
            )
            .await;

        let only = engine
            .tracker
            .submit(resolution.compliances[0].id, &engine.provider, Vec::new(), None)
            .await
            .unwrap();
        let reviewed = engine
            .tracker
            .review_submission(only.id, &engine.moderator, ReviewDecision::Adjust, None)
            .await
            .unwrap();

        assert_eq!(reviewed.status, ComplianceStatus::Abandoned);
        assert!(engine.claims.get_claim(claim.id).await.unwrap().is_closed());
        assert_hiring_status(&engine.hiring(hiring.id).await, HiringStatus::ResolvedCompleted);
    }

    #[tokio::test]
    async fn test_sweep_abandons_overdue_compliance() {
        let engine = TestEngine::new();
        let (_, claim) = engine.disputed_hiring(FilingFixtures::not_delivered()).await;
        let resolution = engine
            .resolve(
                &claim,
                Verdict::Resolved(ResolutionType::ClientFavor),
                vec![ComplianceFixtures::partial_refund(engine.provider.user_id, 5)],
            )
            .await;

        assert!(engine.tracker.sweep_overdue().await.unwrap().is_empty());

        engine.advance_days(30);
        let abandoned = engine.tracker.sweep_overdue().await.unwrap();
        assert_eq!(abandoned, vec![resolution.compliances[0].id]);
        assert!(engine.claims.is_fully_discharged(claim.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_partial_refund_keeps_its_amount() {
        let engine = TestEngine::new();
        let (_, claim) = engine.disputed_hiring(FilingFixtures::poor_quality()).await;
        let resolution = engine
            .resolve(
                &claim,
                Verdict::Resolved(ResolutionType::ClientFavor),
                vec![ComplianceFixtures::partial_refund(engine.provider.user_id, 5)],
            )
            .await;

        match &resolution.compliances[0].compliance_type {
            ComplianceType::PartialRefund { amount } => {
                assert_eq!(*amount, Money::new(dec!(75.00), core_kernel::Currency::USD));
            }
            other => panic!("unexpected compliance type {other:?}"),
        }
    }
}
