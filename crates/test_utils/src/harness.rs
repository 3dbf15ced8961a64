//! In-memory engine harness
//!
//! Wires every service over the mock adapters and a manual clock. The
//! helpers drive hirings through the public services, so a scenario test
//! only states the steps it is actually about.

use std::sync::Arc;

use chrono::Duration;

use core_kernel::{Clock, EngineSettings, HiringId, KeyedLocks, ManualClock, ServiceId, UserId};
use domain_billing::{MockPaymentAuditLog, PaymentReconciler, PaymentWebhookEvent, Reconciliation};
use domain_claims::{
    Claim, ClaimEngine, ClaimFiling, ClaimResolution, ComplianceRequest, ComplianceTracker,
    MockClaimRepository, Verdict,
};
use domain_hiring::{
    Hiring, HiringContext, HiringService, MockHiringRepository, QuotationNegotiator,
};
use domain_party::{AccountStatus, Actor, MockIdentityPort};

use crate::builders::QuoteTermsBuilder;
use crate::fixtures::TemporalFixtures;

/// Every engine service over shared in-memory state
pub struct TestEngine {
    pub hirings: HiringService,
    pub negotiator: QuotationNegotiator,
    pub reconciler: PaymentReconciler,
    pub claims: ClaimEngine,
    pub tracker: ComplianceTracker,

    pub hiring_store: MockHiringRepository,
    pub claim_store: MockClaimRepository,
    pub audit: MockPaymentAuditLog,
    pub identity: MockIdentityPort,
    pub clock: Arc<ManualClock>,

    pub client: Actor,
    pub provider: Actor,
    pub moderator: Actor,
}

impl Default for TestEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEngine {
    pub fn new() -> Self {
        Self::with_settings(EngineSettings::default())
    }

    pub fn with_settings(settings: EngineSettings) -> Self {
        let hiring_store = MockHiringRepository::new();
        let claim_store = MockClaimRepository::new();
        let audit = MockPaymentAuditLog::new();
        let identity = MockIdentityPort::permissive();
        let clock = Arc::new(ManualClock::new(TemporalFixtures::t0()));

        let ctx = HiringContext::new(
            Arc::new(hiring_store.clone()),
            Arc::new(identity.clone()),
            clock.clone() as Arc<dyn Clock>,
            Arc::new(KeyedLocks::new()),
            settings,
        );
        let claims = ClaimEngine::new(ctx.clone(), Arc::new(claim_store.clone()));

        Self {
            hirings: HiringService::new(ctx.clone()),
            negotiator: QuotationNegotiator::new(ctx.clone()),
            reconciler: PaymentReconciler::new(ctx, Arc::new(audit.clone())),
            tracker: ComplianceTracker::new(claims.clone()),
            claims,
            hiring_store,
            claim_store,
            audit,
            identity,
            clock,
            client: Actor::user(UserId::new()),
            provider: Actor::user(UserId::new()),
            moderator: Actor::moderator(UserId::new()),
        }
    }

    /// Moves the manual clock forward
    pub fn advance_days(&self, days: i64) {
        self.clock.advance(Duration::days(days));
    }

    pub async fn set_account(&self, user_id: UserId, status: AccountStatus) {
        self.identity.set_status(user_id, status).await;
    }

    /// New hiring between the harness client and provider
    ///
    /// # Panics
    ///
    /// Panics if the service refuses the hiring
    pub async fn pending_hiring(&self) -> Hiring {
        self.hirings
            .create_hiring(&self.client, self.provider.user_id, ServiceId::new())
            .await
            .expect("hiring should be created")
    }

    /// Hiring quoted by the provider with the given terms
    pub async fn quoted_hiring(&self, terms: QuoteTermsBuilder) -> Hiring {
        let hiring = self.pending_hiring().await;
        self.negotiator
            .create_quotation(hiring.id, &self.provider, terms.build())
            .await
            .expect("provider quotation should be accepted")
    }

    /// Hiring waiting for the gateway
    pub async fn checked_out_hiring(&self) -> Hiring {
        let hiring = self.quoted_hiring(QuoteTermsBuilder::new()).await;
        self.hirings
            .initiate_checkout(hiring.id, &self.client, format!("pref-{}", hiring.id))
            .await
            .expect("checkout should start")
    }

    /// Hiring confirmed by an approved webhook
    pub async fn paid_hiring(&self) -> Hiring {
        let hiring = self.checked_out_hiring().await;
        self.webhook(PaymentWebhookEvent::new("pay-harness", "approved", hiring.id.to_string()))
            .await
            .expect("approved webhook should apply");
        self.hiring(hiring.id).await
    }

    pub async fn webhook(&self, event: PaymentWebhookEvent) -> Result<Reconciliation, domain_billing::BillingError> {
        self.reconciler.reconcile(event).await
    }

    /// Current stored state of a hiring
    pub async fn hiring(&self, hiring_id: HiringId) -> Hiring {
        self.hirings.get(hiring_id).await.expect("hiring should exist")
    }

    /// Claim filed by the harness client on a paid hiring
    pub async fn disputed_hiring(&self, filing: ClaimFiling) -> (Hiring, Claim) {
        let hiring = self.paid_hiring().await;
        let claim = self
            .claims
            .file_claim(hiring.id, &self.client, filing)
            .await
            .expect("claim should be filed");
        (self.hiring(hiring.id).await, claim)
    }

    /// Resolves a claim as the harness moderator
    pub async fn resolve(
        &self,
        claim: &Claim,
        verdict: Verdict,
        requests: Vec<ComplianceRequest>,
    ) -> ClaimResolution {
        self.claims
            .resolve_claim(claim.id, &self.moderator, verdict, "moderator decision".into(), requests)
            .await
            .expect("resolution should be accepted")
    }
}
