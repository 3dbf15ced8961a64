//! Shared fixtures for the engine and tracker unit tests

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;

use core_kernel::{
    Clock, Currency, EngineSettings, KeyedLocks, ManualClock, Money, ServiceId, UserId,
};
use domain_hiring::{
    Hiring, HiringContext, HiringRepository, MockHiringRepository, QuoteTerms, Quotation, TimeUnit,
};
use domain_party::MockIdentityPort;

use crate::claim::{ClaimFiling, ClaimType, ClientClaimType};
use crate::compliance::{ComplianceRequest, ComplianceType};
use crate::engine::ClaimEngine;
use crate::ports::mock::MockClaimRepository;
use crate::tracker::ComplianceTracker;

pub(crate) struct Harness {
    pub engine: ClaimEngine,
    pub tracker: ComplianceTracker,
    pub hirings: MockHiringRepository,
    pub claims: MockClaimRepository,
    pub identity: MockIdentityPort,
    pub clock: Arc<ManualClock>,
}

pub(crate) fn harness() -> Harness {
    harness_with(EngineSettings::default())
}

pub(crate) fn harness_with(settings: EngineSettings) -> Harness {
    let hirings = MockHiringRepository::new();
    let claims = MockClaimRepository::new();
    let identity = MockIdentityPort::permissive();
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 6, 2, 10, 0, 0).unwrap()));
    let ctx = HiringContext::new(
        Arc::new(hirings.clone()),
        Arc::new(identity.clone()),
        clock.clone(),
        Arc::new(KeyedLocks::new()),
        settings,
    );
    let engine = ClaimEngine::new(ctx, Arc::new(claims.clone()));
    Harness {
        tracker: ComplianceTracker::new(engine.clone()),
        engine,
        hirings,
        claims,
        identity,
        clock,
    }
}

/// Stores a hiring that has been paid for and not yet started
pub(crate) async fn paid_hiring(h: &Harness) -> Hiring {
    let now = h.clock.now();
    let mut hiring = Hiring::new(UserId::new(), UserId::new(), ServiceId::new(), now).unwrap();
    let quotation = Quotation::issue(
        QuoteTerms {
            price: Money::new(dec!(300), Currency::USD),
            estimated_hours: dec!(10),
            estimated_time_unit: TimeUnit::Hours,
            notes: None,
            validity_days: None,
            deliverables: Vec::new(),
        },
        now,
        7,
    )
    .unwrap();
    hiring.attach_quotation(quotation, now).unwrap();
    hiring.start_checkout("pref-claims", now).unwrap();
    hiring.confirm_payment("pay-claims", now).unwrap();
    hiring.take_events();
    h.hirings.insert(&hiring).await.unwrap();
    hiring
}

pub(crate) fn not_delivered() -> ClaimFiling {
    ClaimFiling {
        claim_type: ClaimType::Client(ClientClaimType::NotDelivered),
        description: "nothing was delivered after the agreed date".into(),
        evidence_urls: vec!["https://files.example/chat.png".into()],
    }
}

pub(crate) fn request(responsible: UserId, compliance_type: ComplianceType, days: u32) -> ComplianceRequest {
    ComplianceRequest {
        responsible_user_id: responsible,
        compliance_type,
        instructions: "follow the moderator's instructions".into(),
        deadline_days: days,
    }
}
