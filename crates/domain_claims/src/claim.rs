//! Claim aggregate
//!
//! A claim is a dispute raised by one party of a paid hiring. Moderators
//! review it and either reject it or resolve it, optionally imposing
//! compliances on the parties. The claim closes once its verdict no longer
//! depends on outstanding compliances.
//!
//! ```text
//! open -> in_review -> resolved | rejected     (closed_at set on closure)
//!   \_______________________^
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{ClaimId, HiringId, UserId};
use domain_hiring::DisputeOutcome;
use domain_party::PartyRole;

use crate::error::ClaimError;
use crate::events::ClaimEvent;

/// Claim lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    Open,
    InReview,
    Resolved,
    Rejected,
}

impl ClaimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Open => "open",
            ClaimStatus::InReview => "in_review",
            ClaimStatus::Resolved => "resolved",
            ClaimStatus::Rejected => "rejected",
        }
    }

    /// Open and in-review claims block new claims on the same hiring
    pub fn is_active(&self) -> bool {
        matches!(self, ClaimStatus::Open | ClaimStatus::InReview)
    }

    pub fn can_transition_to(&self, target: ClaimStatus) -> bool {
        use ClaimStatus::*;
        matches!(
            (*self, target),
            (Open, InReview) |
            (Open, Resolved) |
            (Open, Rejected) |
            (InReview, Resolved) |
            (InReview, Rejected)
        )
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaimStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(ClaimStatus::Open),
            "in_review" => Ok(ClaimStatus::InReview),
            "resolved" => Ok(ClaimStatus::Resolved),
            "rejected" => Ok(ClaimStatus::Rejected),
            other => Err(format!("unknown claim status: {other}")),
        }
    }
}

/// Grievances a client can raise against the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClientClaimType {
    NotDelivered,
    LateDelivery,
    PoorQuality,
    IncompleteWork,
    NotAsDescribed,
    ProviderUnresponsive,
    Other { reason: String },
}

/// Grievances a provider can raise against the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderClaimType {
    ClientUnresponsive,
    ScopeCreep,
    ExcessiveRevisions,
    MissingRequirements,
    AbusiveBehavior,
    Other { reason: String },
}

/// Claim type tagged with the side that may file it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum ClaimType {
    Client(ClientClaimType),
    Provider(ProviderClaimType),
}

impl ClaimType {
    /// The party allowed to file this type
    pub fn role(&self) -> PartyRole {
        match self {
            ClaimType::Client(_) => PartyRole::Client,
            ClaimType::Provider(_) => PartyRole::Provider,
        }
    }

    /// Stable code used in storage and transport
    pub fn code(&self) -> &'static str {
        match self {
            ClaimType::Client(t) => match t {
                ClientClaimType::NotDelivered => "not_delivered",
                ClientClaimType::LateDelivery => "late_delivery",
                ClientClaimType::PoorQuality => "poor_quality",
                ClientClaimType::IncompleteWork => "incomplete_work",
                ClientClaimType::NotAsDescribed => "not_as_described",
                ClientClaimType::ProviderUnresponsive => "provider_unresponsive",
                ClientClaimType::Other { .. } => "other",
            },
            ClaimType::Provider(t) => match t {
                ProviderClaimType::ClientUnresponsive => "client_unresponsive",
                ProviderClaimType::ScopeCreep => "scope_creep",
                ProviderClaimType::ExcessiveRevisions => "excessive_revisions",
                ProviderClaimType::MissingRequirements => "missing_requirements",
                ProviderClaimType::AbusiveBehavior => "abusive_behavior",
                ProviderClaimType::Other { .. } => "other",
            },
        }
    }

    pub fn other_reason(&self) -> Option<&str> {
        match self {
            ClaimType::Client(ClientClaimType::Other { reason })
            | ClaimType::Provider(ProviderClaimType::Other { reason }) => Some(reason),
            _ => None,
        }
    }

    /// Rebuilds a claim type from its stored parts
    pub fn from_parts(
        role: PartyRole,
        code: &str,
        other_reason: Option<String>,
    ) -> Result<Self, ClaimError> {
        let reason = || {
            other_reason
                .clone()
                .ok_or_else(|| ClaimError::validation("claim type 'other' requires a reason"))
        };
        let claim_type = match role {
            PartyRole::Client => ClaimType::Client(match code {
                "not_delivered" => ClientClaimType::NotDelivered,
                "late_delivery" => ClientClaimType::LateDelivery,
                "poor_quality" => ClientClaimType::PoorQuality,
                "incomplete_work" => ClientClaimType::IncompleteWork,
                "not_as_described" => ClientClaimType::NotAsDescribed,
                "provider_unresponsive" => ClientClaimType::ProviderUnresponsive,
                "other" => ClientClaimType::Other { reason: reason()? },
                other => return Err(unknown_code(role, other)),
            }),
            PartyRole::Provider => ClaimType::Provider(match code {
                "client_unresponsive" => ProviderClaimType::ClientUnresponsive,
                "scope_creep" => ProviderClaimType::ScopeCreep,
                "excessive_revisions" => ProviderClaimType::ExcessiveRevisions,
                "missing_requirements" => ProviderClaimType::MissingRequirements,
                "abusive_behavior" => ProviderClaimType::AbusiveBehavior,
                "other" => ProviderClaimType::Other { reason: reason()? },
                other => return Err(unknown_code(role, other)),
            }),
        };
        Ok(claim_type)
    }

    fn validate(&self) -> Result<(), ClaimError> {
        match self.other_reason() {
            Some(reason) if reason.trim().is_empty() => Err(ClaimError::validation(
                "claim type 'other' requires a non-blank reason",
            )),
            _ => Ok(()),
        }
    }
}

fn unknown_code(role: PartyRole, code: &str) -> ClaimError {
    ClaimError::validation(format!("unknown {role} claim type: {code}"))
}

/// Who the moderator sided with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionType {
    ClientFavor,
    ProviderFavor,
    PartialAgreement,
}

impl ResolutionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionType::ClientFavor => "client_favor",
            ResolutionType::ProviderFavor => "provider_favor",
            ResolutionType::PartialAgreement => "partial_agreement",
        }
    }
}

impl FromStr for ResolutionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client_favor" => Ok(ResolutionType::ClientFavor),
            "provider_favor" => Ok(ResolutionType::ProviderFavor),
            "partial_agreement" => Ok(ResolutionType::PartialAgreement),
            other => Err(format!("unknown resolution type: {other}")),
        }
    }
}

/// A moderator's decision on a claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "resolution_type", rename_all = "snake_case")]
pub enum Verdict {
    Rejected,
    Resolved(ResolutionType),
}

impl Verdict {
    /// Builds a verdict from a status and an optional resolution type
    ///
    /// # Errors
    ///
    /// `Validation` when a resolved status has no resolution type, or a
    /// rejected status carries one
    pub fn from_parts(
        status: ClaimStatus,
        resolution_type: Option<ResolutionType>,
    ) -> Result<Self, ClaimError> {
        match (status, resolution_type) {
            (ClaimStatus::Resolved, Some(t)) => Ok(Verdict::Resolved(t)),
            (ClaimStatus::Resolved, None) => Err(ClaimError::validation(
                "resolution_type is required when resolving a claim",
            )),
            (ClaimStatus::Rejected, None) => Ok(Verdict::Rejected),
            (ClaimStatus::Rejected, Some(_)) => Err(ClaimError::validation(
                "a rejected claim takes no resolution_type",
            )),
            (other, _) => Err(ClaimError::validation(format!(
                "resolution status must be resolved or rejected, got {other}"
            ))),
        }
    }

    pub fn status(&self) -> ClaimStatus {
        match self {
            Verdict::Rejected => ClaimStatus::Rejected,
            Verdict::Resolved(_) => ClaimStatus::Resolved,
        }
    }

    pub fn resolution_type(&self) -> Option<ResolutionType> {
        match self {
            Verdict::Rejected => None,
            Verdict::Resolved(t) => Some(*t),
        }
    }

    /// Where the disputed hiring goes once the claim closes
    pub fn dispute_outcome(&self) -> DisputeOutcome {
        match self {
            Verdict::Rejected => DisputeOutcome::Restore,
            Verdict::Resolved(ResolutionType::ClientFavor) => DisputeOutcome::Restore,
            Verdict::Resolved(ResolutionType::ProviderFavor) => DisputeOutcome::Complete,
            Verdict::Resolved(ResolutionType::PartialAgreement) => DisputeOutcome::Cancel,
        }
    }
}

/// Recorded moderator resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub verdict: Verdict,
    pub text: String,
    pub moderator_id: UserId,
    pub resolved_at: DateTime<Utc>,
}

/// Input for filing a claim
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimFiling {
    pub claim_type: ClaimType,
    pub description: String,
    #[serde(default)]
    pub evidence_urls: Vec<String>,
}

/// The Claim aggregate root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    pub id: ClaimId,
    pub hiring_id: HiringId,
    pub claimant_id: UserId,
    pub claim_type: ClaimType,
    pub description: String,
    pub evidence_urls: Vec<String>,
    pub status: ClaimStatus,
    pub reviewer_id: Option<UserId>,
    pub resolution: Option<Resolution>,
    /// Set once the dispute has been released on the hiring
    pub closed_at: Option<DateTime<Utc>>,
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<ClaimEvent>,
}

impl Claim {
    /// Validates a filing and creates an open claim
    pub fn file(
        hiring_id: HiringId,
        claimant_id: UserId,
        filing: ClaimFiling,
        max_evidence_urls: usize,
        now: DateTime<Utc>,
    ) -> Result<Self, ClaimError> {
        filing.claim_type.validate()?;
        if filing.description.trim().is_empty() {
            return Err(ClaimError::validation("description must not be blank"));
        }
        validate_evidence(&filing.evidence_urls, max_evidence_urls)?;

        let id = ClaimId::new_v7();
        Ok(Self {
            id,
            hiring_id,
            claimant_id,
            events: vec![ClaimEvent::ClaimFiled {
                claim_id: id,
                hiring_id,
                claimant_id,
                claim_type: filing.claim_type.code().to_string(),
                timestamp: now,
            }],
            claim_type: filing.claim_type,
            description: filing.description,
            evidence_urls: filing.evidence_urls,
            status: ClaimStatus::Open,
            reviewer_id: None,
            resolution: None,
            closed_at: None,
            version: 1,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn take_events(&mut self) -> Vec<ClaimEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_closed(&self) -> bool {
        self.closed_at.is_some()
    }

    pub fn verdict(&self) -> Option<Verdict> {
        self.resolution.as_ref().map(|r| r.verdict)
    }

    fn transition(&mut self, to: ClaimStatus, action: &'static str, now: DateTime<Utc>) -> Result<(), ClaimError> {
        if !self.status.can_transition_to(to) {
            return Err(ClaimError::ClaimInvalidState {
                claim_id: self.id,
                status: self.status,
                action,
            });
        }
        self.status = to;
        self.updated_at = now;
        Ok(())
    }

    /// A moderator picks the claim up
    pub fn start_review(&mut self, moderator_id: UserId, now: DateTime<Utc>) -> Result<(), ClaimError> {
        self.transition(ClaimStatus::InReview, "start review of", now)?;
        self.reviewer_id = Some(moderator_id);
        self.events.push(ClaimEvent::ReviewStarted {
            claim_id: self.id,
            moderator_id,
            timestamp: now,
        });
        Ok(())
    }

    /// Records the moderator's verdict; closure happens separately
    pub fn resolve(
        &mut self,
        verdict: Verdict,
        text: impl Into<String>,
        moderator_id: UserId,
        compliance_count: usize,
        now: DateTime<Utc>,
    ) -> Result<(), ClaimError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ClaimError::validation("resolution text must not be blank"));
        }
        self.transition(verdict.status(), "resolve", now)?;
        self.reviewer_id.get_or_insert(moderator_id);
        self.resolution = Some(Resolution {
            verdict,
            text,
            moderator_id,
            resolved_at: now,
        });
        self.events.push(ClaimEvent::ClaimResolved {
            claim_id: self.id,
            hiring_id: self.hiring_id,
            verdict,
            compliance_count,
            timestamp: now,
        });
        Ok(())
    }

    /// Marks the claim closed; the caller has already released the hiring
    pub fn close(&mut self, now: DateTime<Utc>) -> Result<DisputeOutcome, ClaimError> {
        let verdict = self.verdict().ok_or(ClaimError::ClaimInvalidState {
            claim_id: self.id,
            status: self.status,
            action: "close",
        })?;
        self.closed_at = Some(now);
        self.updated_at = now;
        let outcome = verdict.dispute_outcome();
        self.events.push(ClaimEvent::ClaimClosed {
            claim_id: self.id,
            hiring_id: self.hiring_id,
            outcome,
            timestamp: now,
        });
        Ok(outcome)
    }
}

/// Evidence lists are bounded and may not contain blank entries
pub(crate) fn validate_evidence(urls: &[String], max: usize) -> Result<(), ClaimError> {
    if urls.len() > max {
        return Err(ClaimError::validation(format!(
            "at most {max} evidence urls are allowed, got {}",
            urls.len()
        )));
    }
    if urls.iter().any(|u| u.trim().is_empty()) {
        return Err(ClaimError::validation("evidence urls must not be blank"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 5, 12, 0, 0).unwrap()
    }

    fn filing(claim_type: ClaimType) -> ClaimFiling {
        ClaimFiling {
            claim_type,
            description: "work never arrived".into(),
            evidence_urls: vec!["https://files.example/chat.png".into()],
        }
    }

    fn open_claim() -> Claim {
        Claim::file(
            HiringId::new(),
            UserId::new(),
            filing(ClaimType::Client(ClientClaimType::NotDelivered)),
            10,
            now(),
        )
        .unwrap()
    }

    #[test]
    fn test_other_requires_reason() {
        let blank = ClaimType::Provider(ProviderClaimType::Other { reason: "  ".into() });
        let err = Claim::file(HiringId::new(), UserId::new(), filing(blank), 10, now()).unwrap_err();
        assert!(matches!(err, ClaimError::Validation(_)));

        let err = ClaimType::from_parts(PartyRole::Client, "other", None).unwrap_err();
        assert!(matches!(err, ClaimError::Validation(_)));
    }

    #[test]
    fn test_evidence_is_bounded() {
        let mut f = filing(ClaimType::Client(ClientClaimType::PoorQuality));
        f.evidence_urls = (0..11).map(|i| format!("https://e/{i}")).collect();
        assert!(Claim::file(HiringId::new(), UserId::new(), f, 10, now()).is_err());
    }

    #[test]
    fn test_claim_type_parts_round_trip() {
        let t = ClaimType::Provider(ProviderClaimType::Other { reason: "threats".into() });
        let rebuilt =
            ClaimType::from_parts(t.role(), t.code(), t.other_reason().map(String::from)).unwrap();
        assert_eq!(rebuilt, t);
        assert!(ClaimType::from_parts(PartyRole::Provider, "not_delivered", None).is_err());
    }

    #[test]
    fn test_claim_type_json_shape() {
        let t = ClaimType::Client(ClientClaimType::Other { reason: "spam".into() });
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["role"], "client");
        assert_eq!(json["kind"], "other");
        assert_eq!(json["reason"], "spam");
    }

    #[test]
    fn test_verdict_requires_type_when_resolved() {
        assert!(Verdict::from_parts(ClaimStatus::Resolved, None).is_err());
        assert!(Verdict::from_parts(ClaimStatus::Rejected, Some(ResolutionType::ClientFavor)).is_err());
        assert!(Verdict::from_parts(ClaimStatus::Open, None).is_err());
        assert_eq!(
            Verdict::from_parts(ClaimStatus::Rejected, None).unwrap(),
            Verdict::Rejected
        );
    }

    #[test]
    fn test_outcome_mapping_is_explicit() {
        assert_eq!(Verdict::Rejected.dispute_outcome(), DisputeOutcome::Restore);
        assert_eq!(
            Verdict::Resolved(ResolutionType::ClientFavor).dispute_outcome(),
            DisputeOutcome::Restore
        );
        assert_eq!(
            Verdict::Resolved(ResolutionType::ProviderFavor).dispute_outcome(),
            DisputeOutcome::Complete
        );
        assert_eq!(
            Verdict::Resolved(ResolutionType::PartialAgreement).dispute_outcome(),
            DisputeOutcome::Cancel
        );
    }

    #[test]
    fn test_resolved_claim_cannot_be_resolved_again() {
        let mut claim = open_claim();
        let moderator = UserId::new();
        claim.start_review(moderator, now()).unwrap();
        claim
            .resolve(Verdict::Rejected, "no evidence of harm", moderator, 0, now())
            .unwrap();
        let err = claim
            .resolve(Verdict::Rejected, "again", moderator, 0, now())
            .unwrap_err();
        assert!(matches!(err, ClaimError::ClaimInvalidState { .. }));
    }

    #[test]
    fn test_close_requires_verdict() {
        let mut claim = open_claim();
        assert!(claim.close(now()).is_err());
        claim
            .resolve(Verdict::Resolved(ResolutionType::ProviderFavor), "ok", UserId::new(), 0, now())
            .unwrap();
        assert_eq!(claim.close(now()).unwrap(), DisputeOutcome::Complete);
        assert!(claim.is_closed());
    }
}
