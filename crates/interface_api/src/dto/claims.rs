//! Claims and compliance DTOs

use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{ClaimId, ComplianceId};
use domain_claims::{
    ClaimError, ClaimFiling, ClaimStatus, ClaimType, ComplianceRequest, ResolutionType,
    ReviewDecision, Verdict,
};

#[derive(Debug, Deserialize, Validate)]
pub struct FileClaimRequest {
    pub claim_type: ClaimType,
    #[validate(length(min = 1, max = 5000))]
    pub description: String,
    #[serde(default)]
    pub evidence_urls: Vec<String>,
}

impl From<FileClaimRequest> for ClaimFiling {
    fn from(request: FileClaimRequest) -> Self {
        ClaimFiling {
            claim_type: request.claim_type,
            description: request.description,
            evidence_urls: request.evidence_urls,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResolveClaimRequest {
    /// `resolved` or `rejected`
    pub status: ClaimStatus,
    pub resolution_type: Option<ResolutionType>,
    #[validate(length(min = 1, max = 5000))]
    pub resolution: String,
    #[serde(default)]
    pub compliances: Vec<ComplianceRequest>,
}

impl ResolveClaimRequest {
    pub fn verdict(&self) -> Result<Verdict, ClaimError> {
        Verdict::from_parts(self.status, self.resolution_type)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitComplianceRequest {
    #[serde(default)]
    pub evidence_urls: Vec<String>,
    #[validate(length(max = 5000))]
    pub user_notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReviewSubmissionRequest {
    /// `approve`, `reject` or `adjust`
    pub decision: String,
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
    pub rejection_reason: Option<String>,
}

impl ReviewSubmissionRequest {
    pub fn decision(&self) -> Result<ReviewDecision, ClaimError> {
        ReviewDecision::from_parts(&self.decision, self.rejection_reason.clone())
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct PeerReviewRequest {
    pub peer_approved: bool,
    #[validate(length(max = 5000))]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DischargeResponse {
    pub claim_id: ClaimId,
    pub fully_discharged: bool,
}

#[derive(Debug, Serialize)]
pub struct SweepResponse {
    pub abandoned: Vec<ComplianceId>,
}
