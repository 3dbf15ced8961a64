//! Compliance handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{ComplianceId, SubmissionId};
use domain_claims::{ClaimCompliance, ComplianceSubmission};

use crate::auth::CurrentActor;
use crate::dto::claims::*;
use crate::extract::ApiJson;
use crate::{error::ApiError, AppState};

/// Responsible user submits evidence
pub async fn submit_compliance(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<SubmitComplianceRequest>,
) -> Result<(StatusCode, Json<ComplianceSubmission>), ApiError> {
    request.validate()?;
    let submission = state
        .tracker
        .submit(
            ComplianceId::from_uuid(id),
            &actor,
            request.evidence_urls,
            request.user_notes,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(submission)))
}

pub async fn review_submission(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<ReviewSubmissionRequest>,
) -> Result<Json<ClaimCompliance>, ApiError> {
    request.validate()?;
    let decision = request.decision()?;
    let compliance = state
        .tracker
        .review_submission(SubmissionId::from_uuid(id), &actor, decision, request.notes)
        .await?;
    Ok(Json(compliance))
}

/// Advisory review by the counterpart
pub async fn peer_review(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<PeerReviewRequest>,
) -> Result<Json<ComplianceSubmission>, ApiError> {
    request.validate()?;
    let submission = state
        .tracker
        .peer_review(SubmissionId::from_uuid(id), &actor, request.peer_approved, request.reason)
        .await?;
    Ok(Json(submission))
}

/// Abandons pending compliances past their deadline
pub async fn sweep_overdue(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<SweepResponse>, ApiError> {
    if !actor.can_moderate() {
        return Err(ApiError::forbidden("only moderators may sweep overdue compliances"));
    }
    let abandoned = state.tracker.sweep_overdue().await?;
    Ok(Json(SweepResponse { abandoned }))
}
