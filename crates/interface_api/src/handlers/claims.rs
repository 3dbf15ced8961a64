//! Claim handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{ClaimId, HiringId};
use domain_claims::{Claim, ClaimCompliance, ClaimResolution};

use crate::auth::CurrentActor;
use crate::dto::claims::*;
use crate::extract::ApiJson;
use crate::{error::ApiError, AppState};

/// A party of the hiring files a dispute
pub async fn file_claim(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(hiring_id): Path<Uuid>,
    ApiJson(request): ApiJson<FileClaimRequest>,
) -> Result<(StatusCode, Json<Claim>), ApiError> {
    request.validate()?;
    let claim = state
        .claims
        .file_claim(HiringId::from_uuid(hiring_id), &actor, request.into())
        .await?;
    Ok((StatusCode::CREATED, Json(claim)))
}

pub async fn list_claims_for_hiring(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(hiring_id): Path<Uuid>,
) -> Result<Json<Vec<Claim>>, ApiError> {
    let hiring_id = HiringId::from_uuid(hiring_id);
    let hiring = state.hirings.get(hiring_id).await?;
    if !hiring.is_party(actor.user_id) && !actor.can_moderate() {
        return Err(ApiError::forbidden("only the parties and moderators may read claims"));
    }
    Ok(Json(state.claims.claims_for_hiring(hiring_id).await?))
}

pub async fn get_claim(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<Json<Claim>, ApiError> {
    let claim = state.claims.get_claim(ClaimId::from_uuid(id)).await?;
    ensure_can_read(&state, &actor, &claim).await?;
    Ok(Json(claim))
}

/// Moderator picks up an open claim
pub async fn start_review(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<Json<Claim>, ApiError> {
    let claim = state.claims.start_review(ClaimId::from_uuid(id), &actor).await?;
    Ok(Json(claim))
}

pub async fn resolve_claim(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<ResolveClaimRequest>,
) -> Result<Json<ClaimResolution>, ApiError> {
    request.validate()?;
    let verdict = request.verdict()?;
    let resolution = state
        .claims
        .resolve_claim(
            ClaimId::from_uuid(id),
            &actor,
            verdict,
            request.resolution,
            request.compliances,
        )
        .await?;
    Ok(Json(resolution))
}

pub async fn list_compliances(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ClaimCompliance>>, ApiError> {
    let claim_id = ClaimId::from_uuid(id);
    let claim = state.claims.get_claim(claim_id).await?;
    ensure_can_read(&state, &actor, &claim).await?;
    Ok(Json(state.claims.list_compliances(claim_id).await?))
}

pub async fn discharge_status(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<Json<DischargeResponse>, ApiError> {
    let claim_id = ClaimId::from_uuid(id);
    let claim = state.claims.get_claim(claim_id).await?;
    ensure_can_read(&state, &actor, &claim).await?;
    let fully_discharged = state.claims.is_fully_discharged(claim_id).await?;
    Ok(Json(DischargeResponse {
        claim_id,
        fully_discharged,
    }))
}

async fn ensure_can_read(
    state: &AppState,
    actor: &domain_party::Actor,
    claim: &Claim,
) -> Result<(), ApiError> {
    if actor.can_moderate() {
        return Ok(());
    }
    let hiring = state.hirings.get(claim.hiring_id).await?;
    if hiring.is_party(actor.user_id) {
        Ok(())
    } else {
        Err(ApiError::forbidden("only the parties and moderators may read a claim"))
    }
}
