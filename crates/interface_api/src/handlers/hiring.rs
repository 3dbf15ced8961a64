//! Hiring and quotation handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use core_kernel::HiringId;

use crate::auth::CurrentActor;
use crate::dto::hiring::*;
use crate::extract::ApiJson;
use crate::{error::ApiError, AppState};

/// Opens a hiring; the caller is the client
pub async fn create_hiring(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    ApiJson(request): ApiJson<CreateHiringRequest>,
) -> Result<(StatusCode, Json<HiringResponse>), ApiError> {
    request.validate()?;
    let hiring = state
        .hirings
        .create_hiring(&actor, request.provider_id, request.service_id)
        .await?;
    Ok((StatusCode::CREATED, Json(hiring.into())))
}

pub async fn get_hiring(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<Json<HiringResponse>, ApiError> {
    let hiring = state.hirings.get(HiringId::from_uuid(id)).await?;
    if !hiring.is_party(actor.user_id) && !actor.can_moderate() {
        return Err(ApiError::forbidden("only the parties and moderators may read a hiring"));
    }
    Ok(Json(hiring.into()))
}

/// Provider issues a quotation
pub async fn create_quotation(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<CreateQuotationRequest>,
) -> Result<(StatusCode, Json<HiringResponse>), ApiError> {
    request.validate()?;
    let hiring = state
        .negotiator
        .create_quotation(HiringId::from_uuid(id), &actor, request.into())
        .await?;
    Ok((StatusCode::CREATED, Json(hiring.into())))
}

/// Client asks for a new quotation after expiry
pub async fn request_requote(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<Json<HiringResponse>, ApiError> {
    let hiring = state
        .negotiator
        .request_requote(HiringId::from_uuid(id), &actor)
        .await?;
    Ok(Json(hiring.into()))
}

pub async fn initiate_checkout(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<CheckoutRequest>,
) -> Result<Json<HiringResponse>, ApiError> {
    request.validate()?;
    let hiring = state
        .hirings
        .initiate_checkout(HiringId::from_uuid(id), &actor, request.preference_id)
        .await?;
    Ok(Json(hiring.into()))
}

/// Progress reported by the delivery subsystem
pub async fn apply_delivery_event(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<DeliveryEventRequest>,
) -> Result<Json<HiringResponse>, ApiError> {
    let hiring_id = HiringId::from_uuid(id);
    let current = state.hirings.get(hiring_id).await?;
    if !current.is_party(actor.user_id) && !actor.can_moderate() {
        return Err(ApiError::forbidden("only the parties may report delivery progress"));
    }
    let hiring = state.hirings.apply_delivery_event(hiring_id, request.event).await?;
    Ok(Json(hiring.into()))
}

pub async fn cancel_hiring(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<Json<HiringResponse>, ApiError> {
    let hiring = state.hirings.cancel(HiringId::from_uuid(id), &actor).await?;
    Ok(Json(hiring.into()))
}
