//! Payment gateway webhook
//!
//! Mounted outside the JWT layer. When a webhook secret is configured the
//! gateway must echo it in `X-Webhook-Secret`.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

use core_kernel::{Classify, ErrorKind};
use domain_billing::PaymentWebhookEvent;

use crate::dto::payments::WebhookRejected;
use crate::{error::ApiError, AppState};

pub const WEBHOOK_SECRET_HEADER: &str = "X-Webhook-Secret";

/// Applies one gateway notification
///
/// Malformed bodies, unknown references and unknown statuses are
/// acknowledged with `200` and an error body: redelivering them cannot
/// succeed. Conflicts and outages return an error status so the gateway
/// retries.
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<PaymentWebhookEvent>, JsonRejection>,
) -> Result<Response, ApiError> {
    if let Some(expected) = state.config.webhook_secret.as_deref() {
        let given = headers.get(WEBHOOK_SECRET_HEADER).and_then(|v| v.to_str().ok());
        if given != Some(expected) {
            warn!("webhook secret mismatch");
            return Err(ApiError::Unauthorized);
        }
    }

    let event = match body {
        Ok(Json(event)) => event,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "unreadable payment webhook body");
            let body = WebhookRejected {
                acknowledged: true,
                error: ErrorKind::Validation.as_str(),
                message: rejection.body_text(),
            };
            return Ok((StatusCode::OK, Json(body)).into_response());
        }
    };

    match state.reconciler.reconcile(event).await {
        Ok(reconciliation) => Ok((StatusCode::OK, Json(reconciliation)).into_response()),
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::Validation) => {
            let body = WebhookRejected {
                acknowledged: true,
                error: e.kind().as_str(),
                message: e.to_string(),
            };
            Ok((StatusCode::OK, Json(body)).into_response())
        }
        Err(e) => Err(e.into()),
    }
}
