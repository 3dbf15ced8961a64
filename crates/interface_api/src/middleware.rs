//! API middleware

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::{info, warn};

use domain_party::Actor;

use crate::AppState;

/// Authentication middleware
///
/// Validates the bearer token and stores the caller's `Claims` and `Actor`
/// in the request extensions
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    let Some(token) = token else {
        warn!("Missing or invalid Authorization header");
        return Err(StatusCode::UNAUTHORIZED);
    };

    let claims = crate::auth::validate_token(token, &state.config.jwt_secret).map_err(|e| {
        warn!(error = %e, "Token validation failed");
        StatusCode::UNAUTHORIZED
    })?;
    let actor = claims.actor().map_err(|e| {
        warn!(error = %e, "Token carries no usable subject");
        StatusCode::UNAUTHORIZED
    })?;

    request.extensions_mut().insert(claims);
    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}

/// Audit logging middleware
///
/// Logs every API request with the caller and outcome
pub async fn audit_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let user_id = request
        .extensions()
        .get::<Actor>()
        .map(|a| a.user_id.to_string())
        .unwrap_or_else(|| "anonymous".to_string());

    let start = Utc::now();

    let response = next.run(request).await;

    let duration = Utc::now() - start;
    let status = response.status();

    info!(
        method = %method,
        uri = %uri,
        user = %user_id,
        status = %status.as_u16(),
        duration_ms = duration.num_milliseconds(),
        "API request"
    );

    response
}
