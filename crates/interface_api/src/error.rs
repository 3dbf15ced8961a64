//! API error handling
//!
//! Domain errors reach the client through their `ErrorKind`; the kind picks
//! the status code and becomes the `error` field of the body.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use core_kernel::{Classify, ErrorKind};
use domain_billing::BillingError;
use domain_claims::ClaimError;
use domain_hiring::HiringError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation failed")]
    InvalidBody(#[from] validator::ValidationErrors),

    /// The body is not JSON or does not fit the request type
    #[error("Malformed body: {0}")]
    MalformedBody(#[from] JsonRejection),

    /// A classified domain failure
    #[error("{message}")]
    Domain { kind: ErrorKind, message: String },

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl ApiError {
    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Domain {
            kind: ErrorKind::Forbidden,
            message: message.into(),
        }
    }

    fn classified<E: Classify + std::fmt::Display>(err: E) -> Self {
        ApiError::Domain {
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    /// Status code for a domain error kind
    pub fn status_for(kind: ErrorKind) -> StatusCode {
        match kind {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict | ErrorKind::InvalidState | ErrorKind::InvalidTransition => {
                StatusCode::CONFLICT
            }
            ErrorKind::NotExpired
            | ErrorKind::DeadlineExceeded
            | ErrorKind::LimitReached
            | ErrorKind::AttemptLimitReached => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) | ApiError::InvalidBody(_) | ApiError::MalformedBody(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Domain { kind, .. } => Self::status_for(*kind),
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error_type, message, details) = match self {
            ApiError::Unauthorized => ("unauthorized", "Unauthorized".to_string(), None),
            ApiError::BadRequest(msg) => ("bad_request", msg, None),
            ApiError::InvalidBody(errors) => {
                let details = errors
                    .field_errors()
                    .into_iter()
                    .map(|(field, errs)| format!("{field}: {} error(s)", errs.len()))
                    .collect();
                ("validation_error", "Request body failed validation".to_string(), Some(details))
            }
            ApiError::MalformedBody(rejection) => (
                ErrorKind::Validation.as_str(),
                "Request body could not be read".to_string(),
                Some(vec![rejection.body_text()]),
            ),
            ApiError::Domain { kind, message } => (kind.as_str(), message, None),
            ApiError::Internal(msg) => {
                error!(error = %msg, "internal error");
                ("internal_error", "Internal server error".to_string(), None)
            }
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<HiringError> for ApiError {
    fn from(err: HiringError) -> Self {
        ApiError::classified(err)
    }
}

impl From<BillingError> for ApiError {
    fn from(err: BillingError) -> Self {
        ApiError::classified(err)
    }
}

impl From<ClaimError> for ApiError {
    fn from(err: ClaimError) -> Self {
        ApiError::classified(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::HiringId;

    #[test]
    fn test_kinds_map_to_status_codes() {
        assert_eq!(ApiError::status_for(ErrorKind::Validation), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::status_for(ErrorKind::InvalidTransition), StatusCode::CONFLICT);
        assert_eq!(ApiError::status_for(ErrorKind::LimitReached), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(ApiError::status_for(ErrorKind::Unavailable), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_domain_error_keeps_its_kind() {
        let err: ApiError = HiringError::NotFound(HiringId::new()).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert!(matches!(err, ApiError::Domain { kind: ErrorKind::NotFound, .. }));
    }
}
