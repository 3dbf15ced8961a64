//! Authentication and authorization
//!
//! Bearer tokens are HS256 JWTs whose subject is the user id. The roles
//! claim decides whether the caller acts as a plain user, a moderator or an
//! admin.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind as JwtErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use core_kernel::UserId;
use domain_party::Actor;

use crate::error::ApiError;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// User's roles
    pub roles: Vec<String>,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

impl Claims {
    /// The engine-level caller these claims describe
    pub fn actor(&self) -> Result<Actor, AuthError> {
        let user_id = Uuid::parse_str(&self.sub)
            .map(UserId::from_uuid)
            .map_err(|_| AuthError::InvalidSubject(self.sub.clone()))?;
        let actor = if has_role(self, roles::ADMIN) {
            Actor::admin(user_id)
        } else if has_role(self, roles::MODERATOR) {
            Actor::moderator(user_id)
        } else {
            Actor::user(user_id)
        };
        Ok(actor)
    }
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Token subject is not a user id: {0}")]
    InvalidSubject(String),
}

/// Creates a new JWT token
///
/// # Arguments
///
/// * `user_id` - User identifier
/// * `roles` - User's roles
/// * `secret` - JWT secret key
/// * `expiration_secs` - Token validity in seconds
pub fn create_token(
    user_id: &str,
    roles: Vec<String>,
    secret: &str,
    expiration_secs: u64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let exp = now + Duration::seconds(expiration_secs as i64);

    let claims = Claims {
        sub: user_id.to_string(),
        roles,
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidToken)
}

/// Validates a JWT token
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        JwtErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

/// Checks if user has required role
pub fn has_role(claims: &Claims, required_role: &str) -> bool {
    claims.roles.iter().any(|r| r == required_role || r == roles::ADMIN)
}

/// Role names carried in the `roles` claim
pub mod roles {
    pub const MODERATOR: &str = "moderator";
    pub const ADMIN: &str = "admin";
}

/// The authenticated caller, placed in request extensions by `auth_middleware`
#[derive(Debug, Clone, Copy)]
pub struct CurrentActor(pub Actor);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentActor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Actor>()
            .copied()
            .map(CurrentActor)
            .ok_or(ApiError::Unauthorized)
    }
}
