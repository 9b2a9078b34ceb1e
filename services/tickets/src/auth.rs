//! Bearer-token authentication for the tickets API.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TicketsServiceError;
use crate::state::AppState;

/// JWT claims carried by every access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub role: u8,
    pub exp: u64,
}

/// Authenticated caller extracted from the `Authorization: Bearer` header.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: u8,
}

/// Pull the bearer token value out of request headers, if present.
pub fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_owned)
}

/// Validate a bearer token and return the caller it identifies.
pub fn validate_bearer_token(
    token: &str,
    secret: &str,
) -> Result<AuthUser, TicketsServiceError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.required_spec_claims.clear();
    validation.set_required_spec_claims(&["exp", "sub"]);

    let data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|_| TicketsServiceError::Unauthorized)?;

    let user_id = data
        .claims
        .sub
        .parse::<Uuid>()
        .map_err(|_| TicketsServiceError::Unauthorized)?;

    Ok(AuthUser {
        user_id,
        role: data.claims.role,
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = TicketsServiceError;

    // axum-core defines this as `fn -> impl Future + Send` (not `async fn`).
    // Extract values synchronously, return a 'static async move block so the
    // future does not capture the request parts.
    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let token = bearer_token(parts);
        let secret = state.jwt_secret.clone();
        async move {
            let token = token.ok_or(TicketsServiceError::Unauthorized)?;
            validate_bearer_token(&token, &secret)
        }
    }
}
