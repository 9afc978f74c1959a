//! Bearer-token authentication for admin.
//!
//! Every admin API call must carry `Authorization: Bearer <ADMIN_API_TOKEN>`.
//! Tokens are compared as SHA-256 digests so the comparison time does not
//! depend on how many leading characters match.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use sha2::{Digest, Sha256};

use crate::error::AppError;
use crate::state::AppState;

/// Extractor that requires the admin API token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(_admin: RequireAdmin) -> &'static str {
///     "secret"
/// }
/// ```
pub struct RequireAdmin;

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split_once(' '))
            .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
            .map(|(_, token)| token.trim())
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;

        if token_matches(token, state.token_digest()) {
            Ok(Self)
        } else {
            tracing::warn!("Rejected admin request with invalid token");
            Err(AppError::Unauthorized("invalid token".to_string()))
        }
    }
}

fn token_matches(token: &str, expected: &[u8; 32]) -> bool {
    let digest: [u8; 32] = Sha256::digest(token.as_bytes()).into();
    digest
        .iter()
        .zip(expected)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
