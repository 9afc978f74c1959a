//! Bearer-token authentication.
//!
//! Callers send `Authorization: Bearer <token>`. The token is hashed with
//! SHA-256 and the hex digest is looked up in the `users` table.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use sha2::{Digest, Sha256};

use crate::db::{UserRecord, UserRepository};
use crate::error::{AppError, set_sentry_user};
use crate::state::AppState;

/// Extractor that requires an authenticated user.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireUser(user): RequireUser) -> String {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireUser(pub UserRecord);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;

        let user = UserRepository::new(state.pool())
            .find_by_token_hash(&hash_token(token))
            .await?
            .ok_or_else(|| AppError::Unauthorized("invalid token".to_string()))?;

        set_sentry_user(&user.id, Some(&user.email));
        Ok(Self(user))
    }
}

/// Extract the token from an `Authorization: Bearer` header.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// SHA-256 hex digest of an API token, as stored in `users.token_hash`.
#[must_use]
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(value) {
            headers.insert(AUTHORIZATION, value);
        }
        headers
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&headers("Bearer abc123")), Some("abc123"));
        assert_eq!(bearer_token(&headers("bearer abc123")), Some("abc123"));
        assert_eq!(bearer_token(&headers("Basic abc123")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_hash_token_is_sha256_hex() {
        assert_eq!(
            hash_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
