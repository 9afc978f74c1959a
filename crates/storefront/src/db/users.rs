//! User repository.
//!
//! Users authenticate with an opaque API token. Only the SHA-256 hex digest
//! of the token is stored, so a leaked table does not leak credentials.

use bazaar_core::UserId;
use sqlx::{FromRow, PgPool};
use tracing::instrument;

use super::RepositoryError;

/// A stored user.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct UserRecord {
    pub id: UserId,
    pub email: String,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find the user owning a token digest.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip_all)]
    pub async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<UserRecord>, RepositoryError> {
        let user = sqlx::query_as::<_, UserRecord>(
            "SELECT id, email FROM users WHERE token_hash = $1",
        )
        .bind(token_hash)
        .fetch_optional(self.pool)
        .await?;
        Ok(user)
    }

    /// Create a user with the given token digest.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, token_hash))]
    pub async fn create(
        &self,
        email: &str,
        token_hash: &str,
    ) -> Result<UserRecord, RepositoryError> {
        sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (email, token_hash) VALUES ($1, $2) RETURNING id, email",
        )
        .bind(email)
        .bind(token_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                RepositoryError::Conflict(format!("user already exists: {email}"))
            }
            other => RepositoryError::Database(other),
        })
    }
}
