//! CLI subcommands.

pub mod migrate;
pub mod user;

use thiserror::Error;

/// Errors shared by the CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Repository operation failed.
    #[error("{0}")]
    Repository(#[from] bazaar_storefront::db::RepositoryError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),
}

/// Connect to the storefront database.
///
/// Reads `STOREFRONT_DATABASE_URL`, falling back to `DATABASE_URL`.
async fn connect() -> Result<sqlx::PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| CommandError::MissingEnvVar("STOREFRONT_DATABASE_URL"))?;

    tracing::info!("Connecting to storefront database...");
    Ok(sqlx::PgPool::connect(&database_url).await?)
}
