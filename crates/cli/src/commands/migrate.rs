//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! bazaar-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Migrations live in `crates/storefront/migrations/` and are embedded in
//! the binary at build time. The admin service reads the same database and
//! has no migrations of its own.

use super::{CommandError, connect};

/// Run storefront database migrations.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running storefront migrations...");
    bazaar_storefront::MIGRATOR.run(&pool).await?;

    tracing::info!("Storefront migrations complete!");
    Ok(())
}
