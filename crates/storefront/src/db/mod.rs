//! Database operations for the storefront `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `products`, `brands`, `categories`, `product_categories` - Catalog
//! - `product_cross_sells` - "You may also like" links between products
//! - `orders`, `order_items` - Placed orders (read for popularity ordering)
//! - `users` - API users, identified by the SHA-256 digest of their token
//! - `cart_items` - Server-side carts of authenticated users
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p bazaar-cli -- migrate
//! ```

pub mod carts;
pub mod catalog;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use carts::CartRepository;
pub use catalog::CatalogRepository;
pub use users::{UserRecord, UserRepository};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
