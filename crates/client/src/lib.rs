//! Bazaar storefront client.
//!
//! - [`ApiClient`] talks to the storefront JSON API, retrying idempotent
//!   reads on transient failures
//! - [`CartEngine`] keeps the session's cart consistent with its store,
//!   either the server-side cart or a local guest cart
//! - [`FilterSession`], [`debounce`](debounce::debounce) and
//!   [`CatalogBrowser`] drive catalog browsing from URL filter state
//!
//! # Example
//!
//! ```rust,ignore
//! let config = ClientConfig::from_env()?;
//! let cart = bazaar_client::cart_engine(&config).await?;
//! cart.add_one(&ProductId::new("prod-1")).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod debounce;
pub mod engine;
pub mod error;
pub mod http;
pub mod retry;
pub mod store;

pub use catalog::{CatalogBrowser, CatalogSource, FilterSession};
pub use config::ClientConfig;
pub use engine::CartEngine;
pub use error::{ClientError, ClientResult};
pub use http::ApiClient;
pub use retry::RetryPolicy;
pub use store::{CartStore, LocalCartStore, ProductLookup, RemoteCartStore};

/// Build a cart engine for the configured session and load its cart.
///
/// The server-side cart is used when an API token is configured, the
/// guest cart under `data_dir` otherwise.
///
/// # Errors
///
/// Returns `ClientError` if the HTTP client cannot be built or the cart
/// cannot be loaded.
pub async fn cart_engine(config: &ClientConfig) -> ClientResult<CartEngine> {
    let api = ApiClient::new(config)?;
    CartEngine::load(store::select_store(config, api)).await
}
