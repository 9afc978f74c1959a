//! Cart persistence.
//!
//! A session uses exactly one [`CartStore`], chosen at start-up: the
//! storefront's server-side cart when an API token is configured, a local
//! guest cart otherwise.

mod kv;
mod local;
mod remote;

use std::sync::Arc;

use async_trait::async_trait;
use bazaar_core::ProductId;
use bazaar_core::cart::{Cart, CartMutation};
use bazaar_core::catalog::Product;

use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::http::ApiClient;

pub use kv::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore};
pub use local::{CART_KEY, LocalCartStore};
pub use remote::RemoteCartStore;

/// Where a cart lives.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Load the canonical cart.
    async fn load(&self) -> ClientResult<Cart>;

    /// Write an absolute count for one product and return the new
    /// canonical cart. `current` is the cart the mutation was computed from.
    async fn write(&self, current: &Cart, mutation: &CartMutation) -> ClientResult<Cart>;
}

/// Fetches product snapshots for carts that embed them.
#[async_trait]
pub trait ProductLookup: Send + Sync {
    async fn product(&self, id: &ProductId) -> ClientResult<Product>;
}

#[async_trait]
impl ProductLookup for ApiClient {
    async fn product(&self, id: &ProductId) -> ClientResult<Product> {
        self.get_product(id).await
    }
}

/// Pick the store for a session.
#[must_use]
pub fn select_store(config: &ClientConfig, api: ApiClient) -> Arc<dyn CartStore> {
    if config.is_authenticated() {
        tracing::debug!("Using server-side cart");
        Arc::new(RemoteCartStore::new(api))
    } else {
        tracing::debug!(dir = %config.data_dir.display(), "Using guest cart");
        Arc::new(LocalCartStore::new(
            Arc::new(FileKeyValueStore::new(config.data_dir.clone())),
            Arc::new(api),
        ))
    }
}
