//! Server-side cart of an authenticated user.

use async_trait::async_trait;
use bazaar_core::cart::{Cart, CartMutation};

use super::CartStore;
use crate::error::ClientResult;
use crate::http::ApiClient;

/// Cart stored by the storefront.
///
/// Writes send the absolute count (0 for removal) and adopt the cart the
/// server returns; the local view is never patched on its own.
pub struct RemoteCartStore {
    api: ApiClient,
}

impl RemoteCartStore {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl CartStore for RemoteCartStore {
    async fn load(&self) -> ClientResult<Cart> {
        self.api.get_cart().await
    }

    async fn write(&self, _current: &Cart, mutation: &CartMutation) -> ClientResult<Cart> {
        self.api.set_cart_item(mutation).await
    }
}
