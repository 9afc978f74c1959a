//! Guest cart kept in local key-value storage.

use std::sync::Arc;

use async_trait::async_trait;
use bazaar_core::cart::{Cart, CartMutation};

use super::{CartStore, KeyValueStore, ProductLookup};
use crate::error::ClientResult;

/// Storage key holding the serialized guest cart.
pub const CART_KEY: &str = "cart";

/// Guest cart: lines embed a product snapshot and are persisted as JSON
/// under [`CART_KEY`].
///
/// Increases fetch a fresh snapshot first, so stock limits are checked
/// against current data and a deleted product surfaces as `NotFound`.
/// Decreases use the stored line and need no lookup.
pub struct LocalCartStore {
    storage: Arc<dyn KeyValueStore>,
    products: Arc<dyn ProductLookup>,
}

impl LocalCartStore {
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>, products: Arc<dyn ProductLookup>) -> Self {
        Self { storage, products }
    }
}

#[async_trait]
impl CartStore for LocalCartStore {
    async fn load(&self) -> ClientResult<Cart> {
        let Some(raw) = self.storage.get(CART_KEY).await? else {
            return Ok(Cart::default());
        };
        match serde_json::from_str::<Cart>(&raw) {
            Ok(cart) => Ok(cart),
            Err(e) => {
                tracing::warn!(error = %e, "Stored guest cart is unreadable, starting empty");
                Ok(Cart::default())
            }
        }
    }

    async fn write(&self, current: &Cart, mutation: &CartMutation) -> ClientResult<Cart> {
        let snapshot = if current.needs_snapshot(mutation) {
            Some(self.products.product(&mutation.product_id).await?)
        } else {
            None
        };

        let next = current.apply(mutation, snapshot.as_ref())?;
        self.storage
            .set(CART_KEY, &serde_json::to_string(&next)?)
            .await?;
        Ok(next)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use bazaar_core::ProductId;
    use bazaar_core::catalog::Product;
    use rust_decimal::Decimal;

    use super::*;
    use crate::engine::CartEngine;
    use crate::error::ClientError;
    use crate::store::MemoryKeyValueStore;

    struct Catalog(HashMap<ProductId, Product>);

    #[async_trait]
    impl ProductLookup for Catalog {
        async fn product(&self, id: &ProductId) -> ClientResult<Product> {
            self.0
                .get(id)
                .cloned()
                .ok_or_else(|| ClientError::NotFound(id.to_string()))
        }
    }

    fn product(id: &str, stock: u32) -> Product {
        Product {
            id: ProductId::new(id),
            title: format!("Product {id}"),
            description: String::new(),
            images: Vec::new(),
            keywords: Vec::new(),
            price: Decimal::new(1999, 2),
            discount: Decimal::ZERO,
            stock,
            is_available: true,
            brand: None,
            categories: Vec::new(),
        }
    }

    fn store(storage: Arc<MemoryKeyValueStore>) -> LocalCartStore {
        let catalog = Catalog(
            [product("a", 2), product("b", 5)]
                .into_iter()
                .map(|p| (p.id.clone(), p))
                .collect(),
        );
        LocalCartStore::new(storage, Arc::new(catalog))
    }

    #[tokio::test]
    async fn test_empty_storage_loads_empty_cart() {
        let store = store(Arc::new(MemoryKeyValueStore::new()));
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_persists_cart() {
        let storage = Arc::new(MemoryKeyValueStore::new());
        let store = store(Arc::clone(&storage));

        let cart = store
            .write(&Cart::default(), &CartMutation::set(ProductId::new("a"), 2))
            .await
            .unwrap();
        assert_eq!(cart.count(&ProductId::new("a")), 2);

        let reloaded = store.load().await.unwrap();
        assert_eq!(reloaded, cart);
        assert!(storage.get(CART_KEY).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_write_checks_stock_and_leaves_storage_alone() {
        let storage = Arc::new(MemoryKeyValueStore::new());
        let store = store(Arc::clone(&storage));

        let result = store
            .write(&Cart::default(), &CartMutation::set(ProductId::new("a"), 3))
            .await;
        assert!(matches!(result, Err(ClientError::Cart(_))));
        assert_eq!(storage.get(CART_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unknown_product_is_not_found() {
        let store = store(Arc::new(MemoryKeyValueStore::new()));
        let result = store
            .write(&Cart::default(), &CartMutation::set(ProductId::new("gone"), 1))
            .await;
        assert!(matches!(result, Err(ClientError::NotFound(_))));
    }

    async fn engine_with_line(catalog: Catalog) -> (CartEngine, ProductId) {
        let a = ProductId::new("a");
        let line = Cart::default()
            .set_count(&a, 3, Some(&product("a", 10)))
            .unwrap();
        let storage = Arc::new(MemoryKeyValueStore::new());
        storage
            .set(CART_KEY, &serde_json::to_string(&line).unwrap())
            .await
            .unwrap();
        let store = LocalCartStore::new(storage, Arc::new(catalog));
        (CartEngine::load(Arc::new(store)).await.unwrap(), a)
    }

    #[tokio::test]
    async fn test_decrease_after_stock_drop() {
        let catalog = Catalog([(ProductId::new("a"), product("a", 1))].into_iter().collect());
        let (engine, a) = engine_with_line(catalog).await;

        engine.remove_one(&a).await.unwrap();
        assert_eq!(engine.count(&a), 2);
        assert!(engine.add_one(&a).await.is_err());
        assert_eq!(engine.count(&a), 2);
    }

    #[tokio::test]
    async fn test_decrease_after_product_deleted() {
        let (engine, a) = engine_with_line(Catalog(HashMap::new())).await;

        engine.remove_one(&a).await.unwrap();
        assert_eq!(engine.count(&a), 2);
        engine.set_quantity(&a, 1, 10).await.unwrap();
        assert_eq!(engine.count(&a), 1);
    }

    #[tokio::test]
    async fn test_corrupt_storage_starts_empty() {
        let storage = Arc::new(MemoryKeyValueStore::new());
        storage.set(CART_KEY, "not json").await.unwrap();
        let store = store(storage);
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_stored_lines_are_merged() {
        let storage = Arc::new(MemoryKeyValueStore::new());
        let line = serde_json::json!({
            "productId": "b",
            "product": product("b", 5),
            "count": 1
        });
        storage
            .set(
                CART_KEY,
                &serde_json::json!({ "items": [line.clone(), line] }).to_string(),
            )
            .await
            .unwrap();

        let cart = store(storage).load().await.unwrap();
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.count(&ProductId::new("b")), 2);
    }
}
