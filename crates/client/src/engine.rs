//! Cart reconciliation engine.
//!
//! The engine owns the session's view of the cart. Every mutation is
//! computed from the latest canonical cart, written through the session's
//! [`CartStore`], and only then published. Mutations are serialized by a
//! FIFO async mutex held across the store round-trip, so two clicks never
//! compute their counts from the same stale cart.

use std::sync::Arc;

use bazaar_core::ProductId;
use bazaar_core::cart::{Cart, CartMutation, QuantityDraft, clamp_quantity};
use tokio::sync::{Mutex, watch};

use crate::error::ClientResult;
use crate::store::CartStore;

/// Cart engine for one session.
pub struct CartEngine {
    store: Arc<dyn CartStore>,
    cart: Mutex<Cart>,
    updates: watch::Sender<Cart>,
}

impl CartEngine {
    /// Create an engine starting from an empty cart.
    ///
    /// Call [`refresh`](Self::refresh) to load the stored cart.
    #[must_use]
    pub fn new(store: Arc<dyn CartStore>) -> Self {
        let (updates, _) = watch::channel(Cart::default());
        Self {
            store,
            cart: Mutex::new(Cart::default()),
            updates,
        }
    }

    /// Create an engine and load the stored cart.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the cart cannot be loaded.
    pub async fn load(store: Arc<dyn CartStore>) -> ClientResult<Self> {
        let engine = Self::new(store);
        engine.refresh().await?;
        Ok(engine)
    }

    /// Reload the canonical cart from the store.
    ///
    /// # Errors
    ///
    /// Returns the store's error; the current cart is kept.
    pub async fn refresh(&self) -> ClientResult<Cart> {
        let mut cart = self.cart.lock().await;
        let loaded = self.store.load().await.inspect_err(|e| {
            tracing::warn!(error = %e, "Cart refresh failed");
        })?;
        self.publish(&mut cart, loaded.clone());
        Ok(loaded)
    }

    /// Snapshot of the current cart.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.updates.borrow().clone()
    }

    /// Receive every new canonical cart.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.updates.subscribe()
    }

    /// Quantity of a product in the cart (0 when absent).
    #[must_use]
    pub fn count(&self, product_id: &ProductId) -> u32 {
        self.updates.borrow().count(product_id)
    }

    /// Add one unit of a product.
    ///
    /// # Errors
    ///
    /// Returns the store's error; the cart is left unchanged.
    pub async fn add_one(&self, product_id: &ProductId) -> ClientResult<Cart> {
        self.add_quantity(product_id, 1).await
    }

    /// Add `quantity` units of a product.
    ///
    /// # Errors
    ///
    /// Returns the store's error; the cart is left unchanged.
    pub async fn add_quantity(&self, product_id: &ProductId, quantity: u32) -> ClientResult<Cart> {
        self.mutate(product_id, |current| {
            Some(current.saturating_add(quantity)).filter(|_| quantity > 0)
        })
        .await
    }

    /// Remove one unit; the line disappears when its count reaches 0.
    ///
    /// Removing an absent product is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the store's error; the cart is left unchanged.
    pub async fn remove_one(&self, product_id: &ProductId) -> ClientResult<Cart> {
        self.mutate(product_id, |current| current.checked_sub(1)).await
    }

    /// Remove a line entirely.
    ///
    /// # Errors
    ///
    /// Returns the store's error; the cart is left unchanged.
    pub async fn remove_line(&self, product_id: &ProductId) -> ClientResult<Cart> {
        self.mutate(product_id, |current| (current > 0).then_some(0))
            .await
    }

    /// Set a line to `requested` units, clamped to `[1, stock]`.
    ///
    /// Nothing is written when the clamped value equals the current count.
    ///
    /// # Errors
    ///
    /// Returns the store's error; the cart is left unchanged.
    pub async fn set_quantity(
        &self,
        product_id: &ProductId,
        requested: i64,
        stock: u32,
    ) -> ClientResult<Cart> {
        let target = clamp_quantity(requested, stock);
        self.mutate(product_id, |_| Some(target)).await
    }

    /// Write a buffered quantity edit.
    ///
    /// On success the draft is synced to the stored count. On failure the
    /// draft keeps the shopper's edit so it can be retried.
    ///
    /// # Errors
    ///
    /// Returns the store's error; the cart is left unchanged.
    pub async fn confirm_draft(
        &self,
        product_id: &ProductId,
        draft: &mut QuantityDraft,
    ) -> ClientResult<Cart> {
        if !draft.is_dirty() {
            return Ok(self.cart());
        }
        let cart = self
            .set_quantity(product_id, i64::from(draft.draft()), draft.max())
            .await?;
        draft.sync(cart.count(product_id));
        Ok(cart)
    }

    /// Compute a target count from the current one and write it.
    ///
    /// `target` returning `None`, or the current count, skips the write.
    async fn mutate(
        &self,
        product_id: &ProductId,
        target: impl FnOnce(u32) -> Option<u32>,
    ) -> ClientResult<Cart> {
        let mut cart = self.cart.lock().await;
        let current = cart.count(product_id);
        let Some(count) = target(current).filter(|&count| count != current) else {
            return Ok(cart.clone());
        };

        let mutation = CartMutation::set(product_id.clone(), count);
        let next = self
            .store
            .write(&cart, &mutation)
            .await
            .inspect_err(|e| {
                tracing::warn!(
                    product_id = %product_id,
                    count,
                    error = %e,
                    "Cart write failed, keeping previous cart"
                );
            })?;

        tracing::debug!(product_id = %product_id, count, "Cart updated");
        self.publish(&mut cart, next.clone());
        Ok(next)
    }

    fn publish(&self, slot: &mut Cart, next: Cart) {
        *slot = next.clone();
        self.updates.send_replace(next);
    }
}
