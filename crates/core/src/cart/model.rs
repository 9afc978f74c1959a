use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::Product;
use crate::types::ProductId;

/// Errors from cart transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("product {0} is not in the cart and no snapshot was provided")]
    MissingSnapshot(ProductId),

    #[error("snapshot for product {actual} does not match {expected}")]
    SnapshotMismatch {
        expected: ProductId,
        actual: ProductId,
    },

    #[error("only {stock} of product {product_id} in stock (requested {requested})")]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        stock: u32,
    },
}

/// One cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    pub product: Product,
    pub count: u32,
}

impl CartItem {
    /// Line total after discount.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.effective_price() * Decimal::from(self.count)
    }
}

/// A cart: ordered lines, at most one per product, every count at least 1.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawCart")]
pub struct Cart {
    items: Vec<CartItem>,
}

/// Unchecked wire form, normalized on the way in.
#[derive(Deserialize)]
struct RawCart {
    #[serde(default)]
    items: Vec<CartItem>,
}

impl From<RawCart> for Cart {
    fn from(raw: RawCart) -> Self {
        Self::from_items(raw.items)
    }
}

impl Cart {
    /// Build a cart from arbitrary lines.
    ///
    /// Lines for the same product are merged (counts summed, first position
    /// kept) and zero-count lines are dropped.
    #[must_use]
    pub fn from_items(items: impl IntoIterator<Item = CartItem>) -> Self {
        let mut merged: Vec<CartItem> = Vec::new();
        for item in items {
            if item.count == 0 {
                continue;
            }
            match merged.iter_mut().find(|m| m.product_id == item.product_id) {
                Some(existing) => existing.count = existing.count.saturating_add(item.count),
                None => merged.push(item),
            }
        }
        Self { items: merged }
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn get(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.product_id == product_id)
    }

    /// Quantity of a product in the cart, 0 when absent.
    #[must_use]
    pub fn count(&self, product_id: &ProductId) -> u32 {
        self.get(product_id).map_or(0, |item| item.count)
    }

    /// Sum of all line counts.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.count)).sum()
    }

    /// Sum of all line totals after discount.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Add one unit of a product.
    ///
    /// An absent product needs a snapshot to create its line.
    ///
    /// # Errors
    ///
    /// See [`set_count`](Self::set_count).
    pub fn add_one(
        &self,
        product_id: &ProductId,
        snapshot: Option<&Product>,
    ) -> Result<Self, CartError> {
        let target = self.count(product_id).saturating_add(1);
        self.set_count(product_id, target, snapshot)
    }

    /// Remove one unit of a product; the line disappears when it reaches 0.
    ///
    /// Removing an absent product leaves the cart unchanged.
    #[must_use]
    pub fn remove_one(&self, product_id: &ProductId) -> Self {
        let mut next = self.clone();
        if let Some(index) = next.position(product_id) {
            if next.items[index].count > 1 {
                next.items[index].count -= 1;
            } else {
                next.items.remove(index);
            }
        }
        next
    }

    /// Set the absolute quantity of a product. A count of 0 removes the line.
    ///
    /// When a snapshot is given it replaces the stored one. Only increases
    /// are checked against stock; lowering a count always succeeds.
    ///
    /// # Errors
    ///
    /// Returns `CartError::MissingSnapshot` when creating a line without a
    /// snapshot, `CartError::SnapshotMismatch` when the snapshot belongs to
    /// another product, and `CartError::InsufficientStock` when an increase
    /// goes above the known stock.
    pub fn set_count(
        &self,
        product_id: &ProductId,
        count: u32,
        snapshot: Option<&Product>,
    ) -> Result<Self, CartError> {
        if let Some(product) = snapshot
            && &product.id != product_id
        {
            return Err(CartError::SnapshotMismatch {
                expected: product_id.clone(),
                actual: product.id.clone(),
            });
        }

        let mut next = self.clone();
        let position = next.position(product_id);

        if count == 0 {
            if let Some(index) = position {
                next.items.remove(index);
            }
            return Ok(next);
        }

        let current = position.map_or(0, |index| next.items[index].count);
        let product = match (snapshot, position) {
            (Some(product), _) => product.clone(),
            (None, Some(index)) => next.items[index].product.clone(),
            (None, None) => return Err(CartError::MissingSnapshot(product_id.clone())),
        };
        if count > current && count > product.stock {
            return Err(CartError::InsufficientStock {
                product_id: product_id.clone(),
                requested: count,
                stock: product.stock,
            });
        }

        match position {
            Some(index) => {
                let item = &mut next.items[index];
                item.count = count;
                item.product = product;
            }
            None => next.items.push(CartItem {
                product_id: product_id.clone(),
                product,
                count,
            }),
        }
        Ok(next)
    }

    /// Whether `mutation` raises a count and so needs a fresh snapshot.
    ///
    /// Decreases and removals work from the stored line alone.
    #[must_use]
    pub fn needs_snapshot(&self, mutation: &CartMutation) -> bool {
        mutation.count > self.count(&mutation.product_id)
    }

    /// Apply a wire mutation.
    ///
    /// # Errors
    ///
    /// See [`set_count`](Self::set_count).
    pub fn apply(
        &self,
        mutation: &CartMutation,
        snapshot: Option<&Product>,
    ) -> Result<Self, CartError> {
        self.set_count(&mutation.product_id, mutation.count, snapshot)
    }

    fn position(&self, product_id: &ProductId) -> Option<usize> {
        self.items
            .iter()
            .position(|item| &item.product_id == product_id)
    }
}

/// Cart write as sent to the storefront: an absolute count, 0 to remove.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartMutation {
    pub product_id: ProductId,
    pub count: u32,
}

impl CartMutation {
    #[must_use]
    pub const fn set(product_id: ProductId, count: u32) -> Self {
        Self { product_id, count }
    }

    #[must_use]
    pub const fn remove(product_id: ProductId) -> Self {
        Self {
            product_id,
            count: 0,
        }
    }

    #[must_use]
    pub const fn is_removal(&self) -> bool {
        self.count == 0
    }
}

/// Clamp a requested quantity to `[1, stock]`.
///
/// Out-of-stock products still clamp to 1 so the editor never shows 0.
#[must_use]
pub fn clamp_quantity(requested: i64, stock: u32) -> u32 {
    let max = stock.max(1);
    let clamped = requested.clamp(1, i64::from(max));
    u32::try_from(clamped).unwrap_or(max)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: &str, price: i64, stock: u32) -> Product {
        Product {
            id: ProductId::new(id),
            title: id.to_uppercase(),
            description: String::new(),
            images: Vec::new(),
            keywords: Vec::new(),
            price: Decimal::new(price, 0),
            discount: Decimal::ZERO,
            stock,
            is_available: true,
            brand: None,
            categories: Vec::new(),
        }
    }

    fn cart_with(id: &str, count: u32) -> Cart {
        Cart::from_items([CartItem {
            product_id: ProductId::new(id),
            product: product(id, 10, 10),
            count,
        }])
    }

    #[test]
    fn test_count_absent_is_zero() {
        assert_eq!(Cart::default().count(&ProductId::new("a")), 0);
    }

    #[test]
    fn test_add_one_inserts_then_increments() {
        let a = product("a", 10, 5);
        let cart = Cart::default().add_one(&a.id, Some(&a)).unwrap();
        assert_eq!(cart.count(&a.id), 1);

        let cart = cart.add_one(&a.id, None).unwrap();
        assert_eq!(cart.count(&a.id), 2);
        assert_eq!(cart.items().len(), 1);
    }

    #[test]
    fn test_add_one_absent_without_snapshot_fails() {
        let err = Cart::default()
            .add_one(&ProductId::new("a"), None)
            .unwrap_err();
        assert_eq!(err, CartError::MissingSnapshot(ProductId::new("a")));
    }

    #[test]
    fn test_add_then_remove_restores_cart() {
        let original = cart_with("b", 3);
        let a = product("a", 10, 5);
        let restored = original.add_one(&a.id, Some(&a)).unwrap().remove_one(&a.id);
        assert_eq!(restored, original);
    }

    #[test]
    fn test_remove_one_thresholds() {
        let id = ProductId::new("A");
        let cart = cart_with("A", 2).remove_one(&id);
        assert_eq!(cart.count(&id), 1);
        let cart = cart.remove_one(&id);
        assert!(cart.is_empty());
        assert_eq!(cart.remove_one(&id), Cart::default());
    }

    #[test]
    fn test_set_count_zero_removes() {
        let id = ProductId::new("a");
        let cart = cart_with("a", 4).set_count(&id, 0, None).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_count_respects_stock() {
        let a = product("a", 10, 2);
        let err = Cart::default().set_count(&a.id, 3, Some(&a)).unwrap_err();
        assert!(matches!(
            err,
            CartError::InsufficientStock {
                requested: 3,
                stock: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_decrease_ignores_stock() {
        let id = ProductId::new("a");
        let cart = cart_with("a", 3);
        let mut restocked = product("a", 10, 1);
        restocked.title = "Renamed".to_string();

        let lowered = cart.set_count(&id, 2, Some(&restocked)).unwrap();
        assert_eq!(lowered.count(&id), 2);
        assert_eq!(lowered.get(&id).unwrap().product.title, "Renamed");

        let lowered = cart.set_count(&id, 2, None).unwrap();
        assert_eq!(lowered.count(&id), 2);

        assert!(matches!(
            lowered.set_count(&id, 3, Some(&restocked)),
            Err(CartError::InsufficientStock { .. })
        ));
    }

    #[test]
    fn test_needs_snapshot_only_for_increases() {
        let id = ProductId::new("a");
        let cart = cart_with("a", 3);
        assert!(cart.needs_snapshot(&CartMutation::set(id.clone(), 4)));
        assert!(!cart.needs_snapshot(&CartMutation::set(id.clone(), 3)));
        assert!(!cart.needs_snapshot(&CartMutation::set(id.clone(), 2)));
        assert!(!cart.needs_snapshot(&CartMutation::remove(id)));
        assert!(Cart::default().needs_snapshot(&CartMutation::set(ProductId::new("b"), 1)));
    }

    #[test]
    fn test_snapshot_must_match_product() {
        let b = product("b", 10, 2);
        let err = Cart::default()
            .set_count(&ProductId::new("a"), 1, Some(&b))
            .unwrap_err();
        assert!(matches!(err, CartError::SnapshotMismatch { .. }));
    }

    #[test]
    fn test_deserialize_merges_duplicates_and_drops_zero() {
        let a = serde_json::to_value(product("a", 10, 9)).unwrap();
        let b = serde_json::to_value(product("b", 10, 9)).unwrap();
        let json = serde_json::json!({
            "items": [
                { "productId": "a", "product": a, "count": 2 },
                { "productId": "b", "product": b, "count": 0 },
                { "productId": "a", "product": a, "count": 3 },
            ]
        });
        let cart: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.count(&ProductId::new("a")), 5);
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(cart_with("a", 1)).unwrap();
        assert_eq!(json["items"][0]["productId"], "a");
        assert_eq!(json["items"][0]["product"]["isAvailable"], true);
    }

    #[test]
    fn test_subtotal_and_quantity() {
        let mut discounted = product("b", 20, 9);
        discounted.discount = Decimal::new(5, 0);
        let cart = cart_with("a", 2)
            .set_count(&discounted.id, 3, Some(&discounted))
            .unwrap();
        assert_eq!(cart.total_quantity(), 5);
        assert_eq!(cart.subtotal(), Decimal::new(65, 0));
    }

    #[test]
    fn test_clamp_quantity() {
        assert_eq!(clamp_quantity(0, 5), 1);
        assert_eq!(clamp_quantity(-3, 5), 1);
        assert_eq!(clamp_quantity(9, 5), 5);
        assert_eq!(clamp_quantity(4, 5), 4);
        assert_eq!(clamp_quantity(4, 0), 1);
    }

    #[test]
    fn test_mutation_wire_format() {
        let json = serde_json::to_string(&CartMutation::remove(ProductId::new("a"))).unwrap();
        assert_eq!(json, r#"{"productId":"a","count":0}"#);
    }
}
