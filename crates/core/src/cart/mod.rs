//! Shopping cart model.
//!
//! The types here are storage-agnostic: a [`Cart`] is the same value whether
//! it came back from the storefront API for a signed-in shopper or was read
//! from local storage for a guest. All transitions are pure and return a new
//! cart, so the caller decides when (and whether) the result is persisted.

mod draft;
mod model;

pub use draft::QuantityDraft;
pub use model::{Cart, CartError, CartItem, CartMutation, clamp_quantity};
