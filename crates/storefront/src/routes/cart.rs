//! Cart route handlers.
//!
//! Every write carries an absolute count. The response is always the
//! canonical cart as stored after the write, which clients use to replace
//! their local copy.

use axum::{Json, extract::State};
use bazaar_core::cart::{Cart, CartMutation};
use tracing::instrument;

use crate::db::{CartRepository, CatalogRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::state::AppState;

/// Current cart of the authenticated user.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Cart>> {
    let cart = CartRepository::new(state.pool()).get(&user.id).await?;
    Ok(Json(cart))
}

/// Set the count of one product. `count: 0` removes the line.
///
/// Returns 404 for an unknown product and 400 when the count exceeds stock.
#[instrument(
    skip_all,
    fields(user_id = %user.id, product_id = %mutation.product_id, count = mutation.count)
)]
pub async fn update(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(mutation): Json<CartMutation>,
) -> Result<Json<Cart>> {
    let carts = CartRepository::new(state.pool());
    let current = carts.get(&user.id).await?;

    let snapshot = if current.needs_snapshot(&mutation) {
        let product = CatalogRepository::new(state.pool())
            .get(&mutation.product_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("product {}", mutation.product_id)))?;
        Some(product)
    } else {
        None
    };
    // Validates stock and snapshot consistency before anything is written.
    // Decreases use the stored line, so they never fail on stock.
    current.apply(&mutation, snapshot.as_ref())?;

    carts
        .set_count(&user.id, &mutation.product_id, mutation.count)
        .await?;
    tracing::info!("Cart updated");

    Ok(Json(carts.get(&user.id).await?))
}
