//! Catalog route handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use bazaar_core::catalog::{CatalogOptions, CatalogPage, FilterParams, Product};
use bazaar_core::{ProductId, crosssell};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::db::{CatalogRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Query parameters for cross-sell lookups.
#[derive(Debug, Deserialize)]
pub struct CrossSellQuery {
    /// Comma-joined product ids.
    pub ids: Option<String>,
}

/// A bare product list.
#[derive(Debug, Serialize)]
pub struct ProductList {
    pub products: Vec<Product>,
}

/// List products matching the filter parameters.
///
/// The listing and its total count are built from the same predicate and
/// run concurrently.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> Result<Json<CatalogPage>> {
    let filters = params.validate()?;
    let builder = state.query_builder();
    let listing = builder.build(&filters);
    let count = listing.count_query();

    let repo = CatalogRepository::new(state.pool());
    let (products, total_items) = tokio::try_join!(repo.list(&listing), repo.count(&count))?;

    Ok(Json(CatalogPage::new(
        products,
        total_items,
        filters.page(),
        builder.page_size(),
    )))
}

/// Show one product.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Product>> {
    let id = ProductId::new(id);
    CatalogRepository::new(state.pool())
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

/// Merged cross-sell products for a set of products.
#[instrument(skip(state))]
pub async fn cross_sells(
    State(state): State<AppState>,
    Query(query): Query<CrossSellQuery>,
) -> Result<Json<ProductList>> {
    let ids = crosssell::parse_ids(query.ids.as_deref().unwrap_or_default());
    let products = CatalogRepository::new(state.pool())
        .cross_sells(&ids)
        .await?;
    Ok(Json(ProductList { products }))
}

/// Brand and category options for the filter UI.
#[instrument(skip(state))]
pub async fn options(State(state): State<AppState>) -> Result<Json<CatalogOptions>> {
    let options = state
        .options_cache()
        .try_get_with((), CatalogRepository::new(state.pool()).options())
        .await
        .map_err(|e: Arc<RepositoryError>| AppError::Internal(e.to_string()))?;
    Ok(Json(options))
}
