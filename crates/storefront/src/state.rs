//! Application state shared across handlers.

use std::sync::Arc;

use bazaar_core::catalog::{CatalogOptions, CatalogQueryBuilder};
use moka::future::Cache;
use sqlx::PgPool;

use crate::config::StorefrontConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    query_builder: CatalogQueryBuilder,
    options_cache: Cache<(), CatalogOptions>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let options_cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(config.options_cache_ttl)
            .build();
        let query_builder = CatalogQueryBuilder::new(config.catalog_page_size);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                query_builder,
                options_cache,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Query builder configured with the catalog page size.
    #[must_use]
    pub fn query_builder(&self) -> &CatalogQueryBuilder {
        &self.inner.query_builder
    }

    /// Cache for brand/category filter options.
    #[must_use]
    pub fn options_cache(&self) -> &Cache<(), CatalogOptions> {
        &self.inner.options_cache
    }
}
