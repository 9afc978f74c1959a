//! Catalog browsing: filter editing and page loading.
//!
//! [`FilterSession`] owns the URL filter state and pushes every valid
//! change into a channel; wrap its receiver with
//! [`debounce`](crate::debounce::debounce) and feed the result to
//! [`CatalogBrowser::follow`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bazaar_core::catalog::{CatalogPage, FilterError, FilterKey, FilterParams, FilterState};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;

use crate::error::ClientResult;
use crate::http::ApiClient;

/// Source of catalog pages.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn list_products(&self, filter: &FilterState) -> ClientResult<CatalogPage>;
}

#[async_trait]
impl CatalogSource for ApiClient {
    async fn list_products(&self, filter: &FilterState) -> ClientResult<CatalogPage> {
        Self::list_products(self, filter).await
    }
}

/// Filter editing session.
///
/// Invalid input (a non-numeric price, `minPrice > maxPrice`, ...) is
/// returned as an error for inline display and never sent; the URL state
/// stays at its last valid value.
pub struct FilterSession {
    params: FilterParams,
    state: FilterState,
    tx: mpsc::Sender<FilterState>,
}

impl FilterSession {
    /// Start a session from the current URL query string.
    ///
    /// # Errors
    ///
    /// Returns `FilterError` if the query string does not validate.
    pub fn from_query_string(
        query: &str,
        tx: mpsc::Sender<FilterState>,
    ) -> Result<Self, FilterError> {
        let params = FilterParams::from_query_string(query);
        let state = params.validate()?;
        Ok(Self { params, state, tx })
    }

    /// Raw URL parameters.
    #[must_use]
    pub const fn params(&self) -> &FilterParams {
        &self.params
    }

    /// Last valid filter state.
    #[must_use]
    pub const fn state(&self) -> &FilterState {
        &self.state
    }

    /// Query string for the address bar.
    #[must_use]
    pub fn query_string(&self) -> String {
        self.params.to_query_string()
    }

    /// Set one parameter; an empty value clears it.
    ///
    /// Changing anything but `page` returns to the first page.
    ///
    /// # Errors
    ///
    /// Returns `FilterError` if the resulting parameters do not validate.
    pub async fn set(&mut self, key: FilterKey, value: &str) -> Result<&FilterState, FilterError> {
        let mut next = self.params.clone();
        next.set(key, Some(value));
        self.commit(next).await
    }

    /// Drop sort, brand, category and price filters.
    ///
    /// # Errors
    ///
    /// Returns `FilterError` if the remaining parameters do not validate.
    pub async fn clear_filters(&mut self) -> Result<&FilterState, FilterError> {
        let mut next = self.params.clone();
        next.clear_filters();
        self.commit(next).await
    }

    async fn commit(&mut self, next: FilterParams) -> Result<&FilterState, FilterError> {
        let state = next.validate()?;
        self.params = next;
        if state != self.state {
            self.state = state;
            if self.tx.send(self.state.clone()).await.is_err() {
                tracing::debug!("Filter receiver closed");
            }
        }
        Ok(&self.state)
    }
}

/// Loads catalog pages and publishes the latest one.
///
/// Every load is tagged with a generation number; a response that arrives
/// after a newer load started is discarded.
pub struct CatalogBrowser {
    source: Arc<dyn CatalogSource>,
    generation: AtomicU64,
    page: watch::Sender<CatalogPage>,
}

impl CatalogBrowser {
    #[must_use]
    pub fn new(source: Arc<dyn CatalogSource>) -> Self {
        let (page, _) = watch::channel(CatalogPage::empty());
        Self {
            source,
            generation: AtomicU64::new(0),
            page,
        }
    }

    /// Receive every page that gets published.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CatalogPage> {
        self.page.subscribe()
    }

    /// Currently published page.
    #[must_use]
    pub fn page(&self) -> CatalogPage {
        self.page.borrow().clone()
    }

    /// Load a page for `filter`.
    ///
    /// Returns `None` when a newer load superseded this one. A failed fetch
    /// is logged and degrades to the previously published page (empty on
    /// first load).
    pub async fn load(&self, filter: &FilterState) -> Option<CatalogPage> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let result = self.source.list_products(filter).await;

        match result {
            Ok(page) => {
                // Checked under the channel's write lock so an older load
                // cannot overwrite a newer page between check and publish.
                let published = self.page.send_if_modified(|current| {
                    let latest = self.is_latest(generation);
                    if latest {
                        current.clone_from(&page);
                    }
                    latest
                });
                if !published {
                    tracing::debug!(generation, "Discarding stale catalog response");
                }
                published.then_some(page)
            }
            Err(_) if !self.is_latest(generation) => {
                tracing::debug!(generation, "Discarding stale catalog failure");
                None
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    page = filter.page(),
                    "Catalog fetch failed, keeping previous page"
                );
                Some(self.page())
            }
        }
    }

    /// Load a page for every filter state received, until `rx` closes.
    ///
    /// Loads run concurrently, so a slow response never blocks a newer one;
    /// stale responses are dropped by [`load`](Self::load). Finished loads
    /// are reaped as they complete.
    pub async fn follow(self: Arc<Self>, mut rx: mpsc::Receiver<FilterState>) {
        let mut tasks = JoinSet::new();
        loop {
            tokio::select! {
                received = rx.recv() => match received {
                    Some(filter) => self.spawn_load(&mut tasks, filter),
                    None => break,
                },
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }
        while tasks.join_next().await.is_some() {}
    }

    fn spawn_load(self: &Arc<Self>, tasks: &mut JoinSet<()>, filter: FilterState) {
        while tasks.try_join_next().is_some() {}
        let browser = Arc::clone(self);
        tasks.spawn(async move {
            browser.load(&filter).await;
        });
    }

    fn is_latest(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }
}
