//! HTTP client for the storefront API

use bazaar_core::ProductId;
use bazaar_core::cart::{Cart, CartMutation};
use bazaar_core::catalog::{CatalogOptions, CatalogPage, FilterState, Product};
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::retry::RetryPolicy;

#[derive(Deserialize)]
struct ProductList {
    products: Vec<Product>,
}

/// HTTP client for the storefront JSON API.
///
/// Reads go through the configured [`RetryPolicy`]; cart writes are sent
/// exactly once.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    token: Option<SecretString>,
    retry: RetryPolicy,
}

impl ApiClient {
    /// Create a new client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Http` if the underlying client cannot be built.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.api_url.clone(),
            token: config.api_token.clone(),
            retry: RetryPolicy::default(),
        })
    }

    /// Replace the retry policy used for reads.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Whether requests carry an API token.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    // ========== Catalog API ==========

    /// One page of products for a validated filter.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails after retries.
    pub async fn list_products(&self, filter: &FilterState) -> ClientResult<CatalogPage> {
        let mut url = self.endpoint(&["api", "products"])?;
        let query = filter.to_query_string();
        if !query.is_empty() {
            url.set_query(Some(&query));
        }
        self.retry
            .run("list_products", || self.get_json(url.clone()))
            .await
    }

    /// A single product.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` for an unknown id.
    pub async fn get_product(&self, id: &ProductId) -> ClientResult<Product> {
        let url = self.endpoint(&["api", "products", id.as_str()])?;
        self.retry
            .run("get_product", || self.get_json(url.clone()))
            .await
    }

    /// Cross-sells of the given products, merged by the server.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails after retries.
    pub async fn cross_sells(&self, ids: &[ProductId]) -> ClientResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let joined = ids
            .iter()
            .map(ProductId::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let mut url = self.endpoint(&["api", "products", "crosssell"])?;
        url.query_pairs_mut().append_pair("ids", &joined);

        let list: ProductList = self
            .retry
            .run("cross_sells", || self.get_json(url.clone()))
            .await?;
        Ok(list.products)
    }

    /// Brand and category filter options.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the request fails after retries.
    pub async fn catalog_options(&self) -> ClientResult<CatalogOptions> {
        let url = self.endpoint(&["api", "catalog", "options"])?;
        self.retry
            .run("catalog_options", || self.get_json(url.clone()))
            .await
    }

    // ========== Cart API ==========

    /// The authenticated user's cart.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Unauthorized` without a valid token.
    pub async fn get_cart(&self) -> ClientResult<Cart> {
        let url = self.endpoint(&["api", "cart"])?;
        self.retry
            .run("get_cart", || self.get_json(url.clone()))
            .await
    }

    /// Set the absolute count of one cart line (0 removes it).
    ///
    /// Never retried: the caller decides what a failed write means.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` for an unknown product and
    /// `ClientError::Validation` when the count exceeds stock.
    pub async fn set_cart_item(&self, mutation: &CartMutation) -> ClientResult<Cart> {
        let url = self.endpoint(&["api", "cart"])?;
        self.send(self.client.post(url).json(mutation)).await
    }

    // ========== Plumbing ==========

    fn endpoint(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::Config(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> ClientResult<T> {
        self.send(self.client.get(url)).await
    }

    async fn send<T: DeserializeOwned>(&self, mut request: RequestBuilder) -> ClientResult<T> {
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ClientError::from_status(status, text));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
