//! Catalog reads through the HTTP client.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use bazaar_client::debounce::debounce;
use bazaar_client::{
    ApiClient, CatalogBrowser, ClientConfig, ClientError, FilterSession, RetryPolicy,
};
use bazaar_core::ProductId;
use bazaar_core::catalog::{FilterKey, FilterState};
use bazaar_integration_tests::{MockStorefront, product};
use tokio::sync::mpsc;

fn api(mock: &MockStorefront, retry: RetryPolicy) -> ApiClient {
    ApiClient::new(&ClientConfig::new(&mock.url).unwrap())
        .unwrap()
        .with_retry(retry)
}

fn quick_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
    }
}

#[tokio::test]
async fn test_listing_sends_canonical_query() {
    let mock = MockStorefront::start(vec![product("hat", 1)]).await;
    let filter =
        FilterState::from_query_string("sort=title_asc&brand=b1&minPrice=5.50&page=2").unwrap();

    let page = api(&mock, RetryPolicy::none())
        .list_products(&filter)
        .await
        .unwrap();
    assert_eq!(page.products.len(), 1);

    assert_eq!(mock.listing_queries(), vec![Some(filter.to_query_string())]);
}

#[tokio::test]
async fn test_default_listing_has_no_query() {
    let mock = MockStorefront::start(Vec::new()).await;
    api(&mock, RetryPolicy::none())
        .list_products(&FilterState::default())
        .await
        .unwrap();
    assert_eq!(mock.listing_queries(), vec![None]);
}

#[tokio::test]
async fn test_listing_retries_transient_failures() {
    let mock = MockStorefront::start(vec![product("hat", 1)]).await;
    mock.fail_next_listings(2);

    let page = api(&mock, quick_retry(3))
        .list_products(&FilterState::default())
        .await
        .unwrap();
    assert_eq!(page.products.len(), 1);
    assert_eq!(mock.listing_queries().len(), 3);
}

#[tokio::test]
async fn test_listing_without_retry_surfaces_server_error() {
    let mock = MockStorefront::start(vec![product("hat", 1)]).await;
    mock.fail_next_listings(1);

    let err = api(&mock, RetryPolicy::none())
        .list_products(&FilterState::default())
        .await
        .unwrap_err();
    assert!(
        matches!(err, ClientError::Server { status: 503, .. }),
        "got {err:?}"
    );
    assert_eq!(mock.listing_queries().len(), 1);
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let mock = MockStorefront::start(vec![product("hat", 1)]).await;
    let client = api(&mock, quick_retry(3));

    let hat = client.get_product(&ProductId::new("hat")).await.unwrap();
    assert_eq!(hat.stock, 1);

    mock.delete_product("hat");
    let err = client.get_product(&ProductId::new("hat")).await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)), "got {err:?}");
}

#[tokio::test]
async fn test_filter_edits_load_latest_page() {
    let mock = MockStorefront::start(vec![product("hat", 1)]).await;
    let browser = Arc::new(CatalogBrowser::new(Arc::new(api(&mock, RetryPolicy::none()))));
    let mut pages = browser.subscribe();

    let (tx, rx) = mpsc::channel(8);
    let updates = debounce(rx, Duration::from_millis(50));
    let follower = tokio::spawn(Arc::clone(&browser).follow(updates));

    let mut session = FilterSession::from_query_string("", tx).unwrap();
    session.set(FilterKey::Search, "h").await.unwrap();
    session.set(FilterKey::Search, "ha").await.unwrap();
    session.set(FilterKey::Search, "hat").await.unwrap();
    drop(session);

    pages.changed().await.unwrap();
    follower.await.unwrap();

    assert_eq!(browser.page().products.len(), 1);
    assert_eq!(mock.listing_queries(), vec![Some("search=hat".to_string())]);
}
