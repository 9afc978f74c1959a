//! Cart engine against a live HTTP stand-in for the storefront.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use bazaar_client::store::{CART_KEY, KeyValueStore, MemoryKeyValueStore};
use bazaar_client::{
    ApiClient, CartEngine, CartStore, ClientConfig, ClientError, LocalCartStore, RemoteCartStore,
    RetryPolicy,
};
use bazaar_core::ProductId;
use bazaar_core::cart::{Cart, CartMutation};
use bazaar_integration_tests::{MOCK_TOKEN, MockStorefront, product};

fn api(mock: &MockStorefront, token: Option<&str>) -> ApiClient {
    let mut config = ClientConfig::new(&mock.url).unwrap();
    if let Some(token) = token {
        config = config.with_token(token);
    }
    ApiClient::new(&config).unwrap().with_retry(RetryPolicy::none())
}

async fn remote_engine(mock: &MockStorefront) -> CartEngine {
    let store: Arc<dyn CartStore> = Arc::new(RemoteCartStore::new(api(mock, Some(MOCK_TOKEN))));
    CartEngine::load(store).await.unwrap()
}

#[tokio::test]
async fn test_remote_cart_sends_absolute_counts() {
    let mock = MockStorefront::start(vec![product("hat", 5), product("mug", 5)]).await;
    let engine = remote_engine(&mock).await;
    let hat = ProductId::new("hat");
    let mug = ProductId::new("mug");

    engine.add_one(&hat).await.unwrap();
    engine.add_one(&hat).await.unwrap();
    engine.add_one(&mug).await.unwrap();
    engine.remove_one(&hat).await.unwrap();
    let cart = engine.remove_line(&mug).await.unwrap();

    assert_eq!(
        mock.cart_writes(),
        vec![
            CartMutation::set(hat.clone(), 1),
            CartMutation::set(hat.clone(), 2),
            CartMutation::set(mug.clone(), 1),
            CartMutation::set(hat.clone(), 1),
            CartMutation::remove(mug),
        ]
    );
    assert_eq!(cart, mock.server_cart());
    assert_eq!(engine.count(&hat), 1);
}

#[tokio::test]
async fn test_remote_over_stock_is_rejected_and_cart_kept() {
    let mock = MockStorefront::start(vec![product("hat", 2)]).await;
    let engine = remote_engine(&mock).await;
    let hat = ProductId::new("hat");

    engine.add_quantity(&hat, 2).await.unwrap();
    let before = engine.cart();

    let err = engine.add_one(&hat).await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)), "got {err:?}");
    assert_eq!(engine.cart(), before);
    assert_eq!(mock.server_cart().count(&hat), 2);
}

#[tokio::test]
async fn test_remote_unknown_product_is_not_found() {
    let mock = MockStorefront::start(vec![product("hat", 2)]).await;
    let engine = remote_engine(&mock).await;

    let err = engine.add_one(&ProductId::new("ghost")).await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)), "got {err:?}");
    assert!(engine.cart().is_empty());
}

#[tokio::test]
async fn test_remote_bad_token_is_unauthorized() {
    let mock = MockStorefront::start(vec![product("hat", 2)]).await;
    let store: Arc<dyn CartStore> = Arc::new(RemoteCartStore::new(api(&mock, Some("wrong"))));

    let err = CartEngine::load(store).await.err().unwrap();
    assert!(matches!(err, ClientError::Unauthorized));
}

#[tokio::test]
async fn test_set_quantity_clamps_before_writing() {
    let mock = MockStorefront::start(vec![product("hat", 3)]).await;
    let engine = remote_engine(&mock).await;
    let hat = ProductId::new("hat");

    engine.set_quantity(&hat, 99, 3).await.unwrap();
    engine.set_quantity(&hat, -1, 3).await.unwrap();

    assert_eq!(
        mock.cart_writes(),
        vec![CartMutation::set(hat.clone(), 3), CartMutation::set(hat, 1)]
    );
}

#[tokio::test]
async fn test_guest_cart_persists_snapshots() {
    let mock = MockStorefront::start(vec![product("hat", 4)]).await;
    let storage = Arc::new(MemoryKeyValueStore::new());
    let store: Arc<dyn CartStore> = Arc::new(LocalCartStore::new(
        Arc::clone(&storage) as Arc<dyn KeyValueStore>,
        Arc::new(api(&mock, None)),
    ));
    let engine = CartEngine::load(Arc::clone(&store)).await.unwrap();
    let hat = ProductId::new("hat");

    engine.add_quantity(&hat, 2).await.unwrap();
    assert!(mock.cart_writes().is_empty());

    let raw = storage.get(CART_KEY).await.unwrap().unwrap();
    let stored: Cart = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored.count(&hat), 2);
    assert_eq!(stored.get(&hat).unwrap().product.title, "Product hat");

    // A new session over the same storage sees the same cart.
    let reloaded = CartEngine::load(store).await.unwrap();
    assert_eq!(reloaded.cart(), engine.cart());
}

#[tokio::test]
async fn test_guest_cart_checks_fresh_stock() {
    let mock = MockStorefront::start(vec![product("hat", 1), product("mug", 3)]).await;
    let store: Arc<dyn CartStore> = Arc::new(LocalCartStore::new(
        Arc::new(MemoryKeyValueStore::new()),
        Arc::new(api(&mock, None)),
    ));
    let engine = CartEngine::load(store).await.unwrap();
    let hat = ProductId::new("hat");
    let mug = ProductId::new("mug");

    engine.add_one(&hat).await.unwrap();
    let err = engine.add_one(&hat).await.unwrap_err();
    assert!(matches!(err, ClientError::Cart(_)), "got {err:?}");

    engine.add_one(&mug).await.unwrap();
    mock.delete_product("mug");
    let err = engine.add_one(&mug).await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)), "got {err:?}");

    // Removing a deleted product needs no snapshot.
    engine.remove_line(&mug).await.unwrap();
    assert_eq!(engine.count(&mug), 0);
    assert_eq!(engine.count(&hat), 1);
}

#[tokio::test]
async fn test_remote_decrease_after_product_deleted() {
    let mock = MockStorefront::start(vec![product("hat", 5)]).await;
    let engine = remote_engine(&mock).await;
    let hat = ProductId::new("hat");

    engine.add_quantity(&hat, 3).await.unwrap();
    mock.delete_product("hat");

    let cart = engine.remove_one(&hat).await.unwrap();
    assert_eq!(cart.count(&hat), 2);
    assert_eq!(mock.server_cart().count(&hat), 2);
    assert!(matches!(
        engine.add_one(&hat).await,
        Err(ClientError::NotFound(_))
    ));
}
