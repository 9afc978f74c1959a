//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                  - Liveness check
//! GET  /health/ready            - Readiness check (database ping)
//!
//! # Catalog
//! GET  /api/products            - Filtered, sorted, paginated listing
//! GET  /api/products/crosssell  - Merged cross-sells for ?ids=a,b
//! GET  /api/products/{id}       - Product detail
//! GET  /api/catalog/options     - Brand and category filter options
//!
//! # Cart (requires bearer token)
//! GET  /api/cart                - Current cart
//! POST /api/cart                - Set absolute count {productId, count}; 0 removes
//! ```

pub mod cart;
pub mod health;
pub mod products;

use axum::{Router, middleware::from_fn, routing::get};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// JSON API routes, nested under `/api`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Catalog
        .route("/products", get(products::index))
        .route("/products/crosssell", get(products::cross_sells))
        .route("/products/{id}", get(products::show))
        .route("/catalog/options", get(products::options))
        // Cart
        .route("/cart", get(cart::show).post(cart::update))
}

/// All routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api_routes())
}

/// The full application with tracing and request IDs, ready to serve.
pub fn app(state: AppState) -> Router {
    routes()
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}
