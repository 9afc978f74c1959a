//! HTTP middleware and extractors for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//!
//! Authentication is an extractor ([`RequireUser`]) applied per handler.

pub mod auth;
pub mod request_id;

pub use auth::{RequireUser, bearer_token, hash_token};
pub use request_id::request_id_middleware;
