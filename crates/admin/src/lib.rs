//! Bazaar Admin library.
//!
//! Internal reporting API over the storefront database, exposed as a
//! library so the router can be driven from tests.
//!
//! # Security
//!
//! Every API route requires the `ADMIN_API_TOKEN` bearer token. Bind to a
//! private interface; the service is not meant to face the internet.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
