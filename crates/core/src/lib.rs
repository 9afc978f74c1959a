//! Bazaar Core - Shared types and pure domain logic.
//!
//! This crate provides what every Bazaar component agrees on:
//! - `storefront` - Public catalog and cart API
//! - `admin` - Internal reporting API
//! - `client` - Session-side cart engine and catalog browsing
//! - `cli` - Migrations and user management
//!
//! # Architecture
//!
//! The core crate contains only types, traits and pure functions - no I/O,
//! no database access, no HTTP clients. Query descriptors produced here are
//! rendered into SQL by the services, so listing and counting always agree.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs
//! - [`catalog`] - Products, filter state and the catalog query builder
//! - [`cart`] - Cart model, state transitions and quantity drafts
//! - [`crosssell`] - Cross-sell id parsing and merging
//! - [`report`] - Admin order report filters and grouping
//! - [`pattern`] - `ILIKE` pattern escaping

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod crosssell;
pub mod pattern;
pub mod report;
pub mod types;

pub use types::*;
