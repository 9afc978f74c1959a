//! Bazaar storefront library.
//!
//! This crate provides the storefront API as a library, allowing it to be
//! tested in-process and reused by the CLI (user creation, migrations).

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

/// Embedded storefront migrations.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
