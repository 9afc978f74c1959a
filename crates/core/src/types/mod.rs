//! Core types for Bazaar.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;

pub use id::*;
