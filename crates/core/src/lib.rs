//! Pebble Market Core - Shared types library.
//!
//! This crate provides common types used across all Pebble Market components:
//! - `storefront` - Storefront library and HTTP front end
//! - `cli` - Command-line front end over a file-backed browser profile
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices and emails

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
