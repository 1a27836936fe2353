//! Pebble Market storefront library.
//!
//! The cart engine, catalog cache and mock sign-in run over an injected
//! key-value store, so the HTTP front end (`routes`) and the `pebble-cli`
//! binary drive the same services.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod filters;
pub mod interaction;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;
