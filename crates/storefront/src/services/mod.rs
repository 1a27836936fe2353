//! Business logic services for the storefront.
//!
//! Services work on a borrowed [`KeyValueStore`](crate::storage::KeyValueStore)
//! so the HTTP handlers and the CLI drive exactly the same code.
//!
//! # Services
//!
//! - `auth` - Mock sign-in and sign-up against the stored user registry
//! - `cart` - Cart commands and the render instructions they produce
//! - `product_detail` - Variation pricing and the quantity stepper

pub mod auth;
pub mod cart;
pub mod product_detail;
