//! Command implementations.
//!
//! Each command opens the profile through the storefront's own services, so
//! the cart and account rules are exactly those of the web front end.

pub mod auth;
pub mod cart;
pub mod catalog;

use std::fmt::Display;
use std::sync::Arc;

use thiserror::Error;

use pebble_core::ProductId;
use pebble_storefront::catalog::{CatalogClient, CatalogError};
use pebble_storefront::clock::SystemClock;
use pebble_storefront::config::{ConfigError, StorefrontConfig};
use pebble_storefront::routes::products::parse_product_id;
use pebble_storefront::services::cart::{CheckoutError, RenderInstruction};

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Catalog request or lookup failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Checkout refused.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// Sign-in or sign-up refused, with the field messages.
    #[error("{0}")]
    Auth(String),

    /// A `--option` value was not `GROUP=VALUE` for a known option.
    #[error("Unknown option: {0}")]
    UnknownOption(String),

    /// The cart has no line for this product.
    #[error("Product {0} is not in the cart")]
    NotInCart(ProductId),
}

/// Write one line of command output.
#[allow(clippy::print_stdout)]
pub fn emit(line: impl Display) {
    println!("{line}");
}

/// Print the notices a cart change produced.
pub fn emit_toasts(render: &[RenderInstruction]) {
    for instruction in render {
        if let RenderInstruction::Toast(message) = instruction {
            emit(message);
        }
    }
}

/// Build a catalog client from the environment.
pub fn catalog_client() -> Result<(CatalogClient, StorefrontConfig), CommandError> {
    let config = StorefrontConfig::from_env()?;
    let client = CatalogClient::new(&config.catalog, Arc::new(SystemClock))?;
    Ok((client, config))
}

/// Parse a product ID argument.
pub fn product_id(raw: &str) -> Result<ProductId, CommandError> {
    Ok(parse_product_id(raw)?)
}
