//! Cart engine.
//!
//! Every cart interaction is a [`CartCommand`]. [`CartService::apply`] loads
//! the persisted cart, applies the command, writes the whole cart back and
//! returns the new cart together with the [`RenderInstruction`]s describing
//! which page regions must be refreshed.
//!
//! Writes are last-writer-wins: two tabs mutating the same browser storage
//! each write their full view of the cart.

use thiserror::Error;
use tracing::{debug, info};

use pebble_core::ProductId;

use crate::models::{Cart, CatalogEntry, Variations};
use crate::storage::{KeyValueStore, StorageExt, keys};

/// Toast shown when the listing grid adds a product.
pub const LISTING_ADD_MESSAGE: &str = "Item added to cart";

/// Toast shown after a successful checkout.
pub const ORDER_PLACED_MESSAGE: &str = "Order placed successfully!";

/// Where an add-to-cart interaction came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOrigin {
    /// The "Add" button on a listing card.
    Listing,
    /// The add button on the product detail page.
    Detail,
}

/// A cart interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartCommand {
    /// Add `quantity` of `product`, merging with an existing line.
    Add {
        product: CatalogEntry,
        quantity: u32,
        variations: Option<Variations>,
        origin: AddOrigin,
    },
    /// Raise a line's quantity by one.
    Increment(ProductId),
    /// Lower a line's quantity by one, never below 1.
    Decrement(ProductId),
    /// Set a line's quantity, clamped to at least 1.
    SetQuantity { id: ProductId, quantity: u32 },
    /// Delete a line regardless of quantity.
    Remove(ProductId),
    /// Empty the cart.
    Clear,
}

/// A page region to refresh after a cart change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderInstruction {
    /// Re-render the cart line items.
    CartItems,
    /// Update the nav badge with the total quantity.
    Badge(u32),
    /// Update the formatted cart total.
    Total(String),
    /// Enable or disable the checkout button.
    CheckoutEnabled(bool),
    /// Slide the cart drawer open.
    OpenCartPanel,
    /// Show a transient notice.
    Toast(String),
}

/// Result of applying a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartOutcome {
    /// The cart after the command, as persisted.
    pub cart: Cart,
    /// Regions to refresh, in order.
    pub render: Vec<RenderInstruction>,
}

/// Errors from checkout.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckoutError {
    /// Checkout was submitted with nothing in the cart.
    #[error("Please add items to your cart first")]
    EmptyCart,
}

/// Cart operations over a browser's storage.
pub struct CartService<'a> {
    store: &'a dyn KeyValueStore,
}

impl<'a> CartService<'a> {
    /// Create a cart service for `store`.
    #[must_use]
    pub const fn new(store: &'a dyn KeyValueStore) -> Self {
        Self { store }
    }

    /// Read the persisted cart. Missing or unreadable data is an empty cart.
    #[must_use]
    pub fn load(&self) -> Cart {
        self.store.get_or_default(keys::CART_ITEMS)
    }

    /// Apply `command`, persist the cart and describe what to re-render.
    ///
    /// Commands naming a product that is not in the cart change nothing but
    /// still produce the usual summary instructions.
    pub fn apply(&self, command: CartCommand) -> CartOutcome {
        let mut cart = self.load();
        let mut extra = Vec::new();

        match command {
            CartCommand::Add {
                product,
                quantity,
                variations,
                origin,
            } => {
                let quantity = quantity.max(1);
                cart.add(&product, quantity, variations);
                info!(product_id = %product.id, quantity, ?origin, "added to cart");
                extra.push(RenderInstruction::OpenCartPanel);
                extra.push(RenderInstruction::Toast(match origin {
                    AddOrigin::Listing => LISTING_ADD_MESSAGE.to_string(),
                    AddOrigin::Detail => detail_add_message(quantity),
                }));
            }
            CartCommand::Increment(id) => {
                if !cart.increment(id) {
                    debug!(product_id = %id, "increment on missing line");
                }
            }
            CartCommand::Decrement(id) => {
                if !cart.decrement(id) {
                    debug!(product_id = %id, "decrement on missing line");
                }
            }
            CartCommand::SetQuantity { id, quantity } => {
                if !cart.set_quantity(id, quantity) {
                    debug!(product_id = %id, "set quantity on missing line");
                }
            }
            CartCommand::Remove(id) => {
                if !cart.remove(id) {
                    debug!(product_id = %id, "remove on missing line");
                }
            }
            CartCommand::Clear => cart.clear(),
        }

        self.store.set(keys::CART_ITEMS, &cart);

        let mut render = summary(&cart);
        render.extend(extra);
        CartOutcome { cart, render }
    }

    /// Complete the simulated checkout: empty the cart and confirm.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` if there is nothing to buy; the
    /// stored cart is left untouched.
    pub fn checkout(&self) -> Result<CartOutcome, CheckoutError> {
        let cart = self.load();
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        info!(
            items = cart.item_count(),
            total = %cart.total(),
            "order placed"
        );
        let mut outcome = self.apply(CartCommand::Clear);
        outcome
            .render
            .push(RenderInstruction::Toast(ORDER_PLACED_MESSAGE.to_string()));
        Ok(outcome)
    }
}

/// Toast shown when the detail page adds `quantity` items.
#[must_use]
pub fn detail_add_message(quantity: u32) -> String {
    let noun = if quantity > 1 { "items" } else { "item" };
    format!("Added {quantity} {noun} to cart!")
}

/// The instructions every cart change produces.
#[must_use]
pub fn summary(cart: &Cart) -> Vec<RenderInstruction> {
    vec![
        RenderInstruction::CartItems,
        RenderInstruction::Badge(cart.item_count()),
        RenderInstruction::Total(cart.total().display()),
        RenderInstruction::CheckoutEnabled(!cart.is_empty()),
    ]
}

/// Read a quantity typed into a form field.
///
/// Leading digits are used (`"3 pcs"` is 3); anything unparseable, zero or
/// negative becomes 1.
#[must_use]
pub fn parse_quantity(raw: &str) -> u32 {
    let trimmed = raw.trim();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if unsigned.starts_with('-') {
        return 1;
    }
    let digits: String = unsigned.chars().take_while(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return 1;
    }
    digits.parse::<u32>().unwrap_or(u32::MAX).max(1)
}
