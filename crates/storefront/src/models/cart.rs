//! Cart line items and the cart itself.
//!
//! The cart is an insertion-ordered list with at most one line per product
//! id. Every line has a quantity of at least 1; the only way for a product to
//! leave the cart is [`Cart::remove`] or [`Cart::clear`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use pebble_core::{Price, ProductId};

use super::CatalogEntry;

/// Chosen product options, e.g. `Size -> XL`.
pub type Variations = BTreeMap<String, String>;

/// One product in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    /// Product ID (unique within the cart).
    pub id: ProductId,
    /// Product title at the time it was added.
    pub title: String,
    /// Unit price at the time it was added.
    pub price: Price,
    /// Image URL.
    pub image: String,
    /// Quantity, always at least 1.
    pub quantity: u32,
    /// Options chosen on the detail page, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_variations: Option<Variations>,
}

impl CartLineItem {
    /// Line total (`price * quantity`).
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// Ordered collection of line items.
///
/// Serializes as a bare JSON array, which is what lives under `cartItems`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<CartLineItem>", into = "Vec<CartLineItem>")]
pub struct Cart {
    items: Vec<CartLineItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from stored items, restoring the cart invariants.
    ///
    /// Zero quantities become 1 and repeated ids are merged into the first
    /// occurrence.
    #[must_use]
    pub fn from_items(items: Vec<CartLineItem>) -> Self {
        let mut cart = Self::new();
        for mut item in items {
            item.quantity = item.quantity.max(1);
            if let Some(existing) = cart.line_mut(item.id) {
                existing.quantity = existing.quantity.saturating_add(item.quantity);
            } else {
                cart.items.push(item);
            }
        }
        cart
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The line for `id`, if present.
    #[must_use]
    pub fn line(&self, id: ProductId) -> Option<&CartLineItem> {
        self.items.iter().find(|item| item.id == id)
    }

    fn line_mut(&mut self, id: ProductId) -> Option<&mut CartLineItem> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    /// Add `quantity` of `product`.
    ///
    /// An existing line for the same id has its quantity increased; otherwise
    /// a new line is appended. A quantity of 0 counts as 1. Variations, when
    /// given, replace those stored on the line: lines are keyed by product id
    /// only.
    pub fn add(&mut self, product: &CatalogEntry, quantity: u32, variations: Option<Variations>) {
        let quantity = quantity.max(1);
        if let Some(line) = self.line_mut(product.id) {
            line.quantity = line.quantity.saturating_add(quantity);
            if variations.is_some() {
                line.selected_variations = variations;
            }
            return;
        }

        self.items.push(CartLineItem {
            id: product.id,
            title: product.title.clone(),
            price: product.price,
            image: product.image.clone(),
            quantity,
            selected_variations: variations,
        });
    }

    /// Increase the quantity of `id` by one. Returns `false` if absent.
    pub fn increment(&mut self, id: ProductId) -> bool {
        self.line_mut(id).is_some_and(|line| {
            line.quantity = line.quantity.saturating_add(1);
            true
        })
    }

    /// Decrease the quantity of `id` by one, never below 1.
    ///
    /// Returns `false` if absent.
    pub fn decrement(&mut self, id: ProductId) -> bool {
        self.line_mut(id).is_some_and(|line| {
            line.quantity = line.quantity.saturating_sub(1).max(1);
            true
        })
    }

    /// Set the quantity of `id`, clamped to at least 1.
    ///
    /// Returns `false` if absent.
    pub fn set_quantity(&mut self, id: ProductId, quantity: u32) -> bool {
        self.line_mut(id).is_some_and(|line| {
            line.quantity = quantity.max(1);
            true
        })
    }

    /// Remove the line for `id`. Returns `false` if absent.
    pub fn remove(&mut self, id: ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.items.len() != before
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of `price * quantity` over all lines.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(CartLineItem::line_total).sum()
    }

    /// Sum of quantities, shown on the cart badge.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0_u32, |count, item| count.saturating_add(item.quantity))
    }
}

impl From<Vec<CartLineItem>> for Cart {
    fn from(items: Vec<CartLineItem>) -> Self {
        Self::from_items(items)
    }
}

impl From<Cart> for Vec<CartLineItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}
