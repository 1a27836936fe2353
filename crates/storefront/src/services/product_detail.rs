//! Product detail selection: mock variations, price multipliers and the
//! quantity stepper.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pebble_core::{Price, ProductId};

use crate::models::Variations;

use super::cart::parse_quantity;

/// Upper bound of the quantity stepper.
pub const MAX_QUANTITY: u32 = 999;

/// A named option with its choices, e.g. `Size: S, M, L, XL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariationGroup {
    pub name: &'static str,
    pub options: &'static [&'static str],
}

/// Options offered on every product.
pub const VARIATIONS: &[VariationGroup] = &[
    VariationGroup {
        name: "Size",
        options: &["S", "M", "L", "XL"],
    },
    VariationGroup {
        name: "Color",
        options: &["Black", "White", "Blue", "Red"],
    },
];

/// `(group, option, multiplier)` for options that change the price.
const SURCHARGES: &[(&str, &str, Decimal)] = &[
    ("Size", "XL", Decimal::from_parts(110, 0, 0, false, 2)),
    ("Color", "Red", Decimal::from_parts(105, 0, 0, false, 2)),
];

/// Combined price multiplier for `variations`.
///
/// Multipliers of every selected surcharge option are multiplied together,
/// so XL in Red costs `1.10 * 1.05` of the base price.
#[must_use]
pub fn price_multiplier(variations: &Variations) -> Decimal {
    SURCHARGES
        .iter()
        .filter(|(group, option, _)| variations.get(*group).is_some_and(|v| v == option))
        .fold(Decimal::ONE, |acc, (_, _, factor)| acc * factor)
}

/// Whether `option` is a valid choice for `group`.
#[must_use]
pub fn is_known_option(group: &str, option: &str) -> bool {
    VARIATIONS
        .iter()
        .any(|g| g.name == group && g.options.contains(&option))
}

/// Quantity chosen on the detail page, always within `1..=999`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct QuantityStepper(u32);

impl QuantityStepper {
    #[must_use]
    pub fn new(quantity: u32) -> Self {
        Self(quantity.clamp(1, MAX_QUANTITY))
    }

    /// Read a typed value. Unparseable input is 1.
    #[must_use]
    pub fn from_input(raw: &str) -> Self {
        Self::new(parse_quantity(raw))
    }

    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    #[must_use]
    pub fn increment(self) -> Self {
        Self::new(self.0.saturating_add(1))
    }

    #[must_use]
    pub fn decrement(self) -> Self {
        Self::new(self.0.saturating_sub(1))
    }
}

impl Default for QuantityStepper {
    fn default() -> Self {
        Self(1)
    }
}

impl From<u32> for QuantityStepper {
    fn from(quantity: u32) -> Self {
        Self::new(quantity)
    }
}

impl From<QuantityStepper> for u32 {
    fn from(stepper: QuantityStepper) -> Self {
        stepper.0
    }
}

/// Options and quantity picked for one product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailSelection {
    pub product_id: Option<ProductId>,
    pub variations: Variations,
    pub quantity: QuantityStepper,
}

impl DetailSelection {
    /// A fresh selection for `product_id`.
    #[must_use]
    pub fn for_product(product_id: ProductId) -> Self {
        Self {
            product_id: Some(product_id),
            ..Self::default()
        }
    }

    /// Choose `option` in `group`. Unknown groups or options are ignored.
    pub fn select(&mut self, group: &str, option: &str) -> bool {
        if !is_known_option(group, option) {
            return false;
        }
        self.variations.insert(group.to_string(), option.to_string());
        true
    }

    /// Whether `option` is chosen in `group`.
    #[must_use]
    pub fn is_selected(&self, group: &str, option: &str) -> bool {
        self.variations.get(group).is_some_and(|v| v == option)
    }

    /// Price of one unit with the chosen options.
    #[must_use]
    pub fn unit_price(&self, base: Price) -> Price {
        base.scaled(price_multiplier(&self.variations))
    }

    /// Price of the chosen quantity.
    #[must_use]
    pub fn total(&self, base: Price) -> Price {
        self.unit_price(base).times(self.quantity.value())
    }

    /// Variations to store on the cart line, if any were chosen.
    #[must_use]
    pub fn chosen_variations(&self) -> Option<Variations> {
        (!self.variations.is_empty()).then(|| self.variations.clone())
    }

    /// Back to a quantity of 1 after an add; options are kept.
    pub fn reset_quantity(&mut self) {
        self.quantity = QuantityStepper::default();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn selection() -> DetailSelection {
        DetailSelection::for_product(ProductId::new(1))
    }

    #[test]
    fn test_no_surcharge_by_default() {
        let s = selection();
        assert_eq!(s.unit_price(Price::from_cents(2000)).display(), "$20.00");
    }

    #[test]
    fn test_surcharges_combine() {
        let mut s = selection();
        assert!(s.select("Size", "XL"));
        assert_eq!(s.unit_price(Price::from_cents(10000)).display(), "$110.00");

        assert!(s.select("Color", "Red"));
        assert_eq!(s.unit_price(Price::from_cents(10000)).display(), "$115.50");

        assert!(s.select("Size", "M"));
        assert_eq!(s.unit_price(Price::from_cents(10000)).display(), "$105.00");
    }

    #[test]
    fn test_total_uses_quantity() {
        let mut s = selection();
        s.select("Size", "XL");
        s.quantity = QuantityStepper::new(3);
        assert_eq!(s.total(Price::from_cents(1995)).display(), "$65.84");
    }

    #[test]
    fn test_unknown_options_ignored() {
        let mut s = selection();
        assert!(!s.select("Size", "XXL"));
        assert!(!s.select("Material", "Wool"));
        assert!(s.chosen_variations().is_none());
    }

    #[test]
    fn test_stepper_bounds() {
        assert_eq!(QuantityStepper::default().decrement().value(), 1);
        assert_eq!(QuantityStepper::new(999).increment().value(), 999);
        assert_eq!(QuantityStepper::from_input("5000").value(), 999);
        assert_eq!(QuantityStepper::from_input("abc").value(), 1);
        assert_eq!(QuantityStepper::from_input("7").increment().value(), 8);
    }

    #[test]
    fn test_reset_keeps_options() {
        let mut s = selection();
        s.select("Color", "Blue");
        s.quantity = QuantityStepper::new(4);
        s.reset_quantity();
        assert_eq!(s.quantity.value(), 1);
        assert!(s.is_selected("Color", "Blue"));
    }

    #[test]
    fn test_stepper_deserializes_clamped() {
        let s: QuantityStepper = serde_json::from_str("0").unwrap();
        assert_eq!(s.value(), 1);
    }
}
