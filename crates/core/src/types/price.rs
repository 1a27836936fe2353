//! Type-safe price representation using decimal arithmetic.
//!
//! Prices arrive from the catalog API as JSON numbers (e.g. `109.95`) and are
//! persisted back the same way, but all arithmetic happens on
//! [`rust_decimal::Decimal`] so that line totals and variation multipliers are
//! exact.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),
}

/// A non-negative amount in the store currency (US dollars).
///
/// ## Examples
///
/// ```
/// use pebble_core::Price;
///
/// let price = Price::from_cents(1999);
/// assert_eq!(price.display(), "$19.99");
/// assert_eq!(price.times(3).display(), "$59.97");
/// ```
///
/// Deserializing goes through [`Price::new`], so a negative amount in stored
/// or fetched data is a parse error. Arithmetic saturates at
/// [`Decimal::MAX`] instead of overflowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "JsonAmount", into = "JsonAmount")]
pub struct Price(Decimal);

/// Wire form of a price: a plain JSON number.
#[derive(Serialize, Deserialize)]
#[serde(transparent)]
struct JsonAmount(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` if the amount is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// Create a price from a whole number of cents.
    ///
    /// Negative inputs are clamped to zero.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents.max(0), 2))
    }

    /// Returns the decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self(
            self.0
                .checked_mul(Decimal::from(quantity))
                .unwrap_or(Decimal::MAX),
        )
    }

    /// Price scaled by a non-negative factor (e.g. a variation surcharge).
    ///
    /// Negative factors scale to zero.
    #[must_use]
    pub fn scaled(&self, factor: Decimal) -> Self {
        let scaled = self.0.checked_mul(factor).unwrap_or(if factor.is_sign_negative() {
            Decimal::ZERO
        } else {
            Decimal::MAX
        });
        Self(scaled.max(Decimal::ZERO))
    }

    /// Format for display with two decimal places (e.g. `"$19.99"`).
    ///
    /// Rounds half away from zero, matching how the storefront has always
    /// shown totals.
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        format!("${rounded:.2}")
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.checked_add(rhs.0).unwrap_or(Decimal::MAX))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl TryFrom<JsonAmount> for Price {
    type Error = PriceError;

    fn try_from(amount: JsonAmount) -> Result<Self, Self::Error> {
        Self::new(amount.0)
    }
}

impl From<Price> for JsonAmount {
    fn from(price: Price) -> Self {
        Self(price.0)
    }
}
