//! Catalog entry types.
//!
//! Catalog entries come from the remote product API or the bundled fallback
//! file and are never modified by the storefront.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pebble_core::{Price, ProductId};

/// A product record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Product ID.
    pub id: ProductId,
    /// Product title.
    pub title: String,
    /// Unit price.
    pub price: Price,
    /// Image URL.
    pub image: String,
    /// Long description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Category name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Average customer rating.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
}

/// Average customer rating of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    /// Average score out of 5.
    #[serde(with = "rust_decimal::serde::float")]
    pub rate: Decimal,
    /// Number of ratings.
    #[serde(default)]
    pub count: u32,
}

impl CatalogEntry {
    /// Rating text for the detail page (`"3.9 out of 5"` or `"Not rated"`).
    #[must_use]
    pub fn rating_label(&self) -> String {
        self.rating.map_or_else(
            || "Not rated".to_string(),
            |rating| format!("{} out of 5", rating.rate.normalize()),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_api_shape() {
        let json = r#"{
            "id": 1,
            "title": "Fjallraven Backpack",
            "price": 109.95,
            "description": "Your perfect pack",
            "category": "men's clothing",
            "image": "https://fakestoreapi.com/img/81fPKd-2AYL._AC_SL1500_.jpg",
            "rating": { "rate": 3.9, "count": 120 }
        }"#;
        let entry: CatalogEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.id, ProductId::new(1));
        assert_eq!(entry.price.display(), "$109.95");
        assert_eq!(entry.rating_label(), "3.9 out of 5");
    }

    #[test]
    fn test_optional_fields_and_unknown_keys() {
        let json = r#"{"id": 2, "title": "Mug", "price": 5, "image": "mug.png", "sku": "X1"}"#;
        let entry: CatalogEntry = serde_json::from_str(json).unwrap();
        assert!(entry.description.is_none());
        assert_eq!(entry.rating_label(), "Not rated");
    }

    #[test]
    fn test_negative_price_is_rejected() {
        let json = r#"{"id": 3, "title": "Refund", "price": -5, "image": "r.png"}"#;
        assert!(serde_json::from_str::<CatalogEntry>(json).is_err());

        let listing = format!("[{json}]");
        assert!(serde_json::from_str::<Vec<CatalogEntry>>(&listing).is_err());
    }
}
