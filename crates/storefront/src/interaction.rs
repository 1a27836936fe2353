//! Page interaction state and presentation settings.
//!
//! [`PageContext`] is the per-visitor page state that lives in the HTTP
//! session next to the browser storage: the detail-page selection and the
//! de-duplicator for listing-grid actions. Lazy-image and zoom settings are
//! rendered into the markup and acted on by `static/js/storefront.js`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use pebble_core::ProductId;

use crate::models::CatalogEntry;
use crate::services::product_detail::DetailSelection;

/// Session key holding the [`PageContext`].
pub const PAGE_CONTEXT_KEY: &str = "page_context";

/// 1x1 transparent GIF shown until a lazy image is swapped in.
pub const PLACEHOLDER_IMAGE: &str =
    "data:image/gif;base64,R0lGODlhAQABAIAAAAAAAP///ywAAAAAAQABAAACAUwAOw==";

/// Distance from the viewport at which lazy images start loading.
pub const LAZY_MARGIN_PX: u32 = 150;

/// Window in which repeated identical interactions count as one.
pub const DEDUPE_WINDOW_MS: i64 = 500;

/// A product image whose real source is loaded near the viewport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LazyImage {
    /// Image URL, carried in `data-src`.
    pub data_src: String,
    /// Alt text.
    pub alt: String,
}

impl LazyImage {
    #[must_use]
    pub fn new(data_src: impl Into<String>, alt: impl Into<String>) -> Self {
        Self {
            data_src: data_src.into(),
            alt: alt.into(),
        }
    }

    /// What `src` holds before the swap.
    #[must_use]
    pub const fn placeholder(&self) -> &'static str {
        PLACEHOLDER_IMAGE
    }

    /// `IntersectionObserver` root margin.
    #[must_use]
    pub fn root_margin() -> String {
        format!("{LAZY_MARGIN_PX}px 0px")
    }

    /// Whether an image `distance_px` below or above the viewport edge should
    /// load. Zero or negative distances are inside the viewport.
    #[must_use]
    pub fn should_load(distance_px: i64) -> bool {
        distance_px <= i64::from(LAZY_MARGIN_PX)
    }
}

/// Hover magnification on the detail image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoomSettings {
    /// Zoom is only offered on viewports wider than this.
    pub min_viewport_width: u32,
    /// Magnification factor.
    pub ratio: u32,
}

impl ZoomSettings {
    pub const DEFAULT: Self = Self {
        min_viewport_width: 768,
        ratio: 2,
    };

    /// Whether a viewport of `width` pixels gets hover zoom.
    #[must_use]
    pub const fn enabled_for(&self, width: u32) -> bool {
        width > self.min_viewport_width
    }
}

impl Default for ZoomSettings {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Suppresses identical interactions that arrive within a short window, such
/// as the touch and click events of a single tap.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionDeduplicator {
    last_handled: HashMap<String, i64>,
}

impl InteractionDeduplicator {
    /// Whether the interaction `key` at `now_ms` should be handled.
    ///
    /// Returns `false` for a repeat of `key` within [`DEDUPE_WINDOW_MS`] of
    /// the last handled one. Suppressed repeats do not extend the window.
    pub fn should_handle(&mut self, key: &str, now_ms: i64) -> bool {
        let recent = self
            .last_handled
            .get(key)
            .is_some_and(|last| now_ms.saturating_sub(*last) < DEDUPE_WINDOW_MS);
        if recent {
            return false;
        }

        self.last_handled
            .retain(|_, at| now_ms.saturating_sub(*at) < DEDUPE_WINDOW_MS);
        self.last_handled.insert(key.to_string(), now_ms);
        true
    }
}

/// Per-visitor page state carried across requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContext {
    /// Selection on the last product detail page visited.
    #[serde(default)]
    pub detail: DetailSelection,
    /// The product shown on that page, so option changes need no lookup.
    #[serde(default)]
    pub product: Option<CatalogEntry>,
    /// Listing-grid duplicate suppression.
    #[serde(default)]
    pub grid: InteractionDeduplicator,
}

impl PageContext {
    /// Load the context from `session`, or start fresh.
    pub async fn load(session: &Session) -> Self {
        match session.get::<Self>(PAGE_CONTEXT_KEY).await {
            Ok(context) => context.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to load page context, starting fresh");
                Self::default()
            }
        }
    }

    /// Write the context back to `session`.
    pub async fn save(&self, session: &Session) {
        if let Err(e) = session.insert(PAGE_CONTEXT_KEY, self).await {
            tracing::warn!(error = %e, "failed to persist page context");
        }
    }

    /// The detail selection for `product_id`, starting over when the visitor
    /// has moved on to a different product.
    pub fn selection_for(&mut self, product_id: ProductId) -> &mut DetailSelection {
        if self.detail.product_id != Some(product_id) {
            self.detail = DetailSelection::for_product(product_id);
        }
        &mut self.detail
    }

    /// Remember `product` as the one on the detail page.
    pub fn show_product(&mut self, product: CatalogEntry) {
        self.selection_for(product.id);
        self.product = Some(product);
    }

    /// The remembered detail-page product, if it is `product_id`.
    #[must_use]
    pub fn product(&self, product_id: ProductId) -> Option<&CatalogEntry> {
        self.product.as_ref().filter(|p| p.id == product_id)
    }
}

/// Key identifying an add-to-cart from the listing grid.
#[must_use]
pub fn grid_add_key(product_id: ProductId) -> String {
    format!("add:{product_id}")
}
