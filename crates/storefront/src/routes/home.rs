//! Listing page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use pebble_core::ProductId;

use crate::filters;
use crate::interaction::LazyImage;
use crate::models::CatalogEntry;
use crate::routes::PageChrome;
use crate::state::AppState;
use crate::storage::BrowserStorage;

/// Product card display data for templates.
#[derive(Clone)]
pub struct ProductCardView {
    pub id: ProductId,
    pub title: String,
    pub price: String,
    pub image: LazyImage,
}

impl From<&CatalogEntry> for ProductCardView {
    fn from(entry: &CatalogEntry) -> Self {
        Self {
            id: entry.id,
            title: entry.title.clone(),
            price: entry.price.display(),
            image: LazyImage::new(entry.image.clone(), entry.title.clone()),
        }
    }
}

/// Listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub chrome: PageChrome,
    pub products: Vec<ProductCardView>,
    pub error: Option<String>,
    pub root_margin: String,
}

/// Display the product listing.
///
/// Catalog failures replace the grid with an inline message; the page itself
/// always renders.
#[instrument(skip(state, storage))]
pub async fn home(State(state): State<AppState>, storage: BrowserStorage) -> impl IntoResponse {
    let limit = state.config().catalog.page_size;
    let (products, error) = match state.catalog().fetch_products(&storage, limit).await {
        Ok(entries) => (entries.iter().map(ProductCardView::from).collect(), None),
        Err(e) => {
            tracing::warn!(error = %e, "listing rendered without products");
            (Vec::new(), Some(e.to_string()))
        }
    };

    // The catalog cache lives in the visitor's storage
    storage.commit().await;

    HomeTemplate {
        chrome: PageChrome::load(&state, &storage),
        products,
        error,
        root_margin: LazyImage::root_margin(),
    }
}
