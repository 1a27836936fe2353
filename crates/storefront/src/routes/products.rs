//! Product detail route handlers.
//!
//! The page state (chosen options, quantity) lives in the session's
//! [`PageContext`]; every option or stepper change re-renders the options
//! fragment with the recomputed unit price and total.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use pebble_core::ProductId;

use crate::catalog::CatalogError;
use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::interaction::{PageContext, ZoomSettings};
use crate::models::CatalogEntry;
use crate::routes::{PageChrome, hx_trigger};
use crate::services::cart::{AddOrigin, CartCommand, CartService};
use crate::services::product_detail::{DetailSelection, MAX_QUANTITY, QuantityStepper, VARIATIONS};
use crate::state::AppState;
use crate::storage::BrowserStorage;

// =============================================================================
// View Types
// =============================================================================

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub image: String,
    pub rating: String,
}

impl From<&CatalogEntry> for ProductView {
    fn from(entry: &CatalogEntry) -> Self {
        Self {
            id: entry.id,
            title: entry.title.clone(),
            description: entry.description.clone().unwrap_or_default(),
            category: entry.category.clone(),
            image: entry.image.clone(),
            rating: entry.rating_label(),
        }
    }
}

/// One option button.
#[derive(Clone)]
pub struct OptionView {
    pub value: &'static str,
    pub selected: bool,
}

/// One variation group with its buttons.
#[derive(Clone)]
pub struct GroupView {
    pub name: &'static str,
    pub options: Vec<OptionView>,
}

/// Options, stepper and price display data.
#[derive(Clone)]
pub struct OptionsView {
    pub product_id: ProductId,
    pub groups: Vec<GroupView>,
    pub unit_price: String,
    pub total: String,
    pub quantity: u32,
    pub max_quantity: u32,
}

impl OptionsView {
    fn new(product: &CatalogEntry, selection: &DetailSelection) -> Self {
        let groups = VARIATIONS
            .iter()
            .map(|group| GroupView {
                name: group.name,
                options: group
                    .options
                    .iter()
                    .map(|option| OptionView {
                        value: *option,
                        selected: selection.is_selected(group.name, option),
                    })
                    .collect(),
            })
            .collect();

        Self {
            product_id: product.id,
            groups,
            unit_price: selection.unit_price(product.price).display(),
            total: selection.total(product.price).display(),
            quantity: selection.quantity.value(),
            max_quantity: MAX_QUANTITY,
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub chrome: PageChrome,
    pub product: Option<ProductView>,
    pub options: Option<OptionsView>,
    pub zoom: ZoomSettings,
    pub invalid_id: bool,
    pub error: Option<String>,
}

/// Detail options fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/detail_options.html")]
pub struct DetailOptionsTemplate {
    pub options: OptionsView,
}

// =============================================================================
// Form Types
// =============================================================================

/// Query parameters for the detail page.
#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    pub id: Option<String>,
}

/// Variation choice form data.
#[derive(Debug, Deserialize)]
pub struct VariationForm {
    pub id: String,
    pub group: String,
    pub option: String,
}

/// What the stepper did.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepAction {
    Increment,
    Decrement,
    Set,
}

/// Quantity stepper form data.
#[derive(Debug, Deserialize)]
pub struct QuantityForm {
    pub id: String,
    pub action: StepAction,
    #[serde(default)]
    pub quantity: String,
}

/// Add-to-cart form data.
#[derive(Debug, Deserialize)]
pub struct DetailAddForm {
    pub id: String,
}

/// Parse a product id from a query or form value.
///
/// # Errors
///
/// Returns `CatalogError::InvalidId` unless the value is a positive integer.
pub fn parse_product_id(raw: &str) -> Result<ProductId, CatalogError> {
    raw.trim()
        .parse::<ProductId>()
        .ok()
        .filter(|id| id.as_i64() > 0)
        .ok_or(CatalogError::InvalidId)
}

/// The product for an options request, preferring the one remembered with
/// the page.
async fn detail_product(
    state: &AppState,
    storage: &BrowserStorage,
    context: &mut PageContext,
    id: ProductId,
) -> Result<CatalogEntry, AppError> {
    if let Some(product) = context.product(id) {
        return Ok(product.clone());
    }
    let product = state.catalog().fetch_product_by_id(storage, id).await?;
    context.show_product(product.clone());
    Ok(product)
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the product detail page.
///
/// Invalid ids and failed lookups render the page with an inline message.
#[instrument(skip(state, storage))]
pub async fn show(
    State(state): State<AppState>,
    storage: BrowserStorage,
    Query(query): Query<ProductQuery>,
) -> Response {
    let chrome = PageChrome::load(&state, &storage);
    let mut page = ProductShowTemplate {
        chrome,
        product: None,
        options: None,
        zoom: ZoomSettings::DEFAULT,
        invalid_id: false,
        error: None,
    };

    let Ok(id) = parse_product_id(query.id.as_deref().unwrap_or_default()) else {
        page.invalid_id = true;
        return (StatusCode::BAD_REQUEST, page).into_response();
    };

    match state.catalog().fetch_product_by_id(&storage, id).await {
        Ok(product) => {
            let mut context = PageContext::load(storage.session()).await;
            context.show_product(product.clone());
            page.options = Some(OptionsView::new(&product, &context.detail));
            page.product = Some(ProductView::from(&product));
            context.save(storage.session()).await;
            page.into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, product_id = %id, "detail page rendered without product");
            let status = match &e {
                CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::BAD_GATEWAY,
            };
            page.error = Some(e.to_string());
            (status, page).into_response()
        }
    }
}

/// Choose a variation option (HTMX).
#[instrument(skip(state, storage))]
pub async fn variation(
    State(state): State<AppState>,
    storage: BrowserStorage,
    Form(form): Form<VariationForm>,
) -> Result<DetailOptionsTemplate, AppError> {
    let id = parse_product_id(&form.id)?;
    let mut context = PageContext::load(storage.session()).await;
    let product = detail_product(&state, &storage, &mut context, id).await?;

    let selection = context.selection_for(id);
    if !selection.select(&form.group, &form.option) {
        tracing::debug!(group = %form.group, option = %form.option, "ignored unknown option");
    }
    let options = OptionsView::new(&product, selection);

    context.save(storage.session()).await;
    Ok(DetailOptionsTemplate { options })
}

/// Step or type the quantity (HTMX).
#[instrument(skip(state, storage))]
pub async fn quantity(
    State(state): State<AppState>,
    storage: BrowserStorage,
    Form(form): Form<QuantityForm>,
) -> Result<DetailOptionsTemplate, AppError> {
    let id = parse_product_id(&form.id)?;
    let mut context = PageContext::load(storage.session()).await;
    let product = detail_product(&state, &storage, &mut context, id).await?;

    let selection = context.selection_for(id);
    selection.quantity = match form.action {
        StepAction::Increment => selection.quantity.increment(),
        StepAction::Decrement => selection.quantity.decrement(),
        StepAction::Set => QuantityStepper::from_input(&form.quantity),
    };
    let options = OptionsView::new(&product, selection);

    context.save(storage.session()).await;
    Ok(DetailOptionsTemplate { options })
}

/// Add the current selection to the cart (HTMX).
///
/// Waits for the configured delay first so the button shows its loading
/// state, then resets the stepper to 1.
#[instrument(skip(state, storage))]
pub async fn add(
    State(state): State<AppState>,
    storage: BrowserStorage,
    Form(form): Form<DetailAddForm>,
) -> Result<Response, AppError> {
    let id = parse_product_id(&form.id)?;
    tokio::time::sleep(state.config().add_to_cart_delay).await;

    let mut context = PageContext::load(storage.session()).await;
    let product = detail_product(&state, &storage, &mut context, id).await?;
    let selection = context.selection_for(id);
    let quantity = selection.quantity.value();

    let outcome = CartService::new(&storage).apply(CartCommand::Add {
        product: product.clone(),
        quantity,
        variations: selection.chosen_variations(),
        origin: AddOrigin::Detail,
    });
    selection.reset_quantity();
    let options = OptionsView::new(&product, selection);

    storage.commit().await;
    context.save(storage.session()).await;

    let product_id = id.to_string();
    let quantity = quantity.to_string();
    add_breadcrumb(
        "cart",
        "Added to cart from detail page",
        Some(&[("product_id", &product_id), ("quantity", &quantity)]),
    );

    Ok((
        AppendHeaders([("HX-Trigger", hx_trigger(&outcome.render))]),
        DetailOptionsTemplate { options },
    )
        .into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pebble_core::Price;

    use super::*;

    fn entry() -> CatalogEntry {
        CatalogEntry {
            id: ProductId::new(5),
            title: "Lamp".to_string(),
            price: Price::from_cents(2000),
            image: "lamp.png".to_string(),
            description: None,
            category: None,
            rating: None,
        }
    }

    #[test]
    fn test_parse_product_id() {
        assert_eq!(parse_product_id(" 7 ").unwrap(), ProductId::new(7));
        assert!(matches!(parse_product_id("0"), Err(CatalogError::InvalidId)));
        assert!(matches!(parse_product_id("-3"), Err(CatalogError::InvalidId)));
        assert!(matches!(parse_product_id("abc"), Err(CatalogError::InvalidId)));
        assert!(matches!(parse_product_id(""), Err(CatalogError::InvalidId)));
    }

    #[test]
    fn test_options_view_prices() {
        let mut selection = DetailSelection::for_product(ProductId::new(5));
        selection.select("Size", "XL");
        selection.quantity = QuantityStepper::new(2);

        let view = OptionsView::new(&entry(), &selection);

        assert_eq!(view.unit_price, "$22.00");
        assert_eq!(view.total, "$44.00");
        assert_eq!(view.groups.len(), 2);
        assert!(view.groups[0].options.iter().any(|o| o.value == "XL" && o.selected));
    }

    #[test]
    fn test_options_fragment_renders_total() {
        let selection = DetailSelection::for_product(ProductId::new(5));
        let html = DetailOptionsTemplate {
            options: OptionsView::new(&entry(), &selection),
        }
        .render()
        .unwrap();

        assert!(html.contains("Total: $20.00"));
        assert!(html.contains("max=\"999\""));
    }
}
