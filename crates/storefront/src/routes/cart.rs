//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! Every mutation answers with the refreshed items fragment and an
//! `HX-Trigger` header built from the cart engine's render instructions.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use pebble_core::ProductId;

use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::interaction::{PageContext, grid_add_key};
use crate::models::{Cart, CartLineItem};
use crate::routes::products::parse_product_id;
use crate::routes::{CartSummary, PageChrome, hx_trigger, is_htmx, toast_trigger};
use crate::services::cart::{
    AddOrigin, CartCommand, CartOutcome, CartService, CheckoutError, parse_quantity,
};
use crate::state::AppState;
use crate::storage::BrowserStorage;

/// Notice shown when the drawer's checkout link is used on an empty cart.
pub const EMPTY_CART_MESSAGE: &str = "Your cart is empty";

// =============================================================================
// View Types
// =============================================================================

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartLineView {
    pub id: ProductId,
    pub title: String,
    pub image: String,
    pub price: String,
    pub quantity: u32,
    pub line_total: String,
    pub variations: Option<String>,
}

impl From<&CartLineItem> for CartLineView {
    fn from(line: &CartLineItem) -> Self {
        let variations = line
            .selected_variations
            .as_ref()
            .filter(|v| !v.is_empty())
            .map(|v| {
                v.iter()
                    .map(|(name, value)| format!("{name}: {value}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            });

        Self {
            id: line.id,
            title: line.title.clone(),
            image: line.image.clone(),
            price: line.price.display(),
            quantity: line.quantity,
            line_total: line.line_total().display(),
            variations,
        }
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub summary: CartSummary,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.items().iter().map(CartLineView::from).collect(),
            summary: CartSummary::from(cart),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub chrome: PageChrome,
    pub cart: CartView,
    pub in_drawer: bool,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
    pub in_drawer: bool,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

// =============================================================================
// Form Types
// =============================================================================

/// Form naming a cart line.
#[derive(Debug, Deserialize)]
pub struct CartLineForm {
    pub id: String,
    /// Whether the request came from the drawer.
    #[serde(default)]
    pub drawer: Option<String>,
}

/// Set quantity form data.
#[derive(Debug, Deserialize)]
pub struct SetQuantityForm {
    pub id: String,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub drawer: Option<String>,
}

/// Checkout form data.
#[derive(Debug, Default, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub drawer: Option<String>,
}

// =============================================================================
// Helpers
// =============================================================================

fn parse_line_id(raw: &str) -> Result<ProductId, AppError> {
    parse_product_id(raw).map_err(|_| AppError::BadRequest(format!("invalid cart line id: {raw}")))
}

/// Respond to a cart mutation with its triggers and the items fragment.
fn mutation_response(outcome: &CartOutcome, in_drawer: bool) -> Response {
    (
        AppendHeaders([("HX-Trigger", hx_trigger(&outcome.render))]),
        CartItemsTemplate {
            cart: CartView::from(&outcome.cart),
            in_drawer,
        },
    )
        .into_response()
}

/// Apply `command`, persist and respond.
async fn apply_and_respond(storage: &BrowserStorage, command: CartCommand, in_drawer: bool) -> Response {
    let outcome = CartService::new(storage).apply(command);
    storage.commit().await;
    mutation_response(&outcome, in_drawer)
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(state, storage))]
pub async fn show(State(state): State<AppState>, storage: BrowserStorage) -> impl IntoResponse {
    let cart = CartService::new(&storage).load();

    CartShowTemplate {
        chrome: PageChrome::load(&state, &storage),
        cart: CartView::from(&cart),
        in_drawer: false,
    }
}

/// Cart page items fragment (HTMX).
#[instrument(skip(storage))]
pub async fn items(storage: BrowserStorage) -> impl IntoResponse {
    CartItemsTemplate {
        cart: CartView::from(&CartService::new(&storage).load()),
        in_drawer: false,
    }
}

/// Drawer items fragment (HTMX).
#[instrument(skip(storage))]
pub async fn drawer(storage: BrowserStorage) -> impl IntoResponse {
    CartItemsTemplate {
        cart: CartView::from(&CartService::new(&storage).load()),
        in_drawer: true,
    }
}

/// Get cart count badge (HTMX).
#[instrument(skip(storage))]
pub async fn count(storage: BrowserStorage) -> impl IntoResponse {
    CartCountTemplate {
        count: CartService::new(&storage).load().item_count(),
    }
}

/// Add a product from the listing grid (HTMX).
///
/// A repeat of the same add within the de-duplication window is answered
/// with `204 No Content` and changes nothing.
#[instrument(skip(state, storage))]
pub async fn add(
    State(state): State<AppState>,
    storage: BrowserStorage,
    Form(form): Form<CartLineForm>,
) -> Result<Response, AppError> {
    let id = parse_product_id(&form.id)?;

    let mut context = PageContext::load(storage.session()).await;
    if !context
        .grid
        .should_handle(&grid_add_key(id), state.clock().now_ms())
    {
        tracing::debug!(product_id = %id, "duplicate add suppressed");
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    context.save(storage.session()).await;

    let product = state.catalog().fetch_product_by_id(&storage, id).await?;
    let outcome = CartService::new(&storage).apply(CartCommand::Add {
        product,
        quantity: 1,
        variations: None,
        origin: AddOrigin::Listing,
    });
    storage.commit().await;

    let product_id = id.to_string();
    add_breadcrumb("cart", "Added to cart", Some(&[("product_id", &product_id)]));

    Ok((
        StatusCode::OK,
        AppendHeaders([("HX-Trigger", hx_trigger(&outcome.render))]),
    )
        .into_response())
}

/// Increase a line's quantity (HTMX).
#[instrument(skip(storage))]
pub async fn increment(
    storage: BrowserStorage,
    Form(form): Form<CartLineForm>,
) -> Result<Response, AppError> {
    let id = parse_line_id(&form.id)?;
    Ok(apply_and_respond(&storage, CartCommand::Increment(id), form.drawer.is_some()).await)
}

/// Decrease a line's quantity, never below 1 (HTMX).
#[instrument(skip(storage))]
pub async fn decrement(
    storage: BrowserStorage,
    Form(form): Form<CartLineForm>,
) -> Result<Response, AppError> {
    let id = parse_line_id(&form.id)?;
    Ok(apply_and_respond(&storage, CartCommand::Decrement(id), form.drawer.is_some()).await)
}

/// Set a line's quantity from the typed value (HTMX).
#[instrument(skip(storage))]
pub async fn set_quantity(
    storage: BrowserStorage,
    Form(form): Form<SetQuantityForm>,
) -> Result<Response, AppError> {
    let id = parse_line_id(&form.id)?;
    let command = CartCommand::SetQuantity {
        id,
        quantity: parse_quantity(&form.quantity),
    };
    Ok(apply_and_respond(&storage, command, form.drawer.is_some()).await)
}

/// Remove a line (HTMX).
#[instrument(skip(storage))]
pub async fn remove(
    storage: BrowserStorage,
    Form(form): Form<CartLineForm>,
) -> Result<Response, AppError> {
    let id = parse_line_id(&form.id)?;
    Ok(apply_and_respond(&storage, CartCommand::Remove(id), form.drawer.is_some()).await)
}

/// Place the simulated order (HTMX).
///
/// An empty cart is refused with a notice and left untouched.
#[instrument(skip(storage))]
pub async fn checkout(storage: BrowserStorage, Form(form): Form<CheckoutForm>) -> Response {
    let service = CartService::new(&storage);
    let in_drawer = form.drawer.is_some();

    match service.checkout() {
        Ok(outcome) => {
            storage.commit().await;
            add_breadcrumb("checkout", "Order placed", None);
            mutation_response(&outcome, in_drawer)
        }
        Err(CheckoutError::EmptyCart) => (
            AppendHeaders([("HX-Trigger", toast_trigger(&CheckoutError::EmptyCart.to_string()))]),
            CartItemsTemplate {
                cart: CartView::from(&service.load()),
                in_drawer,
            },
        )
            .into_response(),
    }
}

/// Drawer checkout link.
///
/// Goes to the cart page, or shows a notice when there is nothing to buy.
#[instrument(skip(storage, headers))]
pub async fn checkout_start(storage: BrowserStorage, headers: HeaderMap) -> Response {
    let cart = CartService::new(&storage).load();

    if is_htmx(&headers) {
        if cart.is_empty() {
            return (
                StatusCode::NO_CONTENT,
                AppendHeaders([("HX-Trigger", toast_trigger(EMPTY_CART_MESSAGE))]),
            )
                .into_response();
        }
        return (AppendHeaders([("HX-Redirect", "/cart")]), StatusCode::OK).into_response();
    }

    Redirect::to("/cart").into_response()
}
