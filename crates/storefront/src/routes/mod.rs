//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Product listing
//! GET  /health                 - Health check
//!
//! # Product detail
//! GET  /product?id=N           - Product detail page
//! POST /product/variation      - Choose a variation (returns detail_options fragment)
//! POST /product/quantity       - Step or type the quantity (returns detail_options fragment)
//! POST /product/add            - Add the selection after the loading delay
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart page
//! GET  /cart/items             - Cart page items fragment
//! GET  /cart/drawer            - Drawer items fragment
//! GET  /cart/count             - Cart count badge fragment
//! POST /cart/add               - Add from the listing grid (returns empty, triggers events)
//! POST /cart/increment         - +1 (returns cart_items fragment)
//! POST /cart/decrement         - -1, floors at 1 (returns cart_items fragment)
//! POST /cart/set               - Set quantity (returns cart_items fragment)
//! POST /cart/remove            - Remove line (returns cart_items fragment)
//!
//! # Checkout
//! POST /checkout               - Place the simulated order
//! GET  /checkout/start         - Drawer checkout link
//!
//! # Auth
//! GET  /auth?view=login|signup - Auth page
//! GET  /auth/toggle?to=...     - Swap to the other form (fragment)
//! POST /auth/login             - Sign in
//! POST /auth/signup            - Create an account
//! POST /auth/validate/{field}  - Blur validation (field_error fragment)
//! POST /auth/strength          - Password strength (fragment)
//! POST /auth/logout            - Sign out
//! ```

pub mod auth;
pub mod cart;
pub mod home;
pub mod products;

use axum::{
    Router,
    http::HeaderMap,
    middleware as axum_middleware,
    routing::{get, post},
};
use serde_json::{Map, Value, json};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::middleware;
use crate::models::Cart;
use crate::services::auth::AuthService;
use crate::services::cart::{CartService, RenderInstruction};
use crate::state::AppState;
use crate::storage::KeyValueStore;

/// HTMX event names emitted in `HX-Trigger`.
pub mod events {
    /// Cart lines changed; listeners re-fetch their fragment.
    pub const CART_UPDATED: &str = "cartUpdated";
    /// Slide the cart drawer open.
    pub const OPEN_CART_PANEL: &str = "openCartPanel";
    /// Show a transient notice.
    pub const SHOW_TOAST: &str = "showToast";
    /// Sign-in finished; navigate after the greeting.
    pub const AUTH_COMPLETE: &str = "authComplete";
}

/// Nav state shown on every page: cart badge and signed-in name.
#[derive(Debug, Clone, Default)]
pub struct PageChrome {
    pub cart_count: u32,
    pub user_name: Option<String>,
}

impl PageChrome {
    /// Read the nav state from a visitor's storage.
    #[must_use]
    pub fn load(state: &AppState, store: &dyn KeyValueStore) -> Self {
        Self {
            cart_count: CartService::new(store).load().item_count(),
            user_name: AuthService::new(store, state.clock())
                .current_user()
                .map(|user| user.name),
        }
    }
}

/// Whether the request was issued by HTMX.
#[must_use]
pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers.get("hx-request").is_some_and(|v| v == "true")
}

/// Build the `HX-Trigger` payload for a cart change.
///
/// Summary instructions are folded into one `cartUpdated` event carrying the
/// badge count, formatted total and checkout state.
#[must_use]
pub fn hx_trigger(render: &[RenderInstruction]) -> String {
    let mut events = Map::new();
    let mut cart = Map::new();

    for instruction in render {
        match instruction {
            RenderInstruction::CartItems => {
                cart.insert("refresh".to_string(), Value::Bool(true));
            }
            RenderInstruction::Badge(count) => {
                cart.insert("count".to_string(), json!(count));
            }
            RenderInstruction::Total(total) => {
                cart.insert("total".to_string(), json!(total));
            }
            RenderInstruction::CheckoutEnabled(enabled) => {
                cart.insert("checkoutEnabled".to_string(), json!(enabled));
            }
            RenderInstruction::OpenCartPanel => {
                events.insert(events::OPEN_CART_PANEL.to_string(), Value::Bool(true));
            }
            RenderInstruction::Toast(message) => {
                events.insert(events::SHOW_TOAST.to_string(), json!(message));
            }
        }
    }

    if !cart.is_empty() {
        events.insert(events::CART_UPDATED.to_string(), Value::Object(cart));
    }
    Value::Object(events).to_string()
}

/// `HX-Trigger` payload for a lone notice.
#[must_use]
pub fn toast_trigger(message: &str) -> String {
    let mut events = Map::new();
    events.insert(events::SHOW_TOAST.to_string(), json!(message));
    Value::Object(events).to_string()
}

/// Summary values for templates.
#[derive(Debug, Clone)]
pub struct CartSummary {
    pub count: u32,
    pub total: String,
    pub checkout_enabled: bool,
}

impl From<&Cart> for CartSummary {
    fn from(cart: &Cart) -> Self {
        Self {
            count: cart.item_count(),
            total: cart.total().display(),
            checkout_enabled: !cart.is_empty(),
        }
    }
}

/// Create the product detail routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::show))
        .route("/variation", post(products::variation))
        .route("/quantity", post(products::quantity))
        .route("/add", post(products::add))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/items", get(cart::items))
        .route("/drawer", get(cart::drawer))
        .route("/count", get(cart::count))
        .route("/add", post(cart::add))
        .route("/increment", post(cart::increment))
        .route("/decrement", post(cart::decrement))
        .route("/set", post(cart::set_quantity))
        .route("/remove", post(cart::remove))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(cart::checkout))
        .route("/start", get(cart::checkout_start))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(auth::page))
        .route("/toggle", get(auth::toggle))
        .route("/login", post(auth::login))
        .route("/signup", post(auth::signup))
        .route("/validate/{field}", post(auth::validate))
        .route("/strength", post(auth::strength))
        .route("/logout", post(auth::logout))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Listing
        .route("/", get(home::home))
        .route("/health", get(health))
        // Product detail
        .nest("/product", product_routes())
        // Cart
        .nest("/cart", cart_routes())
        // Checkout
        .nest("/checkout", checkout_routes())
        // Auth
        .nest("/auth", auth_routes())
}

/// Build the complete application with middleware and static files.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.config());

    Router::new()
        .merge(routes())
        .nest_service(
            "/static",
            ServeDir::new(concat!(env!("CARGO_MANIFEST_DIR"), "/static")),
        )
        .layer(session_layer)
        .layer(axum_middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(axum_middleware::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<axum::body::Body>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            },
        ))
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hx_trigger_folds_summary() {
        let payload = hx_trigger(&[
            RenderInstruction::CartItems,
            RenderInstruction::Badge(3),
            RenderInstruction::Total("$12.50".to_string()),
            RenderInstruction::CheckoutEnabled(true),
            RenderInstruction::OpenCartPanel,
            RenderInstruction::Toast("Item added to cart".to_string()),
        ]);
        let value: Value = serde_json::from_str(&payload).unwrap();

        assert_eq!(value["cartUpdated"]["count"], 3);
        assert_eq!(value["cartUpdated"]["total"], "$12.50");
        assert_eq!(value["cartUpdated"]["checkoutEnabled"], true);
        assert_eq!(value["openCartPanel"], true);
        assert_eq!(value["showToast"], "Item added to cart");
    }

    #[test]
    fn test_hx_trigger_without_extras() {
        let value: Value =
            serde_json::from_str(&hx_trigger(&[RenderInstruction::Badge(0)])).unwrap();
        assert!(value.get("openCartPanel").is_none());
        assert!(value.get("showToast").is_none());
        assert_eq!(value["cartUpdated"]["count"], 0);
    }

    #[test]
    fn test_is_htmx() {
        let mut headers = HeaderMap::new();
        assert!(!is_htmx(&headers));
        headers.insert("hx-request", "true".parse().unwrap());
        assert!(is_htmx(&headers));
    }
}
