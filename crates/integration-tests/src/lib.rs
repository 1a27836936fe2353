//! Integration tests for Pebble Market.
//!
//! Each test boots the complete storefront router (sessions, security
//! headers, request ids) on an ephemeral port and drives it over real HTTP
//! with a cookie-enabled client, the way a browser would.
//!
//! The catalog API base points at a closed local port, so every catalog read
//! exercises the bundled fallback file (`crates/storefront/data/products.json`).
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p pebble-integration-tests
//! ```

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use url::Url;

use pebble_storefront::clock::{Clock, FixedClock};
use pebble_storefront::config::{CatalogSettings, StorefrontConfig};
use pebble_storefront::routes;
use pebble_storefront::state::AppState;

/// Epoch milliseconds the test clock starts at.
pub const START_MS: i64 = 1_700_000_000_000;

/// A storefront running in the background for one test.
pub struct TestServer {
    /// Base URL without trailing slash, e.g. `http://127.0.0.1:41234`.
    pub base_url: String,
    /// Browser-like client that keeps the session cookie.
    pub client: Client,
    /// The clock the server reads; tests move it explicitly.
    pub clock: Arc<FixedClock>,
}

impl TestServer {
    /// Start a storefront backed by the fallback catalog.
    ///
    /// # Panics
    ///
    /// Panics if the server cannot be started.
    pub async fn start() -> Self {
        Self::start_with_add_delay(Duration::ZERO).await
    }

    /// Like [`Self::start`], but the detail-page add waits `delay` first.
    ///
    /// # Panics
    ///
    /// Panics if the server cannot be started.
    pub async fn start_with_add_delay(delay: Duration) -> Self {
        let clock = Arc::new(FixedClock::new(START_MS));
        let config = test_config(unreachable_api().await, delay);

        let dyn_clock: Arc<dyn Clock> = clock.clone();
        let state = AppState::new(config, dyn_clock).expect("Failed to build app state");
        let app = routes::app(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Test server failed");
        });

        Self {
            base_url: format!("http://{addr}"),
            client: browser(),
            clock,
        }
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// A second visitor with its own cookie jar.
    #[must_use]
    pub fn new_visitor(&self) -> Client {
        browser()
    }
}

/// Cookie-keeping client that does not follow redirects.
fn browser() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// An API base on a port nothing listens on.
async fn unreachable_api() -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to reserve a port");
    let addr: SocketAddr = listener.local_addr().expect("Failed to read local address");
    drop(listener);
    Url::parse(&format!("http://{addr}/")).expect("Failed to build API base")
}

fn test_config(api_base: Url, add_to_cart_delay: Duration) -> StorefrontConfig {
    let mut catalog = CatalogSettings::with_api_base(api_base);
    catalog.timeout = Duration::from_secs(2);

    StorefrontConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        base_url: "http://127.0.0.1".to_string(),
        catalog,
        add_to_cart_delay,
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// Form request marked as coming from HTMX.
pub fn htmx_post(client: &Client, url: String, form: &[(&str, &str)]) -> reqwest::RequestBuilder {
    client.post(url).header("HX-Request", "true").form(form)
}

/// Parse the `HX-Trigger` header of a response.
///
/// # Panics
///
/// Panics if the header is missing or not JSON.
#[must_use]
pub fn hx_trigger(response: &reqwest::Response) -> serde_json::Value {
    let raw = response
        .headers()
        .get("hx-trigger")
        .expect("Missing HX-Trigger header")
        .to_str()
        .expect("HX-Trigger is not ASCII");
    serde_json::from_str(raw).expect("HX-Trigger is not JSON")
}
