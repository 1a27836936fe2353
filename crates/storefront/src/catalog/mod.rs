//! Catalog cache and remote product API client.
//!
//! # Lookup order
//!
//! Listing (`fetch_products`):
//! 1. Fresh, non-empty [`CacheEnvelope`] in browser storage (no network)
//! 2. `GET {base}/products?limit=N`, bounded by the request timeout
//! 3. The bundled fallback catalog file
//!
//! Detail (`fetch_product_by_id`):
//! 1. Any cached envelope containing the id, regardless of age
//! 2. `GET {base}/products/{id}`
//! 3. The bundled fallback catalog file
//!
//! Successful listing loads (network or fallback) overwrite the envelope.
//! Concurrent cache misses each issue their own request.

mod cache;
mod fallback;

pub use cache::CacheEnvelope;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use pebble_core::ProductId;

use crate::clock::Clock;
use crate::config::CatalogSettings;
use crate::models::CatalogEntry;
use crate::storage::KeyValueStore;

/// Errors that can occur when loading catalog data.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed, timed out, or returned a non-success status.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API base URL could not be joined with a path.
    #[error("invalid catalog URL: {0}")]
    Url(#[from] url::ParseError),

    /// The bundled fallback file could not be read.
    #[error("fallback catalog unreadable: {0}")]
    Io(#[from] std::io::Error),

    /// The bundled fallback file is not a JSON list of products.
    #[error("fallback catalog invalid: {0}")]
    Parse(#[from] serde_json::Error),

    /// Every source failed.
    #[error("Unable to load products")]
    Unavailable,

    /// No source knows this product.
    #[error("Product {0} not found")]
    NotFound(ProductId),

    /// The requested id is not a positive number.
    #[error("Invalid product ID")]
    InvalidId,
}

/// Client for product listings and details.
///
/// Cheap to clone; the HTTP connection pool is shared.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    api_base: Url,
    fallback_path: PathBuf,
    cache_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl CatalogClient {
    /// Create a catalog client.
    ///
    /// Every request is aborted once `settings.timeout` elapses.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Http` if the HTTP client cannot be built.
    pub fn new(settings: &CatalogSettings, clock: Arc<dyn Clock>) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(CatalogClientInner {
                client,
                api_base: settings.api_base.clone(),
                fallback_path: settings.fallback_path.clone(),
                cache_ttl: settings.cache_ttl,
                clock,
            }),
        })
    }

    /// Fetch up to `limit` products for the listing grid.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Unavailable` when the cache is stale or empty,
    /// the API fails, and the fallback file cannot be loaded.
    #[instrument(skip(self, store))]
    pub async fn fetch_products(
        &self,
        store: &dyn KeyValueStore,
        limit: usize,
    ) -> Result<Vec<CatalogEntry>, CatalogError> {
        let now = self.inner.clock.now_ms();

        if let Some(envelope) = CacheEnvelope::load_fresh(store, now, self.inner.cache_ttl) {
            debug!(cached = envelope.data.len(), "serving products from cache");
            return Ok(truncated(envelope.data, limit));
        }

        match self.request_products(limit).await {
            Ok(products) => {
                CacheEnvelope::store(store, self.inner.clock.now_ms(), &products);
                return Ok(truncated(products, limit));
            }
            Err(e) => {
                warn!(error = %e, "failed to fetch products from API, attempting local fallback");
            }
        }

        match fallback::load(&self.inner.fallback_path).await {
            Ok(products) => {
                CacheEnvelope::store(store, self.inner.clock.now_ms(), &products);
                Ok(truncated(products, limit))
            }
            Err(e) => {
                tracing::error!(error = %e, path = %self.inner.fallback_path.display(), "failed to load fallback catalog");
                Err(CatalogError::Unavailable)
            }
        }
    }

    /// Fetch a single product for the detail page.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidId` for non-positive ids,
    /// `CatalogError::NotFound` if the fallback catalog was readable but has
    /// no such product, and `CatalogError::Unavailable` if every source failed.
    #[instrument(skip(self, store), fields(product_id = %id))]
    pub async fn fetch_product_by_id(
        &self,
        store: &dyn KeyValueStore,
        id: ProductId,
    ) -> Result<CatalogEntry, CatalogError> {
        if id.as_i64() <= 0 {
            return Err(CatalogError::InvalidId);
        }

        if let Some(entry) = CacheEnvelope::load(store)
            .and_then(|envelope| envelope.data.into_iter().find(|p| p.id == id))
        {
            debug!("serving product from cache");
            return Ok(entry);
        }

        match self.request_product(id).await {
            Ok(entry) => return Ok(entry),
            Err(e) => warn!(error = %e, "failed to fetch product from API, attempting local fallback"),
        }

        match fallback::load(&self.inner.fallback_path).await {
            Ok(products) => products
                .into_iter()
                .find(|p| p.id == id)
                .ok_or(CatalogError::NotFound(id)),
            Err(e) => {
                tracing::error!(error = %e, "failed to load fallback catalog");
                Err(CatalogError::Unavailable)
            }
        }
    }

    async fn request_products(&self, limit: usize) -> Result<Vec<CatalogEntry>, CatalogError> {
        let mut url = self.inner.api_base.join("products")?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());
        let products = self
            .inner
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<CatalogEntry>>()
            .await?;
        Ok(products)
    }

    async fn request_product(&self, id: ProductId) -> Result<CatalogEntry, CatalogError> {
        let url = self.inner.api_base.join(&format!("products/{id}"))?;
        let product = self
            .inner
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<CatalogEntry>()
            .await?;
        Ok(product)
    }
}

fn truncated(mut products: Vec<CatalogEntry>, limit: usize) -> Vec<CatalogEntry> {
    products.truncate(limit);
    products
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::Router;
    use axum::extract::{Path, State};
    use axum::http::StatusCode;
    use axum::routing::get;
    use serde_json::json;

    use super::*;
    use crate::clock::FixedClock;
    use crate::storage::{MemoryStore, StorageExt, keys};

    const T: i64 = 1_700_000_000_000;

    #[derive(Clone)]
    struct Stub {
        hits: Arc<AtomicUsize>,
        status: StatusCode,
        delay: Duration,
    }

    fn product_json(id: i64) -> serde_json::Value {
        json!({
            "id": id,
            "title": format!("API product {id}"),
            "price": 10.5,
            "image": format!("https://img.example/{id}.png"),
        })
    }

    async fn list(State(stub): State<Stub>) -> (StatusCode, axum::Json<serde_json::Value>) {
        stub.hits.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(stub.delay).await;
        let body = json!([product_json(1), product_json(2), product_json(3)]);
        (stub.status, axum::Json(body))
    }

    async fn detail(
        State(stub): State<Stub>,
        Path(id): Path<i64>,
    ) -> (StatusCode, axum::Json<serde_json::Value>) {
        stub.hits.fetch_add(1, Ordering::SeqCst);
        (stub.status, axum::Json(product_json(id)))
    }

    /// Serve a throwaway catalog API and return its base URL and hit counter.
    async fn spawn_api(status: StatusCode, delay: Duration) -> (Url, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let stub = Stub {
            hits: hits.clone(),
            status,
            delay,
        };
        let app = Router::new()
            .route("/products", get(list))
            .route("/products/{id}", get(detail))
            .with_state(stub);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (Url::parse(&format!("http://{addr}/")).unwrap(), hits)
    }

    fn write_fallback(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("products.json");
        let body = json!([
            { "id": 10, "title": "Fallback ten", "price": 1, "image": "ten.png" },
            { "id": 11, "title": "Fallback eleven", "price": 2, "image": "eleven.png" }
        ]);
        std::fs::write(&path, body.to_string()).unwrap();
        path
    }

    fn make_client(api_base: Url, fallback_path: PathBuf, timeout: Duration) -> (CatalogClient, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(T));
        let settings = CatalogSettings {
            api_base,
            fallback_path,
            timeout,
            cache_ttl: Duration::from_secs(600),
            page_size: 12,
        };
        (CatalogClient::new(&settings, clock.clone()).unwrap(), clock)
    }

    fn cached_products(store: &MemoryStore, ts: i64, ids: &[i64]) {
        let data: Vec<CatalogEntry> = ids
            .iter()
            .map(|id| serde_json::from_value(product_json(*id)).unwrap())
            .collect();
        CacheEnvelope::store(store, ts, &data);
    }

    #[tokio::test]
    async fn test_fresh_cache_skips_network() {
        let (base, hits) = spawn_api(StatusCode::OK, Duration::ZERO).await;
        let (client, _clock) = make_client(base, PathBuf::from("missing.json"), Duration::from_secs(10));
        let store = MemoryStore::new();
        cached_products(&store, T - 60_000, &[7, 8, 9]);

        let products = client.fetch_products(&store, 2).await.unwrap();

        assert_eq!(products.len(), 2);
        assert_eq!(products[0].id, ProductId::new(7));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stale_cache_refetches_and_rewrites_envelope() {
        let (base, hits) = spawn_api(StatusCode::OK, Duration::ZERO).await;
        let (client, clock) = make_client(base, PathBuf::from("missing.json"), Duration::from_secs(10));
        let store = MemoryStore::new();
        cached_products(&store, T, &[7]);
        clock.advance(601_000);

        let products = client.fetch_products(&store, 2).await.unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(products.len(), 2);
        let envelope = CacheEnvelope::load(&store).unwrap();
        assert_eq!(envelope.timestamp, T + 601_000);
        assert_eq!(envelope.data.len(), 3);
    }

    #[tokio::test]
    async fn test_server_error_falls_back_to_bundled_file() {
        let dir = tempfile::tempdir().unwrap();
        let (base, hits) = spawn_api(StatusCode::INTERNAL_SERVER_ERROR, Duration::ZERO).await;
        let (client, _clock) = make_client(base, write_fallback(&dir), Duration::from_secs(10));
        let store = MemoryStore::new();

        let products = client.fetch_products(&store, 12).await.unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].title, "Fallback ten");
        assert_eq!(CacheEnvelope::load(&store).unwrap().data.len(), 2);
    }

    #[tokio::test]
    async fn test_timeout_falls_back_to_bundled_file() {
        let dir = tempfile::tempdir().unwrap();
        let (base, _hits) = spawn_api(StatusCode::OK, Duration::from_secs(5)).await;
        let (client, _clock) = make_client(base, write_fallback(&dir), Duration::from_millis(100));
        let store = MemoryStore::new();

        let products = client.fetch_products(&store, 1).await.unwrap();

        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, ProductId::new(10));
    }

    #[tokio::test]
    async fn test_all_sources_failing_is_unavailable() {
        let (base, _hits) = spawn_api(StatusCode::BAD_GATEWAY, Duration::ZERO).await;
        let (client, _clock) = make_client(base, PathBuf::from("/nonexistent/products.json"), Duration::from_secs(10));
        let store = MemoryStore::new();

        let err = client.fetch_products(&store, 12).await.unwrap_err();

        assert!(matches!(err, CatalogError::Unavailable));
        assert_eq!(err.to_string(), "Unable to load products");
        assert!(store.get_raw(keys::PRODUCTS_CACHE).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_detail_served_from_stale_cache() {
        let (base, hits) = spawn_api(StatusCode::OK, Duration::ZERO).await;
        let (client, clock) = make_client(base, PathBuf::from("missing.json"), Duration::from_secs(10));
        let store = MemoryStore::new();
        cached_products(&store, T, &[4, 5]);
        clock.advance(3_600_000);

        let product = client.fetch_product_by_id(&store, ProductId::new(5)).await.unwrap();

        assert_eq!(product.id, ProductId::new(5));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_detail_cache_miss_hits_api() {
        let (base, hits) = spawn_api(StatusCode::OK, Duration::ZERO).await;
        let (client, _clock) = make_client(base, PathBuf::from("missing.json"), Duration::from_secs(10));
        let store = MemoryStore::new();
        cached_products(&store, T, &[4]);

        let product = client.fetch_product_by_id(&store, ProductId::new(6)).await.unwrap();

        assert_eq!(product.title, "API product 6");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        // Detail lookups never rewrite the listing cache.
        assert_eq!(CacheEnvelope::load(&store).unwrap().data.len(), 1);
    }

    #[tokio::test]
    async fn test_detail_falls_back_then_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let (base, _hits) = spawn_api(StatusCode::NOT_FOUND, Duration::ZERO).await;
        let (client, _clock) = make_client(base, write_fallback(&dir), Duration::from_secs(10));
        let store = MemoryStore::new();

        let found = client.fetch_product_by_id(&store, ProductId::new(11)).await.unwrap();
        assert_eq!(found.title, "Fallback eleven");

        let missing = client.fetch_product_by_id(&store, ProductId::new(99)).await;
        assert!(matches!(missing, Err(CatalogError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_detail_rejects_non_positive_ids() {
        let (base, hits) = spawn_api(StatusCode::OK, Duration::ZERO).await;
        let (client, _clock) = make_client(base, PathBuf::from("missing.json"), Duration::from_secs(10));
        let store = MemoryStore::new();

        let err = client.fetch_product_by_id(&store, ProductId::new(0)).await;

        assert!(matches!(err, Err(CatalogError::InvalidId)));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_corrupt_cache_is_ignored() {
        let store = MemoryStore::new();
        store.set(keys::PRODUCTS_CACHE, &"not an envelope");
        assert!(CacheEnvelope::load(&store).is_none());
    }
}
