//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront (default: <http://localhost:3000>)
//! - `CATALOG_API_BASE` - Remote product API (default: <https://fakestoreapi.com>)
//! - `CATALOG_FALLBACK_PATH` - Bundled catalog file (default: `data/products.json`
//!   inside the storefront crate)
//! - `CATALOG_TIMEOUT_SECS` - Catalog request deadline (default: 10)
//! - `CATALOG_CACHE_TTL_SECS` - Catalog cache lifetime (default: 600)
//! - `CATALOG_PAGE_SIZE` - Products shown on the listing grid (default: 12)
//! - `ADD_TO_CART_DELAY_MS` - Loading delay before a detail-page add (default: 500)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_BASE: &str = "https://fakestoreapi.com";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Product catalog settings
    pub catalog: CatalogSettings,
    /// Artificial delay before a detail-page add completes
    pub add_to_cart_delay: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "production", "staging")
    pub sentry_environment: Option<String>,
}

/// Remote catalog and cache configuration.
#[derive(Debug, Clone)]
pub struct CatalogSettings {
    /// API base URL, always ending in `/`
    pub api_base: Url,
    /// Bundled catalog used when the API is unreachable
    pub fallback_path: PathBuf,
    /// Deadline for each catalog request
    pub timeout: Duration,
    /// How long a cached listing stays fresh
    pub cache_ttl: Duration,
    /// Number of products requested for the listing grid
    pub page_size: usize,
}

impl CatalogSettings {
    /// Settings for `api_base` with every other value at its default.
    #[must_use]
    pub fn with_api_base(api_base: Url) -> Self {
        Self {
            api_base,
            fallback_path: default_fallback_path(),
            timeout: Duration::from_secs(10),
            cache_ttl: Duration::from_secs(600),
            page_size: 12,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if a variable is set but cannot be
    /// parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "3000")?;
        let base_url = get_env_or_default("STOREFRONT_BASE_URL", "http://localhost:3000");

        let api_base = parse_api_base(&get_env_or_default("CATALOG_API_BASE", DEFAULT_API_BASE))
            .map_err(|e| ConfigError::InvalidEnvVar("CATALOG_API_BASE".to_string(), e))?;
        let fallback_path =
            get_optional_env("CATALOG_FALLBACK_PATH").map_or_else(default_fallback_path, PathBuf::from);

        let catalog = CatalogSettings {
            api_base,
            fallback_path,
            timeout: Duration::from_secs(parse_env("CATALOG_TIMEOUT_SECS", "10")?),
            cache_ttl: Duration::from_secs(parse_env("CATALOG_CACHE_TTL_SECS", "600")?),
            page_size: parse_env("CATALOG_PAGE_SIZE", "12")?,
        };

        Ok(Self {
            host,
            port,
            base_url,
            catalog,
            add_to_cart_delay: Duration::from_millis(parse_env("ADD_TO_CART_DELAY_MS", "500")?),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse an API base URL, making sure relative joins keep its path.
fn parse_api_base(raw: &str) -> Result<Url, String> {
    let mut url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn default_fallback_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/products.json")
}
