//! Bundled static catalog used when the remote API is unreachable.

use std::path::Path;

use crate::models::CatalogEntry;

use super::CatalogError;

/// Read the fallback catalog file.
pub(super) async fn load(path: &Path) -> Result<Vec<CatalogEntry>, CatalogError> {
    let contents = tokio::fs::read_to_string(path).await?;
    let products = serde_json::from_str(&contents)?;
    Ok(products)
}
