//! Catalog browsing commands.

use pebble_storefront::models::CatalogEntry;
use pebble_storefront::storage::KeyValueStore;

use super::{CommandError, catalog_client, emit, product_id};

/// List products, using the profile's catalog cache when it is fresh.
pub async fn list(store: &dyn KeyValueStore, limit: Option<usize>) -> Result<(), CommandError> {
    let (client, config) = catalog_client()?;
    let limit = limit.unwrap_or(config.catalog.page_size);

    let products = client.fetch_products(store, limit).await?;
    tracing::debug!(count = products.len(), "catalog loaded");

    for product in &products {
        emit(format!(
            "{:>4}  {:>10}  {}",
            product.id.to_string(),
            product.price.display(),
            product.title
        ));
    }
    Ok(())
}

/// Show one product in full.
pub async fn show(store: &dyn KeyValueStore, id: &str) -> Result<(), CommandError> {
    let id = product_id(id)?;
    let (client, _) = catalog_client()?;

    let product = client.fetch_product_by_id(store, id).await?;
    for line in describe(&product) {
        emit(line);
    }
    Ok(())
}

fn describe(product: &CatalogEntry) -> Vec<String> {
    let mut lines = vec![
        format!("#{} {}", product.id, product.title),
        format!("Price: {}", product.price),
    ];
    if let Some(category) = &product.category {
        lines.push(format!("Category: {category}"));
    }
    lines.push(format!("Rating: {}", product.rating_label()));
    if let Some(description) = &product.description {
        lines.push(String::new());
        lines.push(description.clone());
    }
    lines
}
