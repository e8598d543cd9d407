use anyhow::{anyhow, Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::fs::File;
use std::path::Path;
use tokio_retry::{strategy::ExponentialBackoff, Retry};
use tracing::{debug, info};

use super::cache::CatalogCache;
use super::types::{ApiProduct, Product};
use crate::error::{RecordError, SourceUnavailable};

/// Endpoint path appended to the configured API base URL
pub const PRODUCTS_ENDPOINT: &str = "/products";

pub fn products_url(api_url: &str) -> String {
    format!("{}{}", api_url.trim_end_matches('/'), PRODUCTS_ENDPOINT)
}

/// Fetch raw product rows from the product API.
///
/// A fresh cache entry short-circuits the request. Network errors are retried
/// with exponential backoff before giving up.
pub async fn fetch_api_products(
    client: &reqwest::Client,
    api_url: &str,
    cache: Option<&CatalogCache>,
) -> Result<Vec<ApiProduct>> {
    let url = products_url(api_url);

    if let Some(body) = cache.and_then(|c| c.get_fresh(&url)) {
        return parse_api_body(&body);
    }

    // Retry strategy: exponential backoff with 3 attempts
    let retry_strategy = ExponentialBackoff::from_millis(100)
        .max_delay(std::time::Duration::from_secs(5))
        .take(3);

    let body = Retry::spawn(retry_strategy, || async {
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Product API request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("Product API returned HTTP {}", status));
        }

        response
            .text()
            .await
            .map_err(|e| anyhow!("Failed to read product API response: {}", e))
    })
    .await
    .map_err(|e| SourceUnavailable {
        url: url.clone(),
        reason: e.to_string(),
    })?;

    let rows = parse_api_body(&body)?;
    info!(url = %url, rows = rows.len(), "fetched product rows");

    if let Some(cache) = cache {
        // A cache write failure only costs the next run a request
        if let Err(e) = cache.put(&url, &body) {
            debug!(error = %e, "catalog cache write failed");
        }
    }

    Ok(rows)
}

fn parse_api_body(body: &str) -> Result<Vec<ApiProduct>> {
    serde_json::from_str(body).context("Product API response is not a JSON array of products")
}

/// Products converted from API rows in the supported category, plus the rows
/// that had to be refused.
#[derive(Debug, Default)]
pub struct ConvertedRows {
    pub products: Vec<Product>,
    pub rejected: Vec<RecordError>,
}

/// Keep rows in `category` and convert them to catalog products
pub fn convert_api_rows(rows: Vec<ApiProduct>, category: &str, price_multiplier: f64) -> ConvertedRows {
    let mut converted = ConvertedRows::default();
    for row in rows {
        if row.category.as_deref() != Some(category) {
            continue;
        }
        match row.into_product(price_multiplier) {
            Ok(product) => converted.products.push(product),
            Err(e) => converted.rejected.push(e),
        }
    }
    converted
}

/// Read a catalog saved as a JSON array of products
pub fn read_catalog_file(path: &Path) -> Result<Vec<Product>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open catalog file at {}", path.display()))?;
    let products: Vec<Product> = serde_json::from_reader(std::io::BufReader::new(file))
        .with_context(|| format!("Failed to parse catalog file at {}", path.display()))?;
    Ok(products)
}

/// Save a catalog as a JSON array atomically
pub fn write_catalog_file(path: &Path, products: &[Product]) -> Result<()> {
    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;
    serde_json::to_writer_pretty(&mut file, products).context("Failed to serialize catalog")?;
    file.commit().context("Failed to save catalog file")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"[
        {"id": 1, "title": "Backpack", "price": 109.95, "category": "men's clothing",
         "rating": {"rate": 3.9, "count": 120}},
        {"id": 9, "title": "WD 2TB Elements Portable Hard Drive", "price": 64, "category": "electronics",
         "rating": {"rate": 3.3, "count": 203}},
        {"id": 10, "title": "SanDisk SSD", "category": "electronics",
         "rating": {"rate": 2.9, "count": 470}},
        {"id": 11, "title": "Silicon Power SSD", "price": 109, "category": "electronics"}
    ]"#;

    #[test]
    fn test_products_url_handles_trailing_slash() {
        assert_eq!(products_url("https://fakestoreapi.com/"), "https://fakestoreapi.com/products");
        assert_eq!(products_url("https://fakestoreapi.com"), "https://fakestoreapi.com/products");
    }

    #[test]
    fn test_convert_filters_category_and_rejects_missing_price() {
        let rows = parse_api_body(BODY).unwrap();
        let converted = convert_api_rows(rows, "electronics", 83.0);

        let ids: Vec<&str> = converted.products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["9", "11"]);
        assert_eq!(converted.products[0].price, 5312.0);
        assert_eq!(converted.products[1].rating_count, 0);

        assert_eq!(converted.rejected, vec![RecordError::MissingPrice { id: "10".to_string() }]);
    }

    #[test]
    fn test_parse_rejects_non_array() {
        assert!(parse_api_body(r#"{"error": "down"}"#).is_err());
    }

    #[tokio::test]
    async fn test_fresh_cache_skips_network() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CatalogCache::new(dir.path().to_path_buf(), std::time::Duration::from_secs(3600));
        // Unroutable base URL: any request would fail
        let api_url = "http://127.0.0.1:9";
        cache.put(&products_url(api_url), BODY).unwrap();

        let _ = rustls::crypto::ring::default_provider().install_default();
        let client = super::super::client::create_client(std::time::Duration::from_millis(200)).unwrap();
        let rows = fetch_api_products(&client, api_url, Some(&cache)).await.unwrap();
        assert_eq!(rows.len(), 4);
    }

    #[tokio::test]
    async fn test_unreachable_api_is_a_source_error() {
        let _ = rustls::crypto::ring::default_provider().install_default();
        let client = super::super::client::create_client(std::time::Duration::from_millis(200)).unwrap();
        let err = fetch_api_products(&client, "http://127.0.0.1:9", None).await.unwrap_err();
        let source = err.downcast_ref::<SourceUnavailable>().unwrap();
        assert_eq!(source.url, "http://127.0.0.1:9/products");
    }

    #[test]
    fn test_catalog_file_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let products = vec![
            Product::new("1", "Phone X", 1000.0, 4.5, 100),
            Product::new("2", "Laptop Y", 50000.0, 4.7, 200),
        ];
        write_catalog_file(&path, &products).unwrap();
        assert_eq!(read_catalog_file(&path).unwrap(), products);
    }
}
