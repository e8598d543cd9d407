pub mod cache;
pub mod client;
pub mod fetch;
pub mod types;

pub use cache::{clear_cache, get_cache_path, CacheConfig, CatalogCache};
pub use client::create_client;
pub use fetch::{
    convert_api_rows, fetch_api_products, read_catalog_file, write_catalog_file, ConvertedRows,
};
pub use types::{ApiProduct, ApiRating, Product};
