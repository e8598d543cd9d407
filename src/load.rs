//! Turns the configured sources into one validated snapshot of demand and
//! supply. The CLI calls this once; the dashboard calls it again on every
//! reload.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fmt;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::config::Config;
use crate::demand::{read_survey, Customer};
use crate::error::RecordError;
use crate::supply::{
    convert_api_rows, create_client, fetch_api_products, get_cache_path, read_catalog_file,
    CacheConfig, CatalogCache, Product,
};
use crate::synth::{expand_variants, generate_survey, rng_from, DEFAULT_SURVEY_SIZE};

/// Where the customers came from
#[derive(Debug, Clone, PartialEq)]
pub enum SurveySource {
    File(PathBuf),
    /// The survey file was missing and a cohort was generated instead
    Synthetic,
}

impl fmt::Display for SurveySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurveySource::File(path) => write!(f, "{}", path.display()),
            SurveySource::Synthetic => write!(f, "synthetic ({} customers)", DEFAULT_SURVEY_SIZE),
        }
    }
}

/// Where the products came from
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogSource {
    File(PathBuf),
    Api(String),
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogSource::File(path) => write!(f, "{}", path.display()),
            CatalogSource::Api(url) => write!(f, "{}", url),
        }
    }
}

/// Validated demand and supply, ready for the engine
#[derive(Debug, Clone)]
pub struct MarketData {
    pub customers: Vec<Customer>,
    pub products: Vec<Product>,
    /// Records refused at the boundary, demand and supply together
    pub rejected: Vec<RecordError>,
    /// Survey rows that could not be parsed at all
    pub unreadable: usize,
    pub survey_source: SurveySource,
    pub catalog_source: CatalogSource,
    pub loaded_at: DateTime<Local>,
}

impl MarketData {
    pub fn customer(&self, id: &str) -> Option<&Customer> {
        self.customers.iter().find(|c| c.id == id)
    }
}

/// Keep the records that validate; log and collect the rest
pub fn screen<T>(
    records: Vec<T>,
    validate: impl Fn(&T) -> Result<(), RecordError>,
    rejected: &mut Vec<RecordError>,
) -> Vec<T> {
    records
        .into_iter()
        .filter(|record| match validate(record) {
            Ok(()) => true,
            Err(e) => {
                warn!(reason = %e, "rejected record");
                rejected.push(e);
                false
            }
        })
        .collect()
}

pub struct LoadedCustomers {
    pub customers: Vec<Customer>,
    pub unreadable: usize,
    pub source: SurveySource,
}

/// Read the survey file, or generate a cohort when it does not exist
pub fn load_customers(config: &Config) -> Result<LoadedCustomers> {
    let path = config.survey_path();
    if path.exists() {
        let rows = read_survey(&path)?;
        info!(path = %path.display(), customers = rows.customers.len(), "loaded survey");
        return Ok(LoadedCustomers {
            customers: rows.customers,
            unreadable: rows.unreadable,
            source: SurveySource::File(path),
        });
    }

    warn!(
        path = %path.display(),
        count = DEFAULT_SURVEY_SIZE,
        "survey file not found, generating synthetic customers"
    );
    let mut rng = rng_from(config.catalog.seed);
    Ok(LoadedCustomers {
        customers: generate_survey(&mut rng, DEFAULT_SURVEY_SIZE),
        unreadable: 0,
        source: SurveySource::Synthetic,
    })
}

pub struct LoadedProducts {
    pub products: Vec<Product>,
    /// API rows that could not be converted
    pub rejected: Vec<RecordError>,
    pub source: CatalogSource,
}

/// Read the local catalog, or fetch, convert and expand the API catalog
pub async fn load_products(config: &Config, cache_config: &CacheConfig) -> Result<LoadedProducts> {
    if let Some(ref path) = config.catalog.path {
        let products = read_catalog_file(path)?;
        info!(path = %path.display(), products = products.len(), "loaded catalog file");
        return Ok(LoadedProducts {
            products,
            rejected: Vec::new(),
            source: CatalogSource::File(path.clone()),
        });
    }

    let catalog = &config.catalog;
    let engine = config.engine();
    let client = create_client(catalog.timeout())?;
    let cache = cache_config
        .enabled
        .then(|| CatalogCache::new(get_cache_path(), cache_config.ttl));

    let rows = fetch_api_products(&client, catalog.api_url(), cache.as_ref()).await?;
    let converted = convert_api_rows(rows, engine.category(), catalog.price_multiplier());

    let mut rng = rng_from(catalog.seed);
    let products = expand_variants(&mut rng, &converted.products, catalog.variants_per_product());
    info!(
        base = converted.products.len(),
        expanded = products.len(),
        "built catalog from API"
    );

    Ok(LoadedProducts {
        products,
        rejected: converted.rejected,
        source: CatalogSource::Api(catalog.api_url().to_string()),
    })
}

/// Load and screen both sides of the market
pub async fn load_market_data(config: &Config, cache_config: &CacheConfig) -> Result<MarketData> {
    let demand = load_customers(config).context("Failed to load customers")?;
    let supply = load_products(config, cache_config)
        .await
        .context("Failed to load products")?;

    let mut rejected = Vec::new();
    for e in &supply.rejected {
        warn!(reason = %e, "rejected product row");
    }
    rejected.extend(supply.rejected);

    let customers = screen(demand.customers, Customer::validate, &mut rejected);
    let products = screen(supply.products, Product::validate, &mut rejected);

    Ok(MarketData {
        customers,
        products,
        rejected,
        unreadable: demand.unreadable,
        survey_source: demand.source,
        catalog_source: supply.source,
        loaded_at: Local::now(),
    })
}
