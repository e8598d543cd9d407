use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::engine::EngineConfig;

pub const DEFAULT_API_URL: &str = "https://fakestoreapi.com";
pub const DEFAULT_CACHE_TTL: &str = "1h";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_VARIANTS_PER_PRODUCT: u32 = 34;
/// USD to INR, applied to every API price
pub const DEFAULT_PRICE_MULTIPLIER: f64 = 83.0;
pub const DEFAULT_SURVEY_PATH: &str = "customer_survey.csv";

fn default_auto_refresh_interval() -> u64 {
    300
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub survey_path: Option<PathBuf>,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<EngineConfig>,

    #[serde(default)]
    pub theme: ThemeMode,

    /// Seconds between background reloads in the dashboard
    #[serde(default = "default_auto_refresh_interval")]
    pub auto_refresh_interval: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            survey_path: None,
            catalog: CatalogConfig::default(),
            engine: None,
            theme: ThemeMode::default(),
            auto_refresh_interval: default_auto_refresh_interval(),
        }
    }
}

impl Config {
    pub fn survey_path(&self) -> PathBuf {
        self.survey_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SURVEY_PATH))
    }

    /// Engine settings, falling back to built-in defaults
    pub fn engine(&self) -> EngineConfig {
        self.engine.clone().unwrap_or_default()
    }
}

/// Where the catalog comes from and how API rows are turned into products
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Local JSON catalog; when set the API is never contacted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// How long a cached API response stays fresh, e.g. "1h" or "30m"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_ttl: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variants_per_product: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_multiplier: Option<f64>,

    /// Seed for synthetic customers and variants; random when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl CatalogConfig {
    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    pub fn variants_per_product(&self) -> u32 {
        self.variants_per_product
            .unwrap_or(DEFAULT_VARIANTS_PER_PRODUCT)
    }

    pub fn price_multiplier(&self) -> f64 {
        self.price_multiplier.unwrap_or(DEFAULT_PRICE_MULTIPLIER)
    }

    /// Parsed cache TTL. Callers validate first, so a bad value here falls
    /// back to the default.
    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
            .as_deref()
            .and_then(|s| humantime::parse_duration(s).ok())
            .unwrap_or(Duration::from_secs(3600))
    }
}

/// Color scheme selection for the dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Auto,
    Dark,
    Light,
}

/// Validate everything outside the engine section.
/// Returns all validation errors at once.
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if let Some(ref ttl) = config.catalog.cache_ttl {
        if let Err(e) = humantime::parse_duration(ttl) {
            errors.push(format!("catalog.cache_ttl: invalid duration '{}': {}", ttl, e));
        }
    }

    if config.catalog.timeout_secs == Some(0) {
        errors.push("catalog.timeout_secs: must be at least 1".to_string());
    }

    if let Some(m) = config.catalog.price_multiplier {
        if !m.is_finite() || m <= 0.0 {
            errors.push(format!("catalog.price_multiplier: must be positive, got {}", m));
        }
    }

    if let Some(ref url) = config.catalog.api_url {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            errors.push(format!("catalog.api_url: must start with http:// or https://, got '{}'", url));
        }
    }

    if config.auto_refresh_interval == 0 {
        errors.push("auto_refresh_interval: must be at least 1 second".to_string());
    }

    if let Some(ref engine) = config.engine {
        if let Err(engine_errors) = crate::engine::validate_engine(engine) {
            errors.extend(engine_errors);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_is_all_defaults() {
        let config: Config = serde_saphyr::from_str("{}").unwrap();
        assert_eq!(config.survey_path(), PathBuf::from(DEFAULT_SURVEY_PATH));
        assert_eq!(config.catalog.api_url(), DEFAULT_API_URL);
        assert_eq!(config.catalog.variants_per_product(), 34);
        assert_eq!(config.catalog.price_multiplier(), 83.0);
        assert_eq!(config.catalog.cache_ttl(), Duration::from_secs(3600));
        assert_eq!(config.theme, ThemeMode::Auto);
        assert_eq!(config.auto_refresh_interval, 300);
        assert_eq!(config.engine().penalty_weight(), 2.0);
    }

    #[test]
    fn test_full_yaml() {
        let yaml = r#"
survey_path: data/survey.csv
catalog:
  api_url: http://localhost:8080
  cache_ttl: 30m
  timeout_secs: 3
  variants_per_product: 0
  seed: 42
engine:
  penalty_weight: 1.5
  sample_size: 10
theme: light
auto_refresh_interval: 60
"#;
        let config: Config = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(config.survey_path(), PathBuf::from("data/survey.csv"));
        assert_eq!(config.catalog.cache_ttl(), Duration::from_secs(1800));
        assert_eq!(config.catalog.timeout(), Duration::from_secs(3));
        assert_eq!(config.catalog.variants_per_product(), 0);
        assert_eq!(config.catalog.seed, Some(42));
        assert_eq!(config.engine().penalty_weight(), 1.5);
        assert_eq!(config.engine().sample_size(), 10);
        assert_eq!(config.theme, ThemeMode::Light);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let result: Result<Config, _> = serde_saphyr::from_str("colour: blue\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_collects_errors() {
        let mut config = Config::default();
        config.catalog.cache_ttl = Some("soon".to_string());
        config.catalog.timeout_secs = Some(0);
        config.catalog.api_url = Some("ftp://x".to_string());
        config.engine = Some(EngineConfig {
            sample_size: Some(0),
            ..EngineConfig::default()
        });
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.iter().any(|e| e.starts_with("engine.sample_size")));
    }
}
