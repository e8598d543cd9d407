use serde::{Deserialize, Serialize};

use crate::demand::DEFAULT_CATEGORY;

/// Weight applied to relative price distance (higher punishes off-budget harder)
pub const DEFAULT_PENALTY_WEIGHT: f64 = 2.0;
/// Fractional widening of the budget window when picking candidates
pub const DEFAULT_PRICE_BUFFER: f64 = 0.2;
/// Customers (cohort prefix) used for precision metrics
pub const DEFAULT_SAMPLE_SIZE: usize = 50;
/// Recommendations shown per customer in listings and the dashboard
pub const DEFAULT_RECOMMENDATION_COUNT: usize = 5;
/// Depth of the precision@K metrics; the evaluator asks for this many candidates
pub const PRECISION_DEPTH: usize = 3;

/// Engine tuning.
///
/// Each field is optional; unset fields fall back to the constants above.
///
/// Example YAML:
/// ```yaml
/// engine:
///   penalty_weight: 2.0
///   price_buffer: 0.2
///   sample_size: 50
///   category: electronics
///   recommendation_count: 5
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Multiplier on relative price distance in the score (default: 2.0)
    #[serde(default)]
    pub penalty_weight: Option<f64>,

    /// Budget window widening for candidate selection, 0.2 = 20% (default: 0.2)
    #[serde(default)]
    pub price_buffer: Option<f64>,

    /// Leading customers evaluated for precision metrics (default: 50)
    #[serde(default)]
    pub sample_size: Option<usize>,

    /// The one category the catalog serves (default: "electronics")
    #[serde(default)]
    pub category: Option<String>,

    /// Recommendations per customer in listings (default: 5)
    #[serde(default)]
    pub recommendation_count: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            penalty_weight: Some(DEFAULT_PENALTY_WEIGHT),
            price_buffer: Some(DEFAULT_PRICE_BUFFER),
            sample_size: Some(DEFAULT_SAMPLE_SIZE),
            category: Some(DEFAULT_CATEGORY.to_string()),
            recommendation_count: Some(DEFAULT_RECOMMENDATION_COUNT),
        }
    }
}

impl EngineConfig {
    pub fn penalty_weight(&self) -> f64 {
        self.penalty_weight.unwrap_or(DEFAULT_PENALTY_WEIGHT)
    }

    pub fn price_buffer(&self) -> f64 {
        self.price_buffer.unwrap_or(DEFAULT_PRICE_BUFFER)
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size.unwrap_or(DEFAULT_SAMPLE_SIZE)
    }

    pub fn category(&self) -> &str {
        self.category.as_deref().unwrap_or(DEFAULT_CATEGORY)
    }

    pub fn recommendation_count(&self) -> usize {
        self.recommendation_count.unwrap_or(DEFAULT_RECOMMENDATION_COUNT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_engine_config() {
        let config = EngineConfig::default();
        assert_eq!(config.penalty_weight(), 2.0);
        assert_eq!(config.price_buffer(), 0.2);
        assert_eq!(config.sample_size(), 50);
        assert_eq!(config.category(), "electronics");
        assert_eq!(config.recommendation_count(), 5);
    }

    #[test]
    fn test_engine_config_serde_roundtrip() {
        let config = EngineConfig::default();
        let yaml = serde_saphyr::to_string(&config).unwrap();
        let parsed: EngineConfig = serde_saphyr::from_str(&yaml).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_engine_config_parse() {
        let yaml = r#"
penalty_weight: 3.5
sample_size: 10
"#;
        let config: EngineConfig = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(config.penalty_weight(), 3.5);
        assert_eq!(config.sample_size(), 10);
        // Unset fields fall back to defaults
        assert!(config.price_buffer.is_none());
        assert_eq!(config.price_buffer(), 0.2);
        assert_eq!(config.category(), "electronics");
    }

    #[test]
    fn test_empty_engine_config_parse() {
        let config: EngineConfig = serde_saphyr::from_str("{}").unwrap();
        assert!(config.penalty_weight.is_none());
        assert!(config.recommendation_count.is_none());
        assert_eq!(config.recommendation_count(), 5);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<EngineConfig, _> = serde_saphyr::from_str("penalty: 2\n");
        assert!(result.is_err());
    }
}
