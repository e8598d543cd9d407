use super::config::EngineConfig;

/// Validate engine configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_engine(config: &EngineConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if let Some(weight) = config.penalty_weight {
        if !weight.is_finite() || weight < 0.0 {
            errors.push(format!(
                "engine.penalty_weight: must be a non-negative number, got {}",
                weight
            ));
        }
    }

    if let Some(buffer) = config.price_buffer {
        // A buffer of 1.0 or more would drop the lower bound to zero or below
        if !(0.0..1.0).contains(&buffer) {
            errors.push(format!(
                "engine.price_buffer: must be at least 0 and below 1, got {}",
                buffer
            ));
        }
    }

    if config.sample_size == Some(0) {
        errors.push("engine.sample_size: must be at least 1".to_string());
    }

    if let Some(ref category) = config.category {
        if category.trim().is_empty() {
            errors.push("engine.category: must not be empty".to_string());
        }
    }

    if config.recommendation_count == Some(0) {
        errors.push("engine.recommendation_count: must be at least 1".to_string());
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

    fn empty() -> EngineConfig {
        EngineConfig {
            penalty_weight: None,
            price_buffer: None,
            sample_size: None,
            category: None,
            recommendation_count: None,
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_engine(&EngineConfig::default()).is_ok());
    }

    #[test]
    fn test_empty_config_is_valid() {
        assert!(validate_engine(&empty()).is_ok());
    }

    #[test]
    fn test_negative_weight() {
        let config = EngineConfig {
            penalty_weight: Some(-1.0),
            ..empty()
        };
        let errors = validate_engine(&config).unwrap_err();
        assert!(errors[0].contains("engine.penalty_weight"));
    }

    #[test]
    fn test_nan_weight() {
        let config = EngineConfig {
            penalty_weight: Some(f64::NAN),
            ..empty()
        };
        assert!(validate_engine(&config).is_err());
    }

    #[test]
    fn test_buffer_bounds() {
        for bad in [-0.1, 1.0, 2.5] {
            let config = EngineConfig {
                price_buffer: Some(bad),
                ..empty()
            };
            let errors = validate_engine(&config).unwrap_err();
            assert!(errors[0].contains("engine.price_buffer"), "{}", bad);
        }
        let zero = EngineConfig {
            price_buffer: Some(0.0),
            ..empty()
        };
        assert!(validate_engine(&zero).is_ok());
    }

    #[test]
    fn test_blank_category() {
        let config = EngineConfig {
            category: Some("  ".to_string()),
            ..empty()
        };
        let errors = validate_engine(&config).unwrap_err();
        assert!(errors[0].contains("engine.category"));
    }

    #[test]
    fn test_collects_all_errors() {
        let config = EngineConfig {
            penalty_weight: Some(-2.0),     // Error 1
            price_buffer: Some(3.0),        // Error 2
            sample_size: Some(0),           // Error 3
            category: None,
            recommendation_count: Some(0),  // Error 4
        };
        let errors = validate_engine(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
    }
}
