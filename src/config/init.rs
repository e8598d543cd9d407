use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::config::{
    get_config_path, save_config, CatalogConfig, Config, ThemeMode, DEFAULT_API_URL,
    DEFAULT_CACHE_TTL, DEFAULT_SURVEY_PATH,
};
use crate::engine::{
    validate_engine, EngineConfig, DEFAULT_PENALTY_WEIGHT, DEFAULT_PRICE_BUFFER,
    DEFAULT_SAMPLE_SIZE,
};

/// Prompt user with a message and return their trimmed input.
fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    std::io::stdout()
        .flush()
        .context("Failed to flush stdout")?;
    let mut input = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read input")?;
    Ok(input.trim().to_string())
}

/// Prompt user with a message and a default value. Returns default if input is empty.
fn prompt_with_default(message: &str, default: &str) -> Result<String> {
    let input = prompt(&format!("{} [{}]: ", message, default))?;
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input)
    }
}

/// Prompt user with a yes/no question. Returns bool based on input and default.
fn prompt_yes_no(message: &str, default_yes: bool) -> Result<bool> {
    let hint = if default_yes { "Y/n" } else { "y/N" };
    let input = prompt(&format!("{} [{}]: ", message, hint))?;
    let input = input.to_lowercase();
    if input.is_empty() {
        Ok(default_yes)
    } else {
        Ok(input == "y" || input == "yes")
    }
}

/// Keep asking until `parse` accepts the answer.
fn prompt_parsed<T>(
    message: &str,
    default: &str,
    parse: impl Fn(&str) -> Result<T, String>,
) -> Result<T> {
    loop {
        let input = prompt_with_default(message, default)?;
        match parse(&input) {
            Ok(v) => return Ok(v),
            Err(e) => println!("  Invalid: {}. Try again.", e),
        }
    }
}

fn parse_theme(s: &str) -> Result<ThemeMode, String> {
    match s.to_lowercase().as_str() {
        "auto" => Ok(ThemeMode::Auto),
        "dark" => Ok(ThemeMode::Dark),
        "light" => Ok(ThemeMode::Light),
        other => Err(format!("expected auto, dark or light, got '{}'", other)),
    }
}

fn parse_non_negative(s: &str) -> Result<f64, String> {
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => Err("must be a non-negative number".to_string()),
    }
}

fn parse_positive_count(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(v) if v > 0 => Ok(v),
        _ => Err("must be a whole number above zero".to_string()),
    }
}

/// Run the interactive init wizard to create a config file.
///
/// If `default_path` is Some, it is offered as the save location.
pub fn run_init_wizard(default_path: Option<PathBuf>) -> Result<()> {
    println!();
    println!("Market Match Configuration Wizard");
    println!("=================================");
    println!();

    // 1. Data sources
    println!("Customer demand is read from a survey CSV. If the file is missing, a synthetic cohort is generated.");
    let survey_path = prompt_with_default("Survey CSV path", DEFAULT_SURVEY_PATH)?;

    println!();
    println!("Products come from a local JSON catalog if you have one, otherwise from a product API.");
    let catalog_path = prompt("Local catalog JSON (leave empty to use the API): ")?;
    let mut catalog = CatalogConfig::default();
    if catalog_path.is_empty() {
        let api_url = prompt_parsed("Product API base URL", DEFAULT_API_URL, |s| {
            if s.starts_with("http://") || s.starts_with("https://") {
                Ok(s.to_string())
            } else {
                Err("must start with http:// or https://".to_string())
            }
        })?;
        if api_url != DEFAULT_API_URL {
            catalog.api_url = Some(api_url);
        }
        let ttl = prompt_parsed("Cache API responses for", DEFAULT_CACHE_TTL, |s| {
            humantime::parse_duration(s)
                .map(|_| s.to_string())
                .map_err(|e| e.to_string())
        })?;
        if ttl != DEFAULT_CACHE_TTL {
            catalog.cache_ttl = Some(ttl);
        }
    } else {
        catalog.path = Some(PathBuf::from(catalog_path));
    }

    // 2. Engine tuning
    println!();
    let engine = if prompt_yes_no("Tune the recommendation engine? (n accepts defaults)", false)? {
        println!("The penalty weight sets how hard a price far from the budget midpoint is punished.");
        let penalty_weight = prompt_parsed(
            "Penalty weight",
            &DEFAULT_PENALTY_WEIGHT.to_string(),
            parse_non_negative,
        )?;
        println!("The price buffer widens each budget when picking candidates (0.2 means 20% either way).");
        let price_buffer = prompt_parsed("Price buffer", &DEFAULT_PRICE_BUFFER.to_string(), |s| {
            parse_non_negative(s).and_then(|v| {
                if v < 1.0 {
                    Ok(v)
                } else {
                    Err("must be below 1".to_string())
                }
            })
        })?;
        let sample_size = prompt_parsed(
            "Customers sampled for precision metrics",
            &DEFAULT_SAMPLE_SIZE.to_string(),
            parse_positive_count,
        )?;

        let engine = EngineConfig {
            penalty_weight: Some(penalty_weight),
            price_buffer: Some(price_buffer),
            sample_size: Some(sample_size),
            ..EngineConfig::default()
        };
        if let Err(errors) = validate_engine(&engine) {
            anyhow::bail!("Engine settings are invalid: {}", errors.join("; "));
        }
        Some(engine)
    } else {
        None
    };

    // 3. Dashboard
    println!();
    let theme = prompt_parsed("Dashboard theme (auto, dark, light)", "auto", parse_theme)?;

    // 4. Config path
    let default_config_path = match default_path {
        Some(p) => p,
        None => get_config_path()?,
    };
    println!();
    let path_str = prompt_with_default(
        "Where should the config be saved?",
        &default_config_path.display().to_string(),
    )?;
    let config_path = PathBuf::from(&path_str);

    if config_path.exists() {
        let overwrite = prompt_yes_no(
            &format!(
                "Config already exists at {}. Overwrite?",
                config_path.display()
            ),
            false,
        )?;
        if !overwrite {
            println!("Aborted.");
            return Ok(());
        }
    }

    // 5. Write config
    let config = Config {
        survey_path: Some(PathBuf::from(survey_path)),
        catalog,
        engine,
        theme,
        ..Config::default()
    };
    save_config(&config_path, &config)?;

    println!();
    println!("Config written to {}", config_path.display());
    println!("Run `market-match` to open the dashboard.");

    Ok(())
}
