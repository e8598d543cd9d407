use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use market_match::config::{load_config, validate_config, Config};
use market_match::engine::{Evaluator, Recommender};
use market_match::error::SourceUnavailable;
use market_match::load::{load_market_data, MarketData};
use market_match::output;
use market_match::stderr_buffer::BufferedStderr;
use market_match::supply::{clear_cache, get_cache_path, write_catalog_file, CacheConfig};

const EXIT_SUCCESS: i32 = 0;
const EXIT_NETWORK: i32 = 2;
const EXIT_CONFIG: i32 = 4;
const EXIT_DATA: i32 = 5;

const DEFAULT_LIST_LIMIT: usize = 50;

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq)]
enum RecommendFormat {
    #[default]
    Table,
    Tsv,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq)]
enum ReportFormat {
    #[default]
    Table,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive dashboard (default if no subcommand)
    Dashboard,
    /// Rank products for one customer
    Recommend {
        /// Customer id as it appears in the survey, e.g. USER_0001
        customer_id: String,
        /// How many products to show (defaults to engine.recommendation_count)
        #[arg(short, long)]
        top: Option<usize>,
        #[arg(short, long, value_enum, default_value_t)]
        format: RecommendFormat,
    },
    /// Measure recommendation quality over the whole cohort
    Evaluate {
        /// Customers used for precision metrics (defaults to engine.sample_size)
        #[arg(short, long)]
        sample_size: Option<usize>,
        #[arg(short, long, value_enum, default_value_t)]
        format: ReportFormat,
    },
    /// Demand-versus-supply business report
    Insights {
        #[arg(short, long, value_enum, default_value_t)]
        format: ReportFormat,
    },
    /// List loaded customers
    Customers {
        #[arg(short, long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: usize,
    },
    /// List loaded products
    Products {
        #[arg(short, long, default_value_t = DEFAULT_LIST_LIMIT)]
        limit: usize,
    },
    /// Write a synthetic survey CSV
    Generate {
        #[arg(short = 'n', long, default_value_t = market_match::synth::DEFAULT_SURVEY_SIZE)]
        count: usize,
        /// Seed for reproducible output (defaults to catalog.seed, then random)
        #[arg(long)]
        seed: Option<u64>,
        /// Output path (defaults to the configured survey path)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Save the current catalog as JSON for offline use via catalog.path
    ExportCatalog {
        output: PathBuf,
    },
    /// Create a config file interactively
    Init,
    /// Remove cached product API responses
    ClearCache,
}

#[derive(Parser, Debug)]
#[command(name = "market-match")]
#[command(about = "Match customer demand against a product catalog", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/market-match/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Always fetch the catalog from the API
    #[arg(long, global = true)]
    no_cache: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "warn,market_match=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(BufferedStderr)
        .with_target(false)
        .init();
}

fn exit_with(code: i32, msg: impl std::fmt::Display) -> ! {
    eprintln!("{}", msg);
    std::process::exit(code);
}

/// Map a loading failure to its exit code
fn data_error_code(err: &anyhow::Error) -> i32 {
    let network = err.chain().any(|cause| {
        cause.downcast_ref::<SourceUnavailable>().is_some()
            || cause.downcast_ref::<reqwest::Error>().is_some()
    });
    if network {
        EXIT_NETWORK
    } else {
        EXIT_DATA
    }
}

async fn load_or_exit(config: &Config, cache_config: &CacheConfig) -> MarketData {
    match load_market_data(config, cache_config).await {
        Ok(data) => {
            if !data.rejected.is_empty() || data.unreadable > 0 {
                eprintln!(
                    "Skipped {} invalid and {} unreadable records (run with --verbose for details)",
                    data.rejected.len(),
                    data.unreadable
                );
            }
            data
        }
        Err(e) => exit_with(data_error_code(&e), format!("Error: {:#}", e)),
    }
}

fn require_catalog(data: &MarketData) {
    if data.products.is_empty() {
        exit_with(
            EXIT_DATA,
            format!("Catalog from {} has no usable products.", data.catalog_source),
        );
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => exit_with(EXIT_DATA, format!("Failed to serialize output: {}", e)),
    }
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for rustls 0.23+).
    // Fails only when one is already installed.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let cli = Cli::parse();
    init_logging(cli.verbose);
    let command = cli.command.unwrap_or(Commands::Dashboard);
    let start_time = Instant::now();

    // Commands that must work without a valid config
    match command {
        Commands::Init => {
            if let Err(e) = market_match::config::init::run_init_wizard(cli.config) {
                exit_with(EXIT_CONFIG, format!("Init failed: {:#}", e));
            }
            std::process::exit(EXIT_SUCCESS);
        }
        Commands::ClearCache => {
            let path = get_cache_path();
            if let Err(e) = clear_cache(&path) {
                exit_with(EXIT_DATA, format!("Failed to clear cache: {:#}", e));
            }
            println!("Cleared {}", path.display());
            std::process::exit(EXIT_SUCCESS);
        }
        _ => {}
    }

    let config = match load_config(cli.config) {
        Ok(c) => c,
        Err(e) => exit_with(EXIT_CONFIG, format!("Config error: {:#}", e)),
    };

    // Validate config at startup
    if let Err(errors) = validate_config(&config) {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let engine = config.engine();
    let cache_config = CacheConfig {
        enabled: !cli.no_cache,
        ttl: config.catalog.cache_ttl(),
    };
    debug!(
        cache = if cache_config.enabled { "enabled" } else { "disabled (--no-cache)" },
        "starting"
    );

    let use_colors = output::should_use_colors();

    match command {
        Commands::Dashboard => {
            let theme = market_match::tui::resolve_theme(config.theme);
            let app = market_match::tui::App::new_loading(config, cache_config, theme);
            if let Err(e) = market_match::tui::run_tui(app).await {
                exit_with(EXIT_DATA, format!("Dashboard error: {:#}", e));
            }
        }
        Commands::Recommend {
            customer_id,
            top,
            format,
        } => {
            let data = load_or_exit(&config, &cache_config).await;
            require_catalog(&data);
            let Some(customer) = data.customer(&customer_id) else {
                exit_with(EXIT_DATA, format!("Unknown customer id '{}'", customer_id));
            };

            let top_n = top.unwrap_or(engine.recommendation_count());
            let rec = Recommender::from_config(&engine).recommend(customer, &data.products, top_n);
            match format {
                RecommendFormat::Table => {
                    println!("{}", output::format_recommendation_table(customer, &rec, use_colors))
                }
                RecommendFormat::Tsv => println!("{}", output::format_recommendation_tsv(customer, &rec)),
                RecommendFormat::Json => match output::format_recommendation_json(customer, &rec) {
                    Ok(json) => println!("{}", json),
                    Err(e) => exit_with(EXIT_DATA, format!("Failed to serialize output: {}", e)),
                },
            }
        }
        Commands::Evaluate {
            sample_size,
            format,
        } => {
            let data = load_or_exit(&config, &cache_config).await;
            require_catalog(&data);
            let sample_size = sample_size.unwrap_or(engine.sample_size());
            let report = Evaluator::from_config(&engine).evaluate(&data.customers, &data.products, sample_size);
            match format {
                ReportFormat::Table => println!("{}", output::format_metrics(&report, use_colors)),
                ReportFormat::Json => print_json(&report),
            }
        }
        Commands::Insights { format } => {
            let data = load_or_exit(&config, &cache_config).await;
            let report = market_match::insights::business_report(&data.customers, &data.products);
            match format {
                ReportFormat::Table => println!("{}", output::format_insights(&report, use_colors)),
                ReportFormat::Json => print_json(&report),
            }
        }
        Commands::Customers { limit } => {
            let data = load_or_exit(&config, &cache_config).await;
            println!("{}", output::format_customer_list(&data.customers, limit));
        }
        Commands::Products { limit } => {
            let data = load_or_exit(&config, &cache_config).await;
            println!("{}", output::format_product_list(&data.products, limit));
        }
        Commands::Generate {
            count,
            seed,
            output: out,
        } => {
            let path = out.unwrap_or_else(|| config.survey_path());
            let mut rng = market_match::synth::rng_from(seed.or(config.catalog.seed));
            let customers = market_match::synth::generate_survey(&mut rng, count);
            if let Err(e) = market_match::demand::write_survey(&path, &customers) {
                exit_with(EXIT_DATA, format!("Error: {:#}", e));
            }
            println!("Wrote {} customers to {}", customers.len(), path.display());
        }
        Commands::ExportCatalog { output: out } => {
            let data = load_or_exit(&config, &cache_config).await;
            if let Err(e) = write_catalog_file(&out, &data.products) {
                exit_with(EXIT_DATA, format!("Error: {:#}", e));
            }
            println!("Wrote {} products to {}", data.products.len(), out.display());
        }
        Commands::Init | Commands::ClearCache => {}
    }

    info!(elapsed = ?start_time.elapsed(), "done");
    std::process::exit(EXIT_SUCCESS);
}
