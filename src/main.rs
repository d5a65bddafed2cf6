//! Search-Harvest main entry point
//!
//! This is the command-line interface for the Search-Harvest collector.

use anyhow::Context;
use clap::Parser;
use search_harvest::collector::{run_collection, ConfigCatalog, TermCatalog, TermScheduler};
use search_harvest::config::{load_config_with_hash, Config};
use search_harvest::output::{load_report, print_report};
use search_harvest::storage::open_store;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Search-Harvest: a rate-respecting continuous search collector
///
/// Search-Harvest repeatedly queries a search API for a rotating set of
/// terms, never exceeding the configured query quota, and resumes each
/// term's pagination exactly where it left off.
#[derive(Parser, Debug)]
#[command(name = "search-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A rate-respecting continuous search collector", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and list the catalog terms without collecting
    #[arg(long, conflicts_with_all = ["stats", "seed"])]
    dry_run: bool,

    /// Show statistics from the store and exit
    #[arg(long, conflicts_with_all = ["dry_run", "seed"])]
    stats: bool,

    /// Add the catalog terms to the candidate set and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    seed: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.stats {
        handle_stats(&config)
    } else if cli.seed {
        handle_seed(&config)
    } else {
        handle_collect(config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// `RUST_LOG`, when set, overrides the verbosity flags.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if quiet {
            EnvFilter::new("error")
        } else {
            match verbose {
                0 => EnvFilter::new("search_harvest=info,warn"),
                1 => EnvFilter::new("search_harvest=debug,info"),
                2 => EnvFilter::new("search_harvest=trace,debug"),
                _ => EnvFilter::new("trace"),
            }
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be collected
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Search-Harvest Dry Run ===\n");

    println!("Search:");
    println!("  Endpoint: {}", config.search.base_url);
    println!("  Result type: {}", config.search.result_type);
    println!("  Page size: {}", config.search.page_size);
    println!("  Timeout: {}s", config.search.timeout_secs);
    if !config.search.term_prefix.is_empty() {
        println!("  Term prefix: {:?}", config.search.term_prefix);
    }
    match &config.search.bearer_token_env {
        Some(var) => println!(
            "  Bearer token: ${} ({})",
            var,
            if std::env::var_os(var).is_some() {
                "set"
            } else {
                "NOT SET"
            }
        ),
        None => println!("  Bearer token: none"),
    }

    println!("\nRate Limit:");
    println!(
        "  Quota: {} queries per {} minutes",
        config.rate_limit.quota, config.rate_limit.window_minutes
    );
    println!(
        "  Throttle backoff: {}s",
        config.rate_limit.throttle_backoff_secs
    );

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path);

    let terms = ConfigCatalog::from_config(&config.catalog)
        .load_terms()
        .context("failed to load term catalog")?;
    println!("\nCatalog Terms ({}):", terms.len());
    for term in &terms {
        println!("  - {}", term);
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would collect for {} terms", terms.len());

    Ok(())
}

/// Handles the --stats mode: shows statistics from the store
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.storage.database_path);

    let store = open_store(Path::new(&config.storage.database_path))
        .with_context(|| format!("failed to open {}", config.storage.database_path))?;
    let report = load_report(&store)?;
    print_report(&report);

    Ok(())
}

/// Handles the --seed mode: adds catalog terms to the candidate set
fn handle_seed(config: &Config) -> anyhow::Result<()> {
    let mut store = open_store(Path::new(&config.storage.database_path))
        .with_context(|| format!("failed to open {}", config.storage.database_path))?;
    let scheduler = TermScheduler::new(Box::new(ConfigCatalog::from_config(&config.catalog)));

    let added = scheduler.seed(&mut store)?;
    println!("✓ Added {} new terms to the candidate set", added);

    Ok(())
}

/// Handles the main collection loop
///
/// Collection never finishes on its own; it stops on Ctrl-C or on a
/// startup failure.
async fn handle_collect(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        "Quota: {} queries per {} minutes, database: {}",
        config.rate_limit.quota,
        config.rate_limit.window_minutes,
        config.storage.database_path
    );

    tokio::select! {
        result = run_collection(&config) => {
            if let Err(e) = &result {
                tracing::error!("Collection failed: {}", e);
            }
            result.map_err(Into::into)
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for Ctrl-C")?;
            tracing::info!("Interrupted, stopping collection");
            Ok(())
        }
    }
}
