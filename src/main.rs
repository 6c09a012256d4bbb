//! Shelfcrawl main entry point
//!
//! Command-line interface for the catalog scraper. A run either collects
//! product links from a paginated listing, fetches product details for a
//! collected list, or does both in sequence.

use clap::Parser;
use shelfcrawl::config::load_config;
use shelfcrawl::pipeline::{DetailFetcher, LinkCollector};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Shelfcrawl: a resumable e-commerce catalog scraper
///
/// Collects product URLs from paginated listing pages, then visits each
/// product page to extract structured fields and download one image. Both
/// phases checkpoint after every unit of work and resume after a crash.
#[derive(Parser, Debug)]
#[command(name = "shelfcrawl")]
#[command(version = "1.0.0")]
#[command(about = "A resumable e-commerce catalog scraper", long_about = None)]
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

    /// Only collect product links
    #[arg(long, conflicts_with = "details")]
    collect: bool,

    /// Only fetch product details
    #[arg(long, conflicts_with = "collect")]
    details: bool,

    /// Ignore the collector checkpoint and start over from the first page
    #[arg(long)]
    fresh: bool,

    /// Validate config and show what would run without fetching anything
    #[arg(long, conflicts_with_all = ["collect", "details"])]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    if !cli.details {
        handle_collect(&config, cli.fresh).await?;
    }
    if !cli.collect {
        handle_details(&config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("shelfcrawl=info,warn"),
            1 => EnvFilter::new("shelfcrawl=debug,info"),
            2 => EnvFilter::new("shelfcrawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would run
fn handle_dry_run(config: &shelfcrawl::Config) {
    println!("=== Shelfcrawl Dry Run ===\n");

    println!("Collector:");
    println!("  Base URL: {}", config.collector.base_url);
    println!("  Start page: {}", config.collector.start_page);
    match config.collector.end_page {
        Some(end_page) => println!("  End page: {}", end_page),
        None => println!("  End page: unlimited"),
    }
    println!(
        "  Links: min {}, max {}",
        config.collector.min_links, config.collector.max_links
    );
    println!("  Output: {}", config.collector.output_file);
    println!("  Checkpoint: {}", config.collector.checkpoint_file);

    println!("\nDetails:");
    println!("  Input: {}", config.details.input_file);
    println!("  Result dir: {}", config.details.result_dir);
    println!("  Checkpoint: {}", config.details.checkpoint_file);
    println!("  Start from: {}", config.details.start_from);
    match config.details.max_products {
        Some(max_products) => println!("  Max products: {}", max_products),
        None => println!("  Max products: unlimited"),
    }

    println!("\nFetcher:");
    println!("  Engine: {:?}", config.fetcher.engine);
    println!("  Headless: {}", config.fetcher.headless);
    println!("  Timeout: {}s", config.fetcher.timeout_secs);
    println!(
        "  Delay: {}ms + jitter up to {}ms",
        config.fetcher.request_delay_ms, config.fetcher.jitter_ms
    );

    println!("\n✓ Configuration is valid");
}

/// Handles the link collection phase
async fn handle_collect(
    config: &shelfcrawl::Config,
    fresh: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if fresh {
        tracing::info!("Starting fresh link collection");
    } else {
        tracing::info!("Starting link collection (will resume if a checkpoint exists)");
    }

    let mut collector = LinkCollector::new(config).await?;
    match collector.run(fresh).await {
        Ok(links) => {
            tracing::info!("Link collection completed: {} links", links.len());
            Ok(())
        }
        Err(e) => {
            tracing::error!("Link collection failed: {}", e);
            Err(e.into())
        }
    }
}

/// Handles the product details phase
async fn handle_details(config: &shelfcrawl::Config) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Starting detail fetch (will resume if a checkpoint exists)");

    let mut fetcher = DetailFetcher::new(config).await?;
    match fetcher.run().await {
        Ok(summary) => {
            tracing::info!(
                "Detail fetch completed: {} saved, {} skipped of {}",
                summary.saved,
                summary.skipped,
                summary.total
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Detail fetch failed: {}", e);
            Err(e.into())
        }
    }
}
