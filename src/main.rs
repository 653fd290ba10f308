//! Commenter-Census main entry point
//!
//! This is the command-line interface for the Commenter-Census device survey.

use anyhow::Context;
use clap::Parser;
use commenter_census::config::{load_config_with_hash, validate, Config};
use commenter_census::crawler::{run_census, StopReason};
use commenter_census::output::print_summary;
use commenter_census::BrandTable;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Commenter-Census: device brands of a profile's commenters
///
/// Commenter-Census walks an author's posts, pages through the comments on
/// each one, looks up every distinct commenter's device from their own posts,
/// and reports how many commenters use each brand.
#[derive(Parser, Debug)]
#[command(name = "commenter-census")]
#[command(version = "1.0.0")]
#[command(about = "Device brand census of a profile's commenters", long_about = None)]
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

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Override the maximum number of counted users
    #[arg(long, value_name = "N")]
    limit: Option<u64>,

    /// Skip sentiment enrichment even if the config enables it
    #[arg(long)]
    no_enrichment: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    apply_overrides(&mut config, &cli);
    validate(&config).context("Invalid configuration after command-line overrides")?;

    if cli.dry_run {
        print_plan(&config, &config_hash);
        return Ok(());
    }

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    let report = run_census(&config, Some(config_hash), cancel)
        .await
        .context("Census failed")?;

    if !cli.quiet {
        print_summary(&report, &BrandTable::default());
    }

    match &report.stop_reason {
        StopReason::FetchFailed(message) => {
            tracing::error!("Run ended early: {}", message);
        }
        StopReason::Cancelled => tracing::warn!("Run was interrupted; counts are partial"),
        _ => {}
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("commenter_census=info,warn"),
            1 => EnvFilter::new("commenter_census=debug,info"),
            2 => EnvFilter::new("commenter_census=trace,debug"),
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

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(limit) = cli.limit {
        tracing::info!("Global limit overridden to {}", limit);
        config.crawler.global_limit = limit;
    }
    if cli.no_enrichment && config.enrichment.enabled {
        tracing::info!("Sentiment enrichment disabled from the command line");
        config.enrichment.enabled = false;
    }
}

/// What an interrupt should do given the state of the run
#[derive(Debug, PartialEq, Eq)]
enum Interrupt {
    /// Stop crawling and write the partial report
    Cancel,

    /// The run is already stopping; leave without waiting
    Exit,
}

fn on_interrupt(cancel: &CancellationToken) -> Interrupt {
    if cancel.is_cancelled() {
        Interrupt::Exit
    } else {
        cancel.cancel();
        Interrupt::Cancel
    }
}

/// Cancels the run on the first Ctrl-C and exits on the second
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            match on_interrupt(&cancel) {
                Interrupt::Cancel => tracing::warn!(
                    "Interrupt received, stopping after the current request (Ctrl-C again to force exit)"
                ),
                Interrupt::Exit => {
                    tracing::error!("Second interrupt received, exiting immediately");
                    std::process::exit(130);
                }
            }
        }
    });
}

/// Handles the --dry-run mode: shows what would be crawled
fn print_plan(config: &Config, config_hash: &str) {
    println!("=== Commenter-Census Dry Run ===\n");

    println!("Target:");
    println!("  Author: {}", config.target.author_id);
    if config.target.post_ids.is_empty() {
        println!("  Posts: entire timeline");
    } else {
        println!("  Posts ({}):", config.target.post_ids.len());
        for id in &config.target.post_ids {
            println!("    * {}", id);
        }
    }

    println!("\nCrawler:");
    println!("  Global limit: {}", config.crawler.global_limit);
    match config.crawler.per_post_limit {
        Some(limit) => println!("  Per-post limit: {}", limit),
        None => println!("  Per-post limit: none"),
    }
    println!(
        "  Request interval: {}s",
        config.crawler.request_interval_seconds
    );
    println!(
        "  Brand lookup pages: {}",
        config.crawler.brand_lookup_pages
    );

    println!("\nClient:");
    println!("  Base URL: {}", config.client.base_url);
    println!("  Timeout: {}s", config.client.timeout_seconds);

    let run_dir = config.output.run_dir(&config.target.author_id);
    println!("\nOutput:");
    println!("  Directory: {}", run_dir.display());
    println!("  Progress log: {}", config.output.progress_file);
    println!("  Report: {}", config.output.summary_file);

    println!("\nEnrichment:");
    if config.enrichment.enabled {
        println!("  Model: {} at {}", config.enrichment.model, config.enrichment.base_url);
        println!(
            "  Workers: {}, queue: {}",
            config.enrichment.workers, config.enrichment.queue_capacity
        );
        println!("  Export: {}", config.output.sentiment_file);
    } else {
        println!("  Disabled");
    }

    println!("\n✓ Configuration is valid (hash: {})", config_hash);
}
