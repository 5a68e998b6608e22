//! Webcrawler main entry point
//!
//! This is the command-line interface for the same-host web crawler.

use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use webcrawler::config::{load_config_with_hash, validate, CrawlConfig};
use webcrawler::crawler::crawl;

/// Webcrawler: a focused, polite, same-host web crawler
///
/// Starting from the configured seed URLs, the crawler follows links on the
/// same host up to a maximum depth, respects robots.txt and per-host rate
/// limits, and writes one JSON line per visited URL.
#[derive(Parser, Debug)]
#[command(name = "webcrawler")]
#[command(version)]
#[command(about = "A focused, polite, same-host web crawler", long_about = None)]
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

    /// Override the output file path
    #[arg(short, long, value_name = "PATH")]
    output: Option<String>,

    /// Override the maximum link depth
    #[arg(long, value_name = "N")]
    max_depth: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let mut config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    apply_overrides(&mut config, &cli);
    if let Err(e) = validate(&config) {
        tracing::error!("Invalid command-line override: {}", e);
        return Err(e.into());
    }

    if cli.dry_run {
        handle_dry_run(&config);
    } else {
        handle_crawl(config).await?;
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
            0 => EnvFilter::new("webcrawler=info,warn"),
            1 => EnvFilter::new("webcrawler=debug,info"),
            2 => EnvFilter::new("webcrawler=trace,debug"),
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

fn apply_overrides(config: &mut CrawlConfig, cli: &Cli) {
    if let Some(path) = &cli.output {
        tracing::info!("Output path overridden: {}", path);
        config.output.path = path.clone();
    }
    if let Some(depth) = cli.max_depth {
        tracing::info!("Max depth overridden: {}", depth);
        config.crawler.max_depth = depth;
    }
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &CrawlConfig) {
    println!("=== Webcrawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Per-host concurrency: {}", config.crawler.per_host_concurrency);
    println!("  Global concurrency: {}", config.crawler.global_concurrency);
    println!("  Request delay: {}ms", config.crawler.request_delay_ms);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Respect robots.txt: {}", config.crawler.respect_robots);
    println!("  User agent: {}", config.crawler.user_agent);
    match &config.crawler.host_scope {
        Some(scope) => println!("  Host scope: {}", scope),
        None => println!("  Host scope: host of each page"),
    }
    println!("  Path exclusions: {}", config.crawler.path_exclusions.join(", "));

    println!("\nExtraction:");
    println!("  Enabled: {}", config.extraction.enabled);
    println!("  Tags: {}", config.extraction.tags.join(", "));

    println!("\nOutput:");
    println!("  Path: {}", config.output.path);
    println!("  Channel capacity: {}", config.output.channel_capacity);

    println!("\nSeeds ({}):", config.seeds.len());
    for seed in &config.seeds {
        println!("  - {}", seed);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: CrawlConfig) -> Result<(), Box<dyn std::error::Error>> {
    let cancel = CancellationToken::new();

    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, stopping crawl");
            signal_token.cancel();
        }
    });

    let output_path = config.output.path.clone();
    match crawl(config, cancel).await {
        Ok(stats) => {
            tracing::info!(
                "Crawl completed successfully: {} records written to {}",
                stats.records(),
                output_path
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
