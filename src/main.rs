//! Scrapeman main entry point
//!
//! This is the command-line interface for the Scrapeman crawler.

use anyhow::Context;
use clap::Parser;
use scrapeman::config::{read_config, validate, Config};
use scrapeman::output::{print_statistics, CrawlStatistics};
use scrapeman::plugins::{self, Hrefs, Parse, Src, Status};
use scrapeman::state::{EngineState, FinalPayload};
use scrapeman::url::UrlResolver;
use scrapeman::{Crawler, Event, EventKind, Outcome};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Scrapeman: a polite, resumable web crawler
///
/// Scrapeman crawls a site one request per interval, follows links and
/// images under the base URL, and can be interrupted with Ctrl-C and
/// resumed later without fetching anything twice.
#[derive(Parser, Debug)]
#[command(name = "scrapeman")]
#[command(version)]
#[command(about = "A polite, resumable web crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Base URL to crawl (overrides the configuration file)
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Start a fresh crawl, ignoring a saved pause state
    #[arg(long)]
    fresh: bool,

    /// Also accept redirect status codes as successful
    #[arg(long)]
    lenient: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics of the last finished crawl and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(config, cli.fresh, cli.lenient).await?;
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
            0 => EnvFilter::new("scrapeman=info,warn"),
            1 => EnvFilter::new("scrapeman=debug,info"),
            2 => EnvFilter::new("scrapeman=trace,debug"),
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

/// Loads the configuration file (if any), applies command-line overrides and validates
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            read_config(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?
        }
        None => Config::default(),
    };

    if let Some(base_url) = &cli.base_url {
        config.crawler.base_url = Some(base_url.clone());
    }

    validate(&config).context("Invalid configuration")?;
    Ok(config)
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Scrapeman Dry Run ===\n");

    println!("Crawler Configuration:");
    println!(
        "  Base URL: {}",
        config.crawler.base_url.as_deref().unwrap_or("-")
    );
    println!("  Seed: {}", config.crawler.seed_url().unwrap_or_default());
    println!("  Max pending: {}", config.crawler.max_pending);
    println!("  Interval: {}ms", config.crawler.interval);
    println!("  Request timeout: {}ms", config.crawler.request_timeout);
    println!("  Max redirects: {}", config.crawler.max_redirects);
    println!(
        "  Strip tracking params: {}",
        config.crawler.strip_tracking_params
    );

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Pause state: {}", config.output.pause_path);
    println!("  Final payload: {}", config.output.final_path);

    let pause_path = Path::new(&config.output.pause_path);
    println!("\n✓ Configuration is valid");
    if pause_path.exists() {
        println!("✓ Would resume from {}", pause_path.display());
    } else {
        println!("✓ Would start a fresh crawl");
    }
}

/// Handles the --stats mode: summarizes the saved final payload
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let final_path = Path::new(&config.output.final_path);
    println!("Final payload: {}\n", final_path.display());

    let payload = FinalPayload::load(final_path)
        .with_context(|| format!("Failed to read {}", final_path.display()))?;
    let base_url = config.crawler.base_url.as_deref().unwrap_or_default();
    let resolver = UrlResolver::new(base_url, config.crawler.strip_tracking_params)?;

    print_statistics(&CrawlStatistics::from_payload(&payload, &resolver));
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, fresh: bool, lenient: bool) -> anyhow::Result<()> {
    let pause_path = PathBuf::from(&config.output.pause_path);
    let final_path = PathBuf::from(&config.output.final_path);

    let mut crawler = Crawler::new(config)?;

    if lenient {
        crawler
            .plugin(Status::lenient())
            .plugin(Parse)
            .plugin(Hrefs)
            .plugin(Src);
    } else {
        crawler.plugins(plugins::core());
    }

    crawler.on(EventKind::ResourceProcessed, |event| {
        if let Event::ResourceProcessed { resource } = event {
            match resource.status_code {
                Some(code) => tracing::info!("{} {}", code, resource.url),
                None => tracing::info!("--- {}", resource.url),
            }
        }
    });

    let state = if !fresh && pause_path.exists() {
        tracing::info!("Resuming from {}", pause_path.display());
        let state = EngineState::load(&pause_path)
            .with_context(|| format!("Failed to restore {}", pause_path.display()))?;
        Some(state)
    } else {
        tracing::info!("Starting fresh crawl of {}", crawler.resolver().base());
        None
    };
    crawler.start(state)?;

    let pause = crawler.pause_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, pausing");
            pause.pause();
        }
    });

    match crawler.run().await? {
        Outcome::Paused(state) => {
            state
                .save(&pause_path)
                .with_context(|| format!("Failed to write {}", pause_path.display()))?;
            println!("Paused; resume state saved to {}", pause_path.display());
        }
        Outcome::Finished(payload) => {
            payload
                .save(&final_path)
                .with_context(|| format!("Failed to write {}", final_path.display()))?;
            if pause_path.exists() {
                std::fs::remove_file(&pause_path)
                    .with_context(|| format!("Failed to remove {}", pause_path.display()))?;
            }

            tracing::info!("Final payload written to {}", final_path.display());
            print_statistics(&CrawlStatistics::from_payload(&payload, crawler.resolver()));
        }
    }

    Ok(())
}
