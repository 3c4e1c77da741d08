//! Listing-Harvest main entry point
//!
//! This is the command-line interface for the Listing-Harvest crawler and read API.

use anyhow::Context;
use clap::Parser;
use listing_harvest::config::{load_config_with_hash, Config};
use listing_harvest::crawler::{run_crawl, PageFetcher};
use listing_harvest::server::{self, AppState, Credentials};
use listing_harvest::storage::{lock, open_storage, share, RecordStore, SharedStorage, SqliteStorage};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Listing-Harvest: a paced product-listing harvester
///
/// Crawls a fixed number of search-result pages, stores the extracted
/// products in SQLite, and serves them through an authenticated JSON API.
#[derive(Parser, Debug)]
#[command(name = "listing-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A paced product-listing harvester", long_about = None)]
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

    /// Run the crawl and exit without starting the API
    #[arg(long, conflicts_with_all = ["serve_only", "dry_run", "stats"])]
    crawl_only: bool,

    /// Start the API without crawling
    #[arg(long, conflicts_with_all = ["crawl_only", "dry_run", "stats"])]
    serve_only: bool,

    /// Validate config and show which pages would be fetched
    #[arg(long, conflicts_with_all = ["crawl_only", "serve_only", "stats"])]
    dry_run: bool,

    /// Show stored record count and recent runs, then exit
    #[arg(long, conflicts_with_all = ["crawl_only", "serve_only", "dry_run"])]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // .env values become visible to the config overrides
    let _ = dotenvy::dotenv();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        return handle_dry_run(&config);
    }

    let storage = share(
        open_storage(Path::new(&config.storage.database_path))
            .with_context(|| format!("opening database {}", config.storage.database_path))?,
    );
    tracing::info!("Opened database {}", config.storage.database_path);

    if cli.stats {
        handle_stats(&config, &storage)
    } else if cli.crawl_only {
        handle_crawl(&config, storage, &config_hash).await
    } else {
        handle_serve(config, storage, config_hash, !cli.serve_only).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("listing_harvest=info,warn"),
            1 => EnvFilter::new("listing_harvest=debug,info"),
            2 => EnvFilter::new("listing_harvest=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would be fetched
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Listing-Harvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Search URL: {}", config.crawler.search_url);
    println!("  Site origin: {}", config.crawler.site_origin);
    println!("  Total pages: {}", config.crawler.total_pages);
    println!(
        "  Delay between pages: {}-{}ms",
        config.crawler.min_delay_ms, config.crawler.max_delay_ms
    );
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  User agent: {}", config.user_agent.value);

    println!("\nSelectors:");
    println!("  Result item: {}", config.selectors.result_item);
    println!("  Title: {}", config.selectors.title);
    println!("  Price: {}", config.selectors.price);
    println!("  Rating: {}", config.selectors.rating);
    println!("  Link: {}", config.selectors.link);

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path);

    println!("\nAPI:");
    println!("  Listen: {}:{}", config.api.host, config.api.port);
    println!("  Username: {}", config.api.username);

    let client = listing_harvest::crawler::build_http_client(
        &config.user_agent,
        config.crawler.request_timeout_secs,
    )?;
    let fetcher = PageFetcher::new(client, &config.crawler)?;

    println!("\nPages:");
    for page in 1..=fetcher.total_pages() {
        println!("  {:>3}. {}", page, fetcher.page_url(page)?);
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the --stats mode: shows record count and recent runs
fn handle_stats(config: &Config, storage: &SharedStorage<SqliteStorage>) -> anyhow::Result<()> {
    let storage = lock(storage)?;

    println!("Database: {}\n", config.storage.database_path);
    println!("Stored records: {}", storage.count_records()?);

    let runs = storage.get_latest_runs(10)?;
    println!("\nRecent runs ({}):", runs.len());
    for run in runs {
        println!(
            "  #{} {} [{}] pages={} failed={} unstored={} inserted={}{}",
            run.id,
            run.started_at,
            run.status.to_db_string(),
            run.total_pages,
            run.totals.pages_failed,
            run.totals.batches_failed,
            run.totals.records_inserted,
            run.finished_at
                .map(|f| format!(" finished={}", f))
                .unwrap_or_default()
        );
    }

    Ok(())
}

/// Handles the --crawl-only mode
async fn handle_crawl(
    config: &Config,
    storage: SharedStorage<SqliteStorage>,
    config_hash: &str,
) -> anyhow::Result<()> {
    let report = run_crawl(config, storage, config_hash).await?;
    tracing::info!(
        "Scraping completed: {} records from {} pages",
        report.records_inserted,
        report.pages_attempted
    );
    Ok(())
}

/// Runs the API and, unless disabled, the crawl as a background task
///
/// The listener is bound first and the crawl is spawned afterwards; neither
/// waits on the other.
async fn handle_serve(
    config: Config,
    storage: SharedStorage<SqliteStorage>,
    config_hash: String,
    crawl: bool,
) -> anyhow::Result<()> {
    let listener = server::bind(&config.api).await?;
    let state = AppState::new(storage.clone(), Credentials::from_config(&config.api));

    if crawl {
        let crawl_config = config.clone();
        tokio::spawn(async move {
            match run_crawl(&crawl_config, storage, &config_hash).await {
                Ok(report) => tracing::info!(
                    "Scraping completed: {} records from {} pages",
                    report.records_inserted,
                    report.pages_attempted
                ),
                Err(e) => tracing::error!("Crawl could not start: {}", e),
            }
        });
    }

    server::serve(listener, state, shutdown_signal()).await?;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        // Without a signal handler, keep serving
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
