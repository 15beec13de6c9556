//! Cinecrawl main entry point
//!
//! This is the command-line interface for the Cinecrawl chart crawler.

use cinecrawl::config::{resolve_config, Config};
use cinecrawl::crawler::{
    build_fetch_client, crawl_movies, harvest_links, run_pipeline, validate_relays,
};
use cinecrawl::output::read_links;
use cinecrawl::storage::{load_statistics, print_statistics, MovieStore, SqliteStore};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Cinecrawl: a resilient movie-chart crawler
///
/// Cinecrawl harvests the title links of a movie chart, crawls every title
/// page through a pool of workers with retry and optional relays, and stores
/// the extracted details in CSV files and a SQLite database.
#[derive(Parser, Debug)]
#[command(name = "cinecrawl")]
#[command(version = "1.0.0")]
#[command(about = "A resilient movie-chart crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate relay candidates and save the working ones
    Relays,

    /// Harvest title links from the chart listing
    Links,

    /// Crawl the saved title links into the result sink
    Movies,

    /// Run relays (when enabled), links and movies back to back
    Run,

    /// Show statistics from the database and exit
    Stats,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match resolve_config(cli.config.as_deref()) {
        Ok((cfg, Some(hash))) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Ok((cfg, None)) => {
            tracing::info!("No configuration file given, using defaults");
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    match cli.command {
        Command::Relays => handle_relays(&config).await?,
        Command::Links => handle_links(&config).await?,
        Command::Movies => handle_movies(&config).await?,
        Command::Run => handle_run(&config).await?,
        Command::Stats => handle_stats(&config)?,
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("cinecrawl=info,warn"),
            1 => EnvFilter::new("cinecrawl=debug,info"),
            2 => EnvFilter::new("cinecrawl=trace,debug"),
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

/// Cancels the returned token on Ctrl-C
fn cancel_on_interrupt() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping workers");
            token.cancel();
        }
    });
    cancel
}

/// Opens the store and checks it is reachable; failure here is fatal
fn open_store(config: &Config) -> Result<Arc<dyn MovieStore>, Box<dyn std::error::Error>> {
    let path = Path::new(&config.output.database_path);
    let store = match SqliteStore::open(path).and_then(|store| store.ping().map(|_| store)) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Database {} is unavailable: {}", path.display(), e);
            return Err(e.into());
        }
    };
    tracing::info!("Using database {}", path.display());
    Ok(Arc::new(store))
}

/// Handles the `relays` command
async fn handle_relays(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let relays = validate_relays(config, cancel_on_interrupt()).await?;
    println!(
        "✓ {} working relays saved to {}",
        relays.len(),
        config.output.relays_path
    );
    Ok(())
}

/// Handles the `links` command
async fn handle_links(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let client = build_fetch_client(config)?;
    let links = harvest_links(config, &client).await?;
    println!("✓ {} links saved to {}", links.len(), config.output.links_path);
    Ok(())
}

/// Handles the `movies` command: crawls the links saved by `links`
async fn handle_movies(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(config)?;

    let links_path = Path::new(&config.output.links_path);
    let links = match read_links(links_path) {
        Ok(links) => links,
        Err(e) => {
            tracing::error!(
                "Cannot read {} (run `cinecrawl links` first): {}",
                links_path.display(),
                e
            );
            return Err(e.into());
        }
    };
    tracing::info!("Loaded {} links from {}", links.len(), links_path.display());

    let client = build_fetch_client(config)?;
    let report = crawl_movies(config, links, client, store, cancel_on_interrupt()).await?;

    println!(
        "✓ {} movies saved to {} ({} failed{})",
        report.records.len(),
        config.output.movies_path,
        report.failed,
        if report.cancelled { ", cancelled" } else { "" }
    );
    Ok(())
}

/// Handles the `run` command
async fn handle_run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(config)?;

    match run_pipeline(config, store, cancel_on_interrupt()).await {
        Ok(summary) => {
            if let Some(relays) = summary.relays {
                println!("Relays: {}", relays);
            }
            println!("Links: {}", summary.links);
            println!("Movies: {}", summary.movies);
            println!("Failed: {}", summary.failed);
            if summary.cancelled {
                println!("Run was cancelled before the worklist was drained");
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Run failed: {}", e);
            Err(e.into())
        }
    }
}

/// Handles the `stats` command: shows statistics from the database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("Database: {}\n", config.output.database_path);

    let store = open_store(config)?;
    let stats = load_statistics(store.as_ref())?;
    print_statistics(&stats);

    Ok(())
}
