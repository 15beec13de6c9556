//! Crawler coordinator - pipeline orchestration
//!
//! Composes the individual stages into the steps the CLI exposes:
//! - Validating relay candidates and saving the survivors
//! - Harvesting title links from the chart listing
//! - Crawling title pages through the worker pool into the result sink
//! - Running all of the above in one go

use crate::config::Config;
use crate::crawler::{harvest, FetchClient, FetchOutcome, PoolReport, WorkerPool};
use crate::extract::{extract_movie, MovieRecord};
use crate::output;
use crate::relay::{load_candidates, Relay, RelayPool, RelayValidator};
use crate::storage::{MovieStore, PersistOutcome};
use crate::CineError;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Counts reported at the end of a full run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Relays that passed validation, when relay validation ran
    pub relays: Option<usize>,
    pub links: usize,
    pub movies: usize,
    pub failed: usize,
    pub cancelled: bool,
}

/// Probes every relay candidate and writes the working ones to the relays file
///
/// Cancelling `cancel` stops the probes early; relays confirmed so far are
/// still written.
///
/// # Returns
///
/// * `Ok(Vec<Relay>)` - Validated relays, sorted
/// * `Err(CineError)` - The candidate file could not be read or the output written
pub async fn validate_relays(
    config: &Config,
    cancel: CancellationToken,
) -> Result<Vec<Relay>, CineError> {
    let candidates_path = Path::new(&config.relays.candidates_path);
    let candidates = load_candidates(candidates_path)?;
    tracing::info!(
        "Loaded {} relay candidates from {}",
        candidates.len(),
        candidates_path.display()
    );

    let validator = RelayValidator::from_config(&config.relays).with_cancellation(cancel);
    let mut relays: Vec<Relay> = validator.validate(candidates).await.into_iter().collect();
    relays.sort();

    let relays_path = Path::new(&config.output.relays_path);
    output::write_relays(relays_path, &relays)?;
    tracing::info!(
        "Saved {} working relays to {}",
        relays.len(),
        relays_path.display()
    );

    Ok(relays)
}

/// Builds the fetch client, routing through saved relays when they are enabled
///
/// A missing or empty relays file is not fatal; requests then go out directly.
pub fn build_fetch_client(config: &Config) -> Result<FetchClient, CineError> {
    let client = FetchClient::from_config(&config.fetch)?;

    if !config.relays.enabled {
        return Ok(client);
    }

    let relays_path = Path::new(&config.output.relays_path);
    let relays = match output::read_relays(relays_path) {
        Ok(relays) => relays,
        Err(e) => {
            tracing::warn!(
                "Relays enabled but {} could not be read: {}",
                relays_path.display(),
                e
            );
            Vec::new()
        }
    };

    let pool = RelayPool::new(relays, Duration::from_secs(config.fetch.timeout_secs));
    tracing::info!("Routing requests through {} relays", pool.len());
    Ok(client.with_relays(Arc::new(pool)))
}

/// Fetches the chart listing, saves a snapshot and writes the harvested links
///
/// # Returns
///
/// * `Ok(Vec<String>)` - Harvested title URLs in listing order
/// * `Err(CineError::FetchFailed)` - The listing page could not be fetched
pub async fn harvest_links(config: &Config, client: &FetchClient) -> Result<Vec<String>, CineError> {
    let listing_url = config.harvest.listing_url.as_str();
    tracing::info!("Fetching listing {}", listing_url);

    let body = match client.fetch(listing_url).await {
        FetchOutcome::Success(body) => body,
        outcome => {
            return Err(CineError::FetchFailed {
                url: listing_url.to_string(),
                outcome,
            })
        }
    };

    let snapshot_path = Path::new(&config.output.listing_snapshot_path);
    if let Err(e) = output::save_snapshot(snapshot_path, &body) {
        tracing::warn!("Could not save listing snapshot: {}", e);
    }

    let links = harvest(&body, config.harvest.limit);
    if links.is_empty() {
        tracing::warn!("No title links found on {}", listing_url);
    }

    let links_path = Path::new(&config.output.links_path);
    output::write_links(links_path, &links)?;
    tracing::info!("Saved {} links to {}", links.len(), links_path.display());

    Ok(links)
}

/// Crawls title pages through the worker pool
///
/// Each worker fetches a page, extracts a [`MovieRecord`] and hands it to the
/// store. Fetch failures drop the item; store failures are logged and the
/// record is still kept for the CSV. Records are written to the movies CSV in
/// worklist order, including after a cancelled run.
///
/// # Returns
///
/// * `Ok(PoolReport)` - Pool counters and the extracted records
/// * `Err(CineError)` - The store was unreachable or the CSV could not be written
pub async fn crawl_movies(
    config: &Config,
    urls: Vec<String>,
    client: FetchClient,
    store: Arc<dyn MovieStore>,
    cancel: CancellationToken,
) -> Result<PoolReport<MovieRecord>, CineError> {
    store.ping()?;

    let positions: HashMap<String, usize> = urls
        .iter()
        .enumerate()
        .map(|(index, url)| (url.clone(), index))
        .collect();

    let pool = WorkerPool::from_config(&config.pool).with_cancellation(cancel);
    let mut report = pool
        .run(urls, move |url: String| {
            let client = client.clone();
            let store = Arc::clone(&store);
            async move { crawl_one(&client, store.as_ref(), url).await }
        })
        .await;

    report
        .records
        .sort_by_key(|record| positions.get(&record.url).copied().unwrap_or(usize::MAX));

    let movies_path = Path::new(&config.output.movies_path);
    output::write_movies(movies_path, &report.records)?;
    tracing::info!(
        "Saved {} movies to {}",
        report.records.len(),
        movies_path.display()
    );

    Ok(report)
}

async fn crawl_one(
    client: &FetchClient,
    store: &dyn MovieStore,
    url: String,
) -> Result<MovieRecord, CineError> {
    let body = match client.fetch(&url).await {
        FetchOutcome::Success(body) => body,
        outcome => return Err(CineError::FetchFailed { url, outcome }),
    };

    let record = extract_movie(&body, &url);

    match store.persist(&record) {
        Ok(PersistOutcome::Inserted(id)) => {
            tracing::debug!("Stored '{}' as movie {}", record.display_title(), id);
        }
        Ok(PersistOutcome::AlreadyPresent) => {
            tracing::info!("{} already stored, leaving it unchanged", url);
        }
        Ok(PersistOutcome::Skipped) => {
            tracing::warn!("No title found on {}, not stored", url);
        }
        Err(e) => {
            tracing::error!("Failed to store {}: {}", url, e);
        }
    }

    Ok(record)
}

/// Runs relays (when enabled), links and movies back to back
pub async fn run_pipeline(
    config: &Config,
    store: Arc<dyn MovieStore>,
    cancel: CancellationToken,
) -> Result<RunSummary, CineError> {
    store.ping()?;

    let relays = if config.relays.enabled {
        Some(validate_relays(config, cancel.clone()).await?.len())
    } else {
        None
    };

    if cancel.is_cancelled() {
        tracing::warn!("Run cancelled before harvesting links");
        return Ok(RunSummary {
            relays,
            cancelled: true,
            ..RunSummary::default()
        });
    }

    let client = build_fetch_client(config)?;
    let links = harvest_links(config, &client).await?;
    let link_count = links.len();

    let report = crawl_movies(config, links, client, store, cancel).await?;

    Ok(RunSummary {
        relays,
        links: link_count,
        movies: report.records.len(),
        failed: report.failed,
        cancelled: report.cancelled,
    })
}
