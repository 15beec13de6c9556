use serde::Deserialize;

/// Main configuration structure for Cinecrawl
///
/// Every section has defaults, so an empty file (or no file at all) yields a
/// working configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub relays: RelayConfig,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub harvest: HarvestConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Backoff strategy applied between retryable fetch attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackoffStrategy {
    /// `base * 2^(attempt - 1) + jitter`
    #[default]
    Exponential,

    /// `base + jitter` on every attempt
    Fixed,
}

/// Fetch client behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FetchConfig {
    /// Total number of attempts per URL
    pub max_retries: u32,

    /// Base backoff delay (milliseconds)
    pub base_delay_ms: u64,

    /// Upper bound of the random jitter added to every backoff (milliseconds)
    pub max_jitter_ms: u64,

    /// Backoff strategy
    pub backoff: BackoffStrategy,

    /// Per-request timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            max_jitter_ms: 1000,
            backoff: BackoffStrategy::Exponential,
            timeout_secs: 10,
        }
    }
}

/// Relay validation and routing
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RelayConfig {
    /// Route title fetches through validated relays
    pub enabled: bool,

    /// File with one relay candidate per line
    pub candidates_path: String,

    /// Identity-check endpoint probed through each candidate
    pub probe_url: String,

    /// Probe timeout (seconds)
    pub probe_timeout_secs: u64,

    /// Number of concurrent probing workers
    pub fanout: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            candidates_path: "data/proxies/free_proxy_list.txt".to_string(),
            probe_url: "http://ipinfo.io/json".to_string(),
            probe_timeout_secs: 5,
            fanout: 50,
        }
    }
}

/// Worker pool sizing
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PoolConfig {
    /// Number of concurrent crawl workers
    pub worker_count: usize,

    /// Maximum number of work items accepted per run
    pub max_items: usize,

    /// Overall deadline for one pool run (seconds); `None` disables it
    pub deadline_secs: Option<u64>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            worker_count: 10,
            max_items: 250,
            deadline_secs: Some(1800),
        }
    }
}

/// Listing page harvesting
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HarvestConfig {
    /// The bulk listing page
    pub listing_url: String,

    /// Maximum number of links kept from the listing; `None` keeps all
    pub limit: Option<usize>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            listing_url: "https://www.imdb.com/chart/top/".to_string(),
            limit: None,
        }
    }
}

/// Output locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path to the SQLite database file
    pub database_path: String,

    /// Validated relays, one per line
    pub relays_path: String,

    /// Harvested links CSV
    pub links_path: String,

    /// Extracted movie records CSV
    pub movies_path: String,

    /// Raw copy of the last fetched listing page
    pub listing_snapshot_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: "data/cinecrawl.db".to_string(),
            relays_path: "data/proxies/valid_proxies.txt".to_string(),
            links_path: "data/movie_links.csv".to_string(),
            movies_path: "data/movie_details.csv".to_string(),
            listing_snapshot_path: "data/listing_snapshot.html".to_string(),
        }
    }
}
