//! Cinecrawl: a resilient movie-chart crawler
//!
//! This crate crawls the IMDb Top 250 chart, extracts a fixed set of fields
//! per title, validates candidate HTTP relays, and persists the results to
//! CSV files and a SQLite database.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod relay;
pub mod storage;

use thiserror::Error;

/// Main error type for Cinecrawl operations
#[derive(Debug, Error)]
pub enum CineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Fetch failed for {url}: {outcome}")]
    FetchFailed {
        url: String,
        outcome: crawler::FetchOutcome,
    },

    #[error("Invalid relay '{relay}': {message}")]
    InvalidRelay { relay: String, message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid value for environment variable {name}: {value}")]
    Env { name: String, value: String },
}

/// Result type alias for Cinecrawl operations
pub type Result<T> = std::result::Result<T, CineError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{harvest, FetchClient, FetchOutcome, WorkerPool};
pub use extract::{extract_movie, MovieRecord};
pub use relay::{Relay, RelayPool, RelayValidator};
