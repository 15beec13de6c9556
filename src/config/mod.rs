//! Configuration module for Cinecrawl
//!
//! This module handles loading, parsing, and validating the TOML
//! configuration file, plus the environment overrides applied on top of it.
//!
//! # Example
//!
//! ```no_run
//! use cinecrawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("cinecrawl.toml")).unwrap();
//! println!("Crawler will use {} workers", config.pool.worker_count);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BackoffStrategy, Config, FetchConfig, HarvestConfig, OutputConfig, PoolConfig, RelayConfig,
};

// Re-export parser functions
pub use parser::{
    apply_env_overrides, compute_config_hash, load_config, load_config_with_hash, resolve_config,
    ENV_DATABASE_PATH, ENV_USE_RELAYS,
};
pub use validation::validate;
