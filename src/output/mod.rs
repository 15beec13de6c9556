//! Output module for the flat files each pipeline stage leaves behind
//!
//! This module handles:
//! - The validated relay list
//! - The harvested links CSV and the raw listing snapshot
//! - The extracted movies CSV

mod files;

pub use files::{
    read_links, read_relays, save_snapshot, write_links, write_movies, write_relays,
    LINKS_HEADER, MOVIES_HEADER,
};

use thiserror::Error;

/// Errors raised while reading or writing output files
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Malformed file: {0}")]
    Format(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
