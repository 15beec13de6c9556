//! Storage traits and error types
//!
//! This module defines the trait interface for movie stores and
//! associated error types.

use crate::extract::MovieRecord;
use crate::storage::StoredMovie;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// What happened to a record handed to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    /// New movie row with the generated identifier
    Inserted(i64),

    /// A movie with the same source URL already exists; nothing was written
    AlreadyPresent,

    /// The record has no title and cannot be stored
    Skipped,
}

/// Result sink for extracted movies
///
/// Implementations must be shareable across crawl workers.
pub trait MovieStore: Send + Sync {
    /// Checks that the backing store is reachable
    fn ping(&self) -> StorageResult<()>;

    /// Stores a record together with its cast
    ///
    /// Idempotent on the source URL: a second call for the same URL is a
    /// no-op, never an overwrite.
    fn persist(&self, record: &MovieRecord) -> StorageResult<PersistOutcome>;

    /// Looks a movie up by its source URL
    fn get_movie_by_url(&self, url: &str) -> StorageResult<Option<StoredMovie>>;

    /// Cast names of a movie, in insertion order
    fn get_cast(&self, movie_id: i64) -> StorageResult<Vec<String>>;

    fn count_movies(&self) -> StorageResult<u64>;

    fn count_cast_members(&self) -> StorageResult<u64>;
}
