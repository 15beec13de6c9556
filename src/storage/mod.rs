//! Storage module for persisting extracted movies
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Idempotent movie inserts keyed by source URL
//! - Cast rows tied to their movie with cascade delete
//! - Summary counts for the `stats` command

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{MovieStore, PersistOutcome, StorageError, StorageResult};

/// Represents a movie row in the database
#[derive(Debug, Clone, PartialEq)]
pub struct StoredMovie {
    pub id: i64,
    pub title: String,
    pub year: Option<i32>,
    pub rating: Option<f64>,
    pub runtime_minutes: Option<u32>,
    pub metascore: Option<u8>,
    pub url: String,
    pub created_at: String,
}

/// Counts shown by the `stats` command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStatistics {
    pub movies: u64,
    pub cast_members: u64,
}

/// Loads summary counts from a store
pub fn load_statistics(store: &dyn MovieStore) -> StorageResult<StoreStatistics> {
    Ok(StoreStatistics {
        movies: store.count_movies()?,
        cast_members: store.count_cast_members()?,
    })
}

/// Prints store statistics to stdout
pub fn print_statistics(stats: &StoreStatistics) {
    println!("=== Cinecrawl Statistics ===\n");
    println!("Movies: {}", stats.movies);
    println!("Cast members: {}", stats.cast_members);
    if stats.movies > 0 {
        println!(
            "Average cast per movie: {:.2}",
            stats.cast_members as f64 / stats.movies as f64
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::MovieRecord;

    #[test]
    fn test_load_statistics() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut record = MovieRecord::new("https://www.imdb.com/title/tt0111161/");
        record.title = Some("The Shawshank Redemption".to_string());
        record.cast = vec!["Tim Robbins".to_string(), "Morgan Freeman".to_string()];
        store.persist(&record).unwrap();

        let stats = load_statistics(&store).unwrap();
        assert_eq!(
            stats,
            StoreStatistics {
                movies: 1,
                cast_members: 2
            }
        );
    }
}
