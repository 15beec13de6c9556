//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the MovieStore trait.

use crate::extract::MovieRecord;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{MovieStore, PersistOutcome, StorageResult};
use crate::storage::StoredMovie;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// SQLite storage backend
///
/// The connection sits behind a mutex so the store can be shared by every
/// crawl worker.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) the database at `path`
    ///
    /// Missing parent directories are created.
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MovieStore for SqliteStore {
    fn ping(&self) -> StorageResult<()> {
        self.conn().query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    fn persist(&self, record: &MovieRecord) -> StorageResult<PersistOutcome> {
        let Some(title) = record.title.as_deref() else {
            return Ok(PersistOutcome::Skipped);
        };

        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let inserted = tx.execute(
            "INSERT INTO movies (title, year, rating, runtime_min, metascore, url, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(url) DO NOTHING",
            params![
                title,
                record.year,
                record.rating.map(f64::from),
                record.runtime_minutes,
                record.metascore,
                record.url,
                Utc::now().to_rfc3339(),
            ],
        )?;

        if inserted == 0 {
            tx.commit()?;
            return Ok(PersistOutcome::AlreadyPresent);
        }

        let movie_id = tx.last_insert_rowid();
        {
            let mut stmt =
                tx.prepare("INSERT INTO cast_members (movie_id, name) VALUES (?1, ?2)")?;
            for name in &record.cast {
                stmt.execute(params![movie_id, name])?;
            }
        }
        tx.commit()?;

        Ok(PersistOutcome::Inserted(movie_id))
    }

    fn get_movie_by_url(&self, url: &str) -> StorageResult<Option<StoredMovie>> {
        let conn = self.conn();
        let movie = conn
            .query_row(
                "SELECT id, title, year, rating, runtime_min, metascore, url, created_at
                 FROM movies WHERE url = ?1",
                params![url],
                |row| {
                    Ok(StoredMovie {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        year: row.get(2)?,
                        rating: row.get(3)?,
                        runtime_minutes: row.get(4)?,
                        metascore: row.get(5)?,
                        url: row.get(6)?,
                        created_at: row.get(7)?,
                    })
                },
            )
            .optional()?;

        Ok(movie)
    }

    fn get_cast(&self, movie_id: i64) -> StorageResult<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT name FROM cast_members WHERE movie_id = ?1 ORDER BY id")?;
        let names = stmt
            .query_map(params![movie_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    fn count_movies(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM movies", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_cast_members(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM cast_members", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
