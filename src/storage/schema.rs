//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Cinecrawl database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per crawled title, keyed by its source URL
CREATE TABLE IF NOT EXISTS movies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    year INTEGER,
    rating REAL,
    runtime_min INTEGER,
    metascore INTEGER,
    url TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);

-- Leading cast of each title
CREATE TABLE IF NOT EXISTS cast_members (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    movie_id INTEGER NOT NULL REFERENCES movies(id) ON DELETE CASCADE,
    name TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_cast_members_movie ON cast_members(movie_id);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
