//! Flat-file outputs
//!
//! Relays are written one per line. Links and movies are CSV files with a
//! header row. Every writer creates missing parent directories.

use crate::extract::MovieRecord;
use crate::output::{OutputError, OutputResult};
use crate::relay::Relay;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Header of the links CSV
pub const LINKS_HEADER: [&str; 2] = ["position", "url"];

/// Header of the movies CSV
pub const MOVIES_HEADER: [&str; 7] = [
    "title",
    "year",
    "rating",
    "runtime_min",
    "metascore",
    "cast",
    "url",
];

#[derive(Debug, Serialize, Deserialize)]
struct LinkRow {
    position: usize,
    url: String,
}

#[derive(Debug, Serialize)]
struct MovieRow<'a> {
    title: Option<&'a str>,
    year: Option<i32>,
    rating: Option<f32>,
    runtime_min: Option<u32>,
    metascore: Option<u8>,
    cast: String,
    url: &'a str,
}

impl<'a> From<&'a MovieRecord> for MovieRow<'a> {
    fn from(record: &'a MovieRecord) -> Self {
        Self {
            title: record.title.as_deref(),
            year: record.year,
            rating: record.rating,
            runtime_min: record.runtime_minutes,
            metascore: record.metascore,
            cast: record.cast_joined(),
            url: &record.url,
        }
    }
}

fn ensure_parent(path: &Path) -> OutputResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Writes validated relays, one per line, sorted for stable output
pub fn write_relays<'a>(
    path: &Path,
    relays: impl IntoIterator<Item = &'a Relay>,
) -> OutputResult<usize> {
    ensure_parent(path)?;

    let mut relays: Vec<&Relay> = relays.into_iter().collect();
    relays.sort();

    let mut file = fs::File::create(path)?;
    for relay in &relays {
        writeln!(file, "{}", relay)?;
    }
    file.flush()?;

    Ok(relays.len())
}

/// Reads a relay file written by [`write_relays`]
pub fn read_relays(path: &Path) -> OutputResult<Vec<Relay>> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .filter_map(|line| match Relay::parse(line) {
            Ok(relay) => Some(relay),
            Err(e) => {
                if !line.trim().is_empty() {
                    tracing::warn!("Ignoring relay line '{}': {}", line, e);
                }
                None
            }
        })
        .collect())
}

/// Writes harvested links with their 1-based position
pub fn write_links(path: &Path, urls: &[String]) -> OutputResult<usize> {
    ensure_parent(path)?;

    let mut writer = csv::Writer::from_path(path)?;
    if urls.is_empty() {
        writer.write_record(LINKS_HEADER)?;
    }
    for (index, url) in urls.iter().enumerate() {
        writer.serialize(LinkRow {
            position: index + 1,
            url: url.clone(),
        })?;
    }
    writer.flush()?;

    Ok(urls.len())
}

/// Reads the `url` column of a links CSV, in file order
pub fn read_links(path: &Path) -> OutputResult<Vec<String>> {
    let mut reader = csv::Reader::from_path(path)?;

    let url_column = reader
        .headers()?
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case("url"))
        .ok_or_else(|| OutputError::Format(format!("{} has no url column", path.display())))?;

    let mut urls = Vec::new();
    for row in reader.records() {
        let row = row?;
        if let Some(url) = row.get(url_column).map(str::trim).filter(|u| !u.is_empty()) {
            urls.push(url.to_string());
        }
    }

    Ok(urls)
}

/// Writes extracted movie records
pub fn write_movies(path: &Path, records: &[MovieRecord]) -> OutputResult<usize> {
    ensure_parent(path)?;

    let mut writer = csv::Writer::from_path(path)?;
    if records.is_empty() {
        writer.write_record(MOVIES_HEADER)?;
    }
    for record in records {
        writer.serialize(MovieRow::from(record))?;
    }
    writer.flush()?;

    Ok(records.len())
}

/// Saves a raw page for later inspection
pub fn save_snapshot(path: &Path, html: &str) -> OutputResult<()> {
    ensure_parent(path)?;
    fs::write(path, html)?;
    Ok(())
}
