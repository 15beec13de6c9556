//! Field extraction for title pages
//!
//! Every field of a [`MovieRecord`] except the source URL is optional:
//! a selector that finds nothing simply leaves the field empty.

mod movie;

pub use movie::{extract_movie, parse_runtime_minutes, MAX_CAST};

/// Extracted data for one title page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovieRecord {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub rating: Option<f32>,
    pub runtime_minutes: Option<u32>,
    pub metascore: Option<u8>,
    pub cast: Vec<String>,
    pub url: String,
}

impl MovieRecord {
    /// Creates an empty record for `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Cast names joined the way the CSV output stores them
    pub fn cast_joined(&self) -> String {
        self.cast.join(", ")
    }

    /// Title for log lines
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("N/A")
    }
}
