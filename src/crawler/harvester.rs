//! Link harvester for the bulk listing page
//!
//! The chart page embeds its entries as inline JSON-LD; every entry carries
//! an absolute `"url":"https://www.imdb.com/title/tt.../"` field. Harvesting
//! is a pure pass over already-fetched HTML.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

const TITLE_URL_PATTERN: &str = r#""url"\s*:\s*"(https://www\.imdb\.com/title/tt\d+/)""#;

fn title_url_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(TITLE_URL_PATTERN).expect("title URL pattern is valid"))
}

/// Extracts the distinct title URLs of a listing page
///
/// URLs are returned in first-seen order. `limit` truncates the result
/// after de-duplication; `None` keeps everything. A page without matches
/// yields an empty vector.
///
/// # Example
///
/// ```
/// use cinecrawl::crawler::harvest;
///
/// let page = r#"{"url":"https://www.imdb.com/title/tt0111161/"}"#;
/// assert_eq!(harvest(page, None), vec!["https://www.imdb.com/title/tt0111161/"]);
/// ```
pub fn harvest(page_html: &str, limit: Option<usize>) -> Vec<String> {
    let limit = limit.unwrap_or(usize::MAX);
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for captures in title_url_regex().captures_iter(page_html) {
        if urls.len() >= limit {
            break;
        }
        let url = &captures[1];
        if seen.insert(url.to_string()) {
            urls.push(url.to_string());
        }
    }

    urls
}
