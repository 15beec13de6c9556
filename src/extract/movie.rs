//! Title page parser
//!
//! Selectors target the current IMDb title page layout. Each field is looked
//! up independently so one layout change only costs one field.

use crate::extract::MovieRecord;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;

/// Number of leading cast members kept per title
pub const MAX_CAST: usize = 3;

/// Extracts a [`MovieRecord`] from a title page
///
/// # Example
///
/// ```
/// use cinecrawl::extract::extract_movie;
///
/// let html = "<html><body><h1>The Godfather</h1></body></html>";
/// let record = extract_movie(html, "https://www.imdb.com/title/tt0068646/");
/// assert_eq!(record.title.as_deref(), Some("The Godfather"));
/// assert_eq!(record.year, None);
/// ```
pub fn extract_movie(html: &str, url: &str) -> MovieRecord {
    let document = Html::parse_document(html);

    MovieRecord {
        title: extract_title(&document),
        year: extract_year(&document),
        rating: extract_rating(&document),
        runtime_minutes: extract_runtime(&document),
        metascore: extract_metascore(&document),
        cast: extract_cast(&document),
        url: url.to_string(),
    }
}

/// Parses a runtime such as `2h 22m` or `2 hours 22 minutes (142 min)`
///
/// Returns `None` when no positive duration can be read, including numbers
/// too large to hold in minutes.
pub fn parse_runtime_minutes(text: &str) -> Option<u32> {
    static HOURS: OnceLock<Regex> = OnceLock::new();
    static MINUTES: OnceLock<Regex> = OnceLock::new();

    let hours = HOURS.get_or_init(|| Regex::new(r"(\d+)\s*h").expect("hours pattern is valid"));
    let minutes =
        MINUTES.get_or_init(|| Regex::new(r"(\d+)\s*m").expect("minutes pattern is valid"));

    // An absent component counts as zero; an unreadable one voids the runtime
    let read = |re: &Regex| -> Option<u32> {
        match re.captures(text) {
            Some(c) => c[1].parse::<u32>().ok(),
            None => Some(0),
        }
    };

    let total = read(hours)?.checked_mul(60)?.checked_add(read(minutes)?)?;
    (total > 0).then_some(total)
}

fn element_text(element: &ElementRef) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn extract_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("h1").ok()?;

    document
        .select(&selector)
        .next()
        .map(|element| element_text(&element))
        .filter(|s| !s.is_empty())
}

fn extract_year(document: &Html) -> Option<i32> {
    static YEAR: OnceLock<Regex> = OnceLock::new();
    let year = YEAR.get_or_init(|| Regex::new(r"\b(\d{4})\b").expect("year pattern is valid"));

    for css in [r#"a[href*="releaseinfo"]"#, "h1 ~ ul > li > a"] {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };
        let found = document.select(&selector).find_map(|element| {
            year.captures(&element_text(&element))
                .and_then(|c| c[1].parse::<i32>().ok())
        });
        if found.is_some() {
            return found;
        }
    }

    None
}

fn extract_rating(document: &Html) -> Option<f32> {
    let selector =
        Selector::parse(r#"[data-testid="hero-rating-bar__aggregate-rating__score"] span"#).ok()?;

    document
        .select(&selector)
        .next()
        .and_then(|element| element_text(&element).trim().parse::<f32>().ok())
}

fn extract_runtime(document: &Html) -> Option<u32> {
    let selector = Selector::parse(r#"li[data-testid="title-techspec_runtime"]"#).ok()?;

    document
        .select(&selector)
        .next()
        .and_then(|element| parse_runtime_minutes(&element_text(&element)))
}

/// Finds a 0-100 score in a `section span` whose enclosing `li` mentions Metascore
fn extract_metascore(document: &Html) -> Option<u8> {
    let selector = Selector::parse("section span").ok()?;

    document.select(&selector).find_map(|span| {
        let text = element_text(&span);
        if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let value = text.parse::<u8>().ok().filter(|v| *v <= 100)?;

        let parent_li = span
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|element| element.value().name() == "li")?;

        element_text(&parent_li)
            .contains("Metascore")
            .then_some(value)
    })
}

fn extract_cast(document: &Html) -> Vec<String> {
    let (Ok(block_selector), Ok(name_selector)) = (
        Selector::parse(r#"li[data-testid="title-pc-principal-credit"]"#),
        Selector::parse(r#"a[href^="/name/"]"#),
    ) else {
        return Vec::new();
    };

    let Some(stars) = document
        .select(&block_selector)
        .find(|block| element_text(block).contains("Stars"))
    else {
        return Vec::new();
    };

    stars
        .select(&name_selector)
        .map(|link| element_text(&link))
        .filter(|name| !name.is_empty() && !name.eq_ignore_ascii_case("see more"))
        .take(MAX_CAST)
        .collect()
}
