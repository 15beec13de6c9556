//! Randomized browser identities for outgoing requests

use rand::seq::SliceRandom;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT_ENCODING, ACCEPT_LANGUAGE, DNT, REFERER, USER_AGENT,
};

/// Realistic browser identities, one of which is chosen per request
pub const USER_AGENTS: [&str; 3] = [
    // Chrome on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36",
    // Firefox on macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:126.0) Gecko/20100101 Firefox/126.0",
    // Safari on iOS
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_5 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1",
];

pub const ACCEPT_LANGUAGE_VALUE: &str = "en-US,en;q=0.9";
pub const REFERER_VALUE: &str = "https://www.google.com/";
pub const ACCEPT_ENCODING_VALUE: &str = "gzip, deflate, br";
pub const DNT_VALUE: &str = "1";

/// Picks one of [`USER_AGENTS`] uniformly at random
pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// Builds the identity headers for a single request
///
/// The `User-Agent` is drawn at random; the auxiliary headers are constant.
pub fn identity_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(random_user_agent()));
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE),
    );
    headers.insert(REFERER, HeaderValue::from_static(REFERER_VALUE));
    headers.insert(
        ACCEPT_ENCODING,
        HeaderValue::from_static(ACCEPT_ENCODING_VALUE),
    );
    headers.insert(DNT, HeaderValue::from_static(DNT_VALUE));
    headers
}
