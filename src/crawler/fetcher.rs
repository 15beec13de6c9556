//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for title and listing pages:
//! - Building HTTP clients (direct or routed through a relay)
//! - Randomized identity headers per request
//! - Response classification, including soft-block detection
//! - Bounded retry with backoff

use crate::config::FetchConfig;
use crate::crawler::identity::identity_headers;
use crate::crawler::retry::RetryPolicy;
use crate::relay::{Relay, RelayPool};
use crate::CineError;
use reqwest::Client;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Marks a traffic block at any status (matched case-insensitively)
pub const TRAFFIC_MARKER: &str = "unusual traffic";

/// Marks a challenge page, only meaningful on a 200-202 response
pub const CAPTCHA_MARKER: &str = "captcha";

/// Why a retryable attempt failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The server answered with a status worth retrying (429, 5xx, ...)
    Status(u16),

    /// DNS, connect, timeout or body read failure
    Transport(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => write!(f, "HTTP {}", code),
            Self::Transport(error) => write!(f, "transport error: {}", error),
        }
    }
}

/// Classification of a single fetch attempt, or the final result of a fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Page body of a 200-202 response without block markers
    Success(String),

    /// Worth another attempt after a backoff
    RetryableFailure(FailureReason),

    /// 4xx other than 429, never retried
    NonRetryableFailure(u16),

    /// The transport succeeded but the body is an anti-automation page
    SoftBlockDetected,
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RetryableFailure(_) | Self::SoftBlockDetected)
    }

    /// Consumes the outcome, keeping the body of a success
    pub fn into_body(self) -> Option<String> {
        match self {
            Self::Success(body) => Some(body),
            _ => None,
        }
    }
}

impl fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success(body) => write!(f, "success ({} bytes)", body.len()),
            Self::RetryableFailure(reason) => write!(f, "retryable failure ({})", reason),
            Self::NonRetryableFailure(code) => write!(f, "non-retryable HTTP {}", code),
            Self::SoftBlockDetected => write!(f, "soft block detected"),
        }
    }
}

/// Returns true when a response with `status` and `body` is an anti-automation page
///
/// [`TRAFFIC_MARKER`] counts at every status; [`CAPTCHA_MARKER`] only on a
/// 200-202 response, so an error page mentioning a captcha keeps its status.
pub fn is_soft_block(status: u16, body: &str) -> bool {
    let lowered = body.to_lowercase();
    lowered.contains(TRAFFIC_MARKER)
        || ((200..=202).contains(&status) && lowered.contains(CAPTCHA_MARKER))
}

/// Classifies a received response
///
/// | Condition | Outcome |
/// |-----------|---------|
/// | Body mentions unusual traffic | SoftBlockDetected |
/// | HTTP 200-202 mentioning a captcha | SoftBlockDetected |
/// | HTTP 200-202 | Success |
/// | HTTP 4xx except 429 | NonRetryableFailure |
/// | HTTP 429, 5xx, anything else | RetryableFailure |
pub fn classify_response(status: u16, body: String) -> FetchOutcome {
    if is_soft_block(status, &body) {
        return FetchOutcome::SoftBlockDetected;
    }

    match status {
        200..=202 => FetchOutcome::Success(body),
        429 => FetchOutcome::RetryableFailure(FailureReason::Status(status)),
        400..=499 => FetchOutcome::NonRetryableFailure(status),
        _ => FetchOutcome::RetryableFailure(FailureReason::Status(status)),
    }
}

/// Classifies an error raised before a usable response was read
pub fn classify_transport_error(error: &reqwest::Error) -> FetchOutcome {
    let description = if error.is_timeout() {
        "request timeout".to_string()
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else {
        error.to_string()
    };
    FetchOutcome::RetryableFailure(FailureReason::Transport(description))
}

/// Builds an HTTP client, optionally routed through a relay
///
/// Environment proxies are ignored so the only relay in play is the one
/// passed in.
pub fn build_http_client(timeout: Duration, relay: Option<&Relay>) -> Result<Client, CineError> {
    let mut builder = Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .gzip(true)
        .brotli(true)
        .deflate(true)
        .no_proxy();

    if let Some(relay) = relay {
        builder = builder.proxy(relay.to_proxy()?);
    }

    Ok(builder.build()?)
}

/// Fetch client with identity rotation, classification and retry
///
/// # Example
///
/// ```no_run
/// use cinecrawl::crawler::{FetchClient, RetryPolicy};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), cinecrawl::CineError> {
/// let client = FetchClient::new(
///     RetryPolicy::exponential(3, Duration::from_secs(1)),
///     Duration::from_secs(10),
/// )?;
/// let body = client.fetch_body("https://www.imdb.com/chart/top/").await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct FetchClient {
    direct: Client,
    policy: RetryPolicy,
    relays: Option<Arc<RelayPool>>,
}

impl FetchClient {
    /// Creates a client that fetches directly (no relays)
    pub fn new(policy: RetryPolicy, timeout: Duration) -> Result<Self, CineError> {
        Ok(Self {
            direct: build_http_client(timeout, None)?,
            policy,
            relays: None,
        })
    }

    /// Creates a client from the `[fetch]` configuration section
    pub fn from_config(config: &FetchConfig) -> Result<Self, CineError> {
        Self::new(
            RetryPolicy::from(config),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Routes every attempt through a relay drawn from `relays`
    ///
    /// An empty pool leaves the client fetching directly.
    pub fn with_relays(mut self, relays: Arc<RelayPool>) -> Self {
        if relays.is_empty() {
            tracing::warn!("Relay routing requested but no relay is available, fetching directly");
            self.relays = None;
        } else {
            self.relays = Some(relays);
        }
        self
    }

    pub fn uses_relays(&self) -> bool {
        self.relays.is_some()
    }

    /// Fetches a URL, retrying retryable outcomes per the retry policy
    ///
    /// Returns the first success, the first non-retryable failure, or the
    /// last retryable classification once the attempt budget is spent.
    pub async fn fetch(&self, url: &str) -> FetchOutcome {
        let mut attempt = 1;

        loop {
            let outcome = self.attempt(url, attempt).await;

            match &outcome {
                FetchOutcome::Success(body) => {
                    tracing::debug!("[{}] Fetched {} ({} bytes)", attempt, url, body.len());
                    return outcome;
                }
                FetchOutcome::NonRetryableFailure(status) => {
                    tracing::error!("[{}] HTTP {} for {}, not retrying", attempt, status, url);
                    return outcome;
                }
                FetchOutcome::SoftBlockDetected => {
                    tracing::warn!("[{}] Possible block (unusual traffic) at {}", attempt, url);
                }
                FetchOutcome::RetryableFailure(reason) => {
                    tracing::warn!("[{}] {} while fetching {}", attempt, reason, url);
                }
            }

            if !self.policy.should_retry(attempt) {
                tracing::error!(
                    "Giving up on {} after {} attempts: {}",
                    url,
                    attempt,
                    outcome
                );
                return outcome;
            }

            let delay = self.policy.backoff(attempt);
            tracing::debug!("Retrying {} in {:?}", url, delay);
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// Fetches a URL and keeps only the body of a success
    pub async fn fetch_body(&self, url: &str) -> Option<String> {
        self.fetch(url).await.into_body()
    }

    /// Issues one GET and classifies it
    async fn attempt(&self, url: &str, attempt: u32) -> FetchOutcome {
        let client = match self.relays.as_ref().and_then(|pool| pool.choose()) {
            Some((relay, client)) => {
                tracing::debug!("[{}] Routing {} through relay {}", attempt, url, relay);
                client
            }
            None => &self.direct,
        };

        let response = match client.get(url).headers(identity_headers()).send().await {
            Ok(response) => response,
            Err(e) => return classify_transport_error(&e),
        };

        let status = response.status().as_u16();
        match response.text().await {
            Ok(body) => classify_response(status, body),
            Err(e) => classify_transport_error(&e),
        }
    }
}
