//! Crawler module for fetching and processing chart pages
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with identity headers, classification and retry
//! - The bounded work queue and worker pool
//! - Link harvesting from the chart listing
//! - Overall pipeline coordination

mod coordinator;
mod fetcher;
mod harvester;
mod identity;
mod pool;
mod retry;

pub use coordinator::{
    build_fetch_client, crawl_movies, harvest_links, run_pipeline, validate_relays, RunSummary,
};
pub use fetcher::{
    build_http_client, classify_response, classify_transport_error, is_soft_block, FailureReason,
    FetchClient, FetchOutcome, CAPTCHA_MARKER, TRAFFIC_MARKER,
};
pub use harvester::harvest;
pub use identity::{identity_headers, random_user_agent, USER_AGENTS};
pub use pool::{PoolReport, WorkQueue, WorkerPool};
pub use retry::RetryPolicy;
