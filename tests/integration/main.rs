//! Integration tests for Cinecrawl
//!
//! These tests use wiremock to stand in for the chart site, the title pages
//! and the relays, and exercise the public API end-to-end.

mod fetch_tests;
mod pipeline_tests;
mod relay_tests;
