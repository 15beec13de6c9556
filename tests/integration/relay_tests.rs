//! Relay validation with a mock server acting as the relay
//!
//! Plain-HTTP requests sent through a proxy carry the absolute target URL, so
//! a mock server given as the relay sees the probe path and answers for it.

use cinecrawl::crawler::{FetchClient, RetryPolicy};
use cinecrawl::relay::{Relay, RelayPool, RelayValidator};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROBE_URL: &str = "http://ipinfo.test/json";

async fn relay_answering(status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json"))
        .respond_with(ResponseTemplate::new(status).set_body_string(r#"{"ip":"203.0.113.7"}"#))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_only_relays_answering_200_are_kept() {
    let good = relay_answering(200).await;
    let redirecting = relay_answering(204).await;
    let failing = relay_answering(503).await;

    let validator = RelayValidator::new(PROBE_URL, Duration::from_secs(2), 8);
    let valid = validator
        .validate(vec![
            good.uri(),
            redirecting.uri(),
            failing.uri(),
            "127.0.0.1:1".to_string(),
            "not a relay".to_string(),
            String::new(),
        ])
        .await;

    assert_eq!(valid.len(), 1);
    assert!(valid.contains(&Relay::parse(&good.uri()).unwrap()));
}

#[tokio::test]
async fn test_duplicate_candidates_collapse() {
    let good = relay_answering(200).await;

    let validator = RelayValidator::new(PROBE_URL, Duration::from_secs(2), 4);
    let valid = validator
        .validate(vec![good.uri(), good.uri(), format!(" {} ", good.uri())])
        .await;

    assert_eq!(valid.len(), 1);
}

#[tokio::test]
async fn test_fetch_client_routes_through_relay() {
    let relay = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/title/tt0111161/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("via relay"))
        .expect(1)
        .mount(&relay)
        .await;

    let pool = RelayPool::new(
        vec![Relay::parse(&relay.uri()).unwrap()],
        Duration::from_secs(2),
    );
    let policy = RetryPolicy::fixed(1, Duration::ZERO);
    let client = FetchClient::new(policy, Duration::from_secs(2))
        .unwrap()
        .with_relays(Arc::new(pool));

    assert!(client.uses_relays());
    let body = client
        .fetch_body("http://www.imdb.test/title/tt0111161/")
        .await;
    assert_eq!(body.as_deref(), Some("via relay"));
}
