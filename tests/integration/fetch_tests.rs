//! Fetch client behavior against a mock server

use cinecrawl::crawler::{FailureReason, FetchClient, FetchOutcome, RetryPolicy};
use std::time::Duration;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Client with no backoff so retries run back to back
fn instant_client(max_retries: u32, timeout: Duration) -> FetchClient {
    let policy = RetryPolicy::exponential(max_retries, Duration::ZERO).with_jitter(Duration::ZERO);
    FetchClient::new(policy, timeout).expect("Failed to build client")
}

async fn mount_status(server: &MockServer, status: u16, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(status).set_body_string("<html>body</html>"))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_success_statuses_return_body_after_one_attempt() {
    for status in [200u16, 201, 202] {
        let server = MockServer::start().await;
        mount_status(&server, status, 1).await;

        let client = instant_client(3, Duration::from_secs(5));
        let outcome = client.fetch(&format!("{}/page", server.uri())).await;

        assert_eq!(
            outcome,
            FetchOutcome::Success("<html>body</html>".to_string()),
            "status {}",
            status
        );
    }
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    for status in [400u16, 401, 403, 404] {
        let server = MockServer::start().await;
        mount_status(&server, status, 1).await;

        let client = instant_client(3, Duration::from_secs(5));
        let outcome = client.fetch(&format!("{}/page", server.uri())).await;

        assert_eq!(outcome, FetchOutcome::NonRetryableFailure(status));
        assert!(outcome.into_body().is_none());
    }
}

#[tokio::test]
async fn test_retryable_statuses_use_every_attempt() {
    for status in [429u16, 500, 502, 503] {
        let server = MockServer::start().await;
        mount_status(&server, status, 3).await;

        let client = instant_client(3, Duration::from_secs(5));
        let outcome = client.fetch(&format!("{}/page", server.uri())).await;

        assert_eq!(
            outcome,
            FetchOutcome::RetryableFailure(FailureReason::Status(status))
        );
    }
}

#[tokio::test]
async fn test_always_failing_server_yields_no_body() {
    let server = MockServer::start().await;
    mount_status(&server, 500, 3).await;

    let client = instant_client(3, Duration::from_secs(5));
    let body = client.fetch_body(&format!("{}/page", server.uri())).await;

    assert!(body.is_none());
}

#[tokio::test]
async fn test_soft_block_is_retried_until_budget_is_spent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<p>Our systems have detected UNUSUAL TRAFFIC from your network</p>"),
        )
        .expect(3)
        .mount(&server)
        .await;

    let client = instant_client(3, Duration::from_secs(5));
    let outcome = client.fetch(&format!("{}/page", server.uri())).await;

    assert_eq!(outcome, FetchOutcome::SoftBlockDetected);
}

#[tokio::test]
async fn test_captcha_error_page_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(403).set_body_string("<p>Access denied. Please complete the CAPTCHA.</p>"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = instant_client(3, Duration::from_secs(5));
    let outcome = client.fetch(&format!("{}/page", server.uri())).await;

    assert_eq!(outcome, FetchOutcome::NonRetryableFailure(403));
}

#[tokio::test]
async fn test_soft_block_recovers_on_next_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("please solve this captcha"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("real page"))
        .mount(&server)
        .await;

    let client = instant_client(3, Duration::from_secs(5));
    let body = client.fetch_body(&format!("{}/page", server.uri())).await;

    assert_eq!(body.as_deref(), Some("real page"));
}

#[tokio::test]
async fn test_transport_failure_then_success() {
    let server = MockServer::start().await;
    // First answer arrives after the client has timed out
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("too late")
                .set_delay(Duration::from_secs(3)),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("second body"))
        .expect(1)
        .mount(&server)
        .await;

    let client = instant_client(3, Duration::from_secs(1));
    let outcome = client.fetch(&format!("{}/page", server.uri())).await;

    assert_eq!(outcome, FetchOutcome::Success("second body".to_string()));
}

#[tokio::test]
async fn test_unreachable_host_is_a_transport_failure() {
    let client = instant_client(2, Duration::from_secs(1));
    let outcome = client.fetch("http://127.0.0.1:1/page").await;

    assert!(matches!(
        outcome,
        FetchOutcome::RetryableFailure(FailureReason::Transport(_))
    ));
}

#[tokio::test]
async fn test_identity_headers_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("referer", "https://www.google.com/"))
        .and(header("dnt", "1"))
        .and(header_exists("user-agent"))
        .and(header_exists("accept-language"))
        .and(header_exists("accept-encoding"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let client = instant_client(1, Duration::from_secs(5));
    let outcome = client.fetch(&format!("{}/page", server.uri())).await;

    // Unmatched requests get a 404 from the mock server
    assert_eq!(outcome, FetchOutcome::Success("ok".to_string()));
}
