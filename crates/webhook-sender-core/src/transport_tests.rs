//! Tests for [`HttpTransport`] against a local mock receiver.

use super::*;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use wiremock::matchers::{body_bytes, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn endpoint(server: &MockServer) -> Url {
    Url::parse(&format!("{}/webhooks/bigcommerce", server.uri())).unwrap()
}

fn json_request(endpoint: Url, body: &'static [u8]) -> OutboundRequest {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert("Signature", HeaderValue::from_static("test-signature"));

    OutboundRequest {
        endpoint,
        headers,
        body: Bytes::from_static(body),
    }
}

/// Body and headers reach the receiver unchanged.
#[tokio::test]
async fn test_post_sends_body_and_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhooks/bigcommerce"))
        .and(header("content-type", "application/json"))
        .and(header("signature", "test-signature"))
        .and(body_bytes(br#"{"scope":"x"}"#.to_vec()))
        .respond_with(ResponseTemplate::new(200).set_body_string("accepted"))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::new(DEFAULT_TIMEOUT, DEFAULT_USER_AGENT).unwrap();
    let response = transport
        .post(json_request(endpoint(&server), br#"{"scope":"x"}"#))
        .await
        .unwrap();

    assert!(response.is_ok());
    assert_eq!(response.status, 200);
    assert_eq!(&response.body[..], b"accepted");
}

/// Error statuses are transport successes; interpretation is the caller's job.
#[tokio::test]
async fn test_error_status_is_returned_not_raised() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(DEFAULT_TIMEOUT, DEFAULT_USER_AGENT).unwrap();
    let response = transport
        .post(json_request(endpoint(&server), b"{}"))
        .await
        .unwrap();

    assert!(!response.is_ok());
    assert_eq!(response.status, 500);
    assert_eq!(&response.body[..], b"boom");
    assert_eq!(response.body_len, 4);
}

/// An oversized body is drained and counted but only its prefix is kept.
#[tokio::test]
async fn test_large_body_is_drained_not_retained() {
    const BODY_SIZE: usize = 8 * 1024 * 1024;

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_bytes(vec![b'x'; BODY_SIZE]))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(DEFAULT_TIMEOUT, DEFAULT_USER_AGENT).unwrap();
    let response = transport
        .post(json_request(endpoint(&server), b"{}"))
        .await
        .unwrap();

    assert_eq!(response.status, 500);
    assert_eq!(response.body_len, BODY_SIZE);
    assert_eq!(response.body.len(), MAX_RETAINED_BODY);
    assert!(response.body.iter().all(|b| *b == b'x'));
}

#[tokio::test]
async fn test_user_agent_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("user-agent", "webhook-sender-tests/1.0"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::new(DEFAULT_TIMEOUT, "webhook-sender-tests/1.0").unwrap();
    let response = transport
        .post(json_request(endpoint(&server), b"{}"))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
}

/// A receiver slower than the timeout yields a timeout error.
#[tokio::test]
async fn test_slow_receiver_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let timeout = Duration::from_millis(200);
    let transport = HttpTransport::new(timeout, DEFAULT_USER_AGENT).unwrap();
    assert_eq!(transport.timeout(), timeout);

    let result = transport.post(json_request(endpoint(&server), b"{}")).await;

    match result {
        Err(TransportError::Timeout { timeout: reported }) => assert_eq!(reported, timeout),
        other => panic!("expected timeout, got {:?}", other),
    }
}

/// Nothing listening on the port yields a connection error.
#[tokio::test]
async fn test_refused_connection_is_reported() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let url = Url::parse(&format!("http://127.0.0.1:{}/webhooks/bigcommerce", port)).unwrap();
    let transport = HttpTransport::new(Duration::from_secs(5), DEFAULT_USER_AGENT).unwrap();

    let result = transport.post(json_request(url, b"{}")).await;

    let err = result.expect_err("connection to a closed port must fail");
    assert!(
        matches!(err, TransportError::Connect { .. }),
        "expected connect error, got {:?}",
        err
    );
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_with_client_reuses_supplied_client() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;

    let transport = HttpTransport::with_client(reqwest::Client::new(), DEFAULT_TIMEOUT);
    let response = transport
        .post(json_request(endpoint(&server), b"{}"))
        .await
        .unwrap();

    assert_eq!(response.status, 202);
    assert!(!response.is_ok());
}
