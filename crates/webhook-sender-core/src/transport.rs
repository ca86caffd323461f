//! Outbound HTTP delivery.
//!
//! [`WebhookTransport`] is the seam between the dispatcher and the network.
//! The production implementation, [`HttpTransport`], wraps a pooled
//! `reqwest::Client` with a request timeout.
//!
//! A transport always consumes the response body before returning, so the
//! underlying connection goes back to the pool (or is closed) on every path,
//! including non-success statuses. The body is drained chunk by chunk and only
//! the first [`MAX_RETAINED_BODY`] bytes are kept, however much the receiver
//! sends.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::header::HeaderMap;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::TransportError;

/// Default timeout for a single delivery attempt.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default `User-Agent` header value.
pub const DEFAULT_USER_AGENT: &str = concat!("webhook-sender/", env!("CARGO_PKG_VERSION"));

/// Upper bound on the response body prefix kept in a [`TransportResponse`].
pub const MAX_RETAINED_BODY: usize = 4 * 1024;

/// A fully prepared POST request.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub endpoint: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Status and drained body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,

    /// Leading bytes of the response body, at most [`MAX_RETAINED_BODY`]
    pub body: Bytes,

    /// Total number of body bytes the receiver sent
    pub body_len: usize,
}

impl TransportResponse {
    /// Whether the receiver acknowledged with `200 OK`.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Delivers a prepared request and returns the receiver's answer.
///
/// Implementations must not retry; the dispatcher reports every failure to its
/// caller as-is.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    /// POST `request` and wait for the response.
    ///
    /// Any HTTP status, including 4xx and 5xx, is a successful transport
    /// result. Only failures to obtain a response are errors.
    async fn post(&self, request: OutboundRequest) -> Result<TransportResponse, TransportError>;
}

/// [`WebhookTransport`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Build a transport with its own connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Configuration`] if the HTTP client cannot be
    /// created (for example when no TLS backend is available).
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| TransportError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client, timeout })
    }

    /// Reuse an existing client. `timeout` is only used in error reports;
    /// the client's own timeout settings govern the request.
    pub fn with_client(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn classify(&self, error: reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout {
                timeout: self.timeout,
            }
        } else if error.is_connect() {
            TransportError::Connect {
                message: error.to_string(),
            }
        } else {
            TransportError::Request {
                message: error.to_string(),
            }
        }
    }
}

#[async_trait]
impl WebhookTransport for HttpTransport {
    #[instrument(skip(self, request), fields(endpoint = %request.endpoint, body_len = request.body.len()))]
    async fn post(&self, request: OutboundRequest) -> Result<TransportResponse, TransportError> {
        let mut response = self
            .client
            .post(request.endpoint)
            .headers(request.headers)
            .body(request.body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status().as_u16();

        let mut body = BytesMut::new();
        let mut body_len = 0usize;

        // The status is already known; a broken body must not mask it.
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    body_len += chunk.len();
                    let room = MAX_RETAINED_BODY.saturating_sub(body.len());
                    body.extend_from_slice(&chunk[..chunk.len().min(room)]);
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(status, received = body_len, error = %e, "Failed to read response body");
                    break;
                }
            }
        }

        debug!(status, response_len = body_len, "Received response");
        Ok(TransportResponse {
            status,
            body: body.freeze(),
            body_len,
        })
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
