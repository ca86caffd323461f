//! Common test utilities for webhook sender integration tests
//!
//! This module provides:
//! - A receiving endpoint that verifies signatures the way a real receiver does
//! - A recording transport for exercising the dispatcher without a network
//! - Shared fixtures

use async_trait::async_trait;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use bytes::Bytes;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use webhook_sender_core::{OutboundRequest, TransportError, TransportResponse, WebhookTransport};

#[allow(dead_code)]
pub const SECRET: &str = "xPpcHHoAOM";

#[allow(dead_code)]
pub const HASH: &str = "01HZX3Q5K8V2M7N4P6R9T0W1YA";

#[allow(dead_code)]
pub const EXPECTED_SIGNATURE: &str = "LyjvfupIdFQnMO1SQpx_P3lskt9IGzh49ntzJEqYSnk";

// ============================================================================
// Verifying Receiver
// ============================================================================

/// One request seen by [`VerifyingReceiver`].
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct ReceivedDelivery {
    pub signature: Option<String>,
    pub content_type: Option<String>,
    pub body: Bytes,
    pub verified: bool,
}

#[derive(Clone)]
struct ReceiverState {
    secret: Arc<Vec<u8>>,
    deliveries: Arc<Mutex<Vec<ReceivedDelivery>>>,
}

/// HTTP receiver that recomputes HMAC-SHA256 over the raw body and answers
/// `200` when the `Signature` header matches, `401` otherwise.
pub struct VerifyingReceiver {
    address: SocketAddr,
    deliveries: Arc<Mutex<Vec<ReceivedDelivery>>>,
    shutdown: Option<oneshot::Sender<()>>,
}

#[allow(dead_code)]
impl VerifyingReceiver {
    pub async fn start(secret: &str) -> Self {
        let deliveries = Arc::new(Mutex::new(Vec::new()));
        let state = ReceiverState {
            secret: Arc::new(secret.as_bytes().to_vec()),
            deliveries: deliveries.clone(),
        };

        let app = Router::new()
            .route("/webhooks", post(receive))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
                .unwrap();
        });

        Self {
            address,
            deliveries,
            shutdown: Some(shutdown_tx),
        }
    }

    /// URL of the webhook route.
    pub fn url(&self) -> String {
        format!("http://{}/webhooks", self.address)
    }

    pub fn deliveries(&self) -> Vec<ReceivedDelivery> {
        self.deliveries.lock().unwrap().clone()
    }
}

impl Drop for VerifyingReceiver {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn receive(State(state): State<ReceiverState>, headers: HeaderMap, body: Bytes) -> StatusCode {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let signature = header("signature");
    let verified = signature
        .as_deref()
        .map(|s| verify(&state.secret, &body, s))
        .unwrap_or(false);

    state.deliveries.lock().unwrap().push(ReceivedDelivery {
        signature,
        content_type: header("content-type"),
        body,
        verified,
    });

    if verified {
        StatusCode::OK
    } else {
        StatusCode::UNAUTHORIZED
    }
}

fn verify(secret: &[u8], body: &[u8], signature: &str) -> bool {
    let Ok(expected) = URL_SAFE_NO_PAD.decode(signature) else {
        return false;
    };
    let mut mac = Hmac::<Sha256>::new_from_slice(secret).unwrap();
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

// ============================================================================
// Recording Transport
// ============================================================================

/// Transport that records requests and answers with a fixed status.
#[derive(Clone)]
#[allow(dead_code)]
pub struct RecordingTransport {
    status: u16,
    requests: Arc<Mutex<Vec<OutboundRequest>>>,
}

#[allow(dead_code)]
impl RecordingTransport {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebhookTransport for RecordingTransport {
    async fn post(&self, request: OutboundRequest) -> Result<TransportResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        Ok(TransportResponse {
            status: self.status,
            body: Bytes::new(),
            body_len: 0,
        })
    }
}

/// Address with nothing listening on it.
#[allow(dead_code)]
pub fn unused_local_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/webhooks", port)
}
