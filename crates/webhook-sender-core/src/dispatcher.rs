//! Webhook creation, signing and delivery.
//!
//! [`WebhookDispatcher`] runs the linear send sequence:
//!
//! 1. Serialize the payload to its canonical bytes
//! 2. Sign those bytes ([`crate::signer::sign`])
//! 3. POST the same bytes with `Content-Type: application/json` and the
//!    `Signature` header
//! 4. Treat anything but `200 OK` as a failure
//!
//! There is no retry and no intermediate state. Each call is independent, so
//! one dispatcher can serve concurrent callers.
//!
//! # Examples
//!
//! ```rust,no_run
//! use webhook_sender_core::{PayloadTemplate, SenderConfig, WebhookDispatcher};
//!
//! # async fn run(config: SenderConfig) -> Result<(), Box<dyn std::error::Error>> {
//! let dispatcher = WebhookDispatcher::from_config(&config)?;
//! let receipt = dispatcher.create_and_send(&config.payload).await?;
//! println!("{}", receipt);
//! # Ok(())
//! # }
//! ```

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::config::SenderConfig;
use crate::error::DispatchError;
use crate::payload::{CanonicalPayload, PayloadTemplate, WebhookPayload};
use crate::providers::{Clock, HashGenerator, SystemClock, UlidHashGenerator};
use crate::secret::WebhookSecret;
use crate::signer::{sign, SignatureToken, SIGNATURE_HEADER};
use crate::transport::{HttpTransport, OutboundRequest, WebhookTransport};

/// A payload together with the exact bytes and signature that would be sent.
#[derive(Debug, Clone)]
pub struct SignedWebhook {
    pub payload: WebhookPayload,
    pub body: CanonicalPayload,
    pub signature: SignatureToken,
}

/// Proof of a successful delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// Endpoint that acknowledged the webhook
    pub endpoint: Url,

    /// Status returned by the receiver (always 200)
    pub status: u16,

    /// `hash` of the delivered payload
    pub hash: String,
}

impl DeliveryReceipt {
    /// Human-readable success message.
    pub fn message(&self) -> String {
        format!("Webhook sent to {}", self.endpoint)
    }
}

impl fmt::Display for DeliveryReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Creates, signs and delivers webhooks.
///
/// The dispatcher holds only immutable collaborators, so it can be wrapped in
/// an `Arc` and shared between concurrent invocations.
#[derive(Clone)]
pub struct WebhookDispatcher {
    transport: Arc<dyn WebhookTransport>,
    hash_generator: Arc<dyn HashGenerator>,
    clock: Arc<dyn Clock>,
    secret: WebhookSecret,
    endpoint: Url,
}

impl WebhookDispatcher {
    /// Create a dispatcher with ULID hashes and the system clock.
    pub fn new(transport: Arc<dyn WebhookTransport>, secret: WebhookSecret, endpoint: Url) -> Self {
        Self {
            transport,
            hash_generator: Arc::new(UlidHashGenerator),
            clock: Arc::new(SystemClock),
            secret,
            endpoint,
        }
    }

    /// Create a dispatcher backed by [`HttpTransport`] from validated settings.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Configuration`] if the endpoint or secret is
    /// missing or invalid, and [`DispatchError::Transport`] if the HTTP client
    /// cannot be built.
    pub fn from_config(config: &SenderConfig) -> Result<Self, DispatchError> {
        let endpoint = config.endpoint_url()?;
        let secret = config.require_secret()?.clone();

        let transport = HttpTransport::new(config.timeout(), &config.user_agent)?;

        Ok(Self::new(Arc::new(transport), secret, endpoint))
    }

    /// Replace the source of payload `hash` values.
    pub fn with_hash_generator(mut self, hash_generator: Arc<dyn HashGenerator>) -> Self {
        self.hash_generator = hash_generator;
        self
    }

    /// Replace the source of `created_at` timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Configured receiving endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Build a fresh payload with a new `hash`.
    pub fn build_payload(&self, template: &PayloadTemplate) -> WebhookPayload {
        WebhookPayload::from_template(
            template,
            self.hash_generator.generate(),
            self.clock.now_unix(),
        )
    }

    /// Serialize and sign `payload` with the configured secret, without sending.
    pub fn prepare(&self, payload: WebhookPayload) -> Result<SignedWebhook, DispatchError> {
        sign_payload(payload, &self.secret)
    }

    /// Build a fresh payload from `template` and deliver it to the configured
    /// endpoint with the configured secret.
    ///
    /// This is the operation behind both entry points.
    pub async fn create_and_send(
        &self,
        template: &PayloadTemplate,
    ) -> Result<DeliveryReceipt, DispatchError> {
        let payload = self.build_payload(template);
        self.send(&payload, &self.secret, &self.endpoint).await
    }

    /// [`create_and_send`](Self::create_and_send) that stops waiting when
    /// `cancel` fires.
    pub async fn create_and_send_with_cancellation(
        &self,
        template: &PayloadTemplate,
        cancel: &CancellationToken,
    ) -> Result<DeliveryReceipt, DispatchError> {
        let payload = self.build_payload(template);
        self.send_with_cancellation(&payload, &self.secret, &self.endpoint, cancel)
            .await
    }

    /// Sign `payload` with `secret` and POST it to `endpoint`.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::Serialization`] / [`DispatchError::Signature`]: local
    ///   failure, nothing was sent
    /// - [`DispatchError::RequestConstruction`]: `endpoint` is not http(s) or
    ///   the signature is not a valid header value
    /// - [`DispatchError::Transport`]: no response was obtained
    /// - [`DispatchError::UnexpectedStatus`]: the receiver answered with
    ///   anything but `200 OK`
    #[instrument(skip(self, payload, secret), fields(endpoint = %endpoint, hash = %payload.hash))]
    pub async fn send(
        &self,
        payload: &WebhookPayload,
        secret: &WebhookSecret,
        endpoint: &Url,
    ) -> Result<DeliveryReceipt, DispatchError> {
        let signed = sign_payload(payload.clone(), secret).inspect_err(|e| {
            error!(error = %e, kind = e.kind(), "Failed to prepare webhook");
        })?;

        debug!(payload = %signed.body, "Webhook payload");
        debug!(signature = %signed.signature, "Webhook signature");

        let request = build_request(endpoint, &signed).inspect_err(|e| {
            error!(error = %e, "Error creating request");
        })?;

        let response = self.transport.post(request).await.map_err(|e| {
            error!(endpoint = %endpoint, error = %e, "Error sending request to API");
            DispatchError::Transport(e)
        })?;

        if !response.is_ok() {
            error!(
                status = response.status,
                response_len = response.body_len,
                "API request failed"
            );
            return Err(DispatchError::UnexpectedStatus {
                status: response.status,
            });
        }

        info!(url = %endpoint, status = response.status, "Sent webhook to API");

        Ok(DeliveryReceipt {
            endpoint: endpoint.clone(),
            status: response.status,
            hash: signed.payload.hash,
        })
    }

    /// [`send`](Self::send) that stops waiting when `cancel` fires.
    ///
    /// A cancelled send may or may not have reached the receiver; the result
    /// makes no claim either way.
    pub async fn send_with_cancellation(
        &self,
        payload: &WebhookPayload,
        secret: &WebhookSecret,
        endpoint: &Url,
        cancel: &CancellationToken,
    ) -> Result<DeliveryReceipt, DispatchError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!(endpoint = %endpoint, hash = %payload.hash, "Webhook delivery cancelled");
                Err(DispatchError::Cancelled)
            }
            result = self.send(payload, secret, endpoint) => result,
        }
    }
}

impl fmt::Debug for WebhookDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookDispatcher")
            .field("endpoint", &self.endpoint.as_str())
            .field("secret", &self.secret)
            .field("transport", &"<WebhookTransport>")
            .finish()
    }
}

fn sign_payload(
    payload: WebhookPayload,
    secret: &WebhookSecret,
) -> Result<SignedWebhook, DispatchError> {
    let body = payload.to_canonical()?;
    let signature = sign(body.as_bytes(), secret.expose_secret())?;

    Ok(SignedWebhook {
        payload,
        body,
        signature,
    })
}

fn build_request(endpoint: &Url, signed: &SignedWebhook) -> Result<OutboundRequest, DispatchError> {
    if !matches!(endpoint.scheme(), "http" | "https") {
        return Err(DispatchError::RequestConstruction {
            message: format!("unsupported scheme '{}'", endpoint.scheme()),
        });
    }

    let invalid_header = |e: &dyn fmt::Display| DispatchError::RequestConstruction {
        message: format!("invalid {} header: {}", SIGNATURE_HEADER, e),
    };
    let name = HeaderName::from_bytes(SIGNATURE_HEADER.as_bytes()).map_err(|e| invalid_header(&e))?;
    let value = HeaderValue::from_str(signed.signature.as_str()).map_err(|e| invalid_header(&e))?;

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(name, value);

    Ok(OutboundRequest {
        endpoint: endpoint.clone(),
        headers,
        body: signed.body.to_body(),
    })
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
