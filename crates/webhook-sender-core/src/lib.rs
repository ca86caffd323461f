//! # Webhook Sender Core
//!
//! Creates webhook payloads, signs them with HMAC-SHA256 and delivers them to
//! a receiving endpoint.
//!
//! The receiver authenticates a delivery by recomputing the HMAC over the raw
//! request body and comparing it with the `Signature` header. This crate
//! therefore serializes each payload exactly once and uses the same bytes for
//! signing and for the request body.
//!
//! ## Architecture
//!
//! - [`payload`]: payload model and canonical serialization
//! - [`signer`]: HMAC-SHA256 token computation
//! - [`dispatcher`]: the send sequence shared by every entry point
//! - [`transport`]: the network seam and its `reqwest` implementation
//! - [`providers`]: injectable `hash` and clock sources
//! - [`config`] and [`telemetry`]: settings and logging for the binaries
//!
//! ## Usage
//!
//! ```rust
//! use webhook_sender_core::{sign, PayloadTemplate, WebhookPayload};
//!
//! let payload = WebhookPayload::from_template(&PayloadTemplate::default(), "01HZX3Q5K8", 0);
//! let body = payload.to_canonical().unwrap();
//! let token = sign(body.as_bytes(), "my-secret").unwrap();
//! assert_eq!(token.as_str().len(), 43);
//! ```

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod payload;
pub mod providers;
pub mod secret;
pub mod signer;
pub mod telemetry;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use config::{SenderConfig, ServerConfig};
pub use dispatcher::{DeliveryReceipt, SignedWebhook, WebhookDispatcher};
pub use error::{ConfigError, DispatchError, SignatureError, TransportError};
pub use payload::{CanonicalPayload, PayloadData, PayloadTemplate, WebhookPayload};
pub use providers::{Clock, FixedClock, FixedHashGenerator, HashGenerator, SystemClock, UlidHashGenerator};
pub use secret::WebhookSecret;
pub use signer::{sign, SignatureToken, SIGNATURE_HEADER};
pub use telemetry::{LoggingConfig, TelemetryError};
pub use transport::{
    HttpTransport, OutboundRequest, TransportResponse, WebhookTransport, MAX_RETAINED_BODY,
};

pub use tokio_util::sync::CancellationToken;

/// Result message for a completed send, success or failure.
///
/// Both entry points report exactly this text: to the console for the
/// command-line tool, as the response body for the request handler.
pub fn outcome_message(result: &Result<DeliveryReceipt, DispatchError>) -> String {
    match result {
        Ok(receipt) => receipt.message(),
        Err(e) => e.to_string(),
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
