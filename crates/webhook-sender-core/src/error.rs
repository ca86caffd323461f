//! Error types for webhook signing and delivery.
//!
//! Every failure in the send pipeline maps to exactly one [`DispatchError`]
//! variant. The `Display` output of each variant is the human-readable result
//! message reported by the command-line and request-handler entry points, so
//! the wording here is part of the observable behaviour.

use std::time::Duration;

use thiserror::Error;

/// Errors raised while computing a payload signature.
///
/// HMAC accepts keys of any length, so this is effectively unreachable with
/// the SHA-256 construction. It is still surfaced rather than swallowed: a
/// send never proceeds with an empty or partial signature.
#[derive(Debug, Error)]
pub enum SignatureError {
    /// The MAC implementation refused the signing key.
    #[error("HMAC-SHA256 rejected the signing key: {message}")]
    InvalidKey { message: String },
}

/// Errors raised by a [`WebhookTransport`](crate::transport::WebhookTransport).
#[derive(Debug, Error)]
pub enum TransportError {
    /// The HTTP client could not be constructed.
    #[error("HTTP client configuration failed: {message}")]
    Configuration { message: String },

    /// No response arrived within the configured timeout.
    #[error("request timed out after {}s", timeout.as_secs())]
    Timeout { timeout: Duration },

    /// DNS resolution failed or the connection was refused.
    #[error("connection failed: {message}")]
    Connect { message: String },

    /// Any other failure while issuing the request.
    #[error("request failed: {message}")]
    Request { message: String },
}

impl TransportError {
    /// Check if retrying the same request could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Configuration { .. } => false,
            Self::Timeout { .. } => true,
            Self::Connect { .. } => true,
            Self::Request { .. } => false,
        }
    }
}

/// Errors raised while creating, signing or delivering a webhook.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The payload could not be converted to its canonical byte form.
    #[error("Error marshalling payload: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The keyed hash could not be computed.
    #[error("Error signing payload: {0}")]
    Signature(#[from] SignatureError),

    /// Settings needed to build a dispatcher are missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// The endpoint or a header value is malformed.
    #[error("Error creating request: {message}")]
    RequestConstruction { message: String },

    /// Network, DNS or timeout failure. No delivery took place.
    #[error("Error sending request: {0}")]
    Transport(#[from] TransportError),

    /// The receiver answered with something other than `200 OK`.
    #[error("API request failed with status: {status}")]
    UnexpectedStatus { status: u16 },

    /// The caller cancelled the send before a response arrived.
    #[error("Webhook delivery cancelled before a response was received")]
    Cancelled,
}

impl DispatchError {
    /// Check if this error represents a condition that may succeed if retried.
    ///
    /// Nothing in this crate retries; the classification exists so callers
    /// can decide for themselves.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Serialization(_) => false,
            Self::Signature(_) => false,
            Self::Configuration(_) => false,
            Self::RequestConstruction { .. } => false,
            Self::Transport(e) => e.is_transient(),
            Self::UnexpectedStatus { status } => *status >= 500 || *status == 429,
            Self::Cancelled => false,
        }
    }

    /// Short machine-readable name of the failure category, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Serialization(_) => "serialization",
            Self::Signature(_) => "signature",
            Self::Configuration(_) => "configuration",
            Self::RequestConstruction { .. } => "request_construction",
            Self::Transport(_) => "transport",
            Self::UnexpectedStatus { .. } => "unexpected_status",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration source could not be read or deserialized.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A required value is absent.
    #[error("Missing required configuration value: {key}")]
    Required { key: String },

    /// A value is present but unusable.
    #[error("Invalid configuration value for '{key}': {message}")]
    Invalid { key: String, message: String },
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
