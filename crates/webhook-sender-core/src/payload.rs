//! Webhook payload model and its canonical byte form.
//!
//! The receiver verifies the `Signature` header against the raw request body,
//! so the bytes that are signed and the bytes that are sent must be identical.
//! [`WebhookPayload::to_canonical`] produces those bytes exactly once.
//!
//! Field order in the JSON output follows the struct declaration order. Do not
//! reorder fields: the same logical payload with keys in a different order
//! produces a different signature.
//!
//! String values are escaped the way `serde_json` escapes them: `<`, `>`, `&`,
//! U+2028 and U+2029 are written raw, not as `\u003c`-style escapes. A
//! receiver that re-serializes the body with an HTML-escaping encoder before
//! verifying will compute a different signature for payloads containing them.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference timestamp used by the default payload template.
pub const DEFAULT_CREATED_AT: i64 = 1_561_479_335;

/// Order-created webhook body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookPayload {
    /// Event scope, e.g. `store/order/created`
    pub scope: String,

    /// Identifier of the store that produced the event
    pub store_id: String,

    /// Entity the event refers to
    pub data: PayloadData,

    /// Unique identifier of this delivery
    pub hash: String,

    /// Unix timestamp (seconds) of event creation
    pub created_at: i64,

    /// Producer path, e.g. `stores/{store_hash}`
    pub producer: String,
}

/// Entity reference nested in a [`WebhookPayload`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadData {
    /// Entity type, e.g. `order`
    #[serde(rename = "type")]
    pub data_type: String,

    /// Entity identifier
    pub id: i64,
}

impl WebhookPayload {
    /// Build a payload from the constant parts in `template`.
    ///
    /// `hash` and `created_at` vary per delivery and are supplied by the
    /// caller. A fixed `created_at` on the template takes precedence over the
    /// one passed in.
    pub fn from_template(template: &PayloadTemplate, hash: impl Into<String>, created_at: i64) -> Self {
        Self {
            scope: template.scope.clone(),
            store_id: template.store_id.clone(),
            data: PayloadData {
                data_type: template.data_type.clone(),
                id: template.data_id,
            },
            hash: hash.into(),
            created_at: template.created_at.unwrap_or(created_at),
            producer: template.producer.clone(),
        }
    }

    /// Serialize to the exact bytes that are signed and sent.
    ///
    /// # Errors
    ///
    /// Returns the serializer error unchanged; callers wrap it as
    /// [`DispatchError::Serialization`](crate::DispatchError::Serialization).
    pub fn to_canonical(&self) -> Result<CanonicalPayload, serde_json::Error> {
        let bytes = serde_json::to_vec(self)?;
        Ok(CanonicalPayload(Bytes::from(bytes)))
    }
}

/// Serialized payload bytes, shared between signing and the request body.
///
/// Cloning is cheap; the underlying buffer is reference counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalPayload(Bytes);

impl CanonicalPayload {
    /// Wrap bytes that were produced elsewhere, e.g. read from a file.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Hand the buffer to the transport without copying.
    pub fn to_body(&self) -> Bytes {
        self.0.clone()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CanonicalPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// The constant parts of every payload, sourced from configuration.
///
/// Defaults reproduce the BigCommerce order-created sample event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayloadTemplate {
    pub scope: String,
    pub store_id: String,
    pub data_type: String,
    pub data_id: i64,
    pub producer: String,

    /// Fixed creation timestamp; when absent the dispatcher clock is used
    pub created_at: Option<i64>,
}

impl Default for PayloadTemplate {
    fn default() -> Self {
        Self {
            scope: "store/order/created".to_string(),
            store_id: "1025646".to_string(),
            data_type: "order".to_string(),
            data_id: 250,
            producer: "stores/{store_hash}".to_string(),
            created_at: Some(DEFAULT_CREATED_AT),
        }
    }
}

#[cfg(test)]
#[path = "payload_tests.rs"]
mod tests;
