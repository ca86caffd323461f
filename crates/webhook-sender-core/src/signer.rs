//! HMAC-SHA256 payload signing.
//!
//! The signature token is the raw HMAC-SHA256 digest of the request body,
//! keyed by the shared secret, encoded as URL-safe base64 without padding.
//! It travels in the [`SIGNATURE_HEADER`] request header.
//!
//! # Examples
//!
//! ```rust
//! use webhook_sender_core::signer::sign;
//!
//! let token = sign(br#"{"scope":"store/order/created"}"#, "my-secret").unwrap();
//! assert!(!token.as_str().contains('='));
//! ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;

use crate::error::SignatureError;

type HmacSha256 = Hmac<Sha256>;

/// Name of the request header carrying the signature token.
pub const SIGNATURE_HEADER: &str = "Signature";

/// Base64url (no padding) encoded HMAC-SHA256 digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignatureToken(String);

impl SignatureToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SignatureToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the signature token for `payload` keyed by `secret`.
///
/// The MAC runs over exactly the bytes given; nothing is re-encoded or
/// normalized.
///
/// # Errors
///
/// Returns [`SignatureError::InvalidKey`] if the MAC rejects the key.
pub fn sign(payload: &[u8], secret: &str) -> Result<SignatureToken, SignatureError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e| SignatureError::InvalidKey {
            message: e.to_string(),
        })?;
    mac.update(payload);

    let digest = mac.finalize().into_bytes();
    Ok(SignatureToken(URL_SAFE_NO_PAD.encode(digest)))
}

#[cfg(test)]
#[path = "signer_tests.rs"]
mod tests;
