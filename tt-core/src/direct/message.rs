//! Direct message wire format.

use serde::{Deserialize, Serialize};

use crate::crypto::{CryptoError, Result};

/// An encrypted 1:1 message, stored and relayed verbatim.
///
/// ```text
/// {
///   "version": "tt-e1",
///   "data": "<base64 AES-GCM ciphertext + tag>",
///   "key":  "<base64 RSA-OAEP wrapped message key>",
///   "iv":   "<base64 96-bit nonce>"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedMessage {
    /// Protocol version, always `tt-e1` for payloads produced by this crate.
    pub version: String,
    /// AEAD ciphertext followed by the authentication tag.
    pub data: String,
    /// Message key wrapped under the recipient's public key.
    pub key: String,
    /// AEAD nonce.
    pub iv: String,
}

impl EncryptedMessage {
    /// Serializes the payload to JSON.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Validation`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| CryptoError::Validation(e.to_string()))
    }

    /// Parses a payload from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Validation`] if the JSON does not have the
    /// payload shape.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| CryptoError::Validation(format!("malformed direct message: {e}")))
    }
}
