//! Group message encryption under a shared key.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::crypto::{
    decode_nonce, encoding, ensure_protocol_version, fresh_nonce, CryptoError, CryptoProvider,
    KeyId, Result, SymmetricKey, PROTOCOL_VERSION,
};

/// An encrypted group message.
///
/// `keyId` tells readers which cached group key to use. It is not
/// authenticated: a forged id only selects a key under which the tag check
/// then fails.
///
/// ```text
/// { "version": "tt-e1", "data": "<base64>", "iv": "<base64>", "keyId": "<hex>" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupEncryptedMessage {
    /// Protocol version.
    pub version: String,
    /// AEAD ciphertext followed by the authentication tag.
    pub data: String,
    /// AEAD nonce.
    pub iv: String,
    /// Identifier of the group key used.
    pub key_id: KeyId,
}

impl GroupEncryptedMessage {
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
    /// Returns [`CryptoError::Validation`] if the JSON is not a group payload.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| CryptoError::Validation(format!("malformed group message: {e}")))
    }
}

/// Encrypts and decrypts group messages with an already-distributed key.
#[derive(Clone)]
pub struct GroupCipher {
    provider: Arc<dyn CryptoProvider>,
}

impl GroupCipher {
    /// Creates a cipher using the given provider.
    #[must_use]
    pub fn new(provider: Arc<dyn CryptoProvider>) -> Self {
        Self { provider }
    }

    /// Encrypts `plaintext` under `group_key`, with a fresh nonce.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::CryptoUnavailable`] if randomness or encryption
    /// fails.
    pub fn encrypt(&self, plaintext: &str, group_key: &SymmetricKey, key_id: &KeyId) -> Result<GroupEncryptedMessage> {
        let provider = self.provider.as_ref();
        let nonce = fresh_nonce(provider)?;
        let data = provider.aead_seal(group_key.as_bytes(), &nonce, plaintext.as_bytes())?;

        Ok(GroupEncryptedMessage {
            version: PROTOCOL_VERSION.to_string(),
            data: encoding::encode(data),
            iv: encoding::encode(nonce),
            key_id: key_id.clone(),
        })
    }

    /// Decrypts a group message with the key identified by its `keyId`.
    ///
    /// The caller selects `group_key` by `payload.key_id`.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::UnsupportedMessageVersion`] for an unknown version
    /// - [`CryptoError::DecryptionFailed`] for every other failure
    pub fn decrypt(&self, payload: &GroupEncryptedMessage, group_key: &SymmetricKey) -> Result<String> {
        ensure_protocol_version(&payload.version)?;

        let data = encoding::decode(&payload.data).map_err(|_| CryptoError::DecryptionFailed)?;
        let nonce = decode_nonce(&payload.iv)?;
        let plaintext = self
            .provider
            .aead_open(group_key.as_bytes(), &nonce, &data)
            .map_err(|_| CryptoError::DecryptionFailed)?;

        std::str::from_utf8(&plaintext)
            .map(str::to_owned)
            .map_err(|_| CryptoError::DecryptionFailed)
    }
}

impl std::fmt::Debug for GroupCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupCipher")
            .field("provider", &self.provider.name())
            .finish()
    }
}
