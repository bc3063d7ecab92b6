//! Direct message encryption and decryption.

use std::sync::Arc;

use super::message::EncryptedMessage;
use crate::crypto::{
    decode_nonce, encoding, ensure_protocol_version, fresh_nonce, CryptoError, CryptoProvider,
    PrivateKey, PublicKey, Result, SymmetricKey, PROTOCOL_VERSION,
};

/// Hybrid encryption for 1:1 messages.
///
/// # Example
///
/// ```ignore
/// let cipher = MessageCipher::new(provider);
/// let payload = cipher.encrypt_direct("hello", &bob.public_key)?;
/// assert_eq!(cipher.decrypt_direct(&payload, bob.private_key())?, "hello");
/// ```
#[derive(Clone)]
pub struct MessageCipher {
    provider: Arc<dyn CryptoProvider>,
}

impl MessageCipher {
    /// Creates a cipher using the given provider.
    #[must_use]
    pub fn new(provider: Arc<dyn CryptoProvider>) -> Self {
        Self { provider }
    }

    /// Encrypts `plaintext` for the holder of `recipient_public_key`.
    ///
    /// A fresh 256-bit message key and 96-bit nonce are generated for every
    /// call.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Validation`] if the recipient key is invalid, or
    /// [`CryptoError::CryptoUnavailable`] if randomness or encryption fails.
    pub fn encrypt_direct(
        &self,
        plaintext: &str,
        recipient_public_key: &PublicKey,
    ) -> Result<EncryptedMessage> {
        let provider = self.provider.as_ref();
        let message_key = SymmetricKey::generate(provider)?;
        let nonce = fresh_nonce(provider)?;

        let data = provider.aead_seal(message_key.as_bytes(), &nonce, plaintext.as_bytes())?;
        let wrapped_key = provider.wrap_key(recipient_public_key, message_key.as_bytes())?;

        Ok(EncryptedMessage {
            version: PROTOCOL_VERSION.to_string(),
            data: encoding::encode(data),
            key: encoding::encode(wrapped_key),
            iv: encoding::encode(nonce),
        })
    }

    /// Decrypts a direct message with the recipient's private key.
    ///
    /// Retrying with the same key never helps: a failure means the message is
    /// permanently unreadable for that key.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::UnsupportedMessageVersion`] if `payload.version` is not `tt-e1`
    /// - [`CryptoError::DecryptionFailed`] for every other failure (wrong key,
    ///   tampered bytes, malformed encoding)
    pub fn decrypt_direct(&self, payload: &EncryptedMessage, private_key: &PrivateKey) -> Result<String> {
        ensure_protocol_version(&payload.version)?;
        self.open(payload, private_key)
            .map_err(|_| CryptoError::DecryptionFailed)
    }

    fn open(&self, payload: &EncryptedMessage, private_key: &PrivateKey) -> Result<String> {
        let provider = self.provider.as_ref();
        let wrapped_key = encoding::decode(&payload.key).map_err(|_| CryptoError::DecryptionFailed)?;
        let data = encoding::decode(&payload.data).map_err(|_| CryptoError::DecryptionFailed)?;
        let nonce = decode_nonce(&payload.iv)?;

        let raw_key = provider.unwrap_key(private_key, &wrapped_key)?;
        let message_key = SymmetricKey::from_slice(&raw_key)?;

        let plaintext = provider.aead_open(message_key.as_bytes(), &nonce, &data)?;
        std::str::from_utf8(&plaintext)
            .map(str::to_owned)
            .map_err(|_| CryptoError::DecryptionFailed)
    }
}

impl std::fmt::Debug for MessageCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageCipher")
            .field("provider", &self.provider.name())
            .finish()
    }
}
