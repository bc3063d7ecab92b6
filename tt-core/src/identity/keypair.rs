//! Identity key pair generation.
//!
//! This module provides [`KeyPair`], a user's long-lived asymmetric key pair,
//! and [`IdentityKeyManager`], the factory that creates it.
//!
//! # Security
//!
//! - The private key is zeroized on drop
//! - Debug output never includes secret material
//! - `KeyPair` is deliberately not `Serialize`: only the public half may
//!   leave the device, via [`KeyPair::published`]

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::directory::PublishedKey;
use crate::crypto::{CryptoProvider, KeyId, PrivateKey, PublicKey, Result};

/// A user's long-term asymmetric key pair.
#[derive(Clone)]
pub struct KeyPair {
    /// Public key, safe to publish.
    pub public_key: PublicKey,

    /// Private key; exposed only through [`Self::private_key`].
    private_key: PrivateKey,

    /// Random identifier, unique per identity.
    pub key_id: KeyId,

    /// When the key pair was generated.
    pub created_at: DateTime<Utc>,
}

impl KeyPair {
    /// Reassembles a key pair, e.g. after restoring the private key from a
    /// backup.
    #[must_use]
    pub const fn from_parts(
        public_key: PublicKey,
        private_key: PrivateKey,
        key_id: KeyId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            public_key,
            private_key,
            key_id,
            created_at,
        }
    }

    /// Returns the private key.
    ///
    /// # Security Warning
    ///
    /// Pass only to decrypt operations, a [`SecureKeyStore`](super::SecureKeyStore)
    /// or the backup codec.
    #[must_use]
    pub const fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// Returns the record to publish in the key directory.
    #[must_use]
    pub fn published(&self) -> PublishedKey {
        PublishedKey {
            public_key: self.public_key.clone(),
            key_id: self.key_id.clone(),
        }
    }

    /// Returns the SHA-256 fingerprint of the public key.
    #[must_use]
    pub fn fingerprint(&self, provider: &dyn CryptoProvider) -> String {
        self.public_key.fingerprint(provider)
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the private key
        f.debug_struct("KeyPair")
            .field("key_id", &self.key_id)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// Creates identity key pairs.
///
/// Stateless apart from the shared provider; cheap to clone.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tt_core::identity::IdentityKeyManager;
/// use tt_core::RustCryptoProvider;
///
/// let manager = IdentityKeyManager::new(Arc::new(RustCryptoProvider::new()));
/// let identity = manager.generate_identity().unwrap();
/// assert_eq!(identity.key_id.as_str().len(), 32);
/// ```
#[derive(Clone)]
pub struct IdentityKeyManager {
    provider: Arc<dyn CryptoProvider>,
}

impl IdentityKeyManager {
    /// Creates a manager using the given provider.
    #[must_use]
    pub fn new(provider: Arc<dyn CryptoProvider>) -> Self {
        Self { provider }
    }

    /// Generates a new RSA-2048 (OAEP, SHA-256) identity with a random key id.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::CryptoUnavailable`](crate::CryptoError::CryptoUnavailable)
    /// if the provider cannot produce keys or randomness.
    pub fn generate_identity(&self) -> Result<KeyPair> {
        let (public_key, private_key) = self.provider.generate_key_pair()?;
        let key_id = KeyId::generate(self.provider.as_ref())?;

        tracing::debug!(key_id = %key_id, provider = self.provider.name(), "generated identity key pair");

        Ok(KeyPair {
            public_key,
            private_key,
            key_id,
            created_at: Utc::now(),
        })
    }

    /// Re-derives the public key belonging to a stored private key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Validation`](crate::CryptoError::Validation) if
    /// the private key cannot be parsed.
    pub fn public_key_for(&self, private_key: &PrivateKey) -> Result<PublicKey> {
        self.provider.public_key_from_private(private_key)
    }
}

impl std::fmt::Debug for IdentityKeyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityKeyManager")
            .field("provider", &self.provider.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::CryptoError;
    use crate::test_support;

    #[test]
    fn generated_identity_has_key_id_and_timestamp() {
        let identity = test_support::identity(0);
        assert_eq!(identity.key_id.as_str().len(), 32);
        assert!(identity.created_at <= Utc::now());
    }

    #[test]
    fn identities_are_distinct() {
        let a = test_support::identity(0);
        let b = test_support::identity(1);
        assert_ne!(a.public_key, b.public_key);
        assert_ne!(a.key_id, b.key_id);
        assert_ne!(a.private_key(), b.private_key());
    }

    #[test]
    fn public_key_for_matches_generated_public_key() {
        let manager = IdentityKeyManager::new(test_support::provider());
        let identity = test_support::identity(2);
        assert_eq!(
            manager.public_key_for(identity.private_key()).unwrap(),
            identity.public_key
        );
    }

    #[test]
    fn public_key_for_rejects_garbage() {
        let manager = IdentityKeyManager::new(test_support::provider());
        let result = manager.public_key_for(&PrivateKey::from_der(vec![1, 2, 3]));
        assert!(matches!(result, Err(CryptoError::Validation(_))));
    }

    #[test]
    fn published_key_contains_public_half_only() {
        let identity = test_support::identity(0);
        let published = identity.published();
        assert_eq!(published.public_key, identity.public_key);
        assert_eq!(published.key_id, identity.key_id);

        let json = serde_json::to_string(&published).unwrap();
        let private_b64 = identity.private_key().to_base64();
        assert!(!json.contains(private_b64.as_str()));
    }

    #[test]
    fn fingerprint_is_stable() {
        let provider = test_support::provider();
        let identity = test_support::identity(0);
        assert_eq!(
            identity.fingerprint(provider.as_ref()),
            identity.public_key.fingerprint(provider.as_ref())
        );
    }

    #[test]
    fn debug_does_not_leak_private_key() {
        let identity = test_support::identity(0);
        let debug_output = format!("{identity:?}");
        assert!(debug_output.contains(identity.key_id.as_str()));
        assert!(!debug_output.contains("private"));
    }

    #[test]
    fn from_parts_roundtrip() {
        let identity = test_support::identity(3);
        let rebuilt = KeyPair::from_parts(
            identity.public_key.clone(),
            identity.private_key().clone(),
            identity.key_id.clone(),
            identity.created_at,
        );
        assert_eq!(rebuilt.public_key, identity.public_key);
        assert_eq!(rebuilt.private_key(), identity.private_key());
    }
}
