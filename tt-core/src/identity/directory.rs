//! Public key directory collaborator.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::crypto::{CryptoError, KeyId, PublicKey, Result};

/// A user's published public key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedKey {
    /// The identity public key.
    pub public_key: PublicKey,
    /// Identifier of the identity key.
    pub key_id: KeyId,
}

/// Remote directory mapping user ids to published public keys.
///
/// Consumed by the engine before encrypting for a recipient; implemented by
/// the application on top of its document store.
#[async_trait]
pub trait PublicKeyDirectory: Send + Sync {
    /// Looks up the published key of `user_id`.
    ///
    /// # Returns
    ///
    /// `Ok(None)` if the user has not published a key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Storage`] if the lookup itself fails.
    async fn get(&self, user_id: &str) -> Result<Option<PublishedKey>>;

    /// Looks up the published key of `user_id`, treating absence as an error.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyNotFound`] if the user has no published key.
    async fn require(&self, user_id: &str) -> Result<PublishedKey> {
        self.get(user_id)
            .await?
            .ok_or_else(|| CryptoError::KeyNotFound(format!("no published key for {user_id}")))
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use memory::MemoryDirectory;

#[cfg(any(test, feature = "test-utils"))]
mod memory {
    use std::collections::HashMap;
    use std::sync::RwLock;

    use async_trait::async_trait;

    use super::{PublicKeyDirectory, PublishedKey};
    use crate::crypto::{CryptoError, Result};

    /// In-memory directory for testing.
    #[derive(Debug, Default)]
    pub struct MemoryDirectory {
        entries: RwLock<HashMap<String, PublishedKey>>,
    }

    impl MemoryDirectory {
        /// Creates an empty directory.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Publishes (or replaces) the key of `user_id`.
        ///
        /// # Errors
        ///
        /// Returns [`CryptoError::Storage`] if the lock is poisoned.
        pub fn publish(&self, user_id: &str, key: PublishedKey) -> Result<()> {
            let mut entries = self
                .entries
                .write()
                .map_err(|e| CryptoError::Storage(e.to_string()))?;
            entries.insert(user_id.to_string(), key);
            Ok(())
        }
    }

    #[async_trait]
    impl PublicKeyDirectory for MemoryDirectory {
        async fn get(&self, user_id: &str) -> Result<Option<PublishedKey>> {
            let entries = self
                .entries
                .read()
                .map_err(|e| CryptoError::Storage(e.to_string()))?;
            Ok(entries.get(user_id).cloned())
        }
    }
}
