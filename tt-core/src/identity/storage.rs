//! Secure storage abstraction for identity private keys.
//!
//! This module defines the [`SecureKeyStore`] trait for platform-agnostic
//! local persistence of private keys. Implementations are provided by the
//! platform layer (Keychain, Keystore, encrypted browser storage).
//!
//! # Security
//!
//! - Private keys are stored locally only; never synchronized remotely
//! - Implementations should use OS-level secure storage

use crate::crypto::{PrivateKey, Result};

/// Local, device-only storage of identity private keys, keyed by user id.
///
/// Failures are reported as [`CryptoError::Storage`](crate::CryptoError::Storage).
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow use across threads.
///
/// # Example
///
/// ```ignore
/// use tt_core::identity::SecureKeyStore;
///
/// struct PlatformStore { /* ... */ }
///
/// impl SecureKeyStore for PlatformStore {
///     fn get(&self, user_id: &str) -> Result<Option<PrivateKey>> {
///         // Read from platform secure storage
///     }
///     // ... other methods
/// }
/// ```
pub trait SecureKeyStore: Send + Sync {
    /// Retrieves the private key for `user_id`.
    ///
    /// # Returns
    ///
    /// `Ok(Some(key))` if found, `Ok(None)` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the retrieval operation fails.
    fn get(&self, user_id: &str) -> Result<Option<PrivateKey>>;

    /// Stores the private key for `user_id`, replacing any existing key.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn put(&self, user_id: &str, private_key: &PrivateKey) -> Result<()>;

    /// Deletes the private key for `user_id`. Deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the deletion fails.
    fn delete(&self, user_id: &str) -> Result<()>;

    /// Checks whether a private key exists for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the check fails.
    fn contains(&self, user_id: &str) -> Result<bool> {
        Ok(self.get(user_id)?.is_some())
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use memory::MemoryKeyStore;

#[cfg(any(test, feature = "test-utils"))]
mod memory {
    use std::collections::HashMap;
    use std::sync::RwLock;

    use super::SecureKeyStore;
    use crate::crypto::{CryptoError, PrivateKey, Result};

    /// In-memory key store for testing.
    ///
    /// This implementation is NOT secure and should only be used in tests.
    #[derive(Debug, Default)]
    pub struct MemoryKeyStore {
        keys: RwLock<HashMap<String, PrivateKey>>,
    }

    impl MemoryKeyStore {
        /// Creates a new empty store.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl SecureKeyStore for MemoryKeyStore {
        fn get(&self, user_id: &str) -> Result<Option<PrivateKey>> {
            let keys = self
                .keys
                .read()
                .map_err(|e| CryptoError::Storage(e.to_string()))?;
            Ok(keys.get(user_id).cloned())
        }

        fn put(&self, user_id: &str, private_key: &PrivateKey) -> Result<()> {
            let mut keys = self
                .keys
                .write()
                .map_err(|e| CryptoError::Storage(e.to_string()))?;
            keys.insert(user_id.to_string(), private_key.clone());
            Ok(())
        }

        fn delete(&self, user_id: &str) -> Result<()> {
            let mut keys = self
                .keys
                .write()
                .map_err(|e| CryptoError::Storage(e.to_string()))?;
            keys.remove(user_id);
            Ok(())
        }
    }
}
