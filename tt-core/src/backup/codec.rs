//! Backup export and import.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use zeroize::Zeroizing;

use super::bundle::{EncryptedKeyBundle, BACKUP_ALGORITHM, BACKUP_VERSION};
use crate::config::{BackupConfig, MAX_BACKUP_ITERATIONS, MIN_BACKUP_ITERATIONS};
use crate::crypto::{
    decode_nonce, encoding, fresh_nonce, CryptoError, CryptoProvider, KeyId, PrivateKey, Result,
};

/// Salt length for new bundles, in bytes.
const SALT_SIZE: usize = 32;

/// Encrypts private keys under a password for offline backup.
#[derive(Clone)]
pub struct BackupCodec {
    provider: Arc<dyn CryptoProvider>,
    config: BackupConfig,
}

impl BackupCodec {
    /// Creates a codec using the given provider and settings.
    #[must_use]
    pub fn new(provider: Arc<dyn CryptoProvider>, config: BackupConfig) -> Self {
        Self { provider, config }
    }

    /// Returns the settings used for new exports.
    #[must_use]
    pub const fn config(&self) -> &BackupConfig {
        &self.config
    }

    /// Encrypts `private_keys` under `password`.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::Validation`] if the password is shorter than the
    ///   configured minimum (never less than 8 characters), or the configured
    ///   iteration count is below 1,000
    /// - [`CryptoError::CryptoUnavailable`] if randomness or encryption fails
    pub fn export(&self, private_keys: &BTreeMap<KeyId, PrivateKey>, password: &str) -> Result<EncryptedKeyBundle> {
        let min_password_len = self.config.effective_min_password_len();
        if password.chars().count() < min_password_len {
            return Err(CryptoError::Validation(format!(
                "backup password must be at least {min_password_len} characters"
            )));
        }
        if self.config.iterations < MIN_BACKUP_ITERATIONS {
            return Err(CryptoError::Validation(format!(
                "backup iterations must be at least {MIN_BACKUP_ITERATIONS}"
            )));
        }

        let provider = self.provider.as_ref();
        let mut salt = [0u8; SALT_SIZE];
        provider.random_bytes(&mut salt)?;
        let nonce = fresh_nonce(provider)?;

        let plaintext = encode_key_map(private_keys)?;
        let backup_key = provider.derive_key(password.as_bytes(), &salt, self.config.iterations)?;
        let ciphertext = provider.aead_seal(&backup_key, &nonce, plaintext.as_bytes())?;

        tracing::debug!(
            keys = private_keys.len(),
            iterations = self.config.iterations,
            "exported key backup"
        );

        Ok(EncryptedKeyBundle {
            version: BACKUP_VERSION.to_string(),
            algorithm: BACKUP_ALGORITHM.to_string(),
            iterations: self.config.iterations,
            salt: encoding::encode(salt),
            iv: encoding::encode(nonce),
            ciphertext: encoding::encode(ciphertext),
            exported_at: Utc::now(),
        })
    }

    /// Decrypts a bundle with `password`, using the bundle's own salt and
    /// iteration count.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::Validation`] if the ciphertext or password is empty,
    ///   or the iteration count is zero or above 10,000,000
    /// - [`CryptoError::UnsupportedVersion`] if the bundle version is not `1.0`
    /// - [`CryptoError::InvalidPasswordOrCorruptBundle`] for every other failure
    pub fn import(&self, bundle: &EncryptedKeyBundle, password: &str) -> Result<BTreeMap<KeyId, PrivateKey>> {
        if bundle.ciphertext.is_empty() {
            return Err(CryptoError::Validation("backup bundle has no ciphertext".to_string()));
        }
        if password.is_empty() {
            return Err(CryptoError::Validation("backup password is empty".to_string()));
        }
        if bundle.version != BACKUP_VERSION {
            return Err(CryptoError::UnsupportedVersion(bundle.version.clone()));
        }
        if bundle.iterations == 0 {
            return Err(CryptoError::Validation(
                "backup bundle has zero iterations".to_string(),
            ));
        }
        if bundle.iterations > MAX_BACKUP_ITERATIONS {
            return Err(CryptoError::Validation(format!(
                "backup bundle iterations {} exceed {MAX_BACKUP_ITERATIONS}",
                bundle.iterations
            )));
        }

        let keys = self
            .open(bundle, password)
            .map_err(|_| CryptoError::InvalidPasswordOrCorruptBundle)?;

        tracing::debug!(keys = keys.len(), "imported key backup");
        Ok(keys)
    }

    fn open(&self, bundle: &EncryptedKeyBundle, password: &str) -> Result<BTreeMap<KeyId, PrivateKey>> {
        let provider = self.provider.as_ref();
        let salt = encoding::decode(&bundle.salt).map_err(|_| CryptoError::DecryptionFailed)?;
        let nonce = decode_nonce(&bundle.iv)?;
        let ciphertext =
            encoding::decode(&bundle.ciphertext).map_err(|_| CryptoError::DecryptionFailed)?;

        let backup_key = provider.derive_key(password.as_bytes(), &salt, bundle.iterations)?;
        let plaintext = provider.aead_open(&backup_key, &nonce, &ciphertext)?;
        decode_key_map(&plaintext)
    }
}

/// Canonical plaintext: a JSON object sorted by key id, values base64 PKCS#8.
fn encode_key_map(private_keys: &BTreeMap<KeyId, PrivateKey>) -> Result<Zeroizing<String>> {
    let encoded: Vec<(&str, Zeroizing<String>)> = private_keys
        .iter()
        .map(|(key_id, key)| (key_id.as_str(), key.to_base64()))
        .collect();
    let map: BTreeMap<&str, &str> = encoded
        .iter()
        .map(|(key_id, key)| (*key_id, key.as_str()))
        .collect();

    serde_json::to_string(&map)
        .map(Zeroizing::new)
        .map_err(|e| CryptoError::CryptoUnavailable(format!("backup encoding failed: {e}")))
}

fn decode_key_map(plaintext: &[u8]) -> Result<BTreeMap<KeyId, PrivateKey>> {
    let map: BTreeMap<String, Zeroizing<String>> = serde_json::from_slice::<BTreeMap<String, String>>(plaintext)
        .map_err(|_| CryptoError::DecryptionFailed)?
        .into_iter()
        .map(|(key_id, key)| (key_id, Zeroizing::new(key)))
        .collect();

    map.iter()
        .map(|(key_id, key)| Ok((KeyId::new(key_id.as_str()), PrivateKey::from_base64(key)?)))
        .collect()
}

impl std::fmt::Debug for BackupCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackupCodec")
            .field("provider", &self.provider.name())
            .field("config", &self.config)
            .finish()
    }
}
