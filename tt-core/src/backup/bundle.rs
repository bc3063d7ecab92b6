//! Backup bundle file format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::{CryptoError, Result};

/// Version written into new bundles and the only one accepted on import.
pub const BACKUP_VERSION: &str = "1.0";

/// Algorithm descriptor written into new bundles.
pub const BACKUP_ALGORITHM: &str = "PBKDF2-SHA256/AES-256-GCM";

/// A self-describing encrypted backup of private keys.
///
/// ```text
/// {
///   "version": "1.0",
///   "algorithm": "PBKDF2-SHA256/AES-256-GCM",
///   "iterations": 100000,
///   "salt": "<base64 32 bytes>",
///   "iv": "<base64 12 bytes>",
///   "ciphertext": "<base64>",
///   "exportedAt": "<RFC 3339>"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedKeyBundle {
    pub version: String,
    pub algorithm: String,
    /// PBKDF2 iterations used when the bundle was exported.
    pub iterations: u32,
    pub salt: String,
    pub iv: String,
    /// Empty when absent from the source JSON; rejected on import.
    #[serde(default)]
    pub ciphertext: String,
    pub exported_at: DateTime<Utc>,
}

impl EncryptedKeyBundle {
    /// Serializes the bundle for writing to a backup file.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Validation`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| CryptoError::Validation(e.to_string()))
    }

    /// Parses a bundle read from a backup file.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Validation`] if the JSON is not a backup bundle.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| CryptoError::Validation(format!("malformed backup bundle: {e}")))
    }
}
