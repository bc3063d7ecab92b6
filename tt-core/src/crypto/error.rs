//! Error types for the encryption engine.

use thiserror::Error;

/// Errors that can occur in key management, encryption and backup operations.
///
/// The set is closed so callers can match exhaustively. Decryption failures
/// deliberately carry no detail: a caller must not be able to tell which
/// step (unwrap, authentication, decoding) rejected the payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// The platform cannot provide cryptographic primitives.
    #[error("Cryptography unavailable: {0}")]
    CryptoUnavailable(String),

    /// Caller-supplied input is invalid.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unwrap or authenticated decryption failed.
    #[error("Decryption failed")]
    DecryptionFailed,

    /// Backup bundle version is not supported.
    #[error("Unsupported backup version: {0}")]
    UnsupportedVersion(String),

    /// Message payload version is not supported.
    #[error("Unsupported message version: {0}")]
    UnsupportedMessageVersion(String),

    /// No private key or cached group key is available.
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// Backup could not be opened with the given password.
    #[error("Invalid password or corrupt backup")]
    InvalidPasswordOrCorruptBundle,

    /// A collaborator (key store, key directory) reported a failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl CryptoError {
    /// Returns whether repeating the same operation with the same inputs can
    /// succeed.
    ///
    /// Decryption and backup failures are permanent for a given key or
    /// password; only collaborator failures are transient.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, CryptoError>;
