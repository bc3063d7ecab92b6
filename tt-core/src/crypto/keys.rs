//! Key material types.
//!
//! # Security
//!
//! - [`PrivateKey`] and [`SymmetricKey`] are zeroized on drop
//! - Debug output never includes secret material
//! - Secret comparisons are constant-time

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use subtle::ConstantTimeEq;
use zeroize::{ZeroizeOnDrop, Zeroizing};

use super::encoding;
use super::error::{CryptoError, Result};
use super::provider::CryptoProvider;

/// Size of a symmetric (AES-256) key in bytes.
pub const SYMMETRIC_KEY_SIZE: usize = 32;

/// Size of an AES-GCM nonce in bytes (96 bits).
pub const NONCE_SIZE: usize = 12;

/// Random bytes behind a generated [`KeyId`] (128 bits).
const KEY_ID_SIZE: usize = 16;

/// Identifier for an identity key or a shared group key.
///
/// Generated ids are 32 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyId(String);

impl KeyId {
    /// Generates a random key id.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::CryptoUnavailable`] if the provider cannot
    /// produce random bytes.
    pub fn generate(provider: &dyn CryptoProvider) -> Result<Self> {
        let mut bytes = [0u8; KEY_ID_SIZE];
        provider.random_bytes(&mut bytes)?;
        Ok(Self(hex::encode(bytes)))
    }

    /// Wraps an existing identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for KeyId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// An asymmetric public key (DER-encoded `SubjectPublicKeyInfo`).
///
/// Serializes as a base64 string.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PublicKey(Vec<u8>);

impl PublicKey {
    /// Wraps DER-encoded `SubjectPublicKeyInfo` bytes.
    #[must_use]
    pub const fn from_der(der: Vec<u8>) -> Self {
        Self(der)
    }

    /// Returns the DER bytes.
    #[must_use]
    pub fn as_der(&self) -> &[u8] {
        &self.0
    }

    /// Encodes the key as base64.
    #[must_use]
    pub fn to_base64(&self) -> String {
        encoding::encode(&self.0)
    }

    /// Decodes a base64 public key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Validation`] if `text` is not valid base64.
    pub fn from_base64(text: &str) -> Result<Self> {
        encoding::decode(text)
            .map(Self)
            .map_err(|e| CryptoError::Validation(format!("invalid public key encoding: {e}")))
    }

    /// Returns the SHA-256 fingerprint of the key as lowercase hex.
    ///
    /// Users compare fingerprints out of band to verify a contact's key.
    #[must_use]
    pub fn fingerprint(&self, provider: &dyn CryptoProvider) -> String {
        hex::encode(provider.digest(&self.0))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("der_len", &self.0.len())
            .finish()
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        encoding::decode(&text)
            .map(Self)
            .map_err(serde::de::Error::custom)
    }
}

/// An asymmetric private key (DER-encoded PKCS#8).
///
/// Never serialized by this crate except inside an encrypted backup.
/// The bytes are zeroized on drop.
#[derive(Clone, ZeroizeOnDrop)]
pub struct PrivateKey(Vec<u8>);

impl PrivateKey {
    /// Wraps DER-encoded PKCS#8 bytes.
    #[must_use]
    pub const fn from_der(der: Vec<u8>) -> Self {
        Self(der)
    }

    /// Returns the DER bytes.
    ///
    /// # Security Warning
    ///
    /// Exposes secret material. Only pass to a provider or secure storage.
    #[must_use]
    pub fn as_der(&self) -> &[u8] {
        &self.0
    }

    /// Encodes the key as base64, wrapped in `Zeroizing`.
    #[must_use]
    pub fn to_base64(&self) -> Zeroizing<String> {
        Zeroizing::new(encoding::encode(&self.0))
    }

    /// Decodes a base64 private key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Validation`] if `text` is not valid base64.
    pub fn from_base64(text: &str) -> Result<Self> {
        encoding::decode(text)
            .map(Self)
            .map_err(|_| CryptoError::Validation("invalid private key encoding".to_string()))
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_slice().ct_eq(other.0.as_slice()).into()
    }
}

impl Eq for PrivateKey {}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the secret key
        f.write_str("PrivateKey(<redacted>)")
    }
}

/// A 256-bit symmetric key.
///
/// Used both as the ephemeral per-message key of direct messages and as the
/// shared key of a group conversation. Zeroized on drop.
#[derive(Clone, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; SYMMETRIC_KEY_SIZE]);

impl SymmetricKey {
    /// Generates a fresh random key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::CryptoUnavailable`] if the provider cannot
    /// produce random bytes.
    pub fn generate(provider: &dyn CryptoProvider) -> Result<Self> {
        let mut bytes = Zeroizing::new([0u8; SYMMETRIC_KEY_SIZE]);
        provider.random_bytes(&mut bytes[..])?;
        Ok(Self(*bytes))
    }

    /// Creates a key from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; SYMMETRIC_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Creates a key from an unwrapped byte slice.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::DecryptionFailed`] if the slice is not exactly
    /// 32 bytes; a wrong length only ever comes from a bad unwrap.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let array: [u8; SYMMETRIC_KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| CryptoError::DecryptionFailed)?;
        Ok(Self(array))
    }

    /// Returns the raw key bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; SYMMETRIC_KEY_SIZE] {
        &self.0
    }
}

impl PartialEq for SymmetricKey {
    fn eq(&self, other: &Self) -> bool {
        self.0[..].ct_eq(&other.0[..]).into()
    }
}

impl Eq for SymmetricKey {}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(<redacted>)")
    }
}
