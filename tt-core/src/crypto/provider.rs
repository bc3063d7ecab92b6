//! Injectable cryptographic capability.
//!
//! This module defines the [`CryptoProvider`] trait, the only place the
//! engine touches raw primitives. The algorithms in [`crate::direct`],
//! [`crate::group`] and [`crate::backup`] are written once against this trait;
//! each platform supplies an adapter.
//!
//! # Security
//!
//! - Implementations must use a cryptographically secure random source
//! - Unwrap and AEAD-open failures must be reported as
//!   [`CryptoError::DecryptionFailed`](super::CryptoError::DecryptionFailed)
//!   without further detail

use zeroize::Zeroizing;

use super::error::Result;
use super::keys::{PrivateKey, PublicKey, NONCE_SIZE, SYMMETRIC_KEY_SIZE};

/// Platform capability for key generation, key wrapping, AEAD, digest, KDF
/// and randomness.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the engine shares one provider
/// across all components and concurrent calls.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use tt_core::crypto::{CryptoProvider, RustCryptoProvider};
///
/// let provider: Arc<dyn CryptoProvider> = Arc::new(RustCryptoProvider::new());
/// let mut salt = [0u8; 32];
/// provider.random_bytes(&mut salt)?;
/// ```
pub trait CryptoProvider: Send + Sync {
    /// Human-readable adapter name, used in logs.
    fn name(&self) -> &'static str;

    /// Fills `buf` with cryptographically secure random bytes.
    ///
    /// # Errors
    ///
    /// Returns `CryptoUnavailable` if no secure random source exists.
    fn random_bytes(&self, buf: &mut [u8]) -> Result<()>;

    /// Generates a long-term asymmetric key pair suitable for key wrapping.
    ///
    /// # Errors
    ///
    /// Returns `CryptoUnavailable` if key generation is not possible.
    fn generate_key_pair(&self) -> Result<(PublicKey, PrivateKey)>;

    /// Derives the public half of a private key.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the private key cannot be parsed.
    fn public_key_from_private(&self, private_key: &PrivateKey) -> Result<PublicKey>;

    /// Encrypts raw key bytes under a recipient's public key.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the public key cannot be parsed.
    fn wrap_key(&self, public_key: &PublicKey, key: &[u8]) -> Result<Vec<u8>>;

    /// Decrypts key bytes previously produced by [`Self::wrap_key`].
    ///
    /// # Errors
    ///
    /// Returns `DecryptionFailed` for any failure, including an unparsable
    /// private key.
    fn unwrap_key(&self, private_key: &PrivateKey, wrapped: &[u8]) -> Result<Zeroizing<Vec<u8>>>;

    /// Authenticated encryption; the returned bytes are ciphertext followed by
    /// the authentication tag.
    ///
    /// # Errors
    ///
    /// Returns `CryptoUnavailable` if the cipher cannot be constructed.
    fn aead_seal(
        &self,
        key: &[u8; SYMMETRIC_KEY_SIZE],
        nonce: &[u8; NONCE_SIZE],
        plaintext: &[u8],
    ) -> Result<Vec<u8>>;

    /// Authenticated decryption of [`Self::aead_seal`] output.
    ///
    /// # Errors
    ///
    /// Returns `DecryptionFailed` if authentication fails.
    fn aead_open(
        &self,
        key: &[u8; SYMMETRIC_KEY_SIZE],
        nonce: &[u8; NONCE_SIZE],
        ciphertext: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>>;

    /// SHA-256 digest.
    fn digest(&self, data: &[u8]) -> [u8; 32];

    /// Derives a 256-bit key from a password with PBKDF2-HMAC-SHA256.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if `iterations` is zero.
    fn derive_key(
        &self,
        password: &[u8],
        salt: &[u8],
        iterations: u32,
    ) -> Result<Zeroizing<[u8; SYMMETRIC_KEY_SIZE]>>;
}
