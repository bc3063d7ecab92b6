//! Cryptographic building blocks shared by every component.
//!
//! All primitives are reached through the [`CryptoProvider`] trait so the
//! algorithms in this crate run unchanged on every platform; only the
//! provider adapter differs.
//!
//! # Algorithms
//!
//! | Purpose | Algorithm |
//! |---------|-----------|
//! | Identity keys, key wrapping | RSA-2048, OAEP with SHA-256 |
//! | Message encryption | AES-256-GCM, 96-bit nonce |
//! | Password-based key derivation | PBKDF2-HMAC-SHA256 |
//! | Fingerprints | SHA-256 |
//!
//! # Wire encoding
//!
//! Binary fields in every payload are standard base64 with padding.

pub mod encoding;
mod error;
mod keys;
mod provider;
mod rustcrypto;

pub use error::{CryptoError, Result};
pub use keys::{KeyId, PrivateKey, PublicKey, SymmetricKey, NONCE_SIZE, SYMMETRIC_KEY_SIZE};
pub use provider::CryptoProvider;
pub use rustcrypto::{RustCryptoProvider, RSA_MODULUS_BITS};

/// Protocol version carried by every direct and group payload.
pub const PROTOCOL_VERSION: &str = "tt-e1";

/// Rejects payloads whose version is not [`PROTOCOL_VERSION`].
///
/// # Errors
///
/// Returns [`CryptoError::UnsupportedMessageVersion`] on mismatch.
pub fn ensure_protocol_version(version: &str) -> Result<()> {
    if version == PROTOCOL_VERSION {
        Ok(())
    } else {
        Err(CryptoError::UnsupportedMessageVersion(version.to_string()))
    }
}

/// Generates a fresh random AEAD nonce.
pub(crate) fn fresh_nonce(provider: &dyn CryptoProvider) -> Result<[u8; NONCE_SIZE]> {
    let mut nonce = [0u8; NONCE_SIZE];
    provider.random_bytes(&mut nonce)?;
    Ok(nonce)
}

/// Decodes a base64 nonce, mapping any problem to a generic decryption failure.
pub(crate) fn decode_nonce(iv: &str) -> Result<[u8; NONCE_SIZE]> {
    let bytes = encoding::decode(iv).map_err(|_| CryptoError::DecryptionFailed)?;
    bytes
        .try_into()
        .map_err(|_| CryptoError::DecryptionFailed)
}
