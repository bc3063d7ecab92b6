//! Default [`CryptoProvider`] backed by the `RustCrypto` crates.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use super::error::{CryptoError, Result};
use super::keys::{PrivateKey, PublicKey, NONCE_SIZE, SYMMETRIC_KEY_SIZE};
use super::provider::CryptoProvider;

/// RSA modulus size for identity keys.
pub const RSA_MODULUS_BITS: usize = 2048;

/// Provider using RSA-OAEP-SHA256, AES-256-GCM, SHA-256 and
/// PBKDF2-HMAC-SHA256 from the `RustCrypto` project, with the operating
/// system's random number generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustCryptoProvider;

impl RustCryptoProvider {
    /// Creates the provider.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn oaep() -> Oaep {
    Oaep::new::<Sha256>()
}

impl CryptoProvider for RustCryptoProvider {
    fn name(&self) -> &'static str {
        "rustcrypto"
    }

    fn random_bytes(&self, buf: &mut [u8]) -> Result<()> {
        OsRng
            .try_fill_bytes(buf)
            .map_err(|e| CryptoError::CryptoUnavailable(format!("secure random source failed: {e}")))
    }

    fn generate_key_pair(&self) -> Result<(PublicKey, PrivateKey)> {
        let private_key = RsaPrivateKey::new(&mut OsRng, RSA_MODULUS_BITS)
            .map_err(|e| CryptoError::CryptoUnavailable(format!("RSA key generation failed: {e}")))?;

        let public_der = private_key
            .to_public_key()
            .to_public_key_der()
            .map_err(|e| CryptoError::CryptoUnavailable(format!("public key encoding failed: {e}")))?;
        let private_der = private_key
            .to_pkcs8_der()
            .map_err(|e| CryptoError::CryptoUnavailable(format!("private key encoding failed: {e}")))?;

        Ok((
            PublicKey::from_der(public_der.as_bytes().to_vec()),
            PrivateKey::from_der(private_der.as_bytes().to_vec()),
        ))
    }

    fn public_key_from_private(&self, private_key: &PrivateKey) -> Result<PublicKey> {
        let private_key = RsaPrivateKey::from_pkcs8_der(private_key.as_der())
            .map_err(|_| CryptoError::Validation("invalid private key".to_string()))?;
        let public_der = private_key
            .to_public_key()
            .to_public_key_der()
            .map_err(|e| CryptoError::Validation(format!("public key encoding failed: {e}")))?;
        Ok(PublicKey::from_der(public_der.as_bytes().to_vec()))
    }

    fn wrap_key(&self, public_key: &PublicKey, key: &[u8]) -> Result<Vec<u8>> {
        let public_key = RsaPublicKey::from_public_key_der(public_key.as_der())
            .map_err(|e| CryptoError::Validation(format!("invalid public key: {e}")))?;
        public_key
            .encrypt(&mut OsRng, oaep(), key)
            .map_err(|e| CryptoError::Validation(format!("key wrap failed: {e}")))
    }

    fn unwrap_key(&self, private_key: &PrivateKey, wrapped: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let private_key = RsaPrivateKey::from_pkcs8_der(private_key.as_der())
            .map_err(|_| CryptoError::DecryptionFailed)?;
        private_key
            .decrypt(oaep(), wrapped)
            .map(Zeroizing::new)
            .map_err(|_| CryptoError::DecryptionFailed)
    }

    fn aead_seal(
        &self,
        key: &[u8; SYMMETRIC_KEY_SIZE],
        nonce: &[u8; NONCE_SIZE],
        plaintext: &[u8],
    ) -> Result<Vec<u8>> {
        let cipher = Aes256Gcm::new(key.into());
        cipher
            .encrypt(Nonce::from_slice(nonce), plaintext)
            .map_err(|_| CryptoError::CryptoUnavailable("AES-GCM encryption failed".to_string()))
    }

    fn aead_open(
        &self,
        key: &[u8; SYMMETRIC_KEY_SIZE],
        nonce: &[u8; NONCE_SIZE],
        ciphertext: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>> {
        let cipher = Aes256Gcm::new(key.into());
        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map(Zeroizing::new)
            .map_err(|_| CryptoError::DecryptionFailed)
    }

    fn digest(&self, data: &[u8]) -> [u8; 32] {
        Sha256::digest(data).into()
    }

    fn derive_key(
        &self,
        password: &[u8],
        salt: &[u8],
        iterations: u32,
    ) -> Result<Zeroizing<[u8; SYMMETRIC_KEY_SIZE]>> {
        if iterations == 0 {
            return Err(CryptoError::Validation(
                "KDF iterations must be positive".to_string(),
            ));
        }

        let mut key = Zeroizing::new([0u8; SYMMETRIC_KEY_SIZE]);
        pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut key[..]);
        Ok(key)
    }
}
