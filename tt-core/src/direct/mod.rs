//! Hybrid encryption for 1:1 messages (protocol `tt-e1`).
//!
//! # Architecture
//!
//! ```text
//! plaintext ──AES-256-GCM(fresh key, fresh nonce)──► data
//! fresh key ──RSA-OAEP-SHA256(recipient public key)──► key
//!                          nonce ──────────────────► iv
//! ```
//!
//! # Security
//!
//! - Fresh symmetric key and nonce for every message
//! - Every decryption failure is reported as the same
//!   [`CryptoError::DecryptionFailed`](crate::CryptoError::DecryptionFailed)
//! - No forward secrecy: each message key is wrapped under the recipient's
//!   long-term key, so compromise of that key exposes all past messages.
//!   This is a property of `tt-e1` and changes only with a new protocol version.

mod cipher;
mod message;

pub use cipher::MessageCipher;
pub use message::EncryptedMessage;
