//! TT Core Library
//!
//! Client-side end-to-end encryption engine for TT chat. Everything this
//! crate produces is an opaque payload that the backend stores and relays
//! without ever seeing plaintext.
//!
//! # Modules
//!
//! - [`crypto`]: injectable primitives ([`CryptoProvider`]), key types, errors
//! - [`identity`]: long-term identity key pairs and key storage/directory traits
//! - [`direct`]: hybrid encryption for 1:1 messages
//! - [`group`]: sender-keys group encryption with rotation on removal
//! - [`backup`]: password-protected private key export/import
//! - [`expiry`]: per-message TTL timers and best-effort deletion
//!
//! [`TtCore`] wires these together behind one owned object.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![deny(unsafe_code)]

mod api;
pub mod backup;
pub mod config;
pub mod crypto;
pub mod direct;
pub mod expiry;
pub mod group;
pub mod identity;

#[cfg(test)]
pub(crate) mod test_support;

pub use api::TtCore;
pub use config::{BackupConfig, CoreConfig};
pub use crypto::{
    CryptoError, CryptoProvider, KeyId, PrivateKey, PublicKey, Result, RustCryptoProvider,
    SymmetricKey, PROTOCOL_VERSION,
};
