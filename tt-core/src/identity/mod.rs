//! Long-term identity keys.
//!
//! Each user owns one [`KeyPair`] for the lifetime of the account. The public
//! half is published through a [`PublicKeyDirectory`]; the private half stays
//! on the device in a [`SecureKeyStore`] and is never sent anywhere.
//!
//! # Architecture
//!
//! ```text
//! IdentityKeyManager::generate_identity()
//!        │
//!        ├── public_key ──► PublicKeyDirectory (remote, caller-owned)
//!        │
//!        └── private_key ─► SecureKeyStore (local only)
//! ```

mod directory;
mod keypair;
mod storage;

pub use directory::{PublicKeyDirectory, PublishedKey};
pub use keypair::{IdentityKeyManager, KeyPair};
pub use storage::SecureKeyStore;

#[cfg(any(test, feature = "test-utils"))]
pub use directory::MemoryDirectory;
#[cfg(any(test, feature = "test-utils"))]
pub use storage::MemoryKeyStore;
