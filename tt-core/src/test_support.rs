//! Shared fixtures for unit tests.
//!
//! RSA-2048 generation is slow, so a small pool of identities is generated
//! once per test binary and shared.

use std::sync::{Arc, OnceLock};

use crate::crypto::{CryptoProvider, RustCryptoProvider};
use crate::identity::{IdentityKeyManager, KeyPair};

const IDENTITY_POOL_SIZE: usize = 4;

static IDENTITIES: OnceLock<Vec<KeyPair>> = OnceLock::new();

pub fn provider() -> Arc<dyn CryptoProvider> {
    Arc::new(RustCryptoProvider::new())
}

/// Returns the pooled identity at `index` (0..4).
pub fn identity(index: usize) -> &'static KeyPair {
    let pool = IDENTITIES.get_or_init(|| {
        let manager = IdentityKeyManager::new(provider());
        (0..IDENTITY_POOL_SIZE)
            .map(|_| manager.generate_identity().expect("key generation must succeed"))
            .collect()
    });
    &pool[index]
}
