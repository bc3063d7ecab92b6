//! Reusable helpers for integration tests.
//!
//! RSA-2048 generation is slow, so every test binary generates a small pool
//! of identities once and shares it between tests. Each `Client` simulates a
//! separate device with its own `TtCore` and key cache.

#![allow(dead_code)] // Not every test binary uses every helper.

use std::sync::{Arc, OnceLock};

use tt_core::expiry::RecordingSink;
use tt_core::identity::{IdentityKeyManager, KeyPair, MemoryDirectory};
use tt_core::{BackupConfig, CoreConfig, CryptoProvider, RustCryptoProvider, TtCore};

/// Users backed by the identity pool, in pool order.
pub const USERS: [&str; 4] = ["alice", "bob", "carol", "dave"];

static IDENTITIES: OnceLock<Vec<KeyPair>> = OnceLock::new();

pub fn provider() -> Arc<dyn CryptoProvider> {
    Arc::new(RustCryptoProvider::new())
}

/// Returns the pooled identity of one of [`USERS`].
pub fn identity(user: &str) -> &'static KeyPair {
    let pool = IDENTITIES.get_or_init(|| {
        let manager = IdentityKeyManager::new(provider());
        USERS
            .iter()
            .map(|_| manager.generate_identity().expect("key generation should succeed"))
            .collect()
    });
    let index = USERS
        .iter()
        .position(|name| *name == user)
        .expect("user should be in the identity pool");
    &pool[index]
}

/// Directory with every pooled user published.
pub fn directory() -> MemoryDirectory {
    let directory = MemoryDirectory::new();
    for user in USERS {
        directory
            .publish(user, identity(user).published())
            .expect("publish should succeed");
    }
    directory
}

/// Settings with a cheap KDF so backup tests stay fast.
pub fn fast_config() -> CoreConfig {
    CoreConfig {
        backup: BackupConfig::default().with_iterations(1_000),
    }
}

/// One simulated device.
pub struct Client {
    pub user: &'static str,
    pub core: TtCore,
    pub sink: Arc<RecordingSink>,
}

impl Client {
    pub fn new(user: &'static str) -> Self {
        let sink = Arc::new(RecordingSink::new());
        let core = TtCore::new(provider(), sink.clone(), fast_config())
            .expect("core should initialize");
        Self { user, core, sink }
    }

    pub fn key_pair(&self) -> &'static KeyPair {
        identity(self.user)
    }
}
