//! Tunable parameters for the core.

use serde::{Deserialize, Serialize};

/// Default PBKDF2 iteration count for new backups.
pub const DEFAULT_BACKUP_ITERATIONS: u32 = 100_000;

/// Default minimum backup password length, in characters. Also the floor:
/// a lower configured value is ignored.
pub const DEFAULT_MIN_PASSWORD_LEN: usize = 8;

/// Lowest iteration count accepted for new exports.
pub const MIN_BACKUP_ITERATIONS: u32 = 1_000;

/// Highest iteration count accepted on import.
pub const MAX_BACKUP_ITERATIONS: u32 = 10_000_000;

/// Settings for key backup export.
///
/// Only affects new exports. Import always uses the parameters recorded in
/// the bundle itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupConfig {
    /// PBKDF2-HMAC-SHA256 iterations written into new bundles
    pub iterations: u32,

    /// Minimum password length in characters
    pub min_password_len: usize,
}

impl BackupConfig {
    /// Returns a copy with a different iteration count.
    ///
    /// Lower counts are only meant for tests.
    #[must_use]
    pub const fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    /// Password length actually enforced on export, never below
    /// [`DEFAULT_MIN_PASSWORD_LEN`].
    #[must_use]
    pub fn effective_min_password_len(&self) -> usize {
        self.min_password_len.max(DEFAULT_MIN_PASSWORD_LEN)
    }
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_BACKUP_ITERATIONS,
            min_password_len: DEFAULT_MIN_PASSWORD_LEN,
        }
    }
}

/// Top-level configuration consumed by [`TtCore`](crate::TtCore).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoreConfig {
    /// Key backup settings
    pub backup: BackupConfig,
}
