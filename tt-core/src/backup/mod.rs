//! Password-protected export and import of private keys.
//!
//! ```text
//! password ──PBKDF2-HMAC-SHA256(salt, iterations)──► backup key
//! {keyId: PKCS#8 base64, ...} ──AES-256-GCM(backup key, iv)──► ciphertext
//! ```
//!
//! Bundles carry their own KDF parameters so that raising the default
//! iteration count never breaks older backups.

mod bundle;
mod codec;

pub use bundle::{EncryptedKeyBundle, BACKUP_ALGORITHM, BACKUP_VERSION};
pub use codec::BackupCodec;
