//! Sender-keys group encryption.
//!
//! One shared symmetric key per conversation is wrapped once for every member
//! ([`GroupKeyBundle`]) and then reused for many messages ([`GroupCipher`]).
//!
//! # Key Lifecycle
//!
//! ```text
//! create_bundle(members) ──► bundle{keyId, member → wrapped key}
//!        │                         │
//!        │ add_member(key, pk)     │ decrypt_bundle_entry(entry, sk)
//!        ▼                         ▼
//!   same key, one more entry    SymmetricKey ──► KeyCache[conversation][keyId]
//!
//! remove member ──► rotate(remaining) ──► new keyId, new key, no entry for removed
//! ```
//!
//! # Security
//!
//! - Adding a member does not rotate: the new member can read every message
//!   encrypted under the current key, including earlier ones, unless the
//!   caller withholds history.
//! - Removing a member MUST rotate in the same operation. An unrotated key
//!   stays readable by the removed member for all future messages.
//!   [`GroupKeyManager::remove_member`] does both in one call.
//! - The previous bundle is kept by the caller only to read older messages and
//!   must never be handed to an excluded member.

mod bundle;
mod cache;
mod cipher;

pub use bundle::{GroupKeyBundle, GroupKeyManager, GroupKeyResult};
pub use cache::KeyCache;
pub use cipher::{GroupCipher, GroupEncryptedMessage};
