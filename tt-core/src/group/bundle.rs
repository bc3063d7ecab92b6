//! Group key bundles: creation, distribution and rotation.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::{
    encoding, CryptoError, CryptoProvider, KeyId, PrivateKey, PublicKey, Result, SymmetricKey,
};

/// The distribution record of one shared group key.
///
/// Persisted by the caller as the conversation's current bundle.
///
/// ```text
/// {
///   "keyId": "<hex>",
///   "encryptedKeys": { "<memberId>": "<base64 wrapped key>", ... },
///   "createdAt": "<RFC 3339>",
///   "createdBy": "<userId>"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupKeyBundle {
    /// Identifier of the shared key.
    pub key_id: KeyId,
    /// Shared key wrapped under each member's public key, by member id.
    pub encrypted_keys: BTreeMap<String, String>,
    /// When the key was generated.
    pub created_at: DateTime<Utc>,
    /// User who created or rotated the key.
    pub created_by: String,
}

impl GroupKeyBundle {
    /// Returns the wrapped key for `member_id`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyNotFound`] if the member has no entry, for
    /// example because a rotation excluded them.
    pub fn entry_for(&self, member_id: &str) -> Result<&str> {
        self.encrypted_keys
            .get(member_id)
            .map(String::as_str)
            .ok_or_else(|| {
                CryptoError::KeyNotFound(format!(
                    "no entry for {member_id} in group key {}",
                    self.key_id
                ))
            })
    }

    /// Records a wrapped key produced by [`GroupKeyManager::add_member`].
    pub fn add_entry(&mut self, member_id: impl Into<String>, wrapped_key: String) {
        self.encrypted_keys.insert(member_id.into(), wrapped_key);
    }

    /// Returns whether `member_id` has an entry.
    #[must_use]
    pub fn contains_member(&self, member_id: &str) -> bool {
        self.encrypted_keys.contains_key(member_id)
    }

    /// Iterates over member ids holding an entry.
    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.encrypted_keys.keys().map(String::as_str)
    }

    /// Serializes the bundle to JSON.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Validation`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| CryptoError::Validation(e.to_string()))
    }

    /// Parses a bundle from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Validation`] if the JSON is not a bundle.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| CryptoError::Validation(format!("malformed group key bundle: {e}")))
    }
}

/// A freshly generated bundle together with the plaintext shared key.
///
/// The caller owns the key from here on and is expected to cache it.
#[derive(Debug, Clone)]
pub struct GroupKeyResult {
    /// The distribution record to persist.
    pub bundle: GroupKeyBundle,
    /// The shared key.
    pub group_key: SymmetricKey,
}

/// Creates, extends and rotates shared group keys.
#[derive(Clone)]
pub struct GroupKeyManager {
    provider: Arc<dyn CryptoProvider>,
}

impl GroupKeyManager {
    /// Creates a manager using the given provider.
    #[must_use]
    pub fn new(provider: Arc<dyn CryptoProvider>) -> Self {
        Self { provider }
    }

    /// Generates a new shared key and wraps it for every member.
    ///
    /// # Arguments
    ///
    /// * `member_public_keys` - Public key of every member, creator included
    /// * `creator_id` - User creating the bundle
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Validation`] if there are no members or a member
    /// key is invalid.
    pub fn create_bundle(
        &self,
        member_public_keys: &BTreeMap<String, PublicKey>,
        creator_id: &str,
    ) -> Result<GroupKeyResult> {
        if member_public_keys.is_empty() {
            return Err(CryptoError::Validation(
                "a group key needs at least one member".to_string(),
            ));
        }

        let provider = self.provider.as_ref();
        let group_key = SymmetricKey::generate(provider)?;
        let key_id = KeyId::generate(provider)?;

        let encrypted_keys = member_public_keys
            .iter()
            .map(|(member_id, public_key)| {
                let wrapped = provider.wrap_key(public_key, group_key.as_bytes())?;
                Ok((member_id.clone(), encoding::encode(wrapped)))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        tracing::debug!(
            key_id = %key_id,
            members = encrypted_keys.len(),
            created_by = creator_id,
            "created group key bundle"
        );

        Ok(GroupKeyResult {
            bundle: GroupKeyBundle {
                key_id,
                encrypted_keys,
                created_at: Utc::now(),
                created_by: creator_id.to_string(),
            },
            group_key,
        })
    }

    /// Unwraps a member's bundle entry with that member's private key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::DecryptionFailed`] for any failure.
    pub fn decrypt_bundle_entry(&self, wrapped_key: &str, private_key: &PrivateKey) -> Result<SymmetricKey> {
        let wrapped = encoding::decode(wrapped_key).map_err(|_| CryptoError::DecryptionFailed)?;
        let raw_key = self
            .provider
            .unwrap_key(private_key, &wrapped)
            .map_err(|_| CryptoError::DecryptionFailed)?;
        SymmetricKey::from_slice(&raw_key)
    }

    /// Wraps the existing shared key for one additional member, without
    /// rotating.
    ///
    /// The new member can read everything encrypted under this key, including
    /// messages sent before they joined.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Validation`] if the public key is invalid.
    pub fn add_member(&self, current_group_key: &SymmetricKey, new_member_public_key: &PublicKey) -> Result<String> {
        let wrapped = self
            .provider
            .wrap_key(new_member_public_key, current_group_key.as_bytes())?;
        Ok(encoding::encode(wrapped))
    }

    /// Replaces the shared key with a new one distributed only to the
    /// remaining members.
    ///
    /// This is the only correct response to a member removal, and must be
    /// applied as part of the same removal operation.
    ///
    /// # Errors
    ///
    /// Same as [`Self::create_bundle`].
    pub fn rotate(
        &self,
        remaining_member_public_keys: &BTreeMap<String, PublicKey>,
        initiator_id: &str,
    ) -> Result<GroupKeyResult> {
        let result = self.create_bundle(remaining_member_public_keys, initiator_id)?;
        tracing::debug!(
            key_id = %result.bundle.key_id,
            initiator = initiator_id,
            "rotated group key"
        );
        Ok(result)
    }

    /// Removes `removed_id` from `members` and rotates in one step.
    ///
    /// The returned bundle never contains an entry for `removed_id`, even if
    /// it was passed in `members`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::create_bundle`]; removing the last member is a
    /// [`CryptoError::Validation`] error.
    pub fn remove_member(
        &self,
        members: &BTreeMap<String, PublicKey>,
        removed_id: &str,
        initiator_id: &str,
    ) -> Result<GroupKeyResult> {
        let remaining: BTreeMap<String, PublicKey> = members
            .iter()
            .filter(|(member_id, _)| member_id.as_str() != removed_id)
            .map(|(member_id, key)| (member_id.clone(), key.clone()))
            .collect();

        self.rotate(&remaining, initiator_id)
    }
}

impl std::fmt::Debug for GroupKeyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupKeyManager")
            .field("provider", &self.provider.name())
            .finish()
    }
}
