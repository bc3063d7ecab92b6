//! In-memory cache of unwrapped group keys.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::crypto::{KeyId, SymmetricKey};

#[derive(Default)]
struct ConversationKeys {
    current: Option<KeyId>,
    keys: HashMap<KeyId, SymmetricKey>,
}

/// Unwrapped group keys by conversation and key id.
///
/// Older keys stay cached after a rotation so that earlier messages remain
/// readable. Keys are zeroized when evicted or when the cache is dropped.
#[derive(Default)]
pub struct KeyCache {
    conversations: RwLock<HashMap<String, ConversationKeys>>,
}

impl KeyCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Caches a key without changing the conversation's current key.
    pub fn insert(&self, conversation_id: &str, key_id: KeyId, key: SymmetricKey) {
        let mut conversations = self
            .conversations
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        conversations
            .entry(conversation_id.to_string())
            .or_default()
            .keys
            .insert(key_id, key);
    }

    /// Caches a key and makes it the one used for new messages.
    pub fn set_current(&self, conversation_id: &str, key_id: KeyId, key: SymmetricKey) {
        let mut conversations = self
            .conversations
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let entry = conversations.entry(conversation_id.to_string()).or_default();
        entry.keys.insert(key_id.clone(), key);
        entry.current = Some(key_id);
    }

    /// Looks up a key by id.
    #[must_use]
    pub fn get(&self, conversation_id: &str, key_id: &KeyId) -> Option<SymmetricKey> {
        let conversations = self
            .conversations
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        conversations
            .get(conversation_id)
            .and_then(|entry| entry.keys.get(key_id))
            .cloned()
    }

    /// Returns the current key for new messages.
    #[must_use]
    pub fn current(&self, conversation_id: &str) -> Option<(KeyId, SymmetricKey)> {
        let conversations = self
            .conversations
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let entry = conversations.get(conversation_id)?;
        let key_id = entry.current.as_ref()?;
        entry
            .keys
            .get(key_id)
            .map(|key| (key_id.clone(), key.clone()))
    }

    /// Number of keys cached for a conversation.
    #[must_use]
    pub fn key_count(&self, conversation_id: &str) -> usize {
        let conversations = self
            .conversations
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        conversations
            .get(conversation_id)
            .map_or(0, |entry| entry.keys.len())
    }

    /// Drops every key of a conversation. Returns whether anything was cached.
    pub fn forget_conversation(&self, conversation_id: &str) -> bool {
        let mut conversations = self
            .conversations
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        conversations.remove(conversation_id).is_some()
    }
}

impl std::fmt::Debug for KeyCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let conversations = self
            .conversations
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("KeyCache")
            .field("conversations", &conversations.len())
            .finish()
    }
}
