//! Message metadata consumed by the scheduler.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Where a message stands in its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TtlState {
    /// No expiry; never deleted by the scheduler.
    Permanent,
    /// Expiry is in the future.
    Pending,
    /// Expiry has passed; deletion is due.
    Expired,
}

/// The parts of a stored message the scheduler needs.
///
/// `expires_at` is fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    id: String,
    conversation_id: String,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
}

impl Message {
    /// Creates message metadata with an optional expiry.
    pub fn new(
        id: impl Into<String>,
        conversation_id: impl Into<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: id.into(),
            conversation_id: conversation_id.into(),
            expires_at,
        }
    }

    /// Creates metadata for a message that never expires.
    pub fn permanent(id: impl Into<String>, conversation_id: impl Into<String>) -> Self {
        Self::new(id, conversation_id, None)
    }

    /// Creates metadata for a message sent at `sent_at` that lives for `ttl`.
    ///
    /// Returns `None` if the expiry falls outside the representable range.
    pub fn with_ttl(
        id: impl Into<String>,
        conversation_id: impl Into<String>,
        sent_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Option<Self> {
        let expires_at = sent_at.checked_add_signed(ttl)?;
        Some(Self::new(id, conversation_id, Some(expires_at)))
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    #[must_use]
    pub const fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Classifies the message at `now`. A message expiring exactly at `now`
    /// is expired.
    #[must_use]
    pub fn ttl_state(&self, now: DateTime<Utc>) -> TtlState {
        match self.expires_at {
            None => TtlState::Permanent,
            Some(expires_at) if expires_at <= now => TtlState::Expired,
            Some(_) => TtlState::Pending,
        }
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.ttl_state(now) == TtlState::Expired
    }
}
