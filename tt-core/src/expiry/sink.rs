//! Deletion requests for expired messages.

use async_trait::async_trait;

/// Deletes a stored message on behalf of the scheduler.
///
/// Implemented by the application's document store adapter. Failures are
/// reported as plain strings; the scheduler logs them and does not retry.
#[async_trait]
pub trait DeletionSink: Send + Sync {
    /// Deletes `message_id` from `conversation_id`.
    async fn delete(&self, conversation_id: &str, message_id: &str) -> Result<(), String>;
}

#[cfg(any(test, feature = "test-utils"))]
mod recording {
    use std::collections::HashSet;
    use std::sync::{Mutex, PoisonError};

    use async_trait::async_trait;

    use super::DeletionSink;

    /// Sink that records requests, optionally failing for chosen messages.
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        deleted: Mutex<Vec<(String, String)>>,
        failing: Mutex<HashSet<String>>,
    }

    impl RecordingSink {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes every future deletion of `message_id` fail.
        pub fn fail_on(&self, message_id: &str) {
            self.failing
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(message_id.to_string());
        }

        /// Successful deletions as `(conversation_id, message_id)`, in order.
        #[must_use]
        pub fn deleted(&self) -> Vec<(String, String)> {
            self.deleted
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }

        /// Ids of successfully deleted messages, in order.
        #[must_use]
        pub fn deleted_ids(&self) -> Vec<String> {
            self.deleted().into_iter().map(|(_, id)| id).collect()
        }
    }

    #[async_trait]
    impl DeletionSink for RecordingSink {
        async fn delete(&self, conversation_id: &str, message_id: &str) -> Result<(), String> {
            let failing = self
                .failing
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .contains(message_id);
            if failing {
                return Err(format!("store rejected deletion of {message_id}"));
            }
            self.deleted
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push((conversation_id.to_string(), message_id.to_string()));
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use recording::RecordingSink;
