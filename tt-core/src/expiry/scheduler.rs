//! One-shot expiry timers keyed by message id.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tokio::task::AbortHandle;

use super::sink::DeletionSink;
use super::types::{Message, TtlState};

/// Invoked with the expired message when its timer fires.
pub type ExpiryCallback = Arc<dyn Fn(&Message) + Send + Sync>;

/// Outcome of [`Scheduler::start_timer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerStart {
    /// The message has no expiry; nothing scheduled.
    Permanent,
    /// A timer for this message id is already pending.
    AlreadyArmed,
    /// The message was already expired; the callback ran synchronously.
    FiredImmediately,
    /// A new timer was scheduled.
    Armed,
}

struct PendingTimer {
    /// Distinguishes a re-armed timer from the one that is finishing.
    generation: u64,
    abort_handle: AbortHandle,
}

type TimerMap = Arc<Mutex<HashMap<String, PendingTimer>>>;

/// Unregisters a fired timer when dropped, including when the callback
/// panics. A newer timer armed under the same id is left alone.
struct FiredTimer {
    registry: TimerMap,
    message_id: String,
    generation: u64,
}

impl Drop for FiredTimer {
    fn drop(&mut self) {
        let mut timers = lock(&self.registry);
        if timers
            .get(&self.message_id)
            .is_some_and(|timer| timer.generation == self.generation)
        {
            timers.remove(&self.message_id);
        }
    }
}

/// Owns the pending expiry timers of one client.
///
/// Timers are tokio tasks, so arming one requires a running tokio runtime.
/// Dropping the scheduler cancels every pending timer.
pub struct Scheduler {
    sink: Arc<dyn DeletionSink>,
    timers: TimerMap,
    next_generation: AtomicU64,
}

impl Scheduler {
    /// Creates a scheduler that requests deletions through `sink`.
    #[must_use]
    pub fn new(sink: Arc<dyn DeletionSink>) -> Self {
        Self {
            sink,
            timers: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
        }
    }

    /// Arms a timer that calls `on_expire` when `message` expires.
    ///
    /// Does nothing for permanent messages or when a timer for the message id
    /// is already pending. An already expired message fires `on_expire`
    /// before this returns.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime when a timer must be armed.
    pub fn start_timer(&self, message: &Message, on_expire: ExpiryCallback) -> TimerStart {
        let Some(expires_at) = message.expires_at() else {
            return TimerStart::Permanent;
        };

        let mut timers = lock(&self.timers);
        if timers.contains_key(message.id()) {
            return TimerStart::AlreadyArmed;
        }

        let now = Utc::now();
        if message.ttl_state(now) == TtlState::Expired {
            drop(timers);
            tracing::debug!(message_id = message.id(), "message already expired");
            on_expire(message);
            return TimerStart::FiredImmediately;
        }

        let delay = (expires_at - now).to_std().unwrap_or_default();
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let registry = Arc::clone(&self.timers);
        let expired = message.clone();

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _release = FiredTimer {
                registry,
                message_id: expired.id().to_string(),
                generation,
            };
            tracing::debug!(message_id = expired.id(), "expiry timer fired");
            on_expire(&expired);
        });

        timers.insert(
            message.id().to_string(),
            PendingTimer {
                generation,
                abort_handle: task.abort_handle(),
            },
        );
        tracing::debug!(
            message_id = message.id(),
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "armed expiry timer"
        );
        TimerStart::Armed
    }

    /// Cancels the pending timer for `message_id`. Returns whether one existed.
    pub fn cancel_timer(&self, message_id: &str) -> bool {
        let Some(timer) = lock(&self.timers).remove(message_id) else {
            return false;
        };
        timer.abort_handle.abort();
        tracing::debug!(message_id, "cancelled expiry timer");
        true
    }

    /// Cancels every pending timer.
    pub fn cancel_all(&self) {
        let drained: Vec<PendingTimer> = lock(&self.timers).drain().map(|(_, timer)| timer).collect();
        for timer in &drained {
            timer.abort_handle.abort();
        }
        if !drained.is_empty() {
            tracing::debug!(count = drained.len(), "cancelled all expiry timers");
        }
    }

    /// Requests deletion of every expired message and returns the rest, in
    /// their original order.
    ///
    /// Deletion is best effort: sink failures are logged and the message is
    /// dropped from the result anyway.
    pub async fn cleanup_expired(&self, messages: Vec<Message>) -> Vec<Message> {
        let now = Utc::now();
        let mut still_valid = Vec::with_capacity(messages.len());

        for message in messages {
            if !message.is_expired(now) {
                still_valid.push(message);
                continue;
            }

            self.cancel_timer(message.id());
            if let Err(e) = self
                .sink
                .delete(message.conversation_id(), message.id())
                .await
            {
                tracing::warn!(
                    message_id = message.id(),
                    conversation_id = message.conversation_id(),
                    error = %e,
                    "failed to delete expired message"
                );
            }
        }

        still_valid
    }

    /// Re-arms timers for `messages`, typically after a restart.
    ///
    /// Returns how many new timers were armed; expired messages fire
    /// immediately and are not counted.
    ///
    /// # Panics
    ///
    /// Same as [`Self::start_timer`].
    pub fn initialize_timers(&self, messages: &[Message], on_expire: &ExpiryCallback) -> usize {
        messages
            .iter()
            .filter(|message| self.start_timer(message, Arc::clone(on_expire)) == TimerStart::Armed)
            .count()
    }

    /// Callback that asks this scheduler's sink to delete the expired
    /// message. Failures are logged.
    ///
    /// The deletion runs on a spawned tokio task.
    #[must_use]
    pub fn delete_on_expire(&self) -> ExpiryCallback {
        let sink = Arc::clone(&self.sink);
        Arc::new(move |message: &Message| {
            let sink = Arc::clone(&sink);
            let message = message.clone();
            tokio::spawn(async move {
                if let Err(e) = sink.delete(message.conversation_id(), message.id()).await {
                    tracing::warn!(
                        message_id = message.id(),
                        error = %e,
                        "failed to delete expired message"
                    );
                }
            });
        })
    }

    /// Number of pending timers.
    #[must_use]
    pub fn active_timers(&self) -> usize {
        lock(&self.timers).len()
    }

    /// Returns whether a timer for `message_id` is pending.
    #[must_use]
    pub fn is_armed(&self, message_id: &str) -> bool {
        lock(&self.timers).contains_key(message_id)
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("active_timers", &self.active_timers())
            .finish_non_exhaustive()
    }
}

fn lock(timers: &Mutex<HashMap<String, PendingTimer>>) -> MutexGuard<'_, HashMap<String, PendingTimer>> {
    timers.lock().unwrap_or_else(PoisonError::into_inner)
}
