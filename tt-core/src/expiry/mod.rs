//! Disappearing messages.
//!
//! ```text
//! Permanent                       (never scheduled)
//! Pending ──timer──► Expired ──DeletionSink──► Deleted (best effort)
//!    ▲
//!    └── initialize_timers after restart
//! ```
//!
//! The [`Scheduler`] only requests deletion. Whether the store actually
//! removed the message is the sink's concern.

mod scheduler;
mod sink;
mod types;

pub use scheduler::{ExpiryCallback, Scheduler, TimerStart};
pub use sink::DeletionSink;
pub use types::{Message, TtlState};

#[cfg(any(test, feature = "test-utils"))]
pub use sink::RecordingSink;
