//! # Lifecycle events emitted by the supervisor.
//!
//! [`EventKind`] classifies what happened; [`Event`] carries the metadata
//! (task id, error text, reason) together with a timestamp and a global
//! sequence number.
//!
//! ## Ordering guarantees
//! `seq` increases monotonically across the whole process. Events produced by
//! concurrently finishing tasks may reach a subscriber in any order; `seq`
//! restores the order in which they were created.
//!
//! ## Example
//! ```rust
//! use taskwarden::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::TaskFailed)
//!     .with_task("reconcile-pods")
//!     .with_error("api server unavailable");
//!
//! assert_eq!(ev.kind, EventKind::TaskFailed);
//! assert_eq!(ev.task.as_deref(), Some("reconcile-pods"));
//! assert_eq!(ev.error.as_deref(), Some("api server unavailable"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Submission ===
    /// Task accepted before `start`; it waits in the pending set.
    ///
    /// Sets: `task`.
    TaskQueued,

    /// A task with the same id was already pending or running and has been superseded.
    ///
    /// Sets: `task`, `reason` (`"pending"` or `"running"`).
    TaskReplaced,

    // === Run lifecycle ===
    /// A run is about to invoke its work routine.
    ///
    /// Sets: `task`.
    TaskStarting,

    /// Work routine returned without error.
    ///
    /// Sets: `task`.
    TaskStopped,

    /// Work routine returned an error (including cancellation and caught panics).
    ///
    /// Sets: `task`, `error`.
    TaskFailed,

    /// The coordinating loop received the run's outcome.
    ///
    /// Always published after both finish callbacks of that run returned.
    ///
    /// Sets: `task`, `error` (if the run failed).
    OutcomeObserved,

    // === Shutdown ===
    /// Teardown began.
    ///
    /// Sets: `reason` (`"stop"`, `"interrupt"` or `"parent_cancelled"`).
    ShutdownRequested,

    /// Every launched run returned and the outcome queue is closed.
    AllStopped,

    /// The grace period elapsed with runs still active.
    ///
    /// Sets: `reason` (ids left running).
    GraceExceeded,

    // === Subscribers ===
    /// Subscriber panicked while handling an event.
    ///
    /// Sets: `task` (subscriber name), `reason` (panic info).
    SubscriberPanicked,

    /// Subscriber queue was full or closed; the event was dropped for it.
    ///
    /// Sets: `task` (subscriber name), `reason`.
    SubscriberOverflow,
}

/// Runtime event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Task id (or subscriber name for subscriber events).
    pub task: Option<Arc<str>>,
    /// Rendered task error, if any.
    pub error: Option<Arc<str>>,
    /// Free-form detail (trigger name, replacement site, overflow cause).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            error: None,
            reason: None,
        }
    }

    /// Attaches a task id.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a rendered error.
    #[inline]
    pub fn with_error(mut self, error: impl Into<Arc<str>>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }

    /// True for events that end a supervisor's lifetime.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, EventKind::AllStopped | EventKind::GraceExceeded)
    }
}
