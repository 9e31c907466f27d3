//! # Logging subscriber.
//!
//! [`LogWriter`] renders every event as a `tracing` record under the
//! `taskwarden::events` target. Failed runs and grace overruns are emitted at
//! `warn`, everything else at `debug`.
//!
//! ```text
//! DEBUG taskwarden::events: queued task=reconcile-pods
//! DEBUG taskwarden::events: starting task=reconcile-pods
//! WARN  taskwarden::events: failed task=reconcile-pods error="execution failed: 503"
//! DEBUG taskwarden::events: shutdown requested reason=interrupt
//! ```

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// `tracing` adapter for supervisor events.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = e.task.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::TaskQueued => debug!(target: "taskwarden::events", task, "queued"),
            EventKind::TaskReplaced => {
                debug!(target: "taskwarden::events", task, site = reason, "replaced")
            }
            EventKind::TaskStarting => debug!(target: "taskwarden::events", task, "starting"),
            EventKind::TaskStopped => debug!(target: "taskwarden::events", task, "stopped"),
            EventKind::TaskFailed => warn!(
                target: "taskwarden::events",
                task,
                error = e.error.as_deref().unwrap_or("-"),
                "failed"
            ),
            EventKind::OutcomeObserved => {
                debug!(target: "taskwarden::events", task, seq = e.seq, "outcome observed")
            }
            EventKind::ShutdownRequested => {
                debug!(target: "taskwarden::events", reason, "shutdown requested")
            }
            EventKind::AllStopped => debug!(target: "taskwarden::events", "all stopped"),
            EventKind::GraceExceeded => {
                warn!(target: "taskwarden::events", stuck = reason, "grace exceeded")
            }
            EventKind::SubscriberPanicked | EventKind::SubscriberOverflow => {
                warn!(target: "taskwarden::events", subscriber = task, reason, "subscriber trouble")
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
