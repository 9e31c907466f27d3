//! # Outcome of one run.
//!
//! Built right after a run's work routine returns. The run's finish callbacks
//! borrow it first (task-level, then supervisor-level), then it travels through
//! the outcome queue to the coordinating loop, which is its last reader.

use std::fmt;
use std::sync::Weak;

use tokio_util::sync::CancellationToken;

use crate::core::{Inner, Supervisor};
use crate::error::TaskError;
use crate::tasks::task::TaskRef;

/// Result of a finished run.
pub struct Outcome {
    task: TaskRef,
    error: Option<TaskError>,
    token: CancellationToken,
    supervisor: Weak<Inner>,
}

impl Outcome {
    pub(crate) fn new(
        task: TaskRef,
        error: Option<TaskError>,
        token: CancellationToken,
        supervisor: Weak<Inner>,
    ) -> Self {
        Self {
            task,
            error,
            token,
            supervisor,
        }
    }

    /// The task definition that ran.
    pub fn task(&self) -> &TaskRef {
        &self.task
    }

    /// Shorthand for `self.task().id()`.
    pub fn id(&self) -> &str {
        self.task.id()
    }

    /// Error returned by the work routine, if any.
    pub fn error(&self) -> Option<&TaskError> {
        self.error.as_ref()
    }

    /// True when the work routine returned `Ok(())` (or there was no work routine).
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// True when the run's token was cancelled: the run was superseded by a
    /// same-id submission or torn down with the supervisor.
    pub fn was_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The supervisor that ran this task, while it is still alive.
    pub fn supervisor(&self) -> Option<Supervisor> {
        self.supervisor.upgrade().map(Supervisor::from_inner)
    }
}

impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Outcome")
            .field("task", &self.task.id())
            .field("error", &self.error)
            .field("cancelled", &self.token.is_cancelled())
            .finish()
    }
}
