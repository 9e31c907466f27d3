//! Error types used by the supervisor runtime and by task work routines.
//!
//! - [`TaskError`]: returned by a [`Work`](crate::Work) routine; always non-fatal to the supervisor.
//! - [`RuntimeError`]: raised by the supervisor itself while tearing down.
//!
//! Both provide [`as_label`](TaskError::as_label) for logs and metrics.
//!
//! Misuse of the lifecycle (`start` after `stop`, `stop` before `start`) is not an
//! error value: it is a programming mistake and panics.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the supervisor runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Teardown grace period elapsed while some tasks were still running.
    ///
    /// The supervisor stops waiting for them; they are counted as detached.
    #[error("shutdown grace {grace:?} exceeded; still running: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Ids of the tasks that had not returned in time.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskwarden::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }
}

/// # Errors produced by a task's work routine.
///
/// A failed run is reported through its [`Outcome`](crate::Outcome); the supervisor
/// keeps running every other task.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TaskError {
    /// The work routine failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The work routine observed its cancellation token and gave up.
    #[error("context cancelled")]
    Canceled,

    /// The work routine panicked; the panic was caught by the supervisor.
    #[error("task panicked: {message}")]
    Panicked {
        /// Panic payload rendered as text (when it was a string).
        message: String,
    },
}

impl TaskError {
    /// Wraps any displayable error as [`TaskError::Fail`].
    ///
    /// # Example
    /// ```
    /// use taskwarden::TaskError;
    ///
    /// let err = TaskError::fail("connection refused");
    /// assert_eq!(err.to_string(), "execution failed: connection refused");
    /// ```
    pub fn fail(error: impl std::fmt::Display) -> Self {
        TaskError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Canceled => "task_canceled",
            TaskError::Panicked { .. } => "task_panicked",
        }
    }

    /// True for [`TaskError::Canceled`].
    pub fn is_canceled(&self) -> bool {
        matches!(self, TaskError::Canceled)
    }

    /// Builds a [`TaskError::Panicked`] from a caught panic payload.
    pub(crate) fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        TaskError::Panicked { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_stable() {
        assert_eq!(TaskError::fail("x").as_label(), "task_failed");
        assert_eq!(TaskError::Canceled.as_label(), "task_canceled");
        assert_eq!(
            TaskError::Panicked { message: "boom".into() }.as_label(),
            "task_panicked"
        );
    }

    #[test]
    fn panic_payloads_are_rendered() {
        let err = TaskError::from_panic(&"static boom");
        assert_eq!(err.to_string(), "task panicked: static boom");

        let err = TaskError::from_panic(&String::from("owned boom"));
        assert_eq!(err.to_string(), "task panicked: owned boom");

        let err = TaskError::from_panic(&42_u32);
        assert!(matches!(err, TaskError::Panicked { .. }));
    }
}
