//! # Task definition.
//!
//! A [`Task`] bundles an id, an optional [`Work`](crate::Work) routine and an
//! optional finish callback. It is immutable once built and shared as
//! [`TaskRef`]; every run of the same task reuses that definition with a fresh
//! cancellation token.
//!
//! ## Ids
//! The id is the addressing key: submitting a second task with the same id
//! replaces the first (pending or running). Empty ids are accepted and behave
//! like any other id.

use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::tasks::outcome::Outcome;
use crate::tasks::work::{WorkFn, WorkRef};

/// Finish callback: invoked on the run's own execution after the work routine
/// returned, with the run's token and its outcome.
pub type FinishFn = Arc<dyn Fn(CancellationToken, &Outcome) + Send + Sync + 'static>;

/// Shared handle to a task definition.
pub type TaskRef = Arc<Task>;

/// Wraps a closure as a [`FinishFn`].
///
/// ```rust
/// use taskwarden::{Outcome, finish_fn};
///
/// let on_finish = finish_fn(|_ctx, outcome: &Outcome| {
///     println!("{} finished, ok={}", outcome.id(), outcome.is_success());
/// });
/// ```
pub fn finish_fn<F>(f: F) -> FinishFn
where
    F: Fn(CancellationToken, &Outcome) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Immutable unit of work addressed by id.
pub struct Task {
    id: Cow<'static, str>,
    work: Option<WorkRef>,
    on_finish: Option<FinishFn>,
}

impl Task {
    /// Creates a task; `work = None` is a no-op run that still reports a successful outcome.
    pub fn new(
        id: impl Into<Cow<'static, str>>,
        work: Option<WorkRef>,
        on_finish: Option<FinishFn>,
    ) -> Self {
        Self {
            id: id.into(),
            work,
            on_finish,
        }
    }

    /// Creates a task from a closure work routine, without a finish callback.
    ///
    /// ```rust
    /// use tokio_util::sync::CancellationToken;
    /// use taskwarden::{Task, TaskError};
    ///
    /// let task = Task::from_fn("sync-nodes", |_ctx: CancellationToken| async {
    ///     Ok::<_, TaskError>(())
    /// });
    /// assert_eq!(task.id(), "sync-nodes");
    /// ```
    pub fn from_fn<F, Fut>(id: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        Self::new(id, Some(WorkFn::arc(f)), None)
    }

    /// Sets the task-level finish callback.
    pub fn with_on_finish(mut self, on_finish: FinishFn) -> Self {
        self.on_finish = Some(on_finish);
        self
    }

    /// Wraps the task into a [`TaskRef`].
    pub fn into_ref(self) -> TaskRef {
        Arc::new(self)
    }

    /// The addressing key.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Work routine, if any.
    pub fn work(&self) -> Option<&WorkRef> {
        self.work.as_ref()
    }

    /// Task-level finish callback, if any.
    pub fn on_finish(&self) -> Option<&FinishFn> {
        self.on_finish.as_ref()
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("work", &self.work.is_some())
            .field("on_finish", &self.on_finish.is_some())
            .finish()
    }
}
