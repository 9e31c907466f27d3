//! # Work routines.
//!
//! [`Work`] is the async body of a task. It receives the run's
//! [`CancellationToken`] and is expected to return promptly once the token is
//! cancelled: the supervisor never aborts a run, it only asks.
//!
//! [`WorkFn`] adapts a closure `Fn(CancellationToken) -> Future`; every run
//! calls the closure again, so each run owns a fresh future. Shared state
//! between runs must be explicit (`Arc<...>` captured by the closure).

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// Shared handle to a work routine.
pub type WorkRef = Arc<dyn Work>;

/// # Asynchronous, cancelable body of a task.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use taskwarden::{TaskError, Work};
///
/// struct Resync;
///
/// #[async_trait]
/// impl Work for Resync {
///     async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError> {
///         tokio::select! {
///             _ = ctx.cancelled() => Err(TaskError::Canceled),
///             _ = tokio::time::sleep(std::time::Duration::from_millis(10)) => Ok(()),
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Work: Send + Sync + 'static {
    /// Executes one run until completion or cancellation.
    async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError>;
}

/// Closure-backed work routine.
pub struct WorkFn<F> {
    f: F,
}

impl<F, Fut> WorkFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    /// Wraps the closure.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Wraps the closure and returns it as a shared [`WorkRef`].
    ///
    /// ```rust
    /// use tokio_util::sync::CancellationToken;
    /// use taskwarden::{TaskError, WorkFn, WorkRef};
    ///
    /// let work: WorkRef = WorkFn::arc(|_ctx: CancellationToken| async {
    ///     Ok::<_, TaskError>(())
    /// });
    /// ```
    pub fn arc(f: F) -> WorkRef {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut> Work for WorkFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError> {
        (self.f)(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn each_run_gets_a_fresh_future() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let work = WorkFn::arc(move |_ctx: CancellationToken| {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        work.run(CancellationToken::new()).await.unwrap();
        work.run(CancellationToken::new()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
