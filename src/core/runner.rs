//! # Drive a single run of a task.
//!
//! ```text
//! publish TaskStarting
//!   └─► work.run(token)            (panics caught → TaskError::Panicked)
//!         └─► registry.release(id, run)
//!               └─► publish TaskStopped / TaskFailed
//!                     └─► task.on_finish(token, &outcome)
//!                           └─► supervisor on_finish(token, &outcome)
//!                                 └─► outcome queue ──► coordinating loop
//! ```
//!
//! ## Rules
//! - The registry entry is cleared **before** any finish callback runs, so a
//!   callback may resubmit the same id without evicting anything.
//! - The work routine is always invoked, even if the token was already
//!   cancelled by the time the run got scheduled.
//! - A panicking finish callback is logged and skipped; the outcome is still queued.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::TaskError;
use crate::events::{Event, EventKind};
use crate::tasks::{FinishFn, Outcome, TaskRef};

use super::supervisor::Inner;

/// Runs `task` once under `token` and reports its outcome.
pub(crate) async fn drive(
    inner: Arc<Inner>,
    task: TaskRef,
    token: CancellationToken,
    run: u64,
    outcomes: mpsc::Sender<Outcome>,
) {
    let id = task.id();
    inner
        .bus
        .publish(Event::new(EventKind::TaskStarting).with_task(id));
    debug!(task = id, run, "run starting");

    let result = match task.work() {
        Some(work) => AssertUnwindSafe(work.run(token.clone()))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(TaskError::from_panic(&*panic))),
        None => Ok(()),
    };

    inner.registry.release(id, run);

    match &result {
        Ok(()) => inner
            .bus
            .publish(Event::new(EventKind::TaskStopped).with_task(id)),
        Err(err) => inner.bus.publish(
            Event::new(EventKind::TaskFailed)
                .with_task(id)
                .with_error(err.to_string()),
        ),
    }

    let outcome = Outcome::new(
        Arc::clone(&task),
        result.err(),
        token.clone(),
        Arc::downgrade(&inner),
    );
    if let Some(on_finish) = task.on_finish() {
        invoke("task", on_finish, &token, &outcome);
    }
    if let Some(on_finish) = &inner.on_finish {
        invoke("supervisor", on_finish, &token, &outcome);
    }

    if outcomes.send(outcome).await.is_err() {
        debug!(task = id, run, "outcome queue closed; outcome dropped");
    }
}

fn invoke(scope: &'static str, f: &FinishFn, token: &CancellationToken, outcome: &Outcome) {
    if let Err(panic) = std::panic::catch_unwind(AssertUnwindSafe(|| f(token.clone(), outcome))) {
        let err = TaskError::from_panic(&*panic);
        warn!(task = outcome.id(), scope, error = %err, "finish callback panicked");
    }
}
