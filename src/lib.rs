//! # taskwarden
//!
//! **Taskwarden** is an id-addressed async task supervisor for Rust.
//!
//! Tasks are submitted under a string id. Submitting the same id again
//! replaces the previous task: a pending one is swapped out, a running one is
//! cancelled before its successor starts. Each finished run reports an
//! [`Outcome`] to finish callbacks, which can resubmit the task (see
//! [`restart_on_error`], [`Restarter`]). Teardown cancels every run and waits
//! for all of them to return. This is the shape of a reconciler: "keep exactly
//! one watcher per resource, restart it when it fails, stop them all on exit".
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │ Task "pod-a" │   │ Task "pod-b" │   │ Task "pod-a" │ ◄─ replaces the first
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Supervisor                                                       │
//! │  - admin lock: state, pending set, outcome sender                 │
//! │  - Registry: id → (run number, cancel token) of the active run    │
//! │  - TaskTracker: completion barrier for every run                  │
//! │  - Bus (broadcast events) ──► SubscriberSet                       │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  run driver  │   │  run driver  │   │  run driver  │
//!     │ work → release → task on_finish → global on_finish │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            └──────────────────┼──────────────────┘
//!                               ▼ Outcome (bounded mpsc)
//!                 ┌───────────────────────────┐
//!                 │     coordinating loop     │ ◄── Interrupt / parent cancel
//!                 │ log, publish, trigger stop│
//!                 └───────────────────────────┘
//! ```
//!
//! ### Lifecycle
//! ```text
//! Created ──start()──► Started ──stop() / interrupt / parent cancel──► Stopped
//!
//! run:
//!   ├─► publish TaskStarting
//!   ├─► work.run(token)            (panics caught → TaskError::Panicked)
//!   ├─► registry.release(id, run)  (no-op if a newer run owns the id)
//!   ├─► publish TaskStopped / TaskFailed
//!   ├─► task.on_finish(token, &outcome)
//!   ├─► supervisor on_finish(token, &outcome)
//!   └─► send outcome ──► coordinating loop ──► publish OutcomeObserved
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                        |
//! |-------------------|--------------------------------------------------------------|-------------------------------------------|
//! | **Supervision**   | Submit, replace, start and stop id-addressed runs.           | [`Supervisor`], [`SupervisorBuilder`]     |
//! | **Tasks**         | Define work routines as closures or trait objects.           | [`Task`], [`Work`], [`WorkFn`]            |
//! | **Restarts**      | Finish callbacks that resubmit, optionally with backoff.     | [`restart_on_error`], [`Restarter`]       |
//! | **Shutdown**      | Injectable interrupt sources.                                | [`Interrupt`], [`OsSignals`]              |
//! | **Subscriber API**| Hook into lifecycle events.                                  | [`Subscribe`], [`Event`]                  |
//! | **Errors**        | Typed errors for work routines and teardown.                 | [`TaskError`], [`RuntimeError`]           |
//! | **Configuration** | Queue capacities and the teardown grace period.              | [`SupervisorConfig`]                      |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] subscriber.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use taskwarden::{FinishFn, NoInterrupt, Supervisor, SupervisorConfig, Task, TaskError, restart_on_error};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Build subscribers (optional)
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn taskwarden::Subscribe>> = vec![Arc::new(taskwarden::LogWriter)];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn taskwarden::Subscribe>> = Vec::new();
//!
//!     let sup = Supervisor::builder(SupervisorConfig::default())
//!         .with_subscribers(subs)
//!         .with_interrupt(Arc::new(NoInterrupt))
//!         .build();
//!
//!     // A watcher that returns when asked to stop; restarted if it ever fails.
//!     let watcher = Task::from_fn("watch-pods", |ctx: CancellationToken| async move {
//!         ctx.cancelled().await;
//!         Ok::<_, TaskError>(())
//!     })
//!     .with_on_finish(Arc::new(restart_on_error) as FinishFn);
//!
//!     sup.submit_task(watcher.into_ref());
//!     sup.start();
//!     sup.stop().await?;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod policies;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use core::{
    Interrupt, ManualInterrupt, NoInterrupt, OsSignals, State, Supervisor, SupervisorBuilder,
    SupervisorConfig,
};
pub use error::{RuntimeError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use policies::{
    BackoffPolicy, JitterPolicy, RestartPolicy, Restarter, restart, restart_on_error,
    restart_on_success,
};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{FinishFn, Outcome, Task, TaskRef, Work, WorkFn, WorkRef, finish_fn};

// Optional: expose a simple built-in logger subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
