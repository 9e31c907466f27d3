//! Runtime core: supervision and lifecycle.
//!
//! Internal modules:
//! - [`supervisor`]: state machine, submit/start/stop, teardown;
//! - [`registry`]: id → cancel handle of the active run;
//! - [`runner`]: drives one run and dispatches its outcome;
//! - [`coordinator`]: the loop draining outcomes and watching shutdown triggers;
//! - [`shutdown`]: injectable interrupt sources;
//! - [`config`], [`builder`]: construction.

use std::sync::{Mutex, MutexGuard, PoisonError};

mod builder;
mod config;
mod coordinator;
mod registry;
mod runner;
mod shutdown;
mod supervisor;

pub use builder::SupervisorBuilder;
pub use config::SupervisorConfig;
pub use shutdown::{Interrupt, ManualInterrupt, NoInterrupt, OsSignals};
pub use supervisor::{State, Supervisor};

pub(crate) use supervisor::Inner;

/// Locks `m`, recovering the data if a panicking holder poisoned it.
///
/// Callbacks run outside every lock; the only panics under these locks are
/// contract violations raised before any field is touched.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
