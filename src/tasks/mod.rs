//! # Task abstractions.
//!
//! - [`Work`] - async cancelable body of a task; [`WorkFn`] closure adapter
//! - [`Task`] - id + work + finish callback, shared as [`TaskRef`]
//! - [`Outcome`] - what a finished run reports to callbacks and the coordinating loop

mod outcome;
mod task;
mod work;

pub use outcome::Outcome;
pub use task::{FinishFn, Task, TaskRef, finish_fn};
pub use work::{Work, WorkFn, WorkRef};
