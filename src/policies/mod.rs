//! Restart callbacks and the delays between restarts.
//!
//! ## Contents
//! - [`restart`], [`restart_on_error`], [`restart_on_success`]: ready-made finish callbacks
//! - [`RestartPolicy`] which outcomes call for a restart
//! - [`Restarter`] restart callback with backoff and a restart budget
//! - [`BackoffPolicy`] how delays evolve (first / factor / max + jitter)
//! - [`JitterPolicy`] randomization to avoid thundering herd
//!
//! ## Quick wiring
//! ```text
//! Task { on_finish: Restarter::new(policy).with_backoff(b).into_finish() }
//!      └─► runner invokes it after each run:
//!           - policy.wants(outcome) decides restart / reset streak
//!           - backoff.next(streak) delays the resubmission
//! ```
//!
//! ## Defaults
//! - `RestartPolicy::OnError`.
//! - `BackoffPolicy::default()` → first=100ms, factor=2.0, max=30s, jitter=None.
//! - `JitterPolicy::None`; consider `Equal` for balanced randomness.

mod backoff;
mod jitter;
mod restart;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
pub use restart::{RestartPolicy, Restarter, restart, restart_on_error, restart_on_success};
