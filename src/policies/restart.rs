//! # Restart callbacks.
//!
//! Restarting is not built into the supervisor: it is an ordinary finish
//! callback that resubmits the same [`Task`](crate::Task) (same id, work and
//! callback) as a fresh run.
//!
//! - [`restart`], [`restart_on_error`], [`restart_on_success`]: immediate,
//!   unbounded resubmission. An always-failing task with `restart_on_error`
//!   restarts in a tight loop; nothing rate-limits it.
//! - [`Restarter`]: the same decisions with an optional [`BackoffPolicy`]
//!   delay and an optional cap on consecutive restarts per id.
//!
//! None of them resubmit a run whose token was cancelled: such a run was either
//! superseded by a newer submission of its id or torn down with the supervisor.
//!
//! ```rust
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use taskwarden::{FinishFn, Task, TaskError, restart_on_error};
//!
//! let task = Task::from_fn("lease-renewer", |_ctx: CancellationToken| async {
//!     Err::<(), _>(TaskError::fail("lease lost"))
//! })
//! .with_on_finish(Arc::new(restart_on_error) as FinishFn);
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::Supervisor;
use crate::tasks::{FinishFn, Outcome};

use super::backoff::BackoffPolicy;

/// Which outcomes call for a restart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RestartPolicy {
    /// Restart after every run.
    Always,
    /// Restart only when the work routine returned an error (default).
    #[default]
    OnError,
    /// Restart only when the work routine succeeded.
    OnSuccess,
}

impl RestartPolicy {
    /// True if `outcome` calls for a restart under this policy.
    pub fn wants(self, outcome: &Outcome) -> bool {
        match self {
            RestartPolicy::Always => true,
            RestartPolicy::OnError => !outcome.is_success(),
            RestartPolicy::OnSuccess => outcome.is_success(),
        }
    }
}

/// Resubmits the finished task unless the supervisor is stopped or the run was cancelled.
pub fn restart(_ctx: CancellationToken, outcome: &Outcome) {
    if let Some(sup) = restart_target(outcome) {
        debug!(task = outcome.id(), "restarting");
        sup.submit_task(Arc::clone(outcome.task()));
    }
}

/// [`restart`] when the run failed.
pub fn restart_on_error(ctx: CancellationToken, outcome: &Outcome) {
    if RestartPolicy::OnError.wants(outcome) {
        restart(ctx, outcome);
    }
}

/// [`restart`] when the run succeeded.
pub fn restart_on_success(ctx: CancellationToken, outcome: &Outcome) {
    if RestartPolicy::OnSuccess.wants(outcome) {
        restart(ctx, outcome);
    }
}

/// The supervisor to resubmit into, if a restart is still meaningful.
fn restart_target(outcome: &Outcome) -> Option<Supervisor> {
    if outcome.was_cancelled() {
        debug!(task = outcome.id(), "run was cancelled; not restarting");
        return None;
    }
    outcome.supervisor().filter(|sup| !sup.is_stopped())
}

/// Throttled restart callback.
///
/// Keeps a per-id streak of consecutive restarts. The streak resets whenever
/// an outcome does not call for a restart (e.g. a success under `OnError`).
///
/// ```rust
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
/// use taskwarden::{BackoffPolicy, RestartPolicy, Restarter, Task, TaskError};
///
/// let on_finish = Restarter::new(RestartPolicy::OnError)
///     .with_backoff(BackoffPolicy::default())
///     .with_max_restarts(5)
///     .into_finish();
///
/// let task = Task::from_fn("watch-endpoints", |_ctx: CancellationToken| async {
///     Ok::<_, TaskError>(())
/// })
/// .with_on_finish(on_finish);
/// ```
#[derive(Debug)]
pub struct Restarter {
    policy: RestartPolicy,
    backoff: Option<BackoffPolicy>,
    max_restarts: Option<u32>,
    streaks: Mutex<HashMap<String, u32>>,
}

impl Restarter {
    pub fn new(policy: RestartPolicy) -> Self {
        Self {
            policy,
            backoff: None,
            max_restarts: None,
            streaks: Mutex::new(HashMap::new()),
        }
    }

    /// Delays restart number `n` of a streak by `backoff.next(n)`.
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = Some(backoff);
        self
    }

    /// Gives up after `max` consecutive restarts of the same id.
    pub fn with_max_restarts(mut self, max: u32) -> Self {
        self.max_restarts = Some(max);
        self
    }

    /// Converts into a finish callback; share the result between tasks freely.
    pub fn into_finish(self) -> FinishFn {
        let me = Arc::new(self);
        Arc::new(move |ctx: CancellationToken, outcome: &Outcome| me.on_finish(ctx, outcome))
    }

    fn on_finish(&self, _ctx: CancellationToken, outcome: &Outcome) {
        if !self.policy.wants(outcome) {
            crate::core::lock(&self.streaks).remove(outcome.id());
            return;
        }
        let Some(sup) = restart_target(outcome) else {
            return;
        };

        let streak = {
            let mut streaks = crate::core::lock(&self.streaks);
            let n = streaks.entry(outcome.id().to_string()).or_insert(0);
            let current = *n;
            *n = n.saturating_add(1);
            current
        };
        if self.max_restarts.is_some_and(|max| streak >= max) {
            warn!(task = outcome.id(), restarts = streak, "restart budget exhausted");
            return;
        }

        let delay = self.backoff.map(|b| b.next(streak)).unwrap_or_default();
        debug!(task = outcome.id(), streak, ?delay, "restarting");
        sup.submit_after(Arc::clone(outcome.task()), delay);
    }
}
