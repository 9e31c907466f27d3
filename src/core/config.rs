//! # Supervisor configuration.
//!
//! ## Sentinel values
//! - `grace = 0s` → `stop()` waits for every run indefinitely
//! - capacities are clamped to a minimum of 1

use std::time::Duration;

/// Runtime settings for a [`Supervisor`](crate::Supervisor).
///
/// ## Field semantics
/// - `outcome_capacity`: bounded outcome queue size; finished runs wait for room
/// - `bus_capacity`: event bus ring buffer size; lagging subscribers skip events
/// - `grace`: upper bound on how long `stop()` waits for runs (`0s` = unbounded)
#[derive(Clone, Debug)]
pub struct SupervisorConfig {
    /// Capacity of the outcome queue between runs and the coordinating loop.
    pub outcome_capacity: usize,

    /// Capacity of the event bus broadcast channel.
    pub bus_capacity: usize,

    /// Maximum time `stop()` waits for cancelled runs to return.
    ///
    /// Runs still active when it elapses are left behind (counted by
    /// [`Supervisor::detached`](crate::Supervisor::detached)) and `stop()`
    /// returns [`RuntimeError::GraceExceeded`](crate::RuntimeError::GraceExceeded).
    pub grace: Duration,
}

impl SupervisorConfig {
    /// Returns the grace period as an `Option` (`None` = wait indefinitely).
    #[inline]
    pub fn grace_period(&self) -> Option<Duration> {
        if self.grace == Duration::ZERO {
            None
        } else {
            Some(self.grace)
        }
    }

    /// Outcome queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn outcome_capacity_clamped(&self) -> usize {
        self.outcome_capacity.max(1)
    }

    /// Bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for SupervisorConfig {
    /// - `outcome_capacity = 64`
    /// - `bus_capacity = 1024`
    /// - `grace = 0s` (unbounded)
    fn default() -> Self {
        Self {
            outcome_capacity: 64,
            bus_capacity: 1024,
            grace: Duration::ZERO,
        }
    }
}
