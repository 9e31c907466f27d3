//! # Restart backoff.
//!
//! The delay before restart number `n` (0-based) is `first × factor^n`, capped
//! at `max`, then jittered. The base is derived from `n` alone, so jitter never
//! feeds back into later delays.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use taskwarden::{BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy {
//!     first: Duration::from_millis(100),
//!     max: Duration::from_secs(10),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//! };
//!
//! assert_eq!(backoff.next(0), Duration::from_millis(100));
//! assert_eq!(backoff.next(1), Duration::from_millis(200));
//! assert_eq!(backoff.next(10), Duration::from_secs(10));
//! ```

use std::time::Duration;

use super::jitter::JitterPolicy;

/// Growth of restart delays.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackoffPolicy {
    /// Delay before the first restart.
    pub first: Duration,
    /// Upper bound for any delay.
    pub max: Duration,
    /// Multiplicative growth factor (`>= 1.0` recommended).
    pub factor: f64,
    /// Randomization applied after capping.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// `first = 100ms`, `max = 30s`, `factor = 2.0`, no jitter.
    fn default() -> Self {
        Self {
            first: Duration::from_millis(100),
            max: Duration::from_secs(30),
            factor: 2.0,
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// Constant delay between restarts.
    pub fn constant(delay: Duration) -> Self {
        Self {
            first: delay,
            max: delay,
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }

    /// Delay before restart number `restart` (0-based).
    pub fn next(&self, restart: u32) -> Duration {
        let exp = i32::try_from(restart).unwrap_or(i32::MAX);
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);
        let base = if !secs.is_finite() || secs < 0.0 || secs > self.max.as_secs_f64() {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        };
        self.jitter.apply(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exp(first_ms: u64, max: Duration) -> BackoffPolicy {
        BackoffPolicy {
            first: Duration::from_millis(first_ms),
            max,
            factor: 2.0,
            jitter: JitterPolicy::None,
        }
    }

    #[test]
    fn grows_exponentially() {
        let p = exp(100, Duration::from_secs(30));
        let delays: Vec<_> = (0..5).map(|n| p.next(n)).collect();
        assert_eq!(
            delays,
            [100, 200, 400, 800, 1600].map(Duration::from_millis).to_vec()
        );
    }

    #[test]
    fn capped_at_max() {
        let p = exp(100, Duration::from_secs(1));
        assert_eq!(p.next(10), Duration::from_secs(1));
        assert_eq!(p.next(u32::MAX), Duration::from_secs(1));
    }

    #[test]
    fn first_above_max_is_capped() {
        let p = exp(10_000, Duration::from_secs(5));
        assert_eq!(p.next(0), Duration::from_secs(5));
    }

    #[test]
    fn constant_never_grows() {
        let p = BackoffPolicy::constant(Duration::from_millis(250));
        for n in 0..20 {
            assert_eq!(p.next(n), Duration::from_millis(250));
        }
    }

    #[test]
    fn jitter_never_exceeds_base() {
        let p = BackoffPolicy {
            jitter: JitterPolicy::Full,
            ..exp(100, Duration::from_secs(30))
        };
        for n in 0..12 {
            assert!(p.next(n) <= exp(100, Duration::from_secs(30)).next(n));
        }
    }
}
