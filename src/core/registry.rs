//! # Task registry: id → cancel handle of the active run.
//!
//! Holds at most one entry per id. Installing a run for an id that already has
//! one cancels the predecessor's token **before** the new entry goes in, so a
//! running task is never orphaned.
//!
//! ## Rules
//! - Guarded by its own mutex, separate from the supervisor's admin lock.
//! - Every entry is tagged with a run number; a finished run only clears the
//!   entry if it is still its own, so a superseded run cannot evict its successor.
//! - No lock is ever held across an `.await`.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio_util::sync::CancellationToken;

use super::lock;

struct Entry {
    run: u64,
    token: CancellationToken,
}

/// Result of [`Registry::install`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Installed {
    /// Run number assigned to the new entry.
    pub run: u64,
    /// Whether a predecessor was cancelled and evicted.
    pub replaced: bool,
}

#[derive(Default)]
struct Runs {
    next_run: u64,
    by_id: HashMap<String, Entry>,
}

/// Mapping of task id to the cancellation handle of its active run.
#[derive(Default)]
pub(crate) struct Registry {
    runs: Mutex<Runs>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Installs `token` as the active run for `id`, cancelling any predecessor first.
    pub(crate) fn install(&self, id: &str, token: CancellationToken) -> Installed {
        let mut runs = lock(&self.runs);
        let replaced = match runs.by_id.remove(id) {
            Some(prev) => {
                prev.token.cancel();
                true
            }
            None => false,
        };
        runs.next_run += 1;
        let run = runs.next_run;
        runs.by_id.insert(id.to_string(), Entry { run, token });
        Installed { run, replaced }
    }

    /// Clears the entry for `id` if it still belongs to `run`.
    pub(crate) fn release(&self, id: &str, run: u64) -> bool {
        let mut runs = lock(&self.runs);
        match runs.by_id.get(id) {
            Some(entry) if entry.run == run => {
                runs.by_id.remove(id);
                true
            }
            _ => false,
        }
    }

    /// Cancels every active run; entries stay until their runs release them.
    ///
    /// Returns how many tokens were cancelled.
    pub(crate) fn cancel_all(&self) -> usize {
        let runs = lock(&self.runs);
        for entry in runs.by_id.values() {
            entry.token.cancel();
        }
        runs.by_id.len()
    }

    /// Sorted ids of the active runs.
    pub(crate) fn ids(&self) -> Vec<String> {
        let runs = lock(&self.runs);
        let mut ids: Vec<String> = runs.by_id.keys().cloned().collect();
        ids.sort_unstable();
        ids
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        lock(&self.runs).by_id.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_replaces_and_cancels_predecessor() {
        let reg = Registry::new();
        let first = CancellationToken::new();
        let second = CancellationToken::new();

        let a = reg.install("sync", first.clone());
        assert!(!a.replaced);
        assert!(!first.is_cancelled());

        let b = reg.install("sync", second.clone());
        assert!(b.replaced);
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert_eq!(reg.len(), 1);
        assert_ne!(a.run, b.run);
    }

    #[test]
    fn stale_release_keeps_successor() {
        let reg = Registry::new();
        let a = reg.install("sync", CancellationToken::new());
        let b = reg.install("sync", CancellationToken::new());

        assert!(!reg.release("sync", a.run));
        assert_eq!(reg.ids(), vec!["sync".to_string()]);

        assert!(reg.release("sync", b.run));
        assert_eq!(reg.len(), 0);
        assert!(!reg.release("sync", b.run));
    }

    #[test]
    fn cancel_all_signals_every_entry() {
        let reg = Registry::new();
        let tokens: Vec<_> = (0..3).map(|_| CancellationToken::new()).collect();
        for (i, t) in tokens.iter().enumerate() {
            reg.install(&format!("t{i}"), t.clone());
        }

        assert_eq!(reg.cancel_all(), 3);
        assert!(tokens.iter().all(CancellationToken::is_cancelled));
        assert_eq!(reg.ids(), vec!["t0", "t1", "t2"]);
        // cancelling twice is harmless
        assert_eq!(reg.cancel_all(), 3);
    }
}
