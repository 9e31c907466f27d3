//! # Event bus for broadcasting lifecycle events.
//!
//! [`Bus`] wraps [`tokio::sync::broadcast`]: the supervisor, every run and the
//! coordinating loop publish into it; a single listener spawned at `start`
//! fans events out to the configured subscribers.
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never waits.
//! - **No persistence**: events published while nobody listens (e.g. before `start`) are dropped.
//! - **Lag handling**: a slow receiver gets `RecvError::Lagged(n)` and skips `n` oldest events.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for runtime events.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (clamped to at least 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active receivers; dropped if there are none.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a receiver that observes events sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
