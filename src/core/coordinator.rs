//! # Coordinating loop.
//!
//! The single reader of the outcome queue. It multiplexes, with no priority
//! between them:
//! 1. a finished run's [`Outcome`] → log it, publish `OutcomeObserved`;
//! 2. the injected [`Interrupt`](crate::Interrupt) → teardown;
//! 3. cancellation of the parent token → teardown.
//!
//! Teardown is spawned rather than awaited here: the loop must keep draining
//! outcomes while teardown waits for runs, or a full queue would stall both.
//! The loop exits once the queue is closed, i.e. after teardown dropped the
//! last sender and every run returned.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::events::{Event, EventKind};
use crate::tasks::Outcome;

use super::supervisor::{Inner, Trigger};

pub(crate) async fn run(inner: Arc<Inner>, mut outcomes: mpsc::Receiver<Outcome>) {
    let interrupt = Arc::clone(&inner.interrupt);
    let interrupted = interrupt.wait();
    tokio::pin!(interrupted);

    let parent = inner.parent.clone();
    let parent_cancelled = parent.cancelled();
    tokio::pin!(parent_cancelled);

    let mut triggered = false;
    loop {
        tokio::select! {
            msg = outcomes.recv() => match msg {
                Some(outcome) => observe(&inner, &outcome),
                None => break,
            },
            _ = &mut interrupted, if !triggered => {
                triggered = true;
                teardown(&inner, Trigger::Interrupt);
            }
            _ = &mut parent_cancelled, if !triggered => {
                triggered = true;
                teardown(&inner, Trigger::ParentCancelled);
            }
        }
    }
    debug!("coordinating loop exited");
}

fn teardown(inner: &Arc<Inner>, trigger: Trigger) {
    info!(trigger = trigger.as_str(), "shutdown trigger received");
    let inner = Arc::clone(inner);
    tokio::spawn(async move {
        // Failures are logged by `shutdown`; nobody is waiting for the value here.
        let _ = inner.shutdown(trigger).await;
    });
}

fn observe(inner: &Inner, outcome: &Outcome) {
    let mut ev = Event::new(EventKind::OutcomeObserved).with_task(outcome.id());
    match outcome.error() {
        Some(err) if err.is_canceled() => {
            debug!(task = outcome.id(), "task returned after cancellation");
            ev = ev.with_error(err.to_string());
        }
        Some(err) => {
            error!(task = outcome.id(), error = %err, label = err.as_label(), "task failed");
            ev = ev.with_error(err.to_string());
        }
        None => debug!(task = outcome.id(), "task finished"),
    }
    inner.bus.publish(ev);
}
