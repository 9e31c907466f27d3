//! # Demo: basic
//!
//! One watcher per "resource", replaced when the resource changes, all stopped
//! on Ctrl-C (or after a few seconds).
//!
//! Demonstrates how to:
//! - Submit tasks before and after [`Supervisor::start`].
//! - Replace a running task by submitting its id again.
//! - Observe lifecycle events with the built-in [`LogWriter`].
//!
//! ## Flow
//! ```text
//! submit("pod-a"), submit("pod-b")     ─► TaskQueued ×2
//! start()                              ─► TaskStarting ×2
//! submit("pod-a") (spec changed)       ─► TaskReplaced{running}
//!   └─► old pod-a cancelled            ─► TaskFailed{canceled}, OutcomeObserved
//! stop() / Ctrl-C                      ─► ShutdownRequested ... AllStopped
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example basic --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use taskwarden::{LogWriter, Subscribe, Supervisor, SupervisorConfig, TaskError, WorkFn, WorkRef};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

fn watcher(resource: &'static str, generation: u32) -> WorkRef {
    WorkFn::arc(move |ctx: CancellationToken| async move {
        println!("[{resource}] watching generation {generation}");
        loop {
            tokio::select! {
                _ = ctx.cancelled() => {
                    println!("[{resource}] generation {generation} cancelled");
                    return Err(TaskError::Canceled);
                }
                _ = tokio::time::sleep(Duration::from_millis(700)) => {
                    println!("[{resource}] generation {generation} in sync");
                }
            }
        }
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter)];
    let sup = Supervisor::builder(SupervisorConfig {
        grace: Duration::from_secs(5),
        ..SupervisorConfig::default()
    })
    .with_subscribers(subs)
    .build();

    sup.submit("pod-a", Some(watcher("pod-a", 1)), None);
    sup.submit("pod-b", Some(watcher("pod-b", 1)), None);
    sup.start();

    tokio::time::sleep(Duration::from_secs(2)).await;
    sup.submit("pod-a", Some(watcher("pod-a", 2)), None);
    println!("active: {:?}", sup.active());

    tokio::select! {
        _ = sup.wait() => println!("interrupted"),
        _ = tokio::time::sleep(Duration::from_secs(3)) => sup.stop().await?,
    }
    Ok(())
}
