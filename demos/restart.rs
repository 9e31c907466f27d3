//! # Demo: restart
//!
//! Two ways of restarting a task from its finish callback:
//! - `restart_on_error`: immediate resubmission, as often as it fails;
//! - [`Restarter`]: exponential backoff with jitter and a restart budget.
//!
//! ## Flow
//! ```text
//! run "flaky"    ─► Err ─► restart_on_error ─► run ─► Err ─► ... ─► Ok (done)
//! run "doomed"   ─► Err ─► Restarter: sleep(backoff.next(0)) ─► run ─► Err
//!                ─► ... ─► budget exhausted (warn), no further runs
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=taskwarden=debug cargo run --example restart
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use taskwarden::{
    BackoffPolicy, FinishFn, JitterPolicy, NoInterrupt, Outcome, RestartPolicy, Restarter,
    Supervisor, SupervisorConfig, Task, TaskError, finish_fn, restart_on_error,
};
use tokio_util::sync::CancellationToken;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("taskwarden=debug").init();

    let sup = Supervisor::builder(SupervisorConfig::default())
        .with_interrupt(Arc::new(NoInterrupt))
        .with_on_finish(finish_fn(|_ctx, outcome: &Outcome| match outcome.error() {
            Some(err) => println!("[{}] finished: {err}", outcome.id()),
            None => println!("[{}] finished ok", outcome.id()),
        }))
        .build();

    // 1. Fails three times, then succeeds; restarted immediately each time.
    let attempts = Arc::new(AtomicU32::new(0));
    let flaky = Task::from_fn("flaky", move |_ctx: CancellationToken| {
        let attempt = attempts.fetch_add(1, Ordering::Relaxed) + 1;
        async move {
            if attempt <= 3 {
                Err(TaskError::fail(format!("attempt {attempt} failed")))
            } else {
                Ok(())
            }
        }
    })
    .with_on_finish(Arc::new(restart_on_error) as FinishFn);

    // 2. Never succeeds; restarted with growing delays until the budget runs out.
    let backoff = BackoffPolicy {
        first: Duration::from_millis(200),
        max: Duration::from_secs(2),
        factor: 2.0,
        jitter: JitterPolicy::Equal,
    };
    let doomed = Task::from_fn("doomed", |_ctx: CancellationToken| async {
        Err::<(), _>(TaskError::fail("upstream unavailable"))
    })
    .with_on_finish(
        Restarter::new(RestartPolicy::OnError)
            .with_backoff(backoff)
            .with_max_restarts(5)
            .into_finish(),
    );

    sup.submit_task(flaky.into_ref());
    sup.submit_task(doomed.into_ref());
    sup.start();

    tokio::time::sleep(Duration::from_secs(6)).await;
    sup.stop().await?;
    Ok(())
}
