//! End-to-end behaviour of the supervisor through its public API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use taskwarden::{
    BackoffPolicy, Event, EventKind, FinishFn, NoInterrupt, Outcome, RestartPolicy, Restarter,
    Subscribe, Supervisor, SupervisorConfig, Task, TaskError, WorkFn, WorkRef, finish_fn,
    restart_on_error,
};

fn quiet() -> Supervisor {
    Supervisor::builder(SupervisorConfig::default())
        .with_interrupt(Arc::new(NoInterrupt))
        .build()
}

fn counting(hits: &Arc<AtomicUsize>) -> WorkRef {
    let hits = hits.clone();
    WorkFn::arc(move |_ctx: CancellationToken| {
        let hits = hits.clone();
        async move {
            hits.fetch_add(1, Ordering::SeqCst);
            Ok::<_, TaskError>(())
        }
    })
}

/// Parks until cancelled, then takes a moment to clean up before returning.
fn lingering(started: &Arc<AtomicUsize>, finished: &Arc<AtomicUsize>) -> WorkRef {
    let started = started.clone();
    let finished = finished.clone();
    WorkFn::arc(move |ctx: CancellationToken| {
        let started = started.clone();
        let finished = finished.clone();
        async move {
            started.fetch_add(1, Ordering::SeqCst);
            ctx.cancelled().await;
            tokio::time::sleep(Duration::from_millis(20)).await;
            finished.fetch_add(1, Ordering::SeqCst);
            Err(TaskError::Canceled)
        }
    })
}

async fn eventually(mut cond: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn pre_and_post_start_submissions_all_run() -> anyhow::Result<()> {
    let sup = quiet();
    let counter = Arc::new(AtomicUsize::new(0));

    for i in 0..5 {
        sup.submit(i.to_string(), Some(counting(&counter)), None);
    }
    sup.start();
    for i in 0..5 {
        sup.submit(i.to_string(), Some(counting(&counter)), None);
    }
    sup.stop().await?;

    assert_eq!(counter.load(Ordering::SeqCst), 10);
    Ok(())
}

#[tokio::test]
async fn repeated_start_and_stop_act_once() -> anyhow::Result<()> {
    let sup = quiet();
    let mut events = sup.events();
    let counter = Arc::new(AtomicUsize::new(0));
    for i in 0..3 {
        sup.submit(format!("job-{i}"), Some(counting(&counter)), None);
    }

    for _ in 0..4 {
        sup.start();
    }
    for _ in 0..4 {
        sup.stop().await?;
    }

    assert_eq!(counter.load(Ordering::SeqCst), 3);
    let mut shutdowns = 0;
    let mut all_stopped = 0;
    while let Ok(ev) = events.try_recv() {
        match ev.kind {
            EventKind::ShutdownRequested => shutdowns += 1,
            EventKind::AllStopped => all_stopped += 1,
            _ => {}
        }
    }
    assert_eq!((shutdowns, all_stopped), (1, 1));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stop_joins_every_run() -> anyhow::Result<()> {
    let sup = quiet();
    let mut events = sup.events();
    let started = Arc::new(AtomicUsize::new(0));
    let finished = Arc::new(AtomicUsize::new(0));

    for i in 0..8 {
        sup.submit(format!("worker-{i}"), Some(lingering(&started, &finished)), None);
    }
    sup.start();
    eventually(|| started.load(Ordering::SeqCst) == 8).await;

    sup.stop().await?;
    assert_eq!(finished.load(Ordering::SeqCst), 8);
    assert!(sup.active().is_empty());
    assert_eq!(sup.detached(), 0);

    let mut observed = 0;
    let mut last = None;
    while let Ok(ev) = events.try_recv() {
        if ev.kind == EventKind::OutcomeObserved {
            observed += 1;
        }
        last = Some(ev.kind);
    }
    assert_eq!(observed, 8);
    assert_eq!(last, Some(EventKind::AllStopped));
    Ok(())
}

#[tokio::test]
async fn later_pending_submission_wins() -> anyhow::Result<()> {
    let sup = quiet();
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));
    let mut events = sup.events();

    sup.submit("sync", Some(counting(&first)), None);
    sup.submit("sync", Some(counting(&second)), None);

    let ev = events.try_recv()?;
    assert_eq!(ev.kind, EventKind::TaskQueued);
    let ev = events.try_recv()?;
    assert_eq!(ev.kind, EventKind::TaskReplaced);
    assert_eq!(ev.reason.as_deref(), Some("pending"));

    sup.start();
    sup.stop().await?;
    assert_eq!(first.load(Ordering::SeqCst), 0);
    assert_eq!(second.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn running_replacement_keeps_one_entry_per_id() -> anyhow::Result<()> {
    let sup = quiet();
    sup.start();

    let started = Arc::new(AtomicUsize::new(0));
    let finished = Arc::new(AtomicUsize::new(0));
    for round in 1..=5 {
        sup.submit("lease", Some(lingering(&started, &finished)), None);
        eventually(|| started.load(Ordering::SeqCst) == round).await;
        assert_eq!(sup.active(), vec!["lease".to_string()]);
    }

    // every predecessor was cancelled and returned on its own
    eventually(|| finished.load(Ordering::SeqCst) == 4).await;
    assert_eq!(sup.active(), vec!["lease".to_string()]);

    sup.stop().await?;
    assert_eq!(finished.load(Ordering::SeqCst), 5);
    Ok(())
}

#[tokio::test]
async fn single_failure_restarts_exactly_once() -> anyhow::Result<()> {
    let sup = quiet();
    let runs = Arc::new(AtomicUsize::new(0));
    let r = runs.clone();
    let work = WorkFn::arc(move |_ctx: CancellationToken| {
        let n = r.fetch_add(1, Ordering::SeqCst);
        async move {
            if n == 0 {
                Err(TaskError::fail("transient"))
            } else {
                Ok(())
            }
        }
    });

    sup.submit("flaky", Some(work), Some(Arc::new(restart_on_error) as FinishFn));
    sup.start();
    eventually(|| runs.load(Ordering::SeqCst) == 2).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    sup.stop().await?;

    assert_eq!(runs.load(Ordering::SeqCst), 2);
    Ok(())
}

struct Recorder {
    log: Arc<Mutex<Vec<&'static str>>>,
}

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, ev: &Event) {
        if ev.kind == EventKind::OutcomeObserved && ev.task.as_deref() == Some("ordered") {
            self.log.lock().unwrap().push("observed");
        }
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

#[tokio::test]
async fn own_callback_then_global_then_observed() -> anyhow::Result<()> {
    let log = Arc::new(Mutex::new(Vec::new()));

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(Recorder { log: log.clone() })];
    let global_log = log.clone();
    let sup = Supervisor::builder(SupervisorConfig::default())
        .with_interrupt(Arc::new(NoInterrupt))
        .with_on_finish(finish_fn(move |_ctx, _outcome: &Outcome| {
            global_log.lock().unwrap().push("global");
        }))
        .with_subscribers(subs)
        .build();

    let own_log = log.clone();
    let task = Task::from_fn("ordered", |_ctx: CancellationToken| async {
        Ok::<_, TaskError>(())
    })
    .with_on_finish(finish_fn(move |_ctx, _outcome: &Outcome| {
        own_log.lock().unwrap().push("own");
    }));

    sup.submit_task(task.into_ref());
    sup.start();
    eventually(|| log.lock().unwrap().len() == 3).await;
    sup.stop().await?;

    assert_eq!(*log.lock().unwrap(), vec!["own", "global", "observed"]);
    Ok(())
}

#[tokio::test]
async fn callbacks_receive_the_run_token() -> anyhow::Result<()> {
    let sup = quiet();
    let seen = Arc::new(Mutex::new(None::<CancellationToken>));
    let s = seen.clone();
    sup.submit(
        "token",
        None,
        Some(finish_fn(move |ctx, _outcome: &Outcome| {
            *s.lock().unwrap() = Some(ctx);
        })),
    );
    sup.start();
    eventually(|| seen.lock().unwrap().is_some()).await;

    let token = seen.lock().unwrap().take().expect("token recorded");
    assert!(!token.is_cancelled());
    sup.stop().await?;
    assert!(token.is_cancelled());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parent_cancellation_tears_down_like_stop() -> anyhow::Result<()> {
    let parent = CancellationToken::new();
    let sup = Supervisor::builder(SupervisorConfig::default())
        .with_parent(parent.clone())
        .with_interrupt(Arc::new(NoInterrupt))
        .build();
    let mut events = sup.events();

    let started = Arc::new(AtomicUsize::new(0));
    let finished = Arc::new(AtomicUsize::new(0));
    for i in 0..4 {
        sup.submit(format!("watch-{i}"), Some(lingering(&started, &finished)), None);
    }
    sup.start();
    eventually(|| started.load(Ordering::SeqCst) == 4).await;

    parent.cancel();
    tokio::time::timeout(Duration::from_secs(5), sup.wait()).await?;

    assert!(sup.is_stopped());
    assert!(sup.active().is_empty());
    assert_eq!(finished.load(Ordering::SeqCst), 4);

    let mut reason = None;
    let mut all_stopped = false;
    while let Ok(ev) = events.try_recv() {
        match ev.kind {
            EventKind::ShutdownRequested => reason = ev.reason.clone(),
            EventKind::AllStopped => all_stopped = true,
            _ => {}
        }
    }
    assert_eq!(reason.as_deref(), Some("parent_cancelled"));
    assert!(all_stopped);

    // teardown already happened; an explicit stop is a no-op
    sup.stop().await?;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn restarter_gives_up_after_budget() -> anyhow::Result<()> {
    let sup = quiet();
    let runs = Arc::new(AtomicUsize::new(0));
    let r = runs.clone();
    let work = WorkFn::arc(move |_ctx: CancellationToken| {
        r.fetch_add(1, Ordering::SeqCst);
        async { Err::<(), _>(TaskError::fail("always")) }
    });
    let on_finish = Restarter::new(RestartPolicy::OnError)
        .with_backoff(BackoffPolicy {
            first: Duration::from_secs(1),
            max: Duration::from_secs(4),
            factor: 2.0,
            ..BackoffPolicy::default()
        })
        .with_max_restarts(4)
        .into_finish();

    sup.submit("doomed", Some(work), Some(on_finish));
    sup.start();

    // delays: 1s, 2s, 4s, 4s
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(runs.load(Ordering::SeqCst), 2);
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(runs.load(Ordering::SeqCst), 5);

    sup.stop().await?;
    Ok(())
}
