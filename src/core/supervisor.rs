//! # Supervisor: id-addressed runs, same-id replacement, orderly teardown.
//!
//! ## Lifecycle
//! ```text
//! Created ──start()──► Started ──stop() / interrupt / parent cancel──► Stopped
//!
//! Created:  submit() stores the task in the pending set (same id → replaced)
//! Started:  submit() launches immediately (same id running → cancel it, then launch)
//! Stopped:  submit() is dropped silently
//! ```
//!
//! ## Teardown
//! ```text
//! state = Stopped            (admin lock, released immediately)
//!   └─► publish ShutdownRequested
//!   └─► registry.cancel_all() + scope.cancel()
//!   └─► tracker.wait()       (no lock held; optionally bounded by cfg.grace)
//!   └─► drop last outcome sender → queue closed → coordinating loop exits
//!   └─► publish AllStopped / GraceExceeded, release wait()ers
//! ```
//! A `stop()` arriving while another trigger is tearing down waits for that
//! teardown to finish instead of starting a second one.
//!
//! ## Locking
//! Two independent mutual-exclusion domains:
//! - the **admin** lock: state, pending set, outcome sender, loop handle;
//! - the **registry** lock: id → cancel handle (see `registry`).
//!
//! The admin lock is taken before the registry lock when both are needed
//! (launch), never the other way round, and neither is held across an await.
//! Holding the admin lock while launching is what makes `Stopped` a hard
//! boundary: every run that will ever exist is in the registry by the time
//! teardown cancels it.
//!
//! ## Self-submission
//! A work routine submitting its own id is well-defined: the call cancels the
//! caller's token and installs a fresh run; the caller's later release is a
//! no-op because its run number no longer matches.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::core::{
    SupervisorBuilder, SupervisorConfig, coordinator, lock, registry::Registry, runner,
    shutdown::Interrupt,
};
use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::subscribers::{Subscribe, SubscriberSet};
use crate::tasks::{FinishFn, Outcome, Task, TaskRef, WorkRef};

/// Lifecycle state; transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Created,
    Started,
    Stopped,
}

/// What started a teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Trigger {
    Stop,
    Interrupt,
    ParentCancelled,
}

impl Trigger {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Trigger::Stop => "stop",
            Trigger::Interrupt => "interrupt",
            Trigger::ParentCancelled => "parent_cancelled",
        }
    }
}

/// State guarded by the admin lock.
struct Admin {
    state: State,
    pending: Vec<TaskRef>,
    outcomes_tx: Option<mpsc::Sender<Outcome>>,
    outcomes_rx: Option<mpsc::Receiver<Outcome>>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    coordinator: Option<JoinHandle<()>>,
}

pub(crate) struct Inner {
    cfg: SupervisorConfig,
    admin: Mutex<Admin>,
    pub(crate) registry: Registry,
    tracker: TaskTracker,
    /// Supervisor lifetime scope; every run token is a child of it.
    scope: CancellationToken,
    pub(crate) parent: CancellationToken,
    pub(crate) on_finish: Option<FinishFn>,
    pub(crate) interrupt: Arc<dyn Interrupt>,
    pub(crate) bus: Bus,
    /// Cancelled once teardown has finished.
    done: CancellationToken,
    detached: AtomicUsize,
}

/// Concurrent task supervisor.
///
/// Cheap to clone; all clones drive the same supervisor.
///
/// # Example
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use tokio_util::sync::CancellationToken;
/// use taskwarden::{NoInterrupt, Supervisor, SupervisorConfig, TaskError, WorkFn};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let sup = Supervisor::builder(SupervisorConfig::default())
///         .with_interrupt(Arc::new(NoInterrupt))
///         .build();
///
///     let hits = Arc::new(AtomicUsize::new(0));
///     let h = hits.clone();
///     sup.submit("counter", Some(WorkFn::arc(move |_ctx: CancellationToken| {
///         let h = h.clone();
///         async move {
///             h.fetch_add(1, Ordering::SeqCst);
///             Ok::<_, TaskError>(())
///         }
///     })), None);
///
///     sup.start();
///     sup.stop().await?;
///     assert_eq!(hits.load(Ordering::SeqCst), 1);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Supervisor {
    inner: Arc<Inner>,
}

impl Supervisor {
    /// Creates a supervisor bound to `parent` with an optional global finish callback.
    ///
    /// Uses [`SupervisorConfig::default`] and listens for OS termination signals.
    pub fn new(parent: CancellationToken, on_finish: Option<FinishFn>) -> Self {
        let mut builder = SupervisorBuilder::new(SupervisorConfig::default()).with_parent(parent);
        if let Some(f) = on_finish {
            builder = builder.with_on_finish(f);
        }
        builder.build()
    }

    /// Starts a builder with the given configuration.
    pub fn builder(cfg: SupervisorConfig) -> SupervisorBuilder {
        SupervisorBuilder::new(cfg)
    }

    pub(crate) fn from_parts(
        cfg: SupervisorConfig,
        parent: CancellationToken,
        on_finish: Option<FinishFn>,
        interrupt: Arc<dyn Interrupt>,
        subscribers: Vec<Arc<dyn Subscribe>>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(cfg.outcome_capacity_clamped());
        let bus = Bus::new(cfg.bus_capacity_clamped());
        let inner = Inner {
            admin: Mutex::new(Admin {
                state: State::Created,
                pending: Vec::new(),
                outcomes_tx: Some(tx),
                outcomes_rx: Some(rx),
                subscribers,
                coordinator: None,
            }),
            registry: Registry::new(),
            tracker: TaskTracker::new(),
            scope: parent.child_token(),
            parent,
            on_finish,
            interrupt,
            bus,
            done: CancellationToken::new(),
            detached: AtomicUsize::new(0),
            cfg,
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    pub(crate) fn from_inner(inner: Arc<Inner>) -> Self {
        Self { inner }
    }

    /// Submits a task built from its parts. See [`submit_task`](Self::submit_task).
    pub fn submit(
        &self,
        id: impl Into<std::borrow::Cow<'static, str>>,
        work: Option<WorkRef>,
        on_finish: Option<FinishFn>,
    ) {
        self.submit_task(Arc::new(Task::new(id, work, on_finish)));
    }

    /// Submits a task.
    ///
    /// - **Created**: stored in the pending set, replacing a pending task with the same id.
    /// - **Started**: launched now; an active run with the same id is cancelled first.
    ///   Must be called from within a Tokio runtime.
    /// - **Stopped**: dropped.
    pub fn submit_task(&self, task: TaskRef) {
        let mut admin = lock(&self.inner.admin);
        let state = admin.state;
        match state {
            State::Stopped => {
                debug!(task = task.id(), "supervisor stopped; submission dropped");
            }
            State::Created => {
                let id = task.id().to_string();
                let replaced = match admin.pending.iter().position(|t| t.id() == id) {
                    Some(pos) => {
                        admin.pending.remove(pos);
                        true
                    }
                    None => false,
                };
                admin.pending.push(task);
                drop(admin);

                if replaced {
                    debug!(task = %id, "pending task replaced");
                    self.inner.bus.publish(
                        Event::new(EventKind::TaskReplaced)
                            .with_task(id)
                            .with_reason("pending"),
                    );
                } else {
                    debug!(task = %id, "task queued until start");
                    self.inner
                        .bus
                        .publish(Event::new(EventKind::TaskQueued).with_task(id));
                }
            }
            State::Started => {
                if let Some(tx) = admin.outcomes_tx.clone() {
                    self.inner.launch(tx, task);
                }
            }
        }
    }

    /// Starts the coordinating loop and launches every pending task.
    ///
    /// Repeated calls while started are no-ops. Must be called from within a Tokio runtime.
    ///
    /// # Panics
    /// If the supervisor has already been stopped.
    pub fn start(&self) {
        let inner = &self.inner;
        let mut admin = lock(&inner.admin);
        let state = admin.state;
        match state {
            State::Started => return,
            State::Stopped => panic!("Supervisor::start called on a stopped supervisor"),
            State::Created => {}
        }
        admin.state = State::Started;

        let subscribers = std::mem::take(&mut admin.subscribers);
        if !subscribers.is_empty() {
            inner.spawn_listener(subscribers);
        }
        if let Some(rx) = admin.outcomes_rx.take() {
            admin.coordinator = Some(tokio::spawn(coordinator::run(Arc::clone(inner), rx)));
        }

        let pending = std::mem::take(&mut admin.pending);
        info!(pending = pending.len(), "supervisor started");
        if let Some(tx) = admin.outcomes_tx.clone() {
            for task in pending {
                inner.launch(tx.clone(), task);
            }
        }
    }

    /// Cancels every active run, waits for all of them to return and closes the outcome queue.
    ///
    /// Repeated calls do not tear down again; they resolve once the teardown in
    /// progress has finished and return `Ok(())`. Awaiting this from inside a
    /// supervised work routine never completes: the barrier includes that run.
    ///
    /// # Errors
    /// [`RuntimeError::GraceExceeded`] if a grace period is configured and runs
    /// were still active when it elapsed.
    ///
    /// # Panics
    /// If the supervisor was never started.
    pub async fn stop(&self) -> Result<(), RuntimeError> {
        self.inner.shutdown(Trigger::Stop).await
    }

    /// Resolves once teardown has completed, whichever trigger started it.
    pub async fn wait(&self) {
        self.inner.done.cancelled().await;
    }

    /// Current lifecycle state.
    pub fn state(&self) -> State {
        lock(&self.inner.admin).state
    }

    /// True once `start` has been called (stays true after stop).
    pub fn is_started(&self) -> bool {
        self.state() != State::Created
    }

    pub fn is_stopped(&self) -> bool {
        self.state() == State::Stopped
    }

    /// `is_started() && !is_stopped()`.
    pub fn is_running(&self) -> bool {
        self.state() == State::Started
    }

    /// Sorted ids of the runs currently registered as active.
    pub fn active(&self) -> Vec<String> {
        self.inner.registry.ids()
    }

    /// Number of runs abandoned because a grace period elapsed.
    pub fn detached(&self) -> usize {
        self.inner.detached.load(Ordering::Relaxed)
    }

    /// The supervisor's lifetime token, cancelled at teardown.
    pub fn scope(&self) -> CancellationToken {
        self.inner.scope.clone()
    }

    /// Receiver of lifecycle events published from now on.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.inner.bus.subscribe()
    }

    /// Resubmits `task` after `delay`, unless teardown begins first.
    ///
    /// The delay is tracked by the completion barrier, so `stop` never leaves it behind.
    pub(crate) fn submit_after(&self, task: TaskRef, delay: Duration) {
        if delay.is_zero() {
            self.submit_task(task);
            return;
        }
        let sup = self.clone();
        let scope = self.inner.scope.clone();
        self.inner.tracker.spawn(async move {
            tokio::select! {
                _ = scope.cancelled() => {}
                _ = tokio::time::sleep(delay) => sup.submit_task(task),
            }
        });
    }
}

impl Inner {
    /// Installs and spawns one run. Called with the admin lock held.
    fn launch(self: &Arc<Self>, tx: mpsc::Sender<Outcome>, task: TaskRef) {
        let token = self.scope.child_token();
        let installed = self.registry.install(task.id(), token.clone());
        if installed.replaced {
            debug!(task = task.id(), run = installed.run, "active run replaced");
            self.bus.publish(
                Event::new(EventKind::TaskReplaced)
                    .with_task(task.id())
                    .with_reason("running"),
            );
        }
        self.tracker.spawn(runner::drive(
            Arc::clone(self),
            task,
            token,
            installed.run,
            tx,
        ));
    }

    fn spawn_listener(&self, subscribers: Vec<Arc<dyn Subscribe>>) {
        let mut rx = self.bus.subscribe();
        let set = SubscriberSet::new(subscribers, self.bus.clone());
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => {
                        set.emit(&ev);
                        if ev.is_terminal() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "event listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            set.shutdown().await;
        });
    }

    /// The teardown sequence shared by `stop`, interrupts and parent cancellation.
    pub(crate) async fn shutdown(&self, trigger: Trigger) -> Result<(), RuntimeError> {
        let first = {
            let mut admin = lock(&self.admin);
            let state = admin.state;
            match state {
                State::Created => panic!("Supervisor::stop called before start"),
                State::Stopped => None,
                State::Started => {
                    admin.state = State::Stopped;
                    Some(admin.coordinator.take())
                }
            }
        };
        let Some(coordinator) = first else {
            // Another trigger owns the teardown; join it without repeating it.
            self.done.cancelled().await;
            return Ok(());
        };

        info!(trigger = trigger.as_str(), "supervisor stopping");
        self.bus
            .publish(Event::new(EventKind::ShutdownRequested).with_reason(trigger.as_str()));

        let cancelled = self.registry.cancel_all();
        self.scope.cancel();
        self.tracker.close();
        debug!(cancelled, "active runs cancelled; waiting for them to return");

        let result = match self.cfg.grace_period() {
            None => {
                self.tracker.wait().await;
                Ok(())
            }
            Some(grace) => match tokio::time::timeout(grace, self.tracker.wait()).await {
                Ok(()) => Ok(()),
                Err(_elapsed) => {
                    let stuck = self.registry.ids();
                    self.detached.fetch_add(self.tracker.len(), Ordering::Relaxed);
                    warn!(?grace, ?stuck, "runs still active after grace period; detaching");
                    self.bus.publish(
                        Event::new(EventKind::GraceExceeded).with_reason(stuck.join(",")),
                    );
                    Err(RuntimeError::GraceExceeded { grace, stuck })
                }
            },
        };

        // Dropping the last sender we own closes the queue once the runs' clones are gone.
        drop(lock(&self.admin).outcomes_tx.take());

        if result.is_ok() {
            if let Some(handle) = coordinator {
                if let Err(err) = handle.await {
                    warn!(error = %err, "coordinating loop terminated abnormally");
                }
            }
            self.bus.publish(Event::new(EventKind::AllStopped));
            info!(trigger = trigger.as_str(), "supervisor stopped");
        }

        self.done.cancel();
        result
    }
}
