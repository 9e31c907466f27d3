use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::subscribers::Subscribe;
use crate::tasks::FinishFn;

use super::shutdown::{Interrupt, OsSignals};
use super::{Supervisor, SupervisorConfig};

/// Builder for a [`Supervisor`] with optional collaborators.
pub struct SupervisorBuilder {
    cfg: SupervisorConfig,
    parent: CancellationToken,
    on_finish: Option<FinishFn>,
    interrupt: Option<Arc<dyn Interrupt>>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl SupervisorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: SupervisorConfig) -> Self {
        Self {
            cfg,
            parent: CancellationToken::new(),
            on_finish: None,
            interrupt: None,
            subscribers: Vec::new(),
        }
    }

    /// Binds the supervisor to a parent scope; cancelling it tears the supervisor down.
    pub fn with_parent(mut self, parent: CancellationToken) -> Self {
        self.parent = parent;
        self
    }

    /// Global finish callback, invoked after each task's own callback.
    pub fn with_on_finish(mut self, on_finish: FinishFn) -> Self {
        self.on_finish = Some(on_finish);
        self
    }

    /// Interrupt source watched by the coordinating loop (default: [`OsSignals`]).
    pub fn with_interrupt(mut self, interrupt: Arc<dyn Interrupt>) -> Self {
        self.interrupt = Some(interrupt);
        self
    }

    /// Event subscribers. Their workers are spawned by `start`.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the supervisor in the `Created` state. Nothing is spawned yet.
    pub fn build(self) -> Supervisor {
        let interrupt = self
            .interrupt
            .unwrap_or_else(|| Arc::new(OsSignals) as Arc<dyn Interrupt>);
        Supervisor::from_parts(
            self.cfg,
            self.parent,
            self.on_finish,
            interrupt,
            self.subscribers,
        )
    }
}
