//! # Interrupt sources.
//!
//! The coordinating loop treats an [`Interrupt`] as one of its shutdown
//! triggers. Sources are injected through the builder, so independent
//! supervisors (and tests) never share hidden global state.
//!
//! - [`OsSignals`]: `SIGINT`, `SIGTERM`, `SIGQUIT` on unix; Ctrl-C elsewhere (default)
//! - [`ManualInterrupt`]: fired programmatically via [`ManualInterrupt::trigger`]
//! - [`NoInterrupt`]: never fires

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// External event stream that requests shutdown.
#[async_trait]
pub trait Interrupt: Send + Sync + 'static {
    /// Resolves when an interrupt arrives. May never resolve.
    async fn wait(&self);
}

/// Process termination signals.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsSignals;

#[async_trait]
impl Interrupt for OsSignals {
    async fn wait(&self) {
        if let Err(err) = wait_for_shutdown_signal().await {
            warn!(error = %err, "signal registration failed; OS interrupts disabled");
            std::future::pending::<()>().await;
        }
    }
}

/// Interrupt fired by calling [`trigger`](ManualInterrupt::trigger); clones share state.
#[derive(Debug, Default, Clone)]
pub struct ManualInterrupt {
    token: CancellationToken,
}

impl ManualInterrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires the interrupt. Idempotent.
    pub fn trigger(&self) {
        self.token.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }
}

#[async_trait]
impl Interrupt for ManualInterrupt {
    async fn wait(&self) {
        self.token.cancelled().await;
    }
}

/// Interrupt source that never fires.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoInterrupt;

#[async_trait]
impl Interrupt for NoInterrupt {
    async fn wait(&self) {
        std::future::pending::<()>().await;
    }
}

/// Waits for a termination signal; each call registers its own listeners.
#[cfg(unix)]
async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {},
        _ = sigint.recv()  => {},
        _ = sigterm.recv() => {},
        _ = sigquit.recv() => {},
    }
    Ok(())
}

/// Waits for a termination signal; each call registers its own listeners.
#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn manual_interrupt_fires_all_clones() {
        let a = ManualInterrupt::new();
        let b = a.clone();
        assert!(!b.is_triggered());

        a.trigger();
        a.trigger();
        tokio::time::timeout(Duration::from_secs(1), b.wait())
            .await
            .expect("clone should observe trigger");
        assert!(b.is_triggered());
    }

    #[tokio::test(start_paused = true)]
    async fn no_interrupt_never_fires() {
        let fired = tokio::time::timeout(Duration::from_secs(3600), NoInterrupt.wait()).await;
        assert!(fired.is_err());
    }
}
