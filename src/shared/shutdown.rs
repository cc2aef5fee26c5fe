//! Stop signal for billing runs
//!
//! The scheduler loop waits on it; the orchestrator polls it between invoice
//! attempts, so a charge and its status write are never split.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};

/// Cloneable one-shot stop flag.
#[derive(Clone, Debug)]
pub struct ShutdownSignal {
    state: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self {
            state: Arc::new(state),
        }
    }

    pub fn is_triggered(&self) -> bool {
        *self.state.borrow()
    }

    /// Request a stop. Later calls are no-ops.
    pub fn trigger(&self) {
        if !self.state.send_replace(true) {
            info!("Billing shutdown requested");
        }
    }

    /// Resolves once [`trigger`](Self::trigger) has been called, immediately if it already was.
    pub async fn wait(&self) {
        let mut state = self.state.subscribe();
        // The sender lives as long as `self`, so the channel cannot close here.
        let _ = state.wait_for(|stopped| *stopped).await;
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Trigger `signal` on SIGINT/SIGTERM (Ctrl+C elsewhere).
pub async fn trigger_on_os_signal(signal: ShutdownSignal) {
    match os_signal().await {
        Ok(name) => {
            info!(signal = name, "Received OS signal");
            signal.trigger();
        }
        Err(e) => error!(error = %e, "Failed to listen for OS signals"),
    }
}

#[cfg(unix)]
async fn os_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = terminate.recv() => Ok("SIGTERM"),
        res = tokio::signal::ctrl_c() => res.map(|_| "SIGINT"),
    }
}

#[cfg(not(unix))]
async fn os_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await.map(|_| "Ctrl+C")
}
