//! Lifecycle
//!
//! The scraper runs until stopped. [`Lifecycle`] holds the running flag and a
//! watch channel so a stop request can wake the poll loop out of its
//! inter-cycle wait. Signal handlers only call [`Lifecycle::stop`].

use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Running,
    Stopped,
}

#[derive(Debug)]
pub struct Lifecycle {
    running: AtomicBool,
    state: watch::Sender<State>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        let (state, _) = watch::channel(State::Running);
        Self {
            running: AtomicBool::new(true),
            state,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> State {
        *self.state.borrow()
    }

    /// Request a transition to [`State::Stopped`]. Idempotent.
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            tracing::info!("Stopping scraper...");
        }
        self.state.send_replace(State::Stopped);
    }

    /// Wait for `timeout` to elapse or for a stop request, whichever comes
    /// first. Returns `true` if woken by a stop request.
    pub async fn wait(&self, timeout: Duration) -> bool {
        let mut state = self.state.subscribe();
        tokio::select! {
            _ = tokio::time::sleep(timeout) => false,
            _ = state.wait_for(|state| *state == State::Stopped) => true,
        }
    }
}

/// Stop `lifecycle` on SIGINT or SIGTERM.
///
/// The handlers stay installed for the life of the process; later signals
/// repeat the (idempotent) stop request.
#[cfg(unix)]
pub fn spawn_signal_handler(lifecycle: Arc<Lifecycle>) -> Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt()).context("Failed to setup SIGINT handler")?;
    let mut sigterm = signal(SignalKind::terminate()).context("Failed to setup SIGTERM handler")?;

    Ok(tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT, initiating graceful shutdown");
                }
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, initiating graceful shutdown");
                }
            }
            lifecycle.stop();
        }
    }))
}

#[cfg(not(unix))]
pub fn spawn_signal_handler(lifecycle: Arc<Lifecycle>) -> Result<JoinHandle<()>> {
    Ok(tokio::spawn(async move {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
                return;
            }
            tracing::info!("Received Ctrl-C, initiating graceful shutdown");
            lifecycle.stop();
        }
    }))
}
