//! Graceful Shutdown Module
//!
//! Signal handling plus a shutdown broadcast that long-running area streams
//! observe, so they stop promptly instead of holding the server open.

use std::future::Future;
use std::time::Duration;

use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Shutdown coordinator for graceful termination
#[derive(Debug)]
pub struct ShutdownCoordinator {
    shutdown_tx: watch::Sender<bool>,
}

impl ShutdownCoordinator {
    /// Creates a new shutdown coordinator
    #[must_use]
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self { shutdown_tx }
    }

    /// Gets a shutdown receiver
    #[must_use]
    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            receiver: self.shutdown_tx.subscribe(),
        }
    }

    /// Broadcasts the shutdown signal to every subscriber
    pub fn trigger(&self) {
        info!("Initiating graceful shutdown");
        self.shutdown_tx.send_replace(true);
    }

    /// True once [`Self::trigger`] has been called
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        *self.shutdown_tx.borrow()
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Shutdown signal receiver
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    receiver: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// A signal that never fires, for callers with no coordinator.
    #[must_use]
    pub fn never() -> Self {
        // A closed channel keeps reading `false`.
        let (tx, receiver) = watch::channel(false);
        drop(tx);
        Self { receiver }
    }

    /// Waits for shutdown signal
    pub async fn recv(mut self) {
        self.wait().await;
    }

    /// Waits for shutdown without consuming the signal
    pub async fn wait(&mut self) {
        loop {
            if *self.receiver.borrow_and_update() {
                return;
            }
            if self.receiver.changed().await.is_err() {
                // Coordinator gone without triggering: never resolve.
                std::future::pending::<()>().await;
            }
        }
    }

    /// Checks if shutdown has been signaled (non-blocking)
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        *self.receiver.borrow()
    }
}

/// Waits for SIGTERM or SIGINT
pub async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            info!("Received SIGTERM, initiating shutdown");
        }
    }
}

/// Runs a server with graceful shutdown support
///
/// The server future is expected to watch a [`ShutdownSignal`] from the same
/// coordinator (e.g. through `serve_with_shutdown`). On SIGINT/SIGTERM the
/// coordinator is triggered and the server gets `shutdown_timeout` to drain.
pub async fn run_with_graceful_shutdown<F, E>(
    server_future: F,
    coordinator: &ShutdownCoordinator,
    shutdown_timeout: Duration,
) where
    F: Future<Output = Result<(), E>> + Send,
    E: std::fmt::Display,
{
    tokio::pin!(server_future);

    let result = tokio::select! {
        result = &mut server_future => Some(result),
        () = wait_for_signal() => None,
    };

    let result = match result {
        Some(result) => result,
        None => {
            coordinator.trigger();
            match tokio::time::timeout(shutdown_timeout, &mut server_future).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(
                        timeout_secs = shutdown_timeout.as_secs(),
                        "Shutdown timeout reached, abandoning in-flight calls"
                    );
                    return;
                }
            }
        }
    };

    match result {
        Ok(()) => info!("Server stopped normally"),
        Err(e) => error!(error = %e, "Server error"),
    }
}
