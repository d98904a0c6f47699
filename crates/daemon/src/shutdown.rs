//! Termination signals.
//!
//! SIGINT (Ctrl-C) and, on Unix, SIGTERM both stop the daemon, so it shuts
//! down cleanly whether stopped interactively or by a service manager.

/// Which signal asked the daemon to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
}

/// Signal handlers, registered as soon as the listener is built.
pub struct ShutdownListener {
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
}

impl ShutdownListener {
    /// Register the handlers. Must be called from within a Tokio runtime.
    pub fn install() -> std::io::Result<Self> {
        Ok(Self {
            #[cfg(unix)]
            terminate: tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?,
        })
    }

    /// Wait for the first termination signal.
    pub async fn recv(self) -> ShutdownSignal {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to install Ctrl-C handler");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = {
            let mut terminate = self.terminate;
            async move {
                terminate.recv().await;
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            () = ctrl_c => {
                tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
                ShutdownSignal::Interrupt
            }
            () = terminate => {
                tracing::info!("Received SIGTERM, starting graceful shutdown");
                ShutdownSignal::Terminate
            }
        }
    }
}
