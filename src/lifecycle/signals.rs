//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT)
//! - Translate signals into the internal shutdown event
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - A signal triggers graceful shutdown, never an abort

use crate::lifecycle::shutdown::Shutdown;

/// Wait for an interrupt and trigger coordinated shutdown.
pub async fn watch_signals(shutdown: &Shutdown) {
    wait_for_interrupt().await;
    tracing::info!("Shutdown signal received");
    shutdown.trigger();
}

#[cfg(unix)]
async fn wait_for_interrupt() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                result = tokio::signal::ctrl_c() => log_listen_error(result),
                _ = term.recv() => {}
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to register SIGTERM handler");
            log_listen_error(tokio::signal::ctrl_c().await);
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_interrupt() {
    log_listen_error(tokio::signal::ctrl_c().await);
}

fn log_listen_error(result: std::io::Result<()>) {
    if let Err(e) = result {
        tracing::error!(error = %e, "Failed to listen for ctrl-c");
    }
}
