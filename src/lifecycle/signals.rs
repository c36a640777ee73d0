//! OS signal handling.
//!
//! - SIGINT/SIGTERM → trigger graceful shutdown
//! - SIGHUP → send a reload event, never shutdown

use tokio::sync::mpsc;

use crate::lifecycle::reload::ReloadEvent;
use crate::lifecycle::shutdown::Shutdown;

/// Spawn the signal listeners. They exit once shutdown is triggered.
pub fn spawn_signal_handlers(shutdown: &Shutdown, reload_tx: mpsc::UnboundedSender<ReloadEvent>) {
    let on_terminate = shutdown.clone();
    tokio::spawn(async move {
        wait_for_terminate().await;
        tracing::info!("Shutdown signal received");
        on_terminate.trigger();
    });

    #[cfg(unix)]
    {
        let cancel = shutdown.subscribe();
        tokio::spawn(async move {
            let mut hangup = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::hangup()) {
                Ok(signal) => signal,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install SIGHUP handler, reload on signal disabled");
                    return;
                }
            };
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = hangup.recv() => {
                        tracing::info!("Captured SIGHUP, reloading config");
                        if reload_tx.send(ReloadEvent::Signal).is_err() {
                            break;
                        }
                    }
                }
            }
        });
    }
    #[cfg(not(unix))]
    drop(reload_tx);
}

#[cfg(unix)]
async fn wait_for_terminate() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                _ = ctrl_c() => {}
                _ = terminate.recv() => {}
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install SIGTERM handler");
            ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_terminate() {
    ctrl_c().await;
}

/// Ctrl+C, or never if the handler cannot be installed.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
}
