//! Shutdown coordination for the service.

use tokio_util::sync::CancellationToken;

/// Coordinator for graceful shutdown.
///
/// Owns the process-wide cancellation scope. Every long-running task holds
/// a token from [`Shutdown::subscribe`]; [`Shutdown::trigger`] wakes all of
/// them at once, including tasks that subscribe after the fact.
#[derive(Debug, Clone)]
pub struct Shutdown {
    token: CancellationToken,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Token for one task. Cancelling it does not affect siblings.
    pub fn subscribe(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        self.token.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolve once the signal has been triggered.
    pub async fn wait(&self) {
        self.token.cancelled().await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
