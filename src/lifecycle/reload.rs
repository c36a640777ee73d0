//! Reload-on-demand of the config file.
//!
//! Producers (SIGHUP, the file watcher, `POST /reload`) push [`ReloadEvent`]s
//! into an unbounded channel. The listener re-reads the snapshot source and
//! overlays the result on the live snapshot, so anything the file omits,
//! including values learned from key watchers, is kept. Fields that fail
//! validation are treated as omitted.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::validation::sanitize_snapshot;
use crate::config::{ConfigSnapshot, ConfigStore, SnapshotSource};
use crate::observability::metrics;

/// Why a reload was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadEvent {
    /// SIGHUP.
    Signal,
    /// The config file was written.
    FileChanged,
    /// Admin endpoint.
    Manual,
}

pub struct ReloadListener {
    store: ConfigStore,
    source: Arc<dyn SnapshotSource>,
    events: mpsc::UnboundedReceiver<ReloadEvent>,
}

impl ReloadListener {
    pub fn new(
        store: ConfigStore,
        source: Arc<dyn SnapshotSource>,
        events: mpsc::UnboundedReceiver<ReloadEvent>,
    ) -> Self {
        Self {
            store,
            source,
            events,
        }
    }

    /// Handle events until `cancel` fires. If every producer goes away the
    /// listener idles until cancellation.
    pub async fn run(mut self, cancel: CancellationToken) {
        tracing::info!(source = %self.source.describe(), "Reload listener starting");

        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                event = self.events.recv() => event,
            };

            match event {
                Some(event) => {
                    self.reload(event).await;
                }
                None => {
                    tracing::debug!("All reload triggers closed");
                    cancel.cancelled().await;
                    break;
                }
            }
        }

        tracing::info!("Reload listener received shutdown signal, exiting loop");
    }

    /// Re-read the source and merge it over the live snapshot.
    ///
    /// A failed read, or one with nothing usable in it, leaves the store as
    /// it was. Returns the snapshot after the merge.
    pub async fn reload(&self, event: ReloadEvent) -> ConfigSnapshot {
        tracing::info!(trigger = ?event, source = %self.source.describe(), "Reloading config");

        // Sources may do blocking file I/O; keep it off the runtime workers
        // and away from the store lock.
        let source = Arc::clone(&self.source);
        let loaded = match tokio::task::spawn_blocking(move || source.load()).await {
            Ok(Ok(snapshot)) => Some(snapshot),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Failed to load config, keeping current values");
                None
            }
            Err(e) => {
                tracing::error!(error = %e, "Config load task failed, keeping current values");
                None
            }
        };
        let Some(loaded) = loaded else {
            metrics::record_reload("failed");
            return self.store.snapshot();
        };

        let (fresh, problems) = sanitize_snapshot(loaded);
        for problem in &problems {
            tracing::warn!(error = %problem, "Ignoring config file value, keeping current value");
        }
        metrics::record_reload("loaded");

        if fresh.is_empty() {
            tracing::debug!("Reloaded config has no values to apply");
            return self.store.snapshot();
        }
        self.store.merge_over(&fresh)
    }
}
