//! Configuration file watcher for hot reload.
//!
//! Emits a [`ReloadEvent::FileChanged`] whenever the config file is written;
//! the reload listener does the actual re-read and merge.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::lifecycle::reload::ReloadEvent;

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    reload_tx: mpsc::UnboundedSender<ReloadEvent>,
}

impl ConfigWatcher {
    pub fn new(path: &Path, reload_tx: mpsc::UnboundedSender<ReloadEvent>) -> Self {
        Self {
            path: path.to_path_buf(),
            reload_tx,
        }
    }

    /// Start watching the file on notify's background thread.
    ///
    /// The returned watcher must be kept alive for events to keep flowing.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.reload_tx.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::debug!(paths = ?event.paths, "Config file change detected");
                        let _ = tx.send(ReloadEvent::FileChanged);
                    }
                }
                Err(e) => tracing::error!(error = %e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}
