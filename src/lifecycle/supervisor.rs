//! Startup orchestration of the synchronization engine.
//!
//! # Responsibilities
//! - Build the initial snapshot (config file over defaults)
//! - Validate settings before anything starts
//! - Spawn one KeyWatcher per watched key, the heartbeat and the reload
//!   listener, all on the shared cancellation scope
//!
//! # Design Decisions
//! - Fail fast: invalid engine tunables abort startup
//! - Unusable snapshot fields from the file are dropped with a warning and
//!   the defaults show through
//! - After startup no error is fatal; tasks only exit on cancellation
//! - The supervisor keeps no state beyond the task set

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::config::validation::{sanitize_snapshot, validate_settings, ValidationError};
use crate::config::{ConfigSnapshot, ConfigStore, SnapshotSource, SyncSettings};
use crate::health::Heartbeat;
use crate::lifecycle::reload::{ReloadEvent, ReloadListener};
use crate::lifecycle::shutdown::Shutdown;
use crate::resilience::RateLimiter;
use crate::sync::KeyWatcher;

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("invalid sync settings: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "))]
    Invalid(Vec<ValidationError>),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// The snapshot the engine starts from: the file (if it loaded) over the
/// defaults. Unusable file fields are logged and left to the defaults.
pub fn initial_snapshot(file: Option<&ConfigSnapshot>) -> ConfigSnapshot {
    let defaults = ConfigSnapshot::defaults();
    let Some(file) = file else {
        return defaults;
    };

    let (file, problems) = sanitize_snapshot(file.clone());
    for problem in &problems {
        tracing::warn!(error = %problem, "Ignoring config file value, using default");
    }
    file.merge(&defaults)
}

pub struct Supervisor {
    settings: SyncSettings,
    source: Arc<dyn SnapshotSource>,
}

impl Supervisor {
    pub fn new(settings: SyncSettings, source: Arc<dyn SnapshotSource>) -> Self {
        Self { settings, source }
    }

    /// Start every background task. Must be called inside a tokio runtime.
    ///
    /// `file` is the snapshot loaded at startup, if loading succeeded.
    pub fn start(
        self,
        file: Option<&ConfigSnapshot>,
        reloads: mpsc::UnboundedReceiver<ReloadEvent>,
        shutdown: &Shutdown,
    ) -> Result<SupervisorHandle, SupervisorError> {
        validate_settings(&self.settings).map_err(SupervisorError::Invalid)?;
        let snapshot = initial_snapshot(file);

        // The store agent is local; never route it through an HTTP proxy.
        let poll_client = reqwest::Client::builder()
            .timeout(self.settings.poll_timeout())
            .no_proxy()
            .build()?;
        let heartbeat_client = reqwest::Client::builder()
            .timeout(self.settings.heartbeat_timeout())
            .no_proxy()
            .build()?;

        let keys = snapshot.watch_keys().to_vec();
        let store = ConfigStore::new(snapshot);
        let mut tasks = JoinSet::new();

        for key in keys {
            tracing::info!(key = %key, "Running watch for key");
            let limiter = Arc::new(RateLimiter::new(
                self.settings.poll_rate_per_sec,
                self.settings.poll_burst,
            ));
            let watcher = KeyWatcher::new(key, store.clone(), poll_client.clone(), limiter);
            tasks.spawn(watcher.run(shutdown.subscribe()));
        }

        let heartbeat = Heartbeat::new(
            store.clone(),
            heartbeat_client,
            self.settings.heartbeat_interval(),
        );
        tasks.spawn(heartbeat.run(shutdown.subscribe()));

        let listener = ReloadListener::new(store.clone(), self.source, reloads);
        tasks.spawn(listener.run(shutdown.subscribe()));

        tracing::info!(tasks = tasks.len(), "Synchronization engine started");

        Ok(SupervisorHandle {
            store,
            tasks,
            grace: self.settings.shutdown_grace(),
        })
    }
}

/// Running engine: the shared store plus its background tasks.
pub struct SupervisorHandle {
    store: ConfigStore,
    tasks: JoinSet<()>,
    grace: Duration,
}

impl SupervisorHandle {
    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Trigger shutdown and wait up to the grace period for every task.
    ///
    /// Returns `true` if all tasks exited in time; stragglers are aborted.
    pub async fn shutdown(mut self, shutdown: &Shutdown) -> bool {
        shutdown.trigger();

        let drained = tokio::time::timeout(self.grace, async {
            while let Some(res) = self.tasks.join_next().await {
                if let Err(e) = res {
                    tracing::error!(error = %e, "Background task failed");
                }
            }
        })
        .await
        .is_ok();

        if !drained {
            tracing::warn!(remaining = self.tasks.len(), "Tasks did not stop within grace period, aborting");
            self.tasks.shutdown().await;
        }
        drained
    }
}
