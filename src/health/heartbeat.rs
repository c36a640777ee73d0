//! TTL check keep-alive.
//!
//! # Responsibilities
//! - On every tick, if checks are enabled, PUT the TTL pass endpoint
//! - Skip the tick entirely when checks are disabled
//!
//! A failed beat is logged and not retried within the tick. Missing beats
//! lets the remote check expire, which is the intended way to go unhealthy.

use std::time::Duration;

use thiserror::Error;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::ConfigStore;
use crate::observability::metrics;

/// Errors from a single heartbeat.
#[derive(Debug, Error)]
pub enum HeartbeatError {
    #[error("heartbeat request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("heartbeat rejected with status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Result of one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeatOutcome {
    /// Checks are disabled; nothing was sent.
    Skipped,
    /// The check was refreshed.
    Passed { ttl_id: String },
}

/// Periodic TTL heartbeat task.
pub struct Heartbeat {
    store: ConfigStore,
    client: reqwest::Client,
    interval: Duration,
}

impl Heartbeat {
    /// `client` should carry the per-request timeout.
    pub fn new(store: ConfigStore, client: reqwest::Client, interval: Duration) -> Self {
        Self {
            store,
            client,
            interval,
        }
    }

    /// Beat every `interval` until `cancel` fires. The first beat happens
    /// one interval after start.
    pub async fn run(self, cancel: CancellationToken) {
        tracing::info!(interval = ?self.interval, "Running TTL check keep-alive");

        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                res = self.beat() => res,
            };

            match result {
                Ok(BeatOutcome::Passed { ttl_id }) => {
                    tracing::debug!(ttl_id = %ttl_id, "Updated check to passing");
                    metrics::record_heartbeat("passed");
                }
                Ok(BeatOutcome::Skipped) => {
                    metrics::record_heartbeat("skipped");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to update TTL check");
                    metrics::record_heartbeat("failed");
                }
            }
        }

        tracing::info!("Heartbeat received shutdown signal, exiting loop");
    }

    /// Perform one tick. Sends nothing when checks are disabled.
    pub async fn beat(&self) -> Result<BeatOutcome, HeartbeatError> {
        let target = self.store.read(|s| {
            s.checks_enabled().then(|| {
                (
                    format!("{}{}{}", s.remote_base(), s.ttl_endpoint(), s.ttl_id()),
                    s.ttl_id().to_string(),
                )
            })
        });
        let Some((url, ttl_id)) = target else {
            return Ok(BeatOutcome::Skipped);
        };

        let response = self.client.put(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status != reqwest::StatusCode::OK {
            return Err(HeartbeatError::Status { status, body });
        }
        Ok(BeatOutcome::Passed { ttl_id })
    }
}
