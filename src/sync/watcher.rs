//! Long-poll watcher for a single key.
//!
//! # States
//! ```text
//!            ┌──────────────────────────────────────────────┐
//!            ▼                                              │
//!          Idle ──▶ RateLimited ──▶ Polling ──▶ Applying ───┤
//!                        │             │           │        │
//!                        │             └───────────┴─▶ BackedOff
//!                        ▼
//!                   (cancelled: exit)
//! ```
//! - Idle: start of an iteration
//! - RateLimited: waiting on the per-key token bucket
//! - Polling: blocking query `GET {base}{prefix}{key}?index={n}` in flight
//! - Applying: cursor update, body decode, ConfigStore write
//! - BackedOff: a transport or decode failure was logged; back to Idle
//!
//! Cancellation is the only terminal transition. It is checked at every
//! suspension point and once more before the store is touched.

use std::sync::Arc;

use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;

use crate::config::{ConfigStore, FieldUpdate};
use crate::observability::metrics;
use crate::resilience::RateLimiter;
use crate::sync::cursor::{IndexStep, WatchCursor};
use crate::sync::types::{decode_entries, parse_bool, parse_index, WatchError, INDEX_HEADER};

/// Reserved key that sets the greeting language.
pub const LANGUAGE_KEY: &str = "language";

/// Suffix, after the service name, of the key that toggles checks.
pub const ENABLE_CHECKS_SUFFIX: &str = "enable_checks";

/// Raw result of one blocking query.
#[derive(Debug, Clone)]
pub struct PollResponse {
    pub status: StatusCode,
    /// Value of the index header, if the store sent one.
    pub index: Option<String>,
    pub body: Vec<u8>,
}

/// What applying one response did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The cursor was reset; the body was not looked at.
    Reset,
    /// The key does not exist remotely yet.
    Missing,
    /// A config field was updated to `value`.
    Updated { value: String },
    /// The key has no meaning to this service.
    Ignored,
}

enum WatchState {
    Idle,
    RateLimited,
    Polling,
    Applying(PollResponse),
    BackedOff(WatchError),
}

/// One long-running watcher per configured key.
pub struct KeyWatcher {
    key: String,
    store: ConfigStore,
    client: reqwest::Client,
    limiter: Arc<RateLimiter>,
    cursor: WatchCursor,
}

impl KeyWatcher {
    pub fn new(
        key: impl Into<String>,
        store: ConfigStore,
        client: reqwest::Client,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            key: key.into(),
            store,
            client,
            limiter,
            cursor: WatchCursor::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn cursor(&self) -> WatchCursor {
        self.cursor
    }

    /// Run until `cancel` fires.
    pub async fn run(mut self, cancel: CancellationToken) {
        tracing::info!(key = %self.key, "Key watcher starting");

        let mut state = WatchState::Idle;
        loop {
            state = match state {
                WatchState::Idle => {
                    if cancel.is_cancelled() {
                        break;
                    }
                    WatchState::RateLimited
                }
                WatchState::RateLimited => match self.limiter.acquire(&cancel).await {
                    Ok(()) => WatchState::Polling,
                    // Cancellation is the limiter's only failure.
                    Err(_) => break,
                },
                WatchState::Polling => {
                    let poll = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => Err(WatchError::Cancelled),
                        res = self.poll() => res,
                    };
                    match poll {
                        Ok(response) => WatchState::Applying(response),
                        Err(WatchError::Cancelled) => break,
                        Err(e) => WatchState::BackedOff(e),
                    }
                }
                WatchState::Applying(response) => {
                    if cancel.is_cancelled() {
                        break;
                    }
                    match self.apply(response) {
                        Ok(outcome) => {
                            self.log_outcome(&outcome);
                            WatchState::Idle
                        }
                        Err(e) => WatchState::BackedOff(e),
                    }
                }
                WatchState::BackedOff(e) => {
                    tracing::warn!(key = %self.key, kind = e.kind(), error = %e, "Watch iteration failed");
                    metrics::record_watch_error(&self.key, e.kind());
                    WatchState::Idle
                }
            };
        }

        tracing::info!(key = %self.key, "Key watcher received shutdown signal, exiting loop");
    }

    /// Issue one blocking query at the cursor's current index.
    pub async fn poll(&self) -> Result<PollResponse, WatchError> {
        let url = self.store.read(|s| {
            format!(
                "{}{}{}?index={}",
                s.remote_base(),
                s.kv_path_prefix(),
                self.key,
                self.cursor.last_known()
            )
        });
        tracing::debug!(key = %self.key, url = %url, "Issuing blocking query");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            return Err(WatchError::Status(status));
        }

        let index = response
            .headers()
            .get(INDEX_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?.to_vec();

        Ok(PollResponse { status, index, body })
    }

    /// Run a response through the cursor and, if it survives, into the
    /// store.
    ///
    /// The cursor advances before the body is decoded, so a malformed body
    /// is not re-fetched at the same index.
    pub fn apply(&mut self, response: PollResponse) -> Result<ApplyOutcome, WatchError> {
        let observed = response.index.as_deref().map(parse_index).transpose()?;

        match self.cursor.observe(observed) {
            IndexStep::Reset => {
                tracing::warn!(key = %self.key, observed = ?observed, "Change index went backwards, resetting");
                metrics::record_watch_reset(&self.key);
                return Ok(ApplyOutcome::Reset);
            }
            IndexStep::Advance(index) => {
                tracing::debug!(key = %self.key, index, "Change index advanced");
            }
        }

        // A missing key comes back as 404 with an empty body.
        if response.status == StatusCode::NOT_FOUND {
            return Ok(ApplyOutcome::Missing);
        }

        let entries = decode_entries(&response.body)?;
        // Not recursing on a prefix, so at most one entry comes back.
        let Some(entry) = entries.first() else {
            return Ok(ApplyOutcome::Missing);
        };
        let value = entry.decode_value()?;

        self.dispatch(value)
    }

    fn dispatch(&self, value: String) -> Result<ApplyOutcome, WatchError> {
        if self.key == LANGUAGE_KEY {
            self.store.set(FieldUpdate::Language(value.clone()));
            return Ok(ApplyOutcome::Updated { value });
        }

        let checks_key = self
            .store
            .read(|s| format!("{}{}", s.service_name(), ENABLE_CHECKS_SUFFIX));
        if self.key == checks_key {
            let enabled = parse_bool(&value)?;
            self.store.set(FieldUpdate::ChecksEnabled(enabled));
            return Ok(ApplyOutcome::Updated { value });
        }

        Ok(ApplyOutcome::Ignored)
    }

    fn log_outcome(&self, outcome: &ApplyOutcome) {
        match outcome {
            ApplyOutcome::Updated { value } => {
                tracing::info!(key = %self.key, value = %value, "Watched key updated");
                metrics::record_watch_update(&self.key);
            }
            ApplyOutcome::Missing => {
                tracing::warn!(key = %self.key, "Empty response, key does not exist");
            }
            ApplyOutcome::Ignored => {
                tracing::debug!(key = %self.key, "No handler for key, ignoring value");
            }
            ApplyOutcome::Reset => {}
        }
    }
}
