//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges of the engine tunables (rates and timeouts > 0, burst >= 1)
//! - Drop snapshot fields that cannot be used (non-http(s) remote base, empty watch keys)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Bad tunables fail startup; a bad snapshot field is dropped so whatever
//!   sits underneath it (defaults at startup, live values on reload) stays in effect
//! - Startup and reload run the same snapshot check

use thiserror::Error;

use crate::config::schema::{ConfigSnapshot, SyncSettings};

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },

    #[error("remote base '{0}' is not an http(s) URL")]
    RemoteBase(String),

    #[error("watch key at position {0} is empty")]
    EmptyWatchKey(usize),
}

/// Check the engine tunables.
pub fn validate_settings(settings: &SyncSettings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !(settings.poll_rate_per_sec > 0.0 && settings.poll_rate_per_sec.is_finite()) {
        errors.push(ValidationError::NotPositive { field: "poll_rate_per_sec" });
    }
    let counts = [
        ("poll_burst", u64::from(settings.poll_burst)),
        ("poll_timeout_secs", settings.poll_timeout_secs),
        ("heartbeat_interval_secs", settings.heartbeat_interval_secs),
        ("heartbeat_timeout_secs", settings.heartbeat_timeout_secs),
        ("shutdown_grace_secs", settings.shutdown_grace_secs),
    ];
    for (field, value) in counts {
        if value == 0 {
            errors.push(ValidationError::NotPositive { field });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Strip the unusable fields out of a (possibly partial) snapshot.
///
/// A remote base that is not an http(s) URL becomes absent and empty watch
/// keys are filtered out. Absent fields are never reported. Returns the
/// cleaned snapshot plus what was wrong with the input.
pub fn sanitize_snapshot(mut snapshot: ConfigSnapshot) -> (ConfigSnapshot, Vec<ValidationError>) {
    let mut errors = Vec::new();

    if let Some(base) = snapshot.remote_base.take() {
        match url::Url::parse(&base) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.host().is_some() => {
                snapshot.remote_base = Some(base);
            }
            _ => errors.push(ValidationError::RemoteBase(base)),
        }
    }

    if let Some(keys) = snapshot.watch_keys.take() {
        let mut kept = Vec::with_capacity(keys.len());
        let mut dropped = false;
        for (i, key) in keys.into_iter().enumerate() {
            if key.trim().is_empty() {
                errors.push(ValidationError::EmptyWatchKey(i));
                dropped = true;
            } else {
                kept.push(key);
            }
        }
        // A list with nothing usable left counts as absent.
        if !(dropped && kept.is_empty()) {
            snapshot.watch_keys = Some(kept);
        }
    }

    (snapshot, errors)
}
