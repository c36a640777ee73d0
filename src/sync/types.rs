//! Wire types and error definitions for the remote key-value store.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use thiserror::Error;

/// Response header carrying the change-index of a blocking query.
pub const INDEX_HEADER: &str = "X-Consul-Index";

/// One key/value pair as returned by the remote store.
///
/// Decoded per poll cycle and dropped afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RemoteKeyEntry {
    #[serde(default)]
    pub key: String,

    /// Base64-encoded value; `null` for a key stored without a value.
    #[serde(default)]
    pub value: Option<String>,

    #[serde(default)]
    pub modify_index: u64,

    #[serde(default)]
    pub create_index: u64,

    #[serde(default)]
    pub lock_index: u64,

    #[serde(default)]
    pub flags: u64,
}

impl RemoteKeyEntry {
    /// Decode the base64 value into a UTF-8 string. A missing value decodes
    /// to the empty string.
    pub fn decode_value(&self) -> Result<String, WatchError> {
        let raw = self.value.as_deref().unwrap_or_default();
        let bytes = STANDARD.decode(raw)?;
        Ok(String::from_utf8(bytes)?)
    }
}

/// Decode the JSON array body of a KV response.
pub fn decode_entries(body: &[u8]) -> Result<Vec<RemoteKeyEntry>, WatchError> {
    Ok(serde_json::from_slice(body)?)
}

/// Parse the change-index header value.
pub fn parse_index(raw: &str) -> Result<u64, WatchError> {
    raw.trim()
        .parse()
        .map_err(|_| WatchError::IndexHeader(raw.to_string()))
}

/// Parse a boolean the way operators write them in the KV store:
/// `1 t T TRUE true True` and `0 f F FALSE false False`.
pub fn parse_bool(raw: &str) -> Result<bool, WatchError> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        other => Err(WatchError::Bool(other.to_string())),
    }
}

/// Errors that can occur during one watch iteration.
///
/// None of them terminate the watcher except [`WatchError::Cancelled`].
#[derive(Debug, Error)]
pub enum WatchError {
    /// Network, DNS or timeout failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The store answered with an unexpected status.
    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),

    #[error("invalid index header '{0}'")]
    IndexHeader(String),

    #[error("invalid response body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid base64 value: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("value is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("failed to parse bool '{0}'")]
    Bool(String),

    /// The shared cancellation signal fired.
    #[error("cancelled")]
    Cancelled,
}

impl WatchError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            WatchError::Transport(_) | WatchError::Status(_) => "transport",
            WatchError::IndexHeader(_)
            | WatchError::Json(_)
            | WatchError::Base64(_)
            | WatchError::Utf8(_)
            | WatchError::Bool(_) => "decode",
            WatchError::Cancelled => "cancelled",
        }
    }
}
