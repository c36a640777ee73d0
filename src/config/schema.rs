//! Configuration schema definitions.
//!
//! [`ConfigSnapshot`] is the set of runtime tunables kept in sync with the
//! remote store. Every field is independently present or absent so that a
//! partial snapshot (a reload file, a single watched key) can be overlaid on
//! top of another with [`ConfigSnapshot::merge`].
//!
//! [`SyncSettings`] holds the engine's own timing knobs. They come from the
//! optional `sync` table of the config file and are read once at startup.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Port the local remote-store agent listens on.
const DEFAULT_AGENT_PORT: u16 = 8500;

/// One complete-or-partial set of runtime tunables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConfigSnapshot {
    /// Greeting language (e.g. "english", "french").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Base address of the remote store (e.g. "http://10.0.0.4:8500").
    #[serde(default, alias = "consul_addr", skip_serializing_if = "Option::is_none")]
    pub remote_base: Option<String>,

    /// Path prefix of the watched keys (e.g. "/v1/kv/service/hello/").
    #[serde(default, alias = "kv_path", skip_serializing_if = "Option::is_none")]
    pub kv_path_prefix: Option<String>,

    /// Service name, used as a key prefix (e.g. "hello-http/").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,

    /// Path of the TTL check pass endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_endpoint: Option<String>,

    /// Identifier of the TTL check to keep alive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_id: Option<String>,

    /// Whether health checks and heartbeats are enabled.
    #[serde(default, alias = "enable_checks", skip_serializing_if = "Option::is_none")]
    pub checks_enabled: Option<bool>,

    /// Verbose logging.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_mode: Option<bool>,

    /// Keys to watch, relative to `kv_path_prefix`.
    #[serde(default, alias = "keys_to_watch", skip_serializing_if = "Option::is_none")]
    pub watch_keys: Option<Vec<String>>,
}

impl ConfigSnapshot {
    /// The built-in defaults. Merged in last so every field ends up present.
    pub fn defaults() -> Self {
        let host = std::env::var("HOST_IP")
            .ok()
            .filter(|ip| !ip.is_empty())
            .unwrap_or_else(|| "127.0.0.1".to_string());

        Self {
            language: Some("english".to_string()),
            remote_base: Some(format!("http://{}:{}", host, DEFAULT_AGENT_PORT)),
            kv_path_prefix: Some("/v1/kv/service/hello/".to_string()),
            service_name: Some("hello-http/".to_string()),
            ttl_endpoint: Some("/v1/agent/check/pass/".to_string()),
            ttl_id: Some("hello-ttl".to_string()),
            checks_enabled: Some(true),
            debug_mode: Some(false),
            watch_keys: Some(vec!["hello-http/enable_checks".to_string()]),
        }
    }

    /// Overlay `self` on top of `fallback`.
    ///
    /// Every field of the result is `self`'s value when present, otherwise
    /// `fallback`'s.
    pub fn merge(&self, fallback: &ConfigSnapshot) -> ConfigSnapshot {
        ConfigSnapshot {
            language: pick(&self.language, &fallback.language),
            remote_base: pick(&self.remote_base, &fallback.remote_base),
            kv_path_prefix: pick(&self.kv_path_prefix, &fallback.kv_path_prefix),
            service_name: pick(&self.service_name, &fallback.service_name),
            ttl_endpoint: pick(&self.ttl_endpoint, &fallback.ttl_endpoint),
            ttl_id: pick(&self.ttl_id, &fallback.ttl_id),
            checks_enabled: self.checks_enabled.or(fallback.checks_enabled),
            debug_mode: self.debug_mode.or(fallback.debug_mode),
            watch_keys: pick(&self.watch_keys, &fallback.watch_keys),
        }
    }

    /// True when no field is present.
    pub fn is_empty(&self) -> bool {
        *self == ConfigSnapshot::default()
    }

    pub fn language(&self) -> &str {
        self.language.as_deref().unwrap_or_default()
    }

    pub fn remote_base(&self) -> &str {
        self.remote_base.as_deref().unwrap_or_default()
    }

    pub fn kv_path_prefix(&self) -> &str {
        self.kv_path_prefix.as_deref().unwrap_or_default()
    }

    pub fn service_name(&self) -> &str {
        self.service_name.as_deref().unwrap_or_default()
    }

    pub fn ttl_endpoint(&self) -> &str {
        self.ttl_endpoint.as_deref().unwrap_or_default()
    }

    pub fn ttl_id(&self) -> &str {
        self.ttl_id.as_deref().unwrap_or_default()
    }

    /// Absent counts as disabled.
    pub fn checks_enabled(&self) -> bool {
        self.checks_enabled.unwrap_or(false)
    }

    pub fn debug_mode(&self) -> bool {
        self.debug_mode.unwrap_or(false)
    }

    pub fn watch_keys(&self) -> &[String] {
        self.watch_keys.as_deref().unwrap_or_default()
    }
}

fn pick<T: Clone>(preferred: &Option<T>, fallback: &Option<T>) -> Option<T> {
    preferred.as_ref().or(fallback.as_ref()).cloned()
}

/// Timing knobs of the synchronization engine.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Sustained long-poll rate per watched key, in requests per second.
    pub poll_rate_per_sec: f64,

    /// Burst capacity of the per-key poll limiter.
    pub poll_burst: u32,

    /// Client-side ceiling on a single long-poll request, in seconds.
    pub poll_timeout_secs: u64,

    /// Interval between TTL heartbeats, in seconds.
    pub heartbeat_interval_secs: u64,

    /// Request timeout of a single heartbeat, in seconds.
    pub heartbeat_timeout_secs: u64,

    /// How long shutdown waits for background tasks, in seconds.
    pub shutdown_grace_secs: u64,
}

impl SyncSettings {
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_secs(self.heartbeat_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            poll_rate_per_sec: 0.1,
            poll_burst: 2,
            poll_timeout_secs: 360,
            heartbeat_interval_secs: 2,
            heartbeat_timeout_secs: 10,
            shutdown_grace_secs: 5,
        }
    }
}

/// On-disk layout of the config file: snapshot fields at the top level plus
/// an optional `sync` table.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConfigFile {
    #[serde(flatten)]
    pub snapshot: ConfigSnapshot,

    #[serde(default)]
    pub sync: SyncSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partial() -> ConfigSnapshot {
        ConfigSnapshot {
            language: Some("french".into()),
            checks_enabled: Some(false),
            ..Default::default()
        }
    }

    fn other() -> ConfigSnapshot {
        ConfigSnapshot {
            language: Some("spanish".into()),
            service_name: Some("svc/".into()),
            watch_keys: Some(vec!["language".into()]),
            ..Default::default()
        }
    }

    #[test]
    fn test_merge_prefers_present_fields() {
        let merged = partial().merge(&other());
        assert_eq!(merged.language.as_deref(), Some("french"));
        assert_eq!(merged.checks_enabled, Some(false));
        assert_eq!(merged.service_name.as_deref(), Some("svc/"));
        assert_eq!(merged.watch_keys(), ["language".to_string()]);
        assert_eq!(merged.ttl_id, None);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let (a, b) = (partial(), other());
        let once = a.merge(&b);
        assert_eq!(a.merge(&once), once);
        assert_eq!(once.merge(&once), once);
    }

    #[test]
    fn test_merge_is_associative() {
        let third = ConfigSnapshot {
            checks_enabled: Some(true),
            ttl_id: Some("ttl-2".into()),
            debug_mode: Some(true),
            ..Default::default()
        };
        let samples = [
            ConfigSnapshot::default(),
            partial(),
            other(),
            third,
            ConfigSnapshot::defaults(),
        ];

        for a in &samples {
            for b in &samples {
                for c in &samples {
                    assert_eq!(
                        a.merge(&b.merge(c)),
                        a.merge(b).merge(c),
                        "a={:?} b={:?} c={:?}",
                        a,
                        b,
                        c
                    );
                }
            }
        }
    }

    #[test]
    fn test_merge_with_defaults_is_total() {
        let merged = partial().merge(&ConfigSnapshot::defaults());
        assert!(merged.language.is_some());
        assert!(merged.remote_base.is_some());
        assert!(merged.kv_path_prefix.is_some());
        assert!(merged.service_name.is_some());
        assert!(merged.ttl_endpoint.is_some());
        assert!(merged.ttl_id.is_some());
        assert!(merged.checks_enabled.is_some());
        assert!(merged.debug_mode.is_some());
        assert!(merged.watch_keys.is_some());
        assert_eq!(merged.language(), "french");
        assert!(!merged.checks_enabled());
    }

    #[test]
    fn test_empty_merge_keeps_fallback() {
        let b = other();
        assert_eq!(ConfigSnapshot::default().merge(&b), b);
        assert!(ConfigSnapshot::default().is_empty());
        assert!(!b.is_empty());
    }

    #[test]
    fn test_legacy_key_aliases() {
        let json = r#"{
            "consul_addr": "http://10.0.0.1:8500",
            "kv_path": "/v1/kv/x/",
            "enable_checks": false,
            "keys_to_watch": ["language"],
            "ttl_id": null
        }"#;
        let snapshot: ConfigSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.remote_base(), "http://10.0.0.1:8500");
        assert_eq!(snapshot.kv_path_prefix(), "/v1/kv/x/");
        assert_eq!(snapshot.checks_enabled, Some(false));
        assert_eq!(snapshot.watch_keys(), ["language".to_string()]);
        assert_eq!(snapshot.ttl_id, None);
        assert_eq!(snapshot.language, None);
    }

    #[test]
    fn test_config_file_sync_table() {
        let toml_src = r#"
            language = "portuguese"

            [sync]
            poll_burst = 5
        "#;
        let file: ConfigFile = toml::from_str(toml_src).unwrap();
        assert_eq!(file.snapshot.language(), "portuguese");
        assert_eq!(file.sync.poll_burst, 5);
        assert_eq!(file.sync.heartbeat_interval_secs, 2);
    }
}
