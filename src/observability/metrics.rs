//! Metrics collection and exposition.
//!
//! # Metrics
//! - `http_requests_total` (counter): handled requests by route
//! - `kv_watch_updates_total` (counter): config fields updated by key
//! - `kv_watch_resets_total` (counter): change-index rollbacks by key
//! - `kv_watch_errors_total` (counter): failed iterations by key, kind
//! - `ttl_heartbeats_total` (counter): heartbeat attempts by outcome
//! - `config_reloads_total` (counter): reloads by outcome
//!
//! Recording without an installed recorder is a no-op.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Exposing Prometheus metrics"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_http_request(route: &'static str) {
    metrics::counter!("http_requests_total", "route" => route).increment(1);
}

pub fn record_watch_update(key: &str) {
    metrics::counter!("kv_watch_updates_total", "key" => key.to_string()).increment(1);
}

pub fn record_watch_reset(key: &str) {
    metrics::counter!("kv_watch_resets_total", "key" => key.to_string()).increment(1);
}

pub fn record_watch_error(key: &str, kind: &'static str) {
    metrics::counter!("kv_watch_errors_total", "key" => key.to_string(), "kind" => kind)
        .increment(1);
}

pub fn record_heartbeat(outcome: &'static str) {
    metrics::counter!("ttl_heartbeats_total", "outcome" => outcome).increment(1);
}

pub fn record_reload(outcome: &'static str) {
    metrics::counter!("config_reloads_total", "outcome" => outcome).increment(1);
}
