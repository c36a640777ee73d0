//! End-to-end tests of the synchronization engine against a mock store.

use std::io::Write;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hello_service::config::loader::load_config_file;
use hello_service::config::{ConfigSnapshot, ConfigStore, FileSource, SyncSettings};
use hello_service::health::Heartbeat;
use hello_service::lifecycle::{ReloadEvent, Shutdown, Supervisor};
use hello_service::resilience::RateLimiter;
use hello_service::sync::KeyWatcher;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

mod common;

use common::{start_mock_store, wait_until, MockReply};

fn store_for(base: String) -> ConfigStore {
    ConfigStore::new(ConfigSnapshot {
        remote_base: Some(base),
        ..ConfigSnapshot::defaults()
    })
}

fn fast_watcher(key: &str, store: &ConfigStore) -> KeyWatcher {
    KeyWatcher::new(
        key,
        store.clone(),
        reqwest::Client::builder().no_proxy().build().unwrap(),
        Arc::new(RateLimiter::new(100.0, 10)),
    )
}

#[tokio::test]
async fn test_watch_applies_value_and_resets_on_rollback() {
    let calls = Arc::new(AtomicU32::new(0));
    let c = calls.clone();
    let mock = start_mock_store(move |_method, _path| {
        let n = c.fetch_add(1, Ordering::SeqCst);
        async move {
            match n {
                0 => MockReply::kv(5, "service/hello/language", "french"),
                1 => MockReply::kv(3, "service/hello/language", "german"),
                _ => MockReply::hang(),
            }
        }
    })
    .await;

    let store = store_for(mock.base());
    let cancel = CancellationToken::new();
    let task = tokio::spawn(fast_watcher("language", &store).run(cancel.clone()));

    assert!(wait_until(Duration::from_secs(5), || mock.count("GET") >= 3).await);
    let requests = mock.requests();
    assert_eq!(requests[0], "GET /v1/kv/service/hello/language?index=1");
    assert_eq!(requests[1], "GET /v1/kv/service/hello/language?index=5");
    // Rolled back to index 1 without applying "german".
    assert_eq!(requests[2], "GET /v1/kv/service/hello/language?index=1");
    assert_eq!(store.language(), "french");

    // Cancellation unblocks the in-flight long-poll.
    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .expect("watcher stuck in long-poll")
        .unwrap();
}

#[tokio::test]
async fn test_watch_survives_errors() {
    let calls = Arc::new(AtomicU32::new(0));
    let c = calls.clone();
    let mock = start_mock_store(move |_method, _path| {
        let n = c.fetch_add(1, Ordering::SeqCst);
        async move {
            match n {
                0 => MockReply::status(500),
                1 => MockReply {
                    body: "not json".into(),
                    ..MockReply::kv(2, "k", "x")
                },
                2 => MockReply::kv(3, "service/hello/hello-http/enable_checks", "nope"),
                3 => MockReply::kv(4, "service/hello/hello-http/enable_checks", "false"),
                _ => MockReply::hang(),
            }
        }
    })
    .await;

    let store = store_for(mock.base());
    let cancel = CancellationToken::new();
    let task = tokio::spawn(fast_watcher("hello-http/enable_checks", &store).run(cancel.clone()));

    assert!(wait_until(Duration::from_secs(5), || !store.checks_enabled()).await);
    assert!(mock.count("GET") >= 4);
    assert_eq!(store.language(), "english");

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(2), task).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_heartbeat_only_beats_while_enabled() {
    let fail = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let f = fail.clone();
    let mock = start_mock_store(move |_method, _path| {
        let failing = f.load(Ordering::SeqCst);
        async move {
            if failing {
                MockReply::status(500)
            } else {
                MockReply::status(200)
            }
        }
    })
    .await;

    let store = store_for(mock.base());
    store.disable_checks();

    let heartbeat = Heartbeat::new(
        store.clone(),
        reqwest::Client::builder().no_proxy().build().unwrap(),
        Duration::from_millis(20),
    );
    let cancel = CancellationToken::new();
    let task = tokio::spawn(heartbeat.run(cancel.clone()));

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(mock.count("PUT"), 0);

    store.enable_checks();
    assert!(wait_until(Duration::from_secs(5), || mock.count("PUT") >= 2).await);
    assert!(mock
        .requests()
        .iter()
        .all(|r| r == "PUT /v1/agent/check/pass/hello-ttl"));

    // Failing beats are tolerated; the loop keeps going.
    fail.store(true, Ordering::SeqCst);
    let before = mock.count("PUT");
    assert!(wait_until(Duration::from_secs(5), || mock.count("PUT") >= before + 2).await);

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(2), task).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_supervisor_end_to_end() {
    let mock = start_mock_store(|method, path| async move {
        if method == "PUT" {
            return MockReply::status(200);
        }
        if path.ends_with("/language?index=1") {
            MockReply::kv(7, "service/hello/language", "french")
        } else if path.ends_with("/enable_checks?index=1") {
            MockReply::kv(9, "service/hello/hello-http/enable_checks", "false")
        } else {
            MockReply::hang()
        }
    })
    .await;

    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(
        file,
        r#"{{
            "consul_addr": "{}",
            "keys_to_watch": ["language", "hello-http/enable_checks"],
            "sync": {{"poll_rate_per_sec": 50.0, "heartbeat_interval_secs": 1, "shutdown_grace_secs": 2}}
        }}"#,
        mock.base()
    )
    .unwrap();
    file.flush().unwrap();

    let loaded = load_config_file(file.path()).unwrap();
    assert_eq!(loaded.sync.poll_rate_per_sec, 50.0);

    let shutdown = Shutdown::new();
    let (reload_tx, reload_rx) = mpsc::unbounded_channel();
    let engine = Supervisor::new(loaded.sync, Arc::new(FileSource::new(file.path())))
        .start(Some(&loaded.snapshot), reload_rx, &shutdown)
        .unwrap();
    assert_eq!(engine.task_count(), 4);

    let store = engine.store().clone();
    assert!(wait_until(Duration::from_secs(5), || {
        store.language() == "french" && !store.checks_enabled()
    })
    .await);

    // Reload puts the file over live state: watched language survives.
    std::fs::write(file.path(), r#"{"checks_enabled": true}"#).unwrap();
    reload_tx.send(ReloadEvent::Manual).unwrap();
    assert!(wait_until(Duration::from_secs(5), || store.checks_enabled()).await);
    assert_eq!(store.language(), "french");
    assert_eq!(store.snapshot().remote_base(), mock.base());

    // Checks are on again, so the heartbeat starts beating.
    assert!(wait_until(Duration::from_secs(5), || mock.count("PUT") >= 1).await);

    assert!(engine.shutdown(&shutdown).await, "tasks did not stop within grace");
    let after = store.snapshot();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(store.snapshot(), after);
}

#[tokio::test]
async fn test_settings_default_when_sync_table_missing() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(file, r#"{{"language": "spanish"}}"#).unwrap();
    let loaded = load_config_file(file.path()).unwrap();
    assert_eq!(loaded.sync, SyncSettings::default());
    assert_eq!(loaded.snapshot.language(), "spanish");
}
