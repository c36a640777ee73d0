//! Shared utilities for integration testing.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

/// What the mock store answers to one request.
#[derive(Debug, Clone)]
pub struct MockReply {
    pub status: u16,
    pub index: Option<u64>,
    pub body: String,
    /// Hold the response this long, like a blocking query that sees no change.
    pub delay: Duration,
}

impl MockReply {
    /// KV response with one entry whose value is `value`.
    pub fn kv(index: u64, key: &str, value: &str) -> Self {
        Self {
            status: 200,
            index: Some(index),
            body: format!(
                r#"[{{"LockIndex":0,"Key":"{}","Flags":0,"Value":"{}","CreateIndex":1,"ModifyIndex":{}}}]"#,
                key,
                STANDARD.encode(value),
                index
            ),
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            index: None,
            body: String::new(),
            delay: Duration::ZERO,
        }
    }

    /// A blocking query that never sees a change within the test.
    pub fn hang() -> Self {
        Self {
            delay: Duration::from_secs(60),
            ..Self::status(200)
        }
    }
}

/// A running mock of the remote store.
pub struct MockStore {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl MockStore {
    pub fn base(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Request lines seen so far, e.g. "GET /v1/kv/service/hello/language?index=1".
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.requests().iter().filter(|r| r.starts_with(prefix)).count()
    }
}

/// Start a programmable mock store. `f` receives (method, path-and-query).
pub async fn start_mock_store<F, Fut>(f: F) -> MockStore
where
    F: Fn(String, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = MockReply> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::new(f);

    let seen = requests.clone();
    tokio::spawn(async move {
        loop {
            let (socket, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => break,
            };
            let f = f.clone();
            let seen = seen.clone();
            tokio::spawn(async move {
                let mut reader = BufReader::new(socket);
                let mut request_line = String::new();
                if reader.read_line(&mut request_line).await.is_err() {
                    return;
                }
                // Drain headers.
                loop {
                    let mut line = String::new();
                    match reader.read_line(&mut line).await {
                        Ok(0) | Err(_) => break,
                        Ok(_) if line == "\r\n" => break,
                        Ok(_) => {}
                    }
                }

                let mut parts = request_line.split_whitespace();
                let method = parts.next().unwrap_or_default().to_string();
                let path = parts.next().unwrap_or_default().to_string();
                seen.lock().unwrap().push(format!("{} {}", method, path));

                let reply = f(method, path).await;
                tokio::time::sleep(reply.delay).await;

                let status_text = match reply.status {
                    200 => "200 OK",
                    404 => "404 Not Found",
                    500 => "500 Internal Server Error",
                    503 => "503 Service Unavailable",
                    _ => "200 OK",
                };
                let index_header = reply
                    .index
                    .map(|i| format!("X-Consul-Index: {}\r\n", i))
                    .unwrap_or_default();
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\n{}Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_text,
                    index_header,
                    reply.body.len(),
                    reply.body
                );

                let mut socket = reader.into_inner();
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    MockStore { addr, requests }
}

/// Poll `check` until it holds or `timeout` elapses.
#[allow(dead_code)]
pub async fn wait_until(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
