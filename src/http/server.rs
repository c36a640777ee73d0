//! HTTP server setup and handlers.
//!
//! # Routes
//! - `GET /hello`: greeting in the configured language
//! - `GET /healthz`: 200 while checks are enabled, 410 Gone otherwise
//! - `PUT /health/pass`, `PUT /health/fail`: enable or disable checks
//! - `POST /reload`: ask the reload listener to re-read the config file
//!
//! Handlers only go through the ConfigStore surface; none of them touch the
//! network while reading or writing it.

use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ConfigStore;
use crate::lifecycle::reload::ReloadEvent;
use crate::observability::metrics;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Greeting languages the service knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    French,
    Portuguese,
    Spanish,
}

impl Language {
    /// Unknown names fall back to English.
    pub fn from_name(name: &str) -> Self {
        match name {
            "french" => Language::French,
            "portuguese" => Language::Portuguese,
            "spanish" => Language::Spanish,
            _ => Language::English,
        }
    }

    pub fn greeting(self) -> &'static str {
        match self {
            Language::English => "Hello World",
            Language::French => "Bonjour Monde",
            Language::Portuguese => "Olá Mundo",
            Language::Spanish => "Hola Mundo",
        }
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: ConfigStore,
    pub reload_tx: mpsc::UnboundedSender<ReloadEvent>,
}

/// HTTP surface of the service.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(store: ConfigStore, reload_tx: mpsc::UnboundedSender<ReloadEvent>) -> Self {
        let state = AppState { store, reload_tx };
        Self {
            router: Self::build_router(state),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/hello", get(handle_hello))
            .route("/healthz", get(handle_health))
            .route("/health/pass", put(enable_health))
            .route("/health/fail", put(disable_health))
            .route("/reload", post(trigger_reload))
            .with_state(state)
            .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
            .layer(TraceLayer::new_for_http())
    }

    /// Serve on `listener` until `cancel` fires.
    pub async fn run(self, listener: TcpListener, cancel: CancellationToken) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { cancel.cancelled().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn handle_hello(State(state): State<AppState>) -> impl IntoResponse {
    metrics::record_http_request("hello");
    let language = Language::from_name(&state.store.language());
    format!("{}\n", language.greeting())
}

async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    metrics::record_http_request("healthz");
    if !state.store.checks_enabled() {
        return (StatusCode::GONE, String::new());
    }
    (StatusCode::OK, "I'm alive\n".to_string())
}

async fn enable_health(State(state): State<AppState>) -> impl IntoResponse {
    metrics::record_http_request("health_pass");
    state.store.enable_checks();
    "Health endpoint enabled.\n"
}

async fn disable_health(State(state): State<AppState>) -> impl IntoResponse {
    metrics::record_http_request("health_fail");
    state.store.disable_checks();
    "Health endpoint disabled.\n"
}

async fn trigger_reload(State(state): State<AppState>) -> impl IntoResponse {
    metrics::record_http_request("reload");
    match state.reload_tx.send(ReloadEvent::Manual) {
        Ok(()) => (StatusCode::ACCEPTED, "Reload requested.\n"),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, "Reload listener is not running.\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigSnapshot;

    #[test]
    fn test_greetings() {
        assert_eq!(Language::from_name("french").greeting(), "Bonjour Monde");
        assert_eq!(Language::from_name("portuguese").greeting(), "Olá Mundo");
        assert_eq!(Language::from_name("spanish").greeting(), "Hola Mundo");
        assert_eq!(Language::from_name("klingon").greeting(), "Hello World");
    }

    #[tokio::test]
    async fn test_handlers_round_trip_through_store() {
        let store = ConfigStore::new(ConfigSnapshot::defaults());
        let (reload_tx, mut reload_rx) = mpsc::unbounded_channel();
        let server = HttpServer::new(store.clone(), reload_tx);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(server.run(listener, cancel.clone()));

        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        let base = format!("http://{}", addr);

        let body = client.get(format!("{}/hello", base)).send().await.unwrap().text().await.unwrap();
        assert_eq!(body, "Hello World\n");

        let res = client.put(format!("{}/health/fail", base)).send().await.unwrap();
        assert_eq!(res.status(), 200);
        assert!(!store.checks_enabled());
        let res = client.get(format!("{}/healthz", base)).send().await.unwrap();
        assert_eq!(res.status(), 410);

        client.put(format!("{}/health/pass", base)).send().await.unwrap();
        let res = client.get(format!("{}/healthz", base)).send().await.unwrap();
        assert_eq!(res.status(), 200);

        let res = client.post(format!("{}/reload", base)).send().await.unwrap();
        assert_eq!(res.status(), 202);
        assert_eq!(reload_rx.recv().await, Some(ReloadEvent::Manual));

        cancel.cancel();
        task.await.unwrap().unwrap();
    }
}
