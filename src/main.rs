//! Hello service (v1)
//!
//! Greets in whatever language the remote key-value store says, and keeps a
//! TTL health check alive while checks are enabled.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────────────┐
//!                  │                    HELLO SERVICE                      │
//!                  │                                                       │
//!   remote KV ◀────┼── KeyWatcher × N ──┐                                  │
//!   (long-poll)    │   (rate limited)   │                                  │
//!                  │                    ▼                                  │
//!   config file ───┼─▶ ReloadListener ─▶ ConfigStore ◀── HTTP handlers ◀───┼── clients
//!   (SIGHUP/watch) │                    ▲                                  │
//!                  │                    │                                  │
//!   TTL check ◀────┼──── Heartbeat ─────┤                                  │
//!   gRPC health ◀──┼──── GrpcHealth ────┘                                  │
//!                  │                                                       │
//!                  │        one cancellation scope (lifecycle::Shutdown)   │
//!                  └──────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use hello_service::config::loader::load_config_file;
use hello_service::config::watcher::ConfigWatcher;
use hello_service::config::{FileSource, SyncSettings};
use hello_service::health::GrpcHealth;
use hello_service::http::HttpServer;
use hello_service::lifecycle::signals::spawn_signal_handlers;
use hello_service::lifecycle::{Shutdown, Supervisor};
use hello_service::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "hello-service")]
#[command(about = "Hello service backed by a remote key-value store", long_about = None)]
struct Args {
    /// Hello service address.
    #[arg(long, default_value = "localhost:8080")]
    addr: String,

    /// Path to config file (JSON, or TOML with a .toml extension).
    #[arg(long = "cfg-file", default_value = "config.json")]
    cfg_file: PathBuf,

    /// gRPC health check address.
    #[arg(long, default_value = "localhost:9090")]
    grpc_addr: String,

    /// Prometheus metrics address.
    #[arg(long, default_value = "127.0.0.1:9091")]
    metrics_addr: SocketAddr,

    /// Also reload when the config file changes on disk.
    #[arg(long)]
    watch_config: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let loaded = load_config_file(&args.cfg_file);
    let debug = loaded
        .as_ref()
        .ok()
        .and_then(|file| file.snapshot.debug_mode)
        .unwrap_or(false);
    logging::init_logging(debug);

    tracing::info!("hello-service v0.1.0 starting");

    let (file_snapshot, settings) = match loaded {
        Ok(file) => (Some(file.snapshot), file.sync),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load config file, using defaults");
            (None, SyncSettings::default())
        }
    };

    metrics::init_metrics(args.metrics_addr);

    let shutdown = Shutdown::new();
    let (reload_tx, reload_rx) = mpsc::unbounded_channel();
    spawn_signal_handlers(&shutdown, reload_tx.clone());

    let _config_watcher = if args.watch_config {
        match ConfigWatcher::new(&args.cfg_file, reload_tx.clone()).run() {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to watch config file, reload on change disabled");
                None
            }
        }
    } else {
        None
    };

    let status_interval = settings.heartbeat_interval();
    let source = Arc::new(FileSource::new(&args.cfg_file));
    let engine = Supervisor::new(settings, source).start(file_snapshot.as_ref(), reload_rx, &shutdown)?;

    let grpc_listener = TcpListener::bind(&args.grpc_addr).await?;
    let grpc = tokio::spawn(
        GrpcHealth::new(engine.store().clone(), status_interval).run(grpc_listener, shutdown.subscribe()),
    );

    let listener = TcpListener::bind(&args.addr).await?;
    let server = HttpServer::new(engine.store().clone(), reload_tx);
    let served = server.run(listener, shutdown.subscribe()).await;

    let clean = engine.shutdown(&shutdown).await;
    match grpc.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!(error = %e, "gRPC health server exited with error"),
        Err(e) => tracing::error!(error = %e, "gRPC health task failed"),
    }
    tracing::info!(clean, "Shutdown complete");
    served?;
    Ok(())
}
