//! gRPC health service mirroring the checks flag.
//!
//! Serves the standard `grpc.health.v1.Health` service. The status of the
//! service name (without its trailing `/`) is refreshed from ConfigStore on
//! every tick: SERVING while checks are enabled, NOT_SERVING otherwise.

use std::time::Duration;

use tokio::net::TcpListener;
use tokio::time::{self, MissedTickBehavior};
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic_health::server::{health_reporter, HealthReporter};
use tonic_health::ServingStatus;

use crate::config::ConfigStore;

/// gRPC health endpoint driven by the checks flag.
pub struct GrpcHealth {
    store: ConfigStore,
    interval: Duration,
}

impl GrpcHealth {
    pub fn new(store: ConfigStore, interval: Duration) -> Self {
        Self { store, interval }
    }

    /// Serve on `listener` until `cancel` fires.
    pub async fn run(self, listener: TcpListener, cancel: CancellationToken) -> Result<(), tonic::transport::Error> {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(address = %addr, "gRPC health check listening");
        }

        let (reporter, service) = health_reporter();
        let stop = cancel.child_token();

        let serve = async {
            let served = tonic::transport::Server::builder()
                .add_service(service)
                .serve_with_incoming_shutdown(TcpListenerStream::new(listener), cancel.cancelled())
                .await;
            // The status loop has nothing to report to once the server is gone.
            stop.cancel();
            served
        };
        let (served, ()) = tokio::join!(serve, track_checks(self.store, self.interval, reporter, stop.clone()));

        if let Err(e) = &served {
            tracing::error!(error = %e, "gRPC health server failed");
        }
        tracing::info!("gRPC health server stopped");
        served
    }
}

async fn track_checks(
    store: ConfigStore,
    interval: Duration,
    mut reporter: HealthReporter,
    cancel: CancellationToken,
) {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }
        publish_status(&store, &mut reporter).await;
    }
}

/// Copy the checks flag into the health service. Returns what was published.
pub async fn publish_status(store: &ConfigStore, reporter: &mut HealthReporter) -> ServingStatus {
    let (service, enabled) = store.read(|s| {
        (
            s.service_name().trim_end_matches('/').to_string(),
            s.checks_enabled(),
        )
    });
    let status = if enabled {
        ServingStatus::Serving
    } else {
        ServingStatus::NotServing
    };

    reporter.set_service_status(&service, status).await;
    tracing::trace!(service = %service, status = ?status, "Published gRPC health status");
    status
}
