//! Structured logging.
//!
//! `RUST_LOG` wins when set; otherwise the crate logs at `info`, or `debug`
//! when the startup snapshot has debug mode on.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn default_filter(debug: bool) -> &'static str {
    if debug {
        "hello_service=debug,tower_http=debug"
    } else {
        "hello_service=info,tower_http=info"
    }
}

/// Install the global tracing subscriber.
pub fn init_logging(debug: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(debug).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
