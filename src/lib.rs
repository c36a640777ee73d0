//! Hello service: runtime configuration kept in sync with a remote
//! key-value store through blocking queries.

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod sync;

pub use config::{ConfigSnapshot, ConfigStore};
pub use http::HttpServer;
pub use lifecycle::{Shutdown, Supervisor};
