//! HTTP subsystem.
//!
//! # Data Flow
//! ```text
//! Request → TraceLayer → TimeoutLayer → handler → ConfigStore (read / flip checks)
//! ```
//!
//! The handlers are a thin collaborator of the synchronization engine: they
//! never block on I/O while holding configuration state.

pub mod server;

pub use server::{HttpServer, Language};
