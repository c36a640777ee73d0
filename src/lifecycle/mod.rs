//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (supervisor.rs):
//!     Validate tunables → sanitize file over defaults → ConfigStore → spawn tasks
//!
//! Reload (reload.rs):
//!     ReloadEvent → re-read source (blocking pool) → sanitize → merge over live snapshot
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!     SIGHUP → Trigger config reload
//!
//! Shutdown (shutdown.rs):
//!     Cancel token → every task unwinds → wait up to the grace period
//! ```
//!
//! # Design Decisions
//! - One cancellation scope for the whole process
//! - Shutdown has timeout: stragglers are aborted after the deadline

pub mod reload;
pub mod shutdown;
pub mod signals;
pub mod supervisor;

pub use reload::{ReloadEvent, ReloadListener};
pub use shutdown::Shutdown;
pub use supervisor::{Supervisor, SupervisorError, SupervisorHandle};
