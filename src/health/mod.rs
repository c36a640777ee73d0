//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Heartbeat (heartbeat.rs):
//!     Periodic timer
//!     → read checks_enabled from ConfigStore
//!     → PUT {base}{ttl_endpoint}{ttl_id}
//!     → remote TTL check stays passing
//!
//! gRPC health (grpc.rs):
//!     Periodic timer
//!     → read checks_enabled from ConfigStore
//!     → SERVING / NOT_SERVING for the service name
//!
//! Handlers (http/):
//!     /healthz reflects checks_enabled
//!     /health/pass, /health/fail flip it
//! ```
//!
//! # Design Decisions
//! - Fail open to unhealthy: a missed beat just lets the TTL lapse
//! - No retries inside a tick; the next tick is the retry

pub mod grpc;
pub mod heartbeat;

pub use grpc::GrpcHealth;
pub use heartbeat::{BeatOutcome, Heartbeat, HeartbeatError};
