//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Key watcher iteration:
//!     → rate_limit.rs (wait for a token, or unwind on cancellation)
//!     → long-poll request (client-side timeout ceiling)
//!     → on failure: log and start the next iteration
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every outbound call has a deadline
//! - The limiter is the only backoff; failures never escalate it
//! - One limiter per watched key, so keys never starve each other

pub mod rate_limit;

pub use rate_limit::{AcquireError, RateLimiter};
