//! Remote key-value synchronization.
//!
//! # Data Flow
//! ```text
//! KeyWatcher (one per watched key)
//!     → RateLimiter::acquire
//!     → GET {base}{prefix}{key}?index={n}   (blocks remotely until change/timeout)
//!     → cursor.rs (index header: advance, or reset on rollback)
//!     → types.rs (JSON entries, base64 value)
//!     → ConfigStore::set (language / enable_checks)
//! ```
//!
//! # Design Decisions
//! - Polls for one key are strictly sequential; keys are independent
//! - Last write wins per field, no cross-key ordering
//! - A rollback discards the response that revealed it rather than trusting
//!   data from a store that just restarted

pub mod cursor;
pub mod types;
pub mod watcher;

pub use cursor::{IndexStep, WatchCursor};
pub use types::{RemoteKeyEntry, WatchError};
pub use watcher::{ApplyOutcome, KeyWatcher, PollResponse};
