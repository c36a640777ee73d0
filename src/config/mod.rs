//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (JSON/TOML)
//!     → loader.rs (parse, absent fields stay absent)
//!     → validation.rs (unusable fields dropped, tunables checked)
//!     → merged over ConfigSnapshot::defaults()
//!     → store.rs (ConfigStore, shared by every task)
//!
//! At runtime:
//!     key watchers      → ConfigStore::set (one field)
//!     reload listener   → sanitize → ConfigStore::merge_over (file on top of live state)
//!     heartbeat/handlers → ConfigStore::read
//!
//! watcher.rs turns config file writes into reload events.
//! ```
//!
//! # Design Decisions
//! - Every snapshot field is optional so partial snapshots can be overlaid
//! - Engine tunables (SyncSettings) are fixed at startup
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod store;
pub mod validation;
pub mod watcher;

pub use loader::{ConfigError, FileSource, SnapshotSource};
pub use schema::{ConfigFile, ConfigSnapshot, SyncSettings};
pub use store::{ConfigStore, FieldUpdate};
