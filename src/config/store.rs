//! The live configuration snapshot shared by every task.
//!
//! One [`ConfigStore`] exists per process. Clones share the same snapshot.
//! Reads take the read side of a readers–writer lock and may run
//! concurrently; merges and field updates take the write side. The lock is
//! only ever held for the copy or assignment itself, never across I/O, and
//! no guard escapes this module.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::schema::ConfigSnapshot;

/// A single-field update, as applied by a key watcher or a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate {
    Language(String),
    ChecksEnabled(bool),
}

/// Thread-safe holder of the live [`ConfigSnapshot`].
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    inner: Arc<RwLock<ConfigSnapshot>>,
}

impl ConfigStore {
    pub fn new(snapshot: ConfigSnapshot) -> Self {
        Self {
            inner: Arc::new(RwLock::new(snapshot)),
        }
    }

    /// Copy of the current snapshot.
    pub fn snapshot(&self) -> ConfigSnapshot {
        self.inner.read().clone()
    }

    /// Run `f` against the current snapshot under the read lock.
    ///
    /// `f` must not block; use it to pull out the few fields a caller needs.
    pub fn read<R>(&self, f: impl FnOnce(&ConfigSnapshot) -> R) -> R {
        f(&self.inner.read())
    }

    /// Overlay `overlay` on the live snapshot: fields present in `overlay`
    /// win, everything it omits keeps its current value.
    ///
    /// Returns the snapshot as it stands after the merge.
    pub fn merge_over(&self, overlay: &ConfigSnapshot) -> ConfigSnapshot {
        let mut current = self.inner.write();
        let merged = overlay.merge(&current);
        *current = merged.clone();
        merged
    }

    /// Atomically update one field.
    pub fn set(&self, update: FieldUpdate) {
        let mut current = self.inner.write();
        match update {
            FieldUpdate::Language(language) => current.language = Some(language),
            FieldUpdate::ChecksEnabled(enabled) => current.checks_enabled = Some(enabled),
        }
    }

    // Handler-facing surface.

    pub fn language(&self) -> String {
        self.read(|s| s.language().to_string())
    }

    pub fn checks_enabled(&self) -> bool {
        self.read(ConfigSnapshot::checks_enabled)
    }

    pub fn enable_checks(&self) {
        self.set(FieldUpdate::ChecksEnabled(true));
    }

    pub fn disable_checks(&self) {
        self.set(FieldUpdate::ChecksEnabled(false));
    }
}
