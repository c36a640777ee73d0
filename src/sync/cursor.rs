//! Per-key change-index tracking.
//!
//! # State Transitions
//! ```text
//! observe(None)                          → index unchanged, applied = index
//! observe(Some(n)), n >= applied, n != 0 → (n, n), Advance
//! observe(Some(n)), n < applied or n == 0 → (1, 1), Reset
//! ```
//!
//! A reset means the store restarted or compacted its log. The response that
//! revealed it is discarded and the next poll starts from index 1.

/// Index the cursor returns to after a reset.
pub const RESET_INDEX: u64 = 1;

/// What the cursor decided about one response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStep {
    /// The response may be applied; carries the new applied index.
    Advance(u64),
    /// Index went backwards or hit zero; drop the response.
    Reset,
}

/// The (lastKnownIndex, lastAppliedIndex) pair for one watched key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchCursor {
    last_known: u64,
    last_applied: u64,
}

impl WatchCursor {
    /// Start at index 1 with nothing applied yet.
    pub fn new() -> Self {
        Self {
            last_known: RESET_INDEX,
            last_applied: 0,
        }
    }

    /// Index to send with the next blocking query.
    pub fn last_known(&self) -> u64 {
        self.last_known
    }

    pub fn last_applied(&self) -> u64 {
        self.last_applied
    }

    /// Feed the index header of a response (if it had one).
    pub fn observe(&mut self, observed: Option<u64>) -> IndexStep {
        let index = observed.unwrap_or(self.last_known);

        if index < self.last_applied || index == 0 {
            self.last_known = RESET_INDEX;
            self.last_applied = RESET_INDEX;
            return IndexStep::Reset;
        }

        self.last_known = index;
        self.last_applied = index;
        IndexStep::Advance(index)
    }
}

impl Default for WatchCursor {
    fn default() -> Self {
        Self::new()
    }
}
