//! Per-state memoization keyed by [`StateRevision`].
//!
//! The cache holds at most one entry: the value computed for the last
//! revision seen. A different revision recomputes and replaces it. Results
//! never depend on whether the cache is enabled.

use sim_types::StateRevision;
use std::cell::Cell;

/// Single-entry memo keyed by state revision.
#[derive(Debug, Clone)]
pub struct RevisionCache<T: Copy> {
    entry: Cell<Option<(StateRevision, T)>>,
    enabled: bool,
}

impl<T: Copy> Default for RevisionCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy> RevisionCache<T> {
    /// An empty, enabled cache.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entry: Cell::new(None),
            enabled: true,
        }
    }

    /// A cache that never stores anything.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            entry: Cell::new(None),
            enabled: false,
        }
    }

    /// Whether values are memoized.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable memoization. Disabling drops the stored entry.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.invalidate();
        }
    }

    /// Stored value for `revision`, if any.
    #[must_use]
    pub fn get(&self, revision: StateRevision) -> Option<T> {
        match self.entry.get() {
            Some((stored, value)) if stored == revision => Some(value),
            _ => None,
        }
    }

    /// Value for `revision`, computing and storing it on a miss.
    pub fn get_or_compute(&self, revision: StateRevision, compute: impl FnOnce() -> T) -> T {
        if let Some(value) = self.get(revision) {
            return value;
        }

        let value = compute();
        if self.enabled {
            self.entry.set(Some((revision, value)));
        }
        value
    }

    /// Drop the stored entry.
    pub fn invalidate(&self) {
        self.entry.set(None);
    }
}
