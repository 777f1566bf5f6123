//! Link manager
//!
//! Owns the set of dimensions currently linked across all runs. The set
//! is session-global, not per-run; handles are cheap clones sharing the
//! same interior.

use parking_lot::RwLock;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use vantage_catalog::Dimension;

/// Shared set of linked dimensions
#[derive(Debug, Clone, Default)]
pub struct LinkManager {
    linked: Arc<RwLock<HashSet<Dimension>>>,
}

impl LinkManager {
    /// Create with no linked dimensions
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the membership of a dimension; returns the new state
    /// (`true` = now linked)
    pub fn toggle(&self, dimension: Dimension) -> bool {
        let mut linked = self.linked.write();
        let now_linked = if linked.remove(&dimension) {
            false
        } else {
            linked.insert(dimension);
            true
        };
        tracing::debug!(%dimension, now_linked, "link toggled");
        now_linked
    }

    /// Whether a dimension is currently linked
    #[must_use]
    pub fn is_linked(&self, dimension: Dimension) -> bool {
        self.linked.read().contains(&dimension)
    }

    /// Replace the whole set (URL restoration)
    pub fn set_linked<I: IntoIterator<Item = Dimension>>(&self, dimensions: I) {
        let mut linked = self.linked.write();
        linked.clear();
        linked.extend(dimensions);
    }

    /// Ordered snapshot of the linked set
    #[must_use]
    pub fn snapshot(&self) -> BTreeSet<Dimension> {
        self.linked.read().iter().copied().collect()
    }
}
