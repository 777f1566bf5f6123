//! Catalog oracle interface
//!
//! The catalog is an external collaborator: it knows which parameter
//! tuples correspond to real, existing experiments. The engine only
//! drives it; it never owns or infers catalog contents.

use crate::params::{AvailableOptions, ParamSet};

/// Result of resolving a (possibly partial) tuple against the corpus
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Nearest valid full tuple; fully unset when no experiment exists
    /// at all
    pub params: ParamSet,
    /// Legal values per dimension, holding the other dimensions fixed
    /// at their corrected values
    pub options: AvailableOptions,
}

impl Resolution {
    /// Whether the corpus offered no tuple at all
    #[inline]
    #[must_use]
    pub fn is_unsatisfiable(&self) -> bool {
        self.params.is_fully_unset() && self.options.is_empty()
    }
}

/// Oracle of valid experiment parameter combinations
///
/// Contract for `resolve`:
/// - the returned tuple is fully concrete and corresponds to an
///   existing experiment;
/// - every input dimension that was set is kept, falling back to the
///   nearest legal alternative only for dimensions that conflict with
///   the others (the tie-break is the implementation's own);
/// - option lists are computed per dimension with all *other*
///   dimensions fixed at their corrected values;
/// - an empty corpus yields a fully unset tuple and empty options,
///   never an error.
pub trait Catalog: Send + Sync {
    /// Resolve a partial tuple to the nearest valid full tuple plus
    /// per-dimension options
    fn resolve(&self, request: &ParamSet) -> Resolution;

    /// Minimum number of KDMAs a run in this context must carry
    fn min_kdma_count(&self, context: &ParamSet) -> usize;

    /// Maximum number of KDMAs a run in this context may carry
    fn max_kdma_count(&self, context: &ParamSet) -> usize;
}
