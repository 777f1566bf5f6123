//! Run state store
//!
//! The ordered collection of pinned runs:
//! - Insertion order is display/column order
//! - Run ids are never reused, so stale async completions for removed
//!   runs are detected by lookup failure and discarded
//! - Exposes the narrow mutation seams the validation, propagation, and
//!   reload paths need

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use ulid::Ulid;
use vantage_catalog::{
    AvailableOptions, Dimension, DimensionValue, ParamSet, Resolution, RunResult, ValueKindError,
};

/// Unique run identifier (ULID; never reused within a session)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunId(pub Ulid);

impl RunId {
    /// Generate new run ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Load lifecycle of a run's result data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// A fetch is pending or in flight
    Loading,
    /// Result data is present
    Loaded,
    /// The tuple does not correspond to any known experiment
    NoMatch,
    /// The fetch ran but returned nothing usable
    NoData,
    /// The fetch collaborator failed
    Error,
}

impl std::fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LoadStatus::Loading => "loading",
            LoadStatus::Loaded => "loaded",
            LoadStatus::NoMatch => "no-match",
            LoadStatus::NoData => "no-data",
            LoadStatus::Error => "error",
        };
        f.write_str(name)
    }
}

/// One pinned run: parameter tuple, derived options, load state, and
/// the opaque result payload
#[derive(Debug, Clone)]
pub struct Run {
    /// Stable identifier
    pub id: RunId,
    /// Current parameter tuple
    pub params: ParamSet,
    /// Option sets from the last validation; a derived cache, always
    /// overwritable, never hand-edited
    pub options: AvailableOptions,
    /// Result-data lifecycle
    pub load_status: LoadStatus,
    /// Mutual-exclusion flag for reloads
    pub is_reloading: bool,
    /// Fetched payload, when loaded
    pub result: Option<RunResult>,
}

/// Ordered mapping run-id -> run
#[derive(Debug, Default)]
pub struct RunStateStore {
    runs: RwLock<IndexMap<RunId, Run>>,
}

impl RunStateStore {
    /// Create an empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a run derived from a validation resolution; returns its
    /// fresh id
    pub fn add(&self, resolution: Resolution) -> RunId {
        let id = RunId::new();
        let run = Run {
            id,
            params: resolution.params,
            options: resolution.options,
            load_status: LoadStatus::Loading,
            is_reloading: false,
            result: None,
        };
        self.runs.write().insert(id, run);
        tracing::debug!(run_id = %id, "run added");
        id
    }

    /// Remove a run, preserving the relative order of the rest.
    /// Unknown ids are a warning-class no-op.
    pub fn remove(&self, run_id: RunId) -> bool {
        if self.runs.write().shift_remove(&run_id).is_some() {
            tracing::debug!(run_id = %run_id, "run removed");
            true
        } else {
            tracing::warn!(run_id = %run_id, "cannot remove unknown run");
            false
        }
    }

    /// Remove all runs
    pub fn clear(&self) {
        self.runs.write().clear();
    }

    /// Snapshot of one run
    #[must_use]
    pub fn run(&self, run_id: RunId) -> Option<Run> {
        self.runs.read().get(&run_id).cloned()
    }

    /// Snapshot of every run, in insertion order
    #[must_use]
    pub fn all(&self) -> Vec<Run> {
        self.runs.read().values().cloned().collect()
    }

    /// Run ids in insertion order
    #[must_use]
    pub fn ids(&self) -> Vec<RunId> {
        self.runs.read().keys().copied().collect()
    }

    /// Parameter tuples in insertion order
    #[must_use]
    pub fn all_params(&self) -> Vec<ParamSet> {
        self.runs.read().values().map(|r| r.params.clone()).collect()
    }

    /// First run in display order
    #[must_use]
    pub fn first(&self) -> Option<Run> {
        self.runs.read().values().next().cloned()
    }

    /// Parameters of the last (rightmost) run
    #[must_use]
    pub fn last_params(&self) -> Option<ParamSet> {
        self.runs.read().values().last().map(|r| r.params.clone())
    }

    /// Number of runs
    #[must_use]
    pub fn len(&self) -> usize {
        self.runs.read().len()
    }

    /// Whether the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.read().is_empty()
    }

    /// Whether the id is present
    #[must_use]
    pub fn contains(&self, run_id: RunId) -> bool {
        self.runs.read().contains_key(&run_id)
    }

    /// Overwrite a run's tuple and option sets with a validation result
    pub fn apply_validated(&self, run_id: RunId, resolution: &Resolution) -> bool {
        let mut runs = self.runs.write();
        let Some(run) = runs.get_mut(&run_id) else {
            tracing::warn!(run_id = %run_id, "cannot apply validation to unknown run");
            return false;
        };
        run.params = resolution.params.clone();
        run.options = resolution.options.clone();
        true
    }

    /// Raw propagation write: overwrite one dimension without
    /// revalidation, leaving the cached options untouched
    pub fn set_raw_value(
        &self,
        run_id: RunId,
        dimension: Dimension,
        value: &DimensionValue,
    ) -> Result<bool, ValueKindError> {
        let mut runs = self.runs.write();
        let Some(run) = runs.get_mut(&run_id) else {
            return Ok(false);
        };
        run.params.set_value(dimension, value.clone())?;
        Ok(true)
    }

    /// Begin a reload: marks the run loading and returns the tuple to
    /// submit. `None` when the run is unknown (warn) or already
    /// reloading (in-flight wins; the new request is dropped).
    pub fn begin_reload(&self, run_id: RunId) -> Option<ParamSet> {
        let mut runs = self.runs.write();
        let Some(run) = runs.get_mut(&run_id) else {
            tracing::warn!(run_id = %run_id, "cannot reload unknown run");
            return None;
        };
        if run.is_reloading {
            tracing::debug!(run_id = %run_id, "reload already in flight, request dropped");
            return None;
        }
        run.is_reloading = true;
        run.load_status = LoadStatus::Loading;
        Some(run.params.clone())
    }

    /// Finish a reload: record the terminal status, overwrite the
    /// stored tuple with the one just used (last submitted tuple wins,
    /// even on error), and clear the in-flight flag. Completions for
    /// removed runs are discarded.
    pub fn finish_reload(
        &self,
        run_id: RunId,
        submitted: &ParamSet,
        status: LoadStatus,
        result: Option<RunResult>,
    ) {
        let mut runs = self.runs.write();
        let Some(run) = runs.get_mut(&run_id) else {
            tracing::debug!(run_id = %run_id, "stale reload completion discarded");
            return;
        };
        run.params = submitted.clone();
        run.load_status = status;
        if matches!(status, LoadStatus::Loaded) {
            run.result = result;
        }
        run.is_reloading = false;
        tracing::debug!(run_id = %run_id, %status, "reload finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vantage_catalog::ParamSet;

    fn resolution(scene: &str) -> Resolution {
        Resolution {
            params: ParamSet::new()
                .with_scenario("S1")
                .with_scene(scene)
                .with_adm_type("adm-x")
                .with_llm_backbone("llm-1"),
            options: AvailableOptions::default(),
        }
    }

    #[test]
    fn insertion_order_is_preserved_across_removal() {
        let store = RunStateStore::new();
        let a = store.add(resolution("A"));
        let b = store.add(resolution("B"));
        let c = store.add(resolution("C"));

        store.remove(b);

        assert_eq!(store.ids(), vec![a, c]);
        assert_eq!(
            store.all()[1].params.scene.as_deref(),
            Some("C"),
            "relative order survives removal"
        );
    }

    #[test]
    fn remove_unknown_id_is_a_no_op() {
        let store = RunStateStore::new();
        store.add(resolution("A"));

        assert!(!store.remove(RunId::new()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn begin_reload_drops_second_request() {
        let store = RunStateStore::new();
        let id = store.add(resolution("A"));

        assert!(store.begin_reload(id).is_some());
        assert!(store.begin_reload(id).is_none(), "in-flight wins");

        let run = store.run(id).unwrap();
        assert!(run.is_reloading);
        assert_eq!(run.load_status, LoadStatus::Loading);
    }

    #[test]
    fn finish_reload_overwrites_tuple_even_on_error() {
        let store = RunStateStore::new();
        let id = store.add(resolution("A"));
        let submitted = store.begin_reload(id).unwrap();

        let edited = submitted.clone().with_scene("B");
        store.finish_reload(id, &edited, LoadStatus::Error, None);

        let run = store.run(id).unwrap();
        assert_eq!(run.params.scene.as_deref(), Some("B"));
        assert_eq!(run.load_status, LoadStatus::Error);
        assert!(!run.is_reloading);
        assert!(run.result.is_none());
    }

    #[test]
    fn finish_reload_for_removed_run_is_discarded() {
        let store = RunStateStore::new();
        let id = store.add(resolution("A"));
        let submitted = store.begin_reload(id).unwrap();

        store.remove(id);
        store.finish_reload(id, &submitted, LoadStatus::Loaded, None);

        assert!(store.run(id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn ids_are_unique() {
        let store = RunStateStore::new();
        let a = store.add(resolution("A"));
        let b = store.add(resolution("A"));
        assert_ne!(a, b);
    }
}
