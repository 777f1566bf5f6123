//! Propagator
//!
//! Fans a linked-dimension edit out to every other run. Propagation is
//! raw: target tuples are overwritten without revalidation, so a linked
//! dimension stays bit-identical across runs even when that leaves a
//! target tuple temporarily unmatched. Targets are revalidated on their
//! next direct edit; until then the reload path surfaces `no-match`.

use crate::links::LinkManager;
use crate::store::{RunId, RunStateStore};
use std::sync::Arc;
use vantage_catalog::{Dimension, DimensionValue};

/// Which runs a propagation pass touched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropagationOutcome {
    /// Runs whose tuple was overwritten
    pub updated: Vec<RunId>,
    /// Runs that now require a data reload (every updated run)
    pub needs_reload: Vec<RunId>,
}

/// Raw linked-value fan-out across the run store
#[derive(Debug, Clone)]
pub struct Propagator {
    store: Arc<RunStateStore>,
    links: LinkManager,
}

impl Propagator {
    /// Create a propagator over a store and link set
    #[inline]
    #[must_use]
    pub fn new(store: Arc<RunStateStore>, links: LinkManager) -> Self {
        Self { store, links }
    }

    /// Overwrite `dimension` with `value` on every run other than
    /// `source`, provided the dimension is linked
    ///
    /// Calling this for an unlinked dimension is a no-op, not an error.
    /// Reloads for the returned runs are the caller's to schedule; this
    /// method never awaits them.
    pub fn propagate(
        &self,
        dimension: Dimension,
        value: &DimensionValue,
        source: RunId,
    ) -> PropagationOutcome {
        if !self.links.is_linked(dimension) {
            return PropagationOutcome::default();
        }

        let mut outcome = PropagationOutcome::default();
        for run_id in self.store.ids() {
            if run_id == source {
                continue;
            }
            match self.store.set_raw_value(run_id, dimension, value) {
                Ok(true) => {
                    outcome.updated.push(run_id);
                    outcome.needs_reload.push(run_id);
                }
                Ok(false) => {} // run vanished between snapshot and write
                Err(err) => {
                    // Unreachable through the session API: the value was
                    // read from a tuple along the same dimension.
                    tracing::error!(run_id = %run_id, %err, "propagation skipped run");
                }
            }
        }
        tracing::debug!(
            %dimension,
            updated = outcome.updated.len(),
            "linked value propagated"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vantage_catalog::{KdmaMap, ParamSet, Resolution};

    fn store_with_runs(n: usize) -> (Arc<RunStateStore>, Vec<RunId>) {
        let store = Arc::new(RunStateStore::new());
        let ids = (0..n)
            .map(|i| {
                store.add(Resolution {
                    params: ParamSet::new()
                        .with_scenario("S1")
                        .with_scene("A")
                        .with_adm_type("adm-x")
                        .with_llm_backbone(format!("llm-{i}")),
                    options: Default::default(),
                })
            })
            .collect();
        (store, ids)
    }

    #[test]
    fn unlinked_dimension_is_a_no_op() {
        let (store, ids) = store_with_runs(2);
        let propagator = Propagator::new(Arc::clone(&store), LinkManager::new());

        let outcome = propagator.propagate(
            Dimension::LlmBackbone,
            &DimensionValue::scalar("llm-9"),
            ids[0],
        );

        assert_eq!(outcome, PropagationOutcome::default());
        assert_eq!(
            store.run(ids[1]).unwrap().params.llm_backbone.as_deref(),
            Some("llm-1")
        );
    }

    #[test]
    fn linked_dimension_overwrites_every_other_run() {
        let (store, ids) = store_with_runs(3);
        let links = LinkManager::new();
        links.toggle(Dimension::LlmBackbone);
        let propagator = Propagator::new(Arc::clone(&store), links);

        let outcome = propagator.propagate(
            Dimension::LlmBackbone,
            &DimensionValue::scalar("llm-9"),
            ids[0],
        );

        assert_eq!(outcome.updated, vec![ids[1], ids[2]]);
        assert_eq!(outcome.needs_reload, outcome.updated);
        for id in &ids[1..] {
            assert_eq!(
                store.run(*id).unwrap().params.llm_backbone.as_deref(),
                Some("llm-9")
            );
        }
        // The source run is never written by the propagator itself.
        assert_eq!(
            store.run(ids[0]).unwrap().params.llm_backbone.as_deref(),
            Some("llm-0")
        );
    }

    #[test]
    fn propagation_leaves_other_dimensions_untouched() {
        let (store, ids) = store_with_runs(2);
        let links = LinkManager::new();
        links.toggle(Dimension::Kdmas);
        let propagator = Propagator::new(Arc::clone(&store), links);

        let weights = KdmaMap::new().with("mercy", 0.3);
        propagator.propagate(Dimension::Kdmas, &DimensionValue::Kdmas(weights.clone()), ids[0]);

        let target = store.run(ids[1]).unwrap();
        assert!(target.params.kdmas.approx_eq(&weights, 1e-9));
        assert_eq!(target.params.llm_backbone.as_deref(), Some("llm-1"));
        assert_eq!(target.params.scene.as_deref(), Some("A"));
    }
}
