//! Comparison session
//!
//! The application context: owns the run store, link set, validator,
//! propagator, and reload scheduler, and exposes the operation surface
//! the UI drives. Everything is reachable through this object (no
//! ambient/global state) and the render/URL capabilities are injected,
//! never assumed.

use crate::error::EngineError;
use crate::hooks::{NoopHooks, UiHooks};
use crate::kdma;
use crate::links::LinkManager;
use crate::propagate::Propagator;
use crate::reload::ReloadScheduler;
use crate::store::{Run, RunId, RunStateStore};
use crate::url::{SessionSnapshot, UrlCodec};
use crate::validation::ValidationEngine;
use std::sync::Arc;
use std::time::Duration;
use vantage_catalog::{Catalog, Dimension, DimensionValue, ParamSet, Resolution, ResultFetcher};

/// Default debounce for continuous KDMA slider input
pub const KDMA_SLIDER_DEBOUNCE: Duration = Duration::from_millis(500);

/// Session configuration
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Debounce applied to KDMA slider edits
    pub kdma_slider_debounce: Duration,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With KDMA slider debounce
    #[inline]
    #[must_use]
    pub fn with_kdma_slider_debounce(mut self, debounce: Duration) -> Self {
        self.kdma_slider_debounce = debounce;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            kdma_slider_debounce: KDMA_SLIDER_DEBOUNCE,
        }
    }
}

/// One comparison session: ordered runs, linked dimensions, and the
/// machinery that keeps them valid
pub struct ComparisonSession {
    config: EngineConfig,
    store: Arc<RunStateStore>,
    links: LinkManager,
    validator: ValidationEngine,
    propagator: Propagator,
    scheduler: ReloadScheduler,
    hooks: Arc<dyn UiHooks>,
}

impl std::fmt::Debug for ComparisonSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComparisonSession")
            .field("runs", &self.store.len())
            .field("linked", &self.links.snapshot())
            .finish_non_exhaustive()
    }
}

impl ComparisonSession {
    /// Create a session with default configuration and no-op hooks
    #[must_use]
    pub fn new(catalog: Arc<dyn Catalog>, fetcher: Arc<dyn ResultFetcher>) -> Self {
        Self::with_hooks(catalog, fetcher, Arc::new(NoopHooks), EngineConfig::default())
    }

    /// Create a session with injected UI hooks and configuration
    #[must_use]
    pub fn with_hooks(
        catalog: Arc<dyn Catalog>,
        fetcher: Arc<dyn ResultFetcher>,
        hooks: Arc<dyn UiHooks>,
        config: EngineConfig,
    ) -> Self {
        let store = Arc::new(RunStateStore::new());
        let links = LinkManager::new();
        let validator = ValidationEngine::new(catalog);
        let propagator = Propagator::new(Arc::clone(&store), links.clone());
        let scheduler = ReloadScheduler::new(
            Arc::clone(&store),
            validator.clone(),
            fetcher,
            Arc::clone(&hooks),
        );
        Self {
            config,
            store,
            links,
            validator,
            propagator,
            scheduler,
            hooks,
        }
    }

    // --- lifecycle -------------------------------------------------

    /// Restore state from a URL, or auto-pin the first valid
    /// configuration when there is nothing to restore
    ///
    /// Returns whether a URL restoration happened.
    pub fn initialize(&self, url: Option<&str>) -> bool {
        if let Some(url) = url {
            if self.restore_from_url(url) {
                return true;
            }
        }
        self.auto_pin_default();
        false
    }

    /// Restore runs and links from an encoded URL
    ///
    /// Encoded option sets are never trusted: every decoded tuple goes
    /// back through validation via the add path. The URL is rewritten
    /// once at the end of the batch.
    pub fn restore_from_url(&self, url: &str) -> bool {
        let Some(snapshot) = UrlCodec::decode(url) else {
            return false;
        };
        if snapshot.runs.is_empty() {
            return false;
        }
        self.links.set_linked(snapshot.linked.iter().copied());
        for seed in snapshot.runs {
            self.add_run_inner(seed, false);
        }
        self.push_url();
        true
    }

    fn auto_pin_default(&self) {
        if !self.store.is_empty() {
            return;
        }
        let resolution = self.validator.validate(&ParamSet::new());
        if resolution.params.scenario.is_none() {
            tracing::warn!("no valid configuration to auto-pin");
            return;
        }
        self.insert_run(resolution, true);
    }

    // --- run lifecycle ---------------------------------------------

    /// Add a run for a seed tuple; validation derives the rest
    ///
    /// Returns `None` (with a warning) when no scenario resolves at
    /// all.
    pub fn add_run(&self, seed: ParamSet) -> Option<RunId> {
        self.add_run_inner(seed, true)
    }

    fn add_run_inner(&self, seed: ParamSet, update_url: bool) -> Option<RunId> {
        let resolution = self.validator.validate(&seed);
        if resolution.params.scenario.is_none() {
            tracing::warn!("cannot add run: no valid configuration for seed");
            return None;
        }
        Some(self.insert_run(resolution, update_url))
    }

    fn insert_run(&self, resolution: Resolution, update_url: bool) -> RunId {
        let run_id = self.store.add(resolution);
        self.scheduler.reload(run_id);
        self.hooks.render_table();
        if update_url {
            self.push_url();
        }
        run_id
    }

    /// Duplicate the rightmost run's parameters into a new run
    pub fn copy_last_run(&self) -> Option<RunId> {
        let Some(params) = self.store.last_params() else {
            tracing::warn!("no run to copy");
            return None;
        };
        self.add_run(params)
    }

    /// Remove a run; unknown ids are a warning-class no-op
    pub fn remove_run(&self, run_id: RunId) {
        self.scheduler.cancel_pending(run_id);
        if self.store.remove(run_id) {
            self.hooks.render_table();
            self.push_url();
        }
    }

    /// Remove every run
    pub fn clear(&self) {
        self.scheduler.cancel_all_pending();
        self.store.clear();
        self.hooks.render_table();
        self.push_url();
    }

    // --- parameter edits -------------------------------------------

    /// Edit one dimension of a run: auto-correct the run, fan the value
    /// out to linked peers, and schedule reloads for every affected run
    ///
    /// # Errors
    /// `EngineError::ValueKind` when the value kind does not fit the
    /// dimension.
    pub fn edit_parameter(
        &self,
        run_id: RunId,
        dimension: Dimension,
        value: DimensionValue,
    ) -> Result<(), EngineError> {
        self.edit_parameter_inner(run_id, dimension, value, None)
    }

    fn edit_parameter_inner(
        &self,
        run_id: RunId,
        dimension: Dimension,
        value: DimensionValue,
        debounce: Option<Duration>,
    ) -> Result<(), EngineError> {
        let Some(run) = self.store.run(run_id) else {
            tracing::warn!(run_id = %run_id, "cannot edit unknown run");
            return Ok(());
        };

        let resolution = self.validator.apply_edit(&run.params, dimension, value)?;
        self.store.apply_validated(run_id, &resolution);

        let mut reloads = vec![run_id];
        if self.links.is_linked(dimension) {
            // The post-validation value is what propagates, so linked
            // dimensions stay bit-identical across runs.
            let propagated = resolution.params.value(dimension);
            let outcome = self.propagator.propagate(dimension, &propagated, run_id);
            reloads.extend(outcome.needs_reload);
        }
        for id in reloads {
            match debounce {
                Some(delay) => self.scheduler.reload_debounced(id, delay),
                None => self.scheduler.reload(id),
            }
        }

        self.hooks.render_table();
        self.push_url();
        Ok(())
    }

    /// Toggle a dimension's linked state
    ///
    /// Linking immediately propagates the first run's current value so
    /// all runs agree; unlinking leaves every run's value as-is.
    pub fn toggle_link(&self, dimension: Dimension) {
        let now_linked = self.links.toggle(dimension);
        if now_linked {
            if let Some(first) = self.store.first() {
                let value = first.params.value(dimension);
                let outcome = self.propagator.propagate(dimension, &value, first.id);
                for id in outcome.needs_reload {
                    self.scheduler.reload(id);
                }
            }
        }
        self.hooks.render_table();
        self.push_url();
    }

    // --- KDMA edits ------------------------------------------------

    /// Add a KDMA to a run per the add policy
    ///
    /// # Errors
    /// Propagates `EngineError` from the underlying edit.
    pub fn add_kdma(&self, run_id: RunId) -> Result<(), EngineError> {
        let Some(run) = self.store.run(run_id) else {
            tracing::warn!(run_id = %run_id, "cannot add KDMA to unknown run");
            return Ok(());
        };
        let min_required = self.validator.min_kdma_count(&run.params);
        let max_allowed = self.validator.max_kdma_count(&run.params);
        let Some(planned) = kdma::plan_addition(
            &run.params.kdmas,
            &run.options,
            min_required,
            max_allowed,
            self.validator.tolerance(),
        ) else {
            return Ok(());
        };
        self.edit_parameter(run_id, Dimension::Kdmas, DimensionValue::Kdmas(planned))
    }

    /// Remove one KDMA from a run per the removal policy
    ///
    /// # Errors
    /// Propagates `EngineError` from the underlying edit.
    pub fn remove_kdma(&self, run_id: RunId, kdma_type: &str) -> Result<(), EngineError> {
        let Some(run) = self.store.run(run_id) else {
            tracing::warn!(run_id = %run_id, "cannot remove KDMA from unknown run");
            return Ok(());
        };
        let planned = kdma::plan_removal(
            &run.params.kdmas,
            kdma_type,
            &run.options,
            self.validator.tolerance(),
        );
        self.edit_parameter(run_id, Dimension::Kdmas, DimensionValue::Kdmas(planned))
    }

    /// Relabel one KDMA type to another, preserving the weight when the
    /// new type allows it
    ///
    /// # Errors
    /// Propagates `EngineError` from the underlying edit.
    pub fn change_kdma_type(
        &self,
        run_id: RunId,
        old_type: &str,
        new_type: &str,
    ) -> Result<(), EngineError> {
        let Some(run) = self.store.run(run_id) else {
            tracing::warn!(run_id = %run_id, "cannot relabel KDMA on unknown run");
            return Ok(());
        };
        let planned = kdma::plan_type_change(
            &run.params.kdmas,
            old_type,
            new_type,
            &run.options,
            self.validator.tolerance(),
        );
        self.edit_parameter(run_id, Dimension::Kdmas, DimensionValue::Kdmas(planned))
    }

    /// Set one KDMA weight immediately
    ///
    /// # Errors
    /// Propagates `EngineError` from the underlying edit.
    pub fn set_kdma_weight(
        &self,
        run_id: RunId,
        kdma_type: &str,
        weight: f64,
    ) -> Result<(), EngineError> {
        self.set_kdma_weight_inner(run_id, kdma_type, weight, None)
    }

    /// Set one KDMA weight from continuous slider input: the tuple is
    /// committed immediately, the reload is debounced
    ///
    /// # Errors
    /// Propagates `EngineError` from the underlying edit.
    pub fn set_kdma_weight_debounced(
        &self,
        run_id: RunId,
        kdma_type: &str,
        weight: f64,
    ) -> Result<(), EngineError> {
        self.set_kdma_weight_inner(run_id, kdma_type, weight, Some(self.config.kdma_slider_debounce))
    }

    fn set_kdma_weight_inner(
        &self,
        run_id: RunId,
        kdma_type: &str,
        weight: f64,
        debounce: Option<Duration>,
    ) -> Result<(), EngineError> {
        let Some(run) = self.store.run(run_id) else {
            tracing::warn!(run_id = %run_id, "cannot set KDMA weight on unknown run");
            return Ok(());
        };
        let mut planned = run.params.kdmas.clone();
        planned.insert(kdma_type, weight);
        self.edit_parameter_inner(run_id, Dimension::Kdmas, DimensionValue::Kdmas(planned), debounce)
    }

    // --- queries ---------------------------------------------------

    /// Snapshot of every run, in display order
    #[must_use]
    pub fn runs(&self) -> Vec<Run> {
        self.store.all()
    }

    /// Snapshot of one run
    #[must_use]
    pub fn run(&self, run_id: RunId) -> Option<Run> {
        self.store.run(run_id)
    }

    /// Whether a dimension is currently linked
    #[must_use]
    pub fn is_linked(&self, dimension: Dimension) -> bool {
        self.links.is_linked(dimension)
    }

    /// The restorable portion of the session
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            runs: self.store.all_params(),
            linked: self.links.snapshot(),
        }
    }

    /// Encode the current state as a URL query string
    ///
    /// # Errors
    /// `EngineError::Encode` when serialization fails.
    pub fn current_url(&self) -> Result<String, EngineError> {
        UrlCodec::encode(&self.snapshot())
    }

    /// Session configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn push_url(&self) {
        match UrlCodec::encode(&self.snapshot()) {
            Ok(url) => self.hooks.url_changed(&url),
            Err(err) => tracing::error!(%err, "failed to encode session state"),
        }
    }
}
