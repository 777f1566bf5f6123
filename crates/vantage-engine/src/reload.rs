//! Reload scheduler
//!
//! Drives the asynchronous refresh of a run's result data after a
//! parameter change:
//! - Single-flight per run: a run already mid-reload drops the new
//!   request entirely (in-flight wins; no queueing, no cancellation)
//! - Fire-and-forget: completion is observed only through the run's
//!   `load_status`, never through a return value; failures inside the
//!   task become `LoadStatus::Error`
//! - Debounced variant coalescing rapid repeats (slider drags) into a
//!   single reload fired after the last request

use crate::hooks::UiHooks;
use crate::store::{LoadStatus, RunId, RunStateStore};
use crate::validation::ValidationEngine;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use vantage_catalog::{ParamSet, ResultFetcher, RunResult};

/// Per-run reload driver; handles are cheap clones
#[derive(Clone)]
pub struct ReloadScheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    store: Arc<RunStateStore>,
    validator: ValidationEngine,
    fetcher: Arc<dyn ResultFetcher>,
    hooks: Arc<dyn UiHooks>,
    // Pending debounce timer per run; at most one entry per key.
    timers: DashMap<RunId, JoinHandle<()>>,
}

impl std::fmt::Debug for ReloadScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReloadScheduler")
            .field("pending_timers", &self.inner.timers.len())
            .finish_non_exhaustive()
    }
}

impl ReloadScheduler {
    /// Create a scheduler over the store and collaborators
    #[must_use]
    pub fn new(
        store: Arc<RunStateStore>,
        validator: ValidationEngine,
        fetcher: Arc<dyn ResultFetcher>,
        hooks: Arc<dyn UiHooks>,
    ) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                store,
                validator,
                fetcher,
                hooks,
                timers: DashMap::new(),
            }),
        }
    }

    /// Reload a run's result data for its current tuple
    ///
    /// The begin phase is synchronous: the single-flight check, the
    /// `Loading` transition, and the tuple snapshot all happen before
    /// this returns. The resolve/fetch work runs in a spawned task.
    pub fn reload(&self, run_id: RunId) {
        let Some(submitted) = self.inner.store.begin_reload(run_id) else {
            return;
        };
        self.inner.hooks.render_table();

        let scheduler = self.clone();
        tokio::spawn(async move {
            scheduler.execute(run_id, submitted).await;
        });
    }

    /// Coalesce rapid repeated reload requests for a run into a single
    /// reload fired `delay` after the last request
    pub fn reload_debounced(&self, run_id: RunId, delay: Duration) {
        let scheduler = self.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            scheduler.inner.timers.remove(&run_id);
            scheduler.reload(run_id);
        });
        if let Some(previous) = self.inner.timers.insert(run_id, handle) {
            previous.abort();
        }
    }

    /// Drop any pending debounce timer for a run (run removal)
    pub fn cancel_pending(&self, run_id: RunId) {
        if let Some((_, handle)) = self.inner.timers.remove(&run_id) {
            handle.abort();
        }
    }

    /// Drop every pending debounce timer (session clear)
    pub fn cancel_all_pending(&self) {
        self.inner.timers.retain(|_, handle| {
            handle.abort();
            false
        });
    }

    async fn execute(&self, run_id: RunId, submitted: ParamSet) {
        let (status, result) = self.resolve_and_fetch(&submitted).await;
        self.inner
            .store
            .finish_reload(run_id, &submitted, status, result);
        self.inner.hooks.render_table();
    }

    /// Resolve the tuple first; only a tuple the catalog confirms is
    /// fetched at all.
    async fn resolve_and_fetch(&self, submitted: &ParamSet) -> (LoadStatus, Option<RunResult>) {
        let resolution = self.inner.validator.validate(submitted);
        if !resolution
            .params
            .approx_matches(submitted, self.inner.validator.tolerance())
        {
            return (LoadStatus::NoMatch, None);
        }

        match self.inner.fetcher.fetch(submitted).await {
            Ok(Some(result)) => (LoadStatus::Loaded, Some(result)),
            Ok(None) => (LoadStatus::NoData, None),
            Err(err) => {
                tracing::error!(%err, "result fetch failed");
                (LoadStatus::Error, None)
            }
        }
    }
}
