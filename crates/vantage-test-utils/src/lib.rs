//! Testing utilities for the Vantage workspace
//!
//! Shared fixtures: an in-memory table-backed catalog and a scripted
//! result fetcher.

#![allow(missing_docs)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use vantage_catalog::{
    AvailableOptions, Catalog, Dimension, FetchError, KdmaMap, ParamSet, Resolution, ResultFetcher,
    RunResult, KDMA_WEIGHT_TOLERANCE,
};

/// Dimension order used when narrowing candidates: earlier dimensions
/// win when the requested tuple conflicts with the corpus.
const RESOLVE_PRIORITY: [Dimension; 6] = [
    Dimension::Scenario,
    Dimension::Scene,
    Dimension::AdmType,
    Dimension::LlmBackbone,
    Dimension::Kdmas,
    Dimension::RunVariant,
];

/// In-memory catalog backed by an explicit list of concrete tuples.
///
/// Implements the resolve contract: keep every set input dimension that
/// some remaining candidate satisfies, fall back for the rest, pick the
/// first surviving candidate, and compute options per dimension holding
/// the other corrected dimensions fixed.
#[derive(Debug, Clone, Default)]
pub struct TableCatalog {
    experiments: Vec<ParamSet>,
    kdma_bounds: HashMap<String, (usize, usize)>,
}

impl TableCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_experiment(mut self, params: ParamSet) -> Self {
        self.experiments.push(params);
        self
    }

    /// Override the per-ADM KDMA count policy (min, max).
    pub fn with_kdma_bounds(mut self, adm_type: impl Into<String>, min: usize, max: usize) -> Self {
        self.kdma_bounds.insert(adm_type.into(), (min, max));
        self
    }

    fn dimension_satisfied(candidate: &ParamSet, request: &ParamSet, dimension: Dimension) -> bool {
        match dimension {
            Dimension::Scenario => candidate.scenario == request.scenario,
            Dimension::Scene => candidate.scene == request.scene,
            Dimension::AdmType => candidate.adm_type == request.adm_type,
            Dimension::LlmBackbone => candidate.llm_backbone == request.llm_backbone,
            Dimension::RunVariant => candidate.run_variant == request.run_variant,
            Dimension::Kdmas => candidate
                .kdmas
                .approx_eq(&request.kdmas, KDMA_WEIGHT_TOLERANCE),
        }
    }

    fn dimension_requested(request: &ParamSet, dimension: Dimension) -> bool {
        match dimension {
            Dimension::Scenario => request.scenario.is_some(),
            Dimension::Scene => request.scene.is_some(),
            Dimension::AdmType => request.adm_type.is_some(),
            Dimension::LlmBackbone => request.llm_backbone.is_some(),
            Dimension::RunVariant => request.run_variant.is_some(),
            // An empty mapping acts as "unset" for narrowing; an
            // unaligned run still resolves to itself because its scalar
            // dimensions identify the candidate.
            Dimension::Kdmas => !request.kdmas.is_empty(),
        }
    }

    /// Candidates that agree with `fixed` on every dimension except
    /// `varying`.
    fn agreeing_except<'a>(
        &'a self,
        fixed: &'a ParamSet,
        varying: Dimension,
    ) -> impl Iterator<Item = &'a ParamSet> {
        self.experiments.iter().filter(move |candidate| {
            Dimension::ALL
                .iter()
                .filter(|d| **d != varying)
                .all(|d| Self::dimension_satisfied(candidate, fixed, *d))
        })
    }

    fn options_for(&self, corrected: &ParamSet) -> AvailableOptions {
        let mut options = AvailableOptions::default();
        for candidate in self.agreeing_except(corrected, Dimension::Scenario) {
            if let Some(v) = &candidate.scenario {
                if !options.scenarios.contains(v) {
                    options.scenarios.push(v.clone());
                }
            }
        }
        for candidate in self.agreeing_except(corrected, Dimension::Scene) {
            if let Some(v) = &candidate.scene {
                if !options.scenes.contains(v) {
                    options.scenes.push(v.clone());
                }
            }
        }
        for candidate in self.agreeing_except(corrected, Dimension::AdmType) {
            if let Some(v) = &candidate.adm_type {
                if !options.adm_types.contains(v) {
                    options.adm_types.push(v.clone());
                }
            }
        }
        for candidate in self.agreeing_except(corrected, Dimension::LlmBackbone) {
            if let Some(v) = &candidate.llm_backbone {
                if !options.llm_backbones.contains(v) {
                    options.llm_backbones.push(v.clone());
                }
            }
        }
        for candidate in self.agreeing_except(corrected, Dimension::RunVariant) {
            if !options.run_variants.contains(&candidate.run_variant) {
                options.run_variants.push(candidate.run_variant.clone());
            }
        }
        for candidate in self.agreeing_except(corrected, Dimension::Kdmas) {
            if !options
                .kdma_combinations
                .iter()
                .any(|c| c.approx_eq(&candidate.kdmas, KDMA_WEIGHT_TOLERANCE))
            {
                options.kdma_combinations.push(candidate.kdmas.clone());
            }
        }
        options
    }
}

impl Catalog for TableCatalog {
    fn resolve(&self, request: &ParamSet) -> Resolution {
        if self.experiments.is_empty() {
            return Resolution::default();
        }

        let mut candidates: Vec<&ParamSet> = self.experiments.iter().collect();
        for dimension in RESOLVE_PRIORITY {
            if !Self::dimension_requested(request, dimension) {
                continue;
            }
            let surviving: Vec<&ParamSet> = candidates
                .iter()
                .copied()
                .filter(|c| Self::dimension_satisfied(c, request, dimension))
                .collect();
            if !surviving.is_empty() {
                candidates = surviving;
            }
        }

        let corrected = candidates[0].clone();
        let options = self.options_for(&corrected);
        Resolution {
            params: corrected,
            options,
        }
    }

    fn min_kdma_count(&self, context: &ParamSet) -> usize {
        context
            .adm_type
            .as_deref()
            .and_then(|adm| self.kdma_bounds.get(adm))
            .map_or(0, |(min, _)| *min)
    }

    fn max_kdma_count(&self, context: &ParamSet) -> usize {
        if let Some((_, max)) = context
            .adm_type
            .as_deref()
            .and_then(|adm| self.kdma_bounds.get(adm))
        {
            return *max;
        }
        // Derived default: the largest combination the corpus holds for
        // this ADM type (corpus-wide when no ADM is set).
        self.experiments
            .iter()
            .filter(|e| context.adm_type.is_none() || e.adm_type == context.adm_type)
            .map(|e| e.kdmas.len())
            .max()
            .unwrap_or(0)
    }
}

/// How the scripted fetcher answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// Answer from the scripted result table.
    #[default]
    Normal,
    /// Every fetch returns `Ok(None)`.
    EmptyAll,
    /// Every fetch fails with a transport error.
    FailAll,
}

/// Scripted result fetcher with call counting and optional delay.
#[derive(Debug, Clone, Default)]
pub struct ScriptedFetcher {
    results: Vec<(ParamSet, RunResult)>,
    mode: FetchMode,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_result(mut self, params: ParamSet, result: RunResult) -> Self {
        self.results.push((params, result));
        self
    }

    pub fn with_mode(mut self, mode: FetchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Delay every fetch, for tests that race edits against a slow
    /// in-flight request (pair with paused tokio time).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of fetches started so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResultFetcher for ScriptedFetcher {
    async fn fetch(&self, params: &ParamSet) -> Result<Option<RunResult>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.mode {
            FetchMode::FailAll => Err(FetchError::Transport("scripted failure".to_string())),
            FetchMode::EmptyAll => Ok(None),
            FetchMode::Normal => Ok(self
                .results
                .iter()
                .find(|(p, _)| p.approx_matches(params, KDMA_WEIGHT_TOLERANCE))
                .map(|(_, r)| r.clone())),
        }
    }
}

/// Minimal result payload for a given experiment key.
pub fn make_result(experiment_key: &str) -> RunResult {
    RunResult {
        experiment_key: experiment_key.to_string(),
        input_output: serde_json::json!({
            "input": {"state": format!("state for {experiment_key}"), "choices": []},
            "output": {"choice": 0},
        }),
        input_output_array: Vec::new(),
        timing_s: Some(1.25),
    }
}

/// Concrete tuple shorthand used across the engine tests.
pub fn experiment(
    scenario: &str,
    scene: &str,
    adm_type: &str,
    llm_backbone: &str,
    kdmas: KdmaMap,
) -> ParamSet {
    ParamSet::new()
        .with_scenario(scenario)
        .with_scene(scene)
        .with_adm_type(adm_type)
        .with_llm_backbone(llm_backbone)
        .with_kdmas(kdmas)
}

/// Small two-scenario corpus shared by several engine suites:
/// - `S1/A` on `adm-x` with `llm-1`/`llm-2`, unaligned or
///   `{mercy: 0.3, risk: 0.5}`
/// - `S1/B` on `adm-x` with `llm-1`, unaligned
/// - `S2/A` on `adm-y` with `llm-2`, `{mercy: 0.7}`
pub fn demo_catalog() -> TableCatalog {
    let aligned = KdmaMap::new().with("mercy", 0.3).with("risk", 0.5);
    TableCatalog::new()
        .with_experiment(experiment("S1", "A", "adm-x", "llm-1", KdmaMap::new()))
        .with_experiment(experiment("S1", "A", "adm-x", "llm-1", aligned.clone()))
        .with_experiment(experiment("S1", "A", "adm-x", "llm-2", aligned.clone()))
        .with_experiment(experiment("S1", "B", "adm-x", "llm-1", KdmaMap::new()))
        .with_experiment(experiment(
            "S2",
            "A",
            "adm-y",
            "llm-2",
            KdmaMap::new().with("mercy", 0.7),
        ))
}
