//! Parameter tuples and per-dimension option sets

use crate::dimension::{Dimension, DimensionValue, KdmaMap, ValueKindError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One run's parameter tuple
///
/// Every scalar field is `Option<String>`: `None` means "unset" in a
/// partial tuple handed to the catalog. After resolution all fields are
/// concrete, with the exception of `run_variant`, where `None` is itself
/// a legal concrete value ("no variant").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamSet {
    /// Scenario identifier
    pub scenario: Option<String>,
    /// Scene within the scenario
    pub scene: Option<String>,
    /// Decision-maker type
    pub adm_type: Option<String>,
    /// Backbone model
    pub llm_backbone: Option<String>,
    /// Run variant
    #[serde(default)]
    pub run_variant: Option<String>,
    /// KDMA weight mapping
    #[serde(default)]
    pub kdmas: KdmaMap,
}

impl ParamSet {
    /// Create a fully unset tuple
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With scenario
    #[inline]
    #[must_use]
    pub fn with_scenario(mut self, scenario: impl Into<String>) -> Self {
        self.scenario = Some(scenario.into());
        self
    }

    /// With scene
    #[inline]
    #[must_use]
    pub fn with_scene(mut self, scene: impl Into<String>) -> Self {
        self.scene = Some(scene.into());
        self
    }

    /// With ADM type
    #[inline]
    #[must_use]
    pub fn with_adm_type(mut self, adm_type: impl Into<String>) -> Self {
        self.adm_type = Some(adm_type.into());
        self
    }

    /// With LLM backbone
    #[inline]
    #[must_use]
    pub fn with_llm_backbone(mut self, llm_backbone: impl Into<String>) -> Self {
        self.llm_backbone = Some(llm_backbone.into());
        self
    }

    /// With run variant
    #[inline]
    #[must_use]
    pub fn with_run_variant(mut self, run_variant: impl Into<String>) -> Self {
        self.run_variant = Some(run_variant.into());
        self
    }

    /// With KDMA mapping
    #[inline]
    #[must_use]
    pub fn with_kdmas(mut self, kdmas: KdmaMap) -> Self {
        self.kdmas = kdmas;
        self
    }

    /// Value along one dimension
    #[must_use]
    pub fn value(&self, dimension: Dimension) -> DimensionValue {
        match dimension {
            Dimension::Scenario => DimensionValue::Scalar(self.scenario.clone()),
            Dimension::Scene => DimensionValue::Scalar(self.scene.clone()),
            Dimension::AdmType => DimensionValue::Scalar(self.adm_type.clone()),
            Dimension::LlmBackbone => DimensionValue::Scalar(self.llm_backbone.clone()),
            Dimension::RunVariant => DimensionValue::Scalar(self.run_variant.clone()),
            Dimension::Kdmas => DimensionValue::Kdmas(self.kdmas.clone()),
        }
    }

    /// Overwrite the value along one dimension
    ///
    /// # Errors
    /// `ValueKindError` when a scalar is written to the KDMA axis or a
    /// KDMA mapping to a scalar axis.
    pub fn set_value(
        &mut self,
        dimension: Dimension,
        value: DimensionValue,
    ) -> Result<(), ValueKindError> {
        match (dimension, value) {
            (Dimension::Scenario, DimensionValue::Scalar(v)) => self.scenario = v,
            (Dimension::Scene, DimensionValue::Scalar(v)) => self.scene = v,
            (Dimension::AdmType, DimensionValue::Scalar(v)) => self.adm_type = v,
            (Dimension::LlmBackbone, DimensionValue::Scalar(v)) => self.llm_backbone = v,
            (Dimension::RunVariant, DimensionValue::Scalar(v)) => self.run_variant = v,
            (Dimension::Kdmas, DimensionValue::Kdmas(map)) => self.kdmas = map,
            (dimension, DimensionValue::Scalar(_)) => {
                return Err(ValueKindError {
                    dimension,
                    expected: "kdma mapping",
                });
            }
            (dimension, DimensionValue::Kdmas(_)) => {
                return Err(ValueKindError {
                    dimension,
                    expected: "scalar",
                });
            }
        }
        Ok(())
    }

    /// Tuple equality with tolerance-aware KDMA comparison
    #[must_use]
    pub fn approx_matches(&self, other: &ParamSet, tolerance: f64) -> bool {
        self.scenario == other.scenario
            && self.scene == other.scene
            && self.adm_type == other.adm_type
            && self.llm_backbone == other.llm_backbone
            && self.run_variant == other.run_variant
            && self.kdmas.approx_eq(&other.kdmas, tolerance)
    }

    /// Whether no dimension carries a value (the catalog's "no valid
    /// configuration exists" answer)
    #[must_use]
    pub fn is_fully_unset(&self) -> bool {
        self.scenario.is_none()
            && self.scene.is_none()
            && self.adm_type.is_none()
            && self.llm_backbone.is_none()
            && self.run_variant.is_none()
            && self.kdmas.is_empty()
    }
}

/// Legal values per dimension, conditioned on the rest of a corrected
/// tuple
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AvailableOptions {
    /// Legal scenarios
    pub scenarios: Vec<String>,
    /// Legal scenes
    pub scenes: Vec<String>,
    /// Legal ADM types
    pub adm_types: Vec<String>,
    /// Legal LLM backbones
    pub llm_backbones: Vec<String>,
    /// Legal run variants (`None` = "no variant")
    pub run_variants: Vec<Option<String>>,
    /// Legal complete KDMA weight combinations; may include the empty
    /// mapping (unaligned)
    pub kdma_combinations: Vec<KdmaMap>,
}

impl AvailableOptions {
    /// Whether every option list is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
            && self.scenes.is_empty()
            && self.adm_types.is_empty()
            && self.llm_backbones.is_empty()
            && self.run_variants.is_empty()
            && self.kdma_combinations.is_empty()
    }

    /// Whether `value` is a legal choice along `dimension`
    #[must_use]
    pub fn contains(&self, dimension: Dimension, value: &DimensionValue, tolerance: f64) -> bool {
        match (dimension, value) {
            (Dimension::Scenario, DimensionValue::Scalar(Some(v))) => {
                self.scenarios.iter().any(|s| s == v)
            }
            (Dimension::Scene, DimensionValue::Scalar(Some(v))) => {
                self.scenes.iter().any(|s| s == v)
            }
            (Dimension::AdmType, DimensionValue::Scalar(Some(v))) => {
                self.adm_types.iter().any(|s| s == v)
            }
            (Dimension::LlmBackbone, DimensionValue::Scalar(Some(v))) => {
                self.llm_backbones.iter().any(|s| s == v)
            }
            (Dimension::RunVariant, DimensionValue::Scalar(v)) => {
                self.run_variants.iter().any(|s| s == v)
            }
            (Dimension::Kdmas, DimensionValue::Kdmas(map)) => self
                .kdma_combinations
                .iter()
                .any(|c| c.approx_eq(map, tolerance)),
            // An unset scalar is never a legal concrete choice outside
            // the run-variant axis.
            (_, DimensionValue::Scalar(None)) => false,
            _ => false,
        }
    }

    /// Per-KDMA-type legal weights, derived from the combination list
    ///
    /// Used for single-KDMA addition and for preserving a weight across
    /// a type change. Values keep first-seen order per type.
    #[must_use]
    pub fn kdma_value_domains(&self, tolerance: f64) -> BTreeMap<String, Vec<f64>> {
        let mut domains: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for combination in &self.kdma_combinations {
            for (kdma_type, weight) in combination.iter() {
                let values = domains.entry(kdma_type.to_string()).or_default();
                if !values.iter().any(|v| (v - weight).abs() <= tolerance) {
                    values.push(weight);
                }
            }
        }
        domains
    }

    /// Whether the empty (unaligned) combination is legal
    #[must_use]
    pub fn has_empty_combination(&self) -> bool {
        self.kdma_combinations.iter().any(KdmaMap::is_empty)
    }

    /// First combination with at least one entry
    #[must_use]
    pub fn first_non_empty_combination(&self) -> Option<&KdmaMap> {
        self.kdma_combinations.iter().find(|c| !c.is_empty())
    }
}
