//! Parameter dimensions and their values
//!
//! Defines the fixed set of editable axes for a run:
//! - Five scalar dimensions (scenario, scene, ADM type, LLM backbone,
//!   run variant)
//! - The KDMA dimension, whose value is a weight mapping rather than a
//!   scalar

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tolerance used when comparing KDMA weights.
///
/// Weights travel through sliders and JSON, so equality checks and the
/// weight-preservation rule on KDMA type changes compare within this
/// tolerance rather than bit-exactly.
pub const KDMA_WEIGHT_TOLERANCE: f64 = 1e-6;

/// One editable axis of a run's parameter tuple
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    /// Scenario identifier
    Scenario,
    /// Scene within the scenario
    Scene,
    /// Decision-maker (ADM) type
    AdmType,
    /// Backbone model behind the ADM
    LlmBackbone,
    /// Run variant (rerun, original, ...); absent for most runs
    RunVariant,
    /// KDMA weight mapping
    Kdmas,
}

impl Dimension {
    /// Every dimension, in canonical display order
    pub const ALL: [Dimension; 6] = [
        Dimension::Scenario,
        Dimension::Scene,
        Dimension::AdmType,
        Dimension::LlmBackbone,
        Dimension::RunVariant,
        Dimension::Kdmas,
    ];

    /// Whether this dimension carries a scalar value
    #[inline]
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Dimension::Kdmas)
    }

    /// Wire/display name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Dimension::Scenario => "scenario",
            Dimension::Scene => "scene",
            Dimension::AdmType => "adm_type",
            Dimension::LlmBackbone => "llm_backbone",
            Dimension::RunVariant => "run_variant",
            Dimension::Kdmas => "kdmas",
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Value for one dimension of a tuple
///
/// Scalar dimensions use `Scalar`; `None` means "unset" in a partial
/// tuple (and, for the run-variant axis only, is also a legal concrete
/// value). The KDMA dimension uses `Kdmas`.
#[derive(Debug, Clone, PartialEq)]
pub enum DimensionValue {
    /// Scalar identifier or unset
    Scalar(Option<String>),
    /// KDMA weight mapping
    Kdmas(KdmaMap),
}

impl DimensionValue {
    /// Convenience constructor for a set scalar
    #[inline]
    #[must_use]
    pub fn scalar(value: impl Into<String>) -> Self {
        DimensionValue::Scalar(Some(value.into()))
    }

    /// Convenience constructor for an unset scalar
    #[inline]
    #[must_use]
    pub fn unset() -> Self {
        DimensionValue::Scalar(None)
    }
}

/// A dimension was handed a value of the wrong kind (scalar where a
/// KDMA mapping is required, or vice versa)
#[derive(Debug, Clone, thiserror::Error)]
#[error("dimension {dimension} expects a {expected} value")]
pub struct ValueKindError {
    /// The dimension being written
    pub dimension: Dimension,
    /// "scalar" or "kdma mapping"
    pub expected: &'static str,
}

/// KDMA weight mapping: KDMA-type name -> numeric weight
///
/// Keys are unique and unordered; a `BTreeMap` keeps serialization and
/// iteration deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KdmaMap(BTreeMap<String, f64>);

impl KdmaMap {
    /// Create an empty mapping
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    #[inline]
    #[must_use]
    pub fn with(mut self, kdma_type: impl Into<String>, weight: f64) -> Self {
        self.0.insert(kdma_type.into(), weight);
        self
    }

    /// Insert or overwrite a weight
    pub fn insert(&mut self, kdma_type: impl Into<String>, weight: f64) {
        self.0.insert(kdma_type.into(), weight);
    }

    /// Remove an entry; returns the removed weight
    pub fn remove(&mut self, kdma_type: &str) -> Option<f64> {
        self.0.remove(kdma_type)
    }

    /// Weight for a KDMA type
    #[inline]
    #[must_use]
    pub fn get(&self, kdma_type: &str) -> Option<f64> {
        self.0.get(kdma_type).copied()
    }

    /// Whether the type is present
    #[inline]
    #[must_use]
    pub fn contains_type(&self, kdma_type: &str) -> bool {
        self.0.contains_key(kdma_type)
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the mapping is empty (the "unaligned" value when the
    /// catalog lists an empty combination as legal)
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(type, weight)` entries
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Iterate over KDMA type names
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Tolerance-aware equality: identical key sets, each weight within
    /// `tolerance` of its counterpart
    #[must_use]
    pub fn approx_eq(&self, other: &KdmaMap, tolerance: f64) -> bool {
        if self.0.len() != other.0.len() {
            return false;
        }
        self.0.iter().all(|(kdma_type, weight)| {
            other
                .0
                .get(kdma_type)
                .is_some_and(|w| (w - weight).abs() <= tolerance)
        })
    }
}

impl FromIterator<(String, f64)> for KdmaMap {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for KdmaMap {
    type Item = (String, f64);
    type IntoIter = std::collections::btree_map::IntoIter<String, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
