//! Validation engine
//!
//! Thin wrapper over the catalog oracle that performs auto-correction
//! of a single edit and applies the KDMA preservation rule: the
//! caller's weight mapping is never pruned entry-by-entry, the legal
//! combination list is handed back for the caller to decide.

use crate::error::EngineError;
use std::sync::Arc;
use vantage_catalog::{
    Catalog, Dimension, DimensionValue, KdmaMap, ParamSet, Resolution, KDMA_WEIGHT_TOLERANCE,
};

/// Auto-correcting validator over an external catalog
#[derive(Clone)]
pub struct ValidationEngine {
    catalog: Arc<dyn Catalog>,
    tolerance: f64,
}

impl std::fmt::Debug for ValidationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationEngine")
            .field("tolerance", &self.tolerance)
            .finish_non_exhaustive()
    }
}

impl ValidationEngine {
    /// Create a validator over a catalog
    #[inline]
    #[must_use]
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self {
            catalog,
            tolerance: KDMA_WEIGHT_TOLERANCE,
        }
    }

    /// KDMA weight comparison tolerance in effect
    #[inline]
    #[must_use]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Validate a (possibly partial) tuple against the catalog
    ///
    /// Scalar dimensions adopt the catalog's corrected values. For the
    /// KDMA dimension:
    /// - a non-empty mapping is preserved verbatim, never pruned
    ///   entry-by-entry; the returned `kdma_combinations` list lets the
    ///   caller decide;
    /// - an empty mapping is kept only when the empty (unaligned)
    ///   combination is legal for the corrected context; otherwise the
    ///   catalog's corrected combination is adopted, which is what
    ///   makes default auto-pin land on a concrete run.
    ///
    /// An unsatisfiable catalog yields the all-unset resolution; the
    /// caller treats it as "no valid configuration exists".
    #[must_use]
    pub fn validate(&self, request: &ParamSet) -> Resolution {
        let mut resolution = self.catalog.resolve(request);
        if resolution.is_unsatisfiable() {
            tracing::debug!("catalog offered no tuple at all");
            return resolution;
        }

        if request.kdmas.is_empty() {
            if resolution.options.has_empty_combination() {
                resolution.params.kdmas = KdmaMap::new();
            }
        } else {
            resolution.params.kdmas = request.kdmas.clone();
        }
        resolution
    }

    /// Auto-correct a single edit: set `dimension` to `value` on top of
    /// `current`, then validate the whole tuple
    ///
    /// # Errors
    /// `EngineError::ValueKind` when the value kind does not fit the
    /// dimension.
    pub fn apply_edit(
        &self,
        current: &ParamSet,
        dimension: Dimension,
        value: DimensionValue,
    ) -> Result<Resolution, EngineError> {
        let mut request = current.clone();
        request.set_value(dimension, value)?;
        let resolution = self.validate(&request);
        if !resolution.params.approx_matches(&request, self.tolerance) {
            tracing::debug!(%dimension, "edit auto-corrected to nearest valid tuple");
        }
        Ok(resolution)
    }

    /// Minimum required KDMA count for a run context
    #[must_use]
    pub fn min_kdma_count(&self, context: &ParamSet) -> usize {
        self.catalog.min_kdma_count(context)
    }

    /// Maximum allowed KDMA count for a run context
    #[must_use]
    pub fn max_kdma_count(&self, context: &ParamSet) -> usize {
        self.catalog.max_kdma_count(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vantage_test_utils::{demo_catalog, experiment};

    fn engine() -> ValidationEngine {
        ValidationEngine::new(Arc::new(demo_catalog()))
    }

    #[test]
    fn validate_empty_request_yields_concrete_tuple() {
        let resolution = engine().validate(&ParamSet::new());

        assert_eq!(resolution.params.scenario.as_deref(), Some("S1"));
        assert_eq!(resolution.params.scene.as_deref(), Some("A"));
        assert_eq!(resolution.params.adm_type.as_deref(), Some("adm-x"));
        assert_eq!(resolution.params.llm_backbone.as_deref(), Some("llm-1"));
        // The unaligned combination is legal for S1/A/adm-x/llm-1, so
        // the empty request mapping is kept.
        assert!(resolution.params.kdmas.is_empty());
    }

    #[test]
    fn validate_adopts_combination_when_empty_is_illegal() {
        let resolution = engine().validate(&ParamSet::new().with_scenario("S2"));

        assert_eq!(resolution.params.adm_type.as_deref(), Some("adm-y"));
        assert_eq!(
            resolution.params.kdmas.get("mercy"),
            Some(0.7),
            "no unaligned run exists for S2, so the corrected combination is adopted"
        );
    }

    #[test]
    fn validate_preserves_nonconforming_kdmas() {
        let stray = KdmaMap::new().with("mercy", 0.9);
        let request = ParamSet::new()
            .with_scenario("S1")
            .with_scene("A")
            .with_adm_type("adm-x")
            .with_llm_backbone("llm-1")
            .with_kdmas(stray.clone());

        let resolution = engine().validate(&request);
        assert!(
            resolution.params.kdmas.approx_eq(&stray, KDMA_WEIGHT_TOLERANCE),
            "entries are never auto-dropped"
        );
        assert!(
            !resolution.options.kdma_combinations.is_empty(),
            "the legal combinations are still reported"
        );
    }

    #[test]
    fn correction_is_idempotent() {
        let requests = [
            ParamSet::new(),
            ParamSet::new().with_scenario("S2"),
            ParamSet::new().with_scene("B").with_llm_backbone("llm-2"),
            experiment("S1", "A", "adm-x", "llm-2", KdmaMap::new().with("mercy", 0.3)),
        ];
        let engine = engine();

        for request in requests {
            let first = engine.validate(&request);
            let second = engine.validate(&first.params);
            assert_eq!(
                second.params, first.params,
                "validate(validate(t)) == validate(t) for {request:?}"
            );
        }
    }

    #[test]
    fn apply_edit_keeps_the_edited_dimension() {
        let engine = engine();
        let start = engine.validate(&ParamSet::new()).params;

        let resolution = engine
            .apply_edit(
                &start,
                Dimension::LlmBackbone,
                DimensionValue::scalar("llm-2"),
            )
            .unwrap();

        assert_eq!(resolution.params.llm_backbone.as_deref(), Some("llm-2"));
        assert_eq!(resolution.params.scenario.as_deref(), Some("S1"));
    }

    #[test]
    fn apply_edit_corrects_conflicting_dimensions() {
        let engine = engine();
        // S2 only exists on adm-y/llm-2; editing scenario must drag the
        // conflicting dimensions along.
        let start = engine.validate(&ParamSet::new()).params;
        let resolution = engine
            .apply_edit(&start, Dimension::Scenario, DimensionValue::scalar("S2"))
            .unwrap();

        assert_eq!(resolution.params.scenario.as_deref(), Some("S2"));
        assert_eq!(resolution.params.adm_type.as_deref(), Some("adm-y"));
        assert_eq!(resolution.params.llm_backbone.as_deref(), Some("llm-2"));
    }

    #[test]
    fn apply_edit_rejects_kind_mismatch() {
        let engine = engine();
        let start = engine.validate(&ParamSet::new()).params;

        let err = engine
            .apply_edit(&start, Dimension::Kdmas, DimensionValue::scalar("oops"))
            .unwrap_err();
        assert!(matches!(err, EngineError::ValueKind(_)));
    }

    #[test]
    fn empty_catalog_is_unsatisfiable_not_an_error() {
        let engine = ValidationEngine::new(Arc::new(vantage_test_utils::TableCatalog::new()));
        let resolution = engine.validate(&ParamSet::new().with_scenario("S1"));
        assert!(resolution.is_unsatisfiable());
    }
}
