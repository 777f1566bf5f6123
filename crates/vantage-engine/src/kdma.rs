//! KDMA edit policy
//!
//! The business rules for editing a run's KDMA mapping, expressed as
//! pure planning helpers over the run's current mapping and option
//! sets. The session applies the planned mapping through the normal
//! validated edit path.

use vantage_catalog::{AvailableOptions, Dimension, DimensionValue, KdmaMap};

/// Plan adding one KDMA to `current`
///
/// - At the maximum count: warning-class no-op (`None`).
/// - Empty mapping with a minimum-required count above one: install the
///   first non-empty legal combination atomically.
/// - Otherwise: first KDMA type not already present, at that type's
///   first legal weight (0.0 when the domain list is empty); no type
///   available is a warning-class no-op.
pub(crate) fn plan_addition(
    current: &KdmaMap,
    options: &AvailableOptions,
    min_required: usize,
    max_allowed: usize,
    tolerance: f64,
) -> Option<KdmaMap> {
    if current.len() >= max_allowed {
        tracing::warn!(max_allowed, "cannot add KDMA: maximum reached");
        return None;
    }

    if current.is_empty() && min_required > 1 {
        if let Some(combination) = options.first_non_empty_combination() {
            return Some(combination.clone());
        }
        tracing::warn!(min_required, "no non-empty KDMA combination available");
        return None;
    }

    let domains = options.kdma_value_domains(tolerance);
    let Some(kdma_type) = domains.keys().find(|t| !current.contains_type(t)) else {
        tracing::warn!("no available KDMA types to add");
        return None;
    };
    let weight = domains[kdma_type].first().copied().unwrap_or(0.0);
    Some(current.clone().with(kdma_type.clone(), weight))
}

/// Plan removing one KDMA from `current`
///
/// When the remainder is not itself a legal combination and the empty
/// combination is legal, the removal collapses to the empty (unaligned)
/// mapping; otherwise the partial removal is accepted as-is.
pub(crate) fn plan_removal(
    current: &KdmaMap,
    kdma_type: &str,
    options: &AvailableOptions,
    tolerance: f64,
) -> KdmaMap {
    let mut updated = current.clone();
    updated.remove(kdma_type);

    let remainder_legal = options.contains(
        Dimension::Kdmas,
        &DimensionValue::Kdmas(updated.clone()),
        tolerance,
    );
    if !remainder_legal && options.has_empty_combination() {
        return KdmaMap::new();
    }
    updated
}

/// Plan relabeling `old_type` to `new_type`
///
/// The numeric weight is preserved when the new type's legal weights
/// contain a value within tolerance of the old weight; otherwise it
/// snaps to the new type's first legal value.
pub(crate) fn plan_type_change(
    current: &KdmaMap,
    old_type: &str,
    new_type: &str,
    options: &AvailableOptions,
    tolerance: f64,
) -> KdmaMap {
    let Some(old_weight) = current.get(old_type) else {
        tracing::warn!(old_type, "cannot relabel absent KDMA type");
        return current.clone();
    };

    let mut updated = current.clone();
    updated.remove(old_type);

    let domains = options.kdma_value_domains(tolerance);
    let mut weight = old_weight;
    if let Some(values) = domains.get(new_type) {
        if !values.is_empty() && !values.iter().any(|v| (v - old_weight).abs() <= tolerance) {
            weight = values[0];
        }
    }
    updated.insert(new_type, weight);
    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use vantage_catalog::KDMA_WEIGHT_TOLERANCE;

    fn options(combinations: Vec<KdmaMap>) -> AvailableOptions {
        AvailableOptions {
            kdma_combinations: combinations,
            ..AvailableOptions::default()
        }
    }

    #[test]
    fn addition_at_max_is_rejected() {
        let current = KdmaMap::new().with("mercy", 0.3);
        let opts = options(vec![KdmaMap::new().with("mercy", 0.3).with("risk", 0.5)]);

        assert!(plan_addition(&current, &opts, 0, 1, KDMA_WEIGHT_TOLERANCE).is_none());
    }

    #[test]
    fn addition_to_empty_with_minimum_above_one_installs_combination() {
        let combination = KdmaMap::new().with("mercy", 0.3).with("risk", 0.5);
        let opts = options(vec![KdmaMap::new(), combination.clone()]);

        let planned = plan_addition(&KdmaMap::new(), &opts, 2, 2, KDMA_WEIGHT_TOLERANCE).unwrap();
        assert!(planned.approx_eq(&combination, KDMA_WEIGHT_TOLERANCE));
        assert_eq!(planned.len(), 2, "installed atomically, not entry by entry");
    }

    #[test]
    fn addition_picks_first_missing_type_at_first_legal_weight() {
        let current = KdmaMap::new().with("mercy", 0.3);
        let opts = options(vec![
            KdmaMap::new().with("mercy", 0.3).with("risk", 0.5),
            KdmaMap::new().with("mercy", 0.3).with("risk", 0.8),
        ]);

        let planned = plan_addition(&current, &opts, 0, 2, KDMA_WEIGHT_TOLERANCE).unwrap();
        assert_eq!(planned.get("risk"), Some(0.5));
        assert_eq!(planned.get("mercy"), Some(0.3));
    }

    #[test]
    fn addition_with_no_remaining_type_is_rejected() {
        let current = KdmaMap::new().with("mercy", 0.3);
        let opts = options(vec![KdmaMap::new().with("mercy", 0.3)]);

        assert!(plan_addition(&current, &opts, 0, 3, KDMA_WEIGHT_TOLERANCE).is_none());
    }

    #[test]
    fn removal_keeps_legal_remainder() {
        let current = KdmaMap::new().with("mercy", 0.3).with("risk", 0.5);
        let opts = options(vec![
            KdmaMap::new().with("mercy", 0.3),
            current.clone(),
        ]);

        let planned = plan_removal(&current, "risk", &opts, KDMA_WEIGHT_TOLERANCE);
        assert_eq!(planned.get("mercy"), Some(0.3));
        assert_eq!(planned.len(), 1);
    }

    #[test]
    fn removal_collapses_to_empty_when_remainder_is_illegal() {
        let current = KdmaMap::new().with("mercy", 0.3).with("risk", 0.5);
        let opts = options(vec![KdmaMap::new(), current.clone()]);

        let planned = plan_removal(&current, "risk", &opts, KDMA_WEIGHT_TOLERANCE);
        assert!(planned.is_empty(), "unaligned state is reachable");
    }

    #[test]
    fn removal_accepts_illegal_remainder_without_empty_option() {
        let current = KdmaMap::new().with("mercy", 0.3).with("risk", 0.5);
        let opts = options(vec![current.clone()]);

        let planned = plan_removal(&current, "risk", &opts, KDMA_WEIGHT_TOLERANCE);
        assert_eq!(planned.get("mercy"), Some(0.3), "partial removal stands");
    }

    #[test]
    fn type_change_preserves_weight_within_tolerance() {
        let current = KdmaMap::new().with("mercy", 0.3);
        let opts = options(vec![
            KdmaMap::new().with("mercy", 0.3),
            KdmaMap::new().with("risk", 0.3),
        ]);

        let planned = plan_type_change(&current, "mercy", "risk", &opts, KDMA_WEIGHT_TOLERANCE);
        assert_eq!(planned.get("risk"), Some(0.3));
        assert!(!planned.contains_type("mercy"));
    }

    #[test]
    fn type_change_snaps_to_first_legal_weight() {
        let current = KdmaMap::new().with("mercy", 0.3);
        let opts = options(vec![
            KdmaMap::new().with("mercy", 0.3),
            KdmaMap::new().with("risk", 0.8),
            KdmaMap::new().with("risk", 0.9),
        ]);

        let planned = plan_type_change(&current, "mercy", "risk", &opts, KDMA_WEIGHT_TOLERANCE);
        assert_eq!(planned.get("risk"), Some(0.8));
    }

    #[test]
    fn type_change_of_absent_type_is_a_no_op() {
        let current = KdmaMap::new().with("mercy", 0.3);
        let opts = options(vec![]);

        let planned = plan_type_change(&current, "risk", "ethos", &opts, KDMA_WEIGHT_TOLERANCE);
        assert_eq!(planned, current);
    }
}
