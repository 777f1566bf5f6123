//! Error types for the comparison engine
//!
//! Most per-run failures in this engine are not errors: validation
//! misses, fetch failures, and stale completions surface as the run's
//! `LoadStatus`, and warning-class invariant violations (KDMA over the
//! maximum, unknown run ids) are logged no-ops. What remains here are
//! genuine API-seam failures.

use vantage_catalog::ValueKindError;

/// Main engine error type
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A dimension was handed a value of the wrong kind
    #[error("parameter value kind mismatch: {0}")]
    ValueKind(#[from] ValueKindError),

    /// The session snapshot could not be serialized for the URL
    #[error("state encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}
