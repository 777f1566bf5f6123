//! Vantage Catalog - parameter model and collaborator interfaces
//!
//! Foundational types for the comparison engine:
//! - Parameter dimensions, tuples, and KDMA weight mappings
//! - Per-dimension option sets conditioned on a corrected tuple
//! - The `Catalog` oracle and `ResultFetcher` collaborator seams

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod catalog;
pub mod dimension;
pub mod fetch;
pub mod params;

// Re-exports for convenience
pub use catalog::{Catalog, Resolution};
pub use dimension::{
    Dimension, DimensionValue, KdmaMap, ValueKindError, KDMA_WEIGHT_TOLERANCE,
};
pub use fetch::{FetchError, ResultFetcher, RunResult};
pub use params::{AvailableOptions, ParamSet};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
