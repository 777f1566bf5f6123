//! Vantage Engine - multi-run comparison core
//!
//! The validation, linking, and propagation engine behind the run
//! comparison table:
//! - Auto-corrects edited parameter tuples against the catalog oracle
//! - Keeps linked dimensions identical across runs via raw propagation
//! - Schedules debounced, single-flight result reloads per run
//! - Serializes the whole session to a restorable URL
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vantage_engine::ComparisonSession;
//!
//! let session = ComparisonSession::new(catalog, fetcher);
//! session.initialize(page_url.as_deref());
//!
//! let run = session.runs()[0].id;
//! session.toggle_link(Dimension::LlmBackbone);
//! session.edit_parameter(run, Dimension::LlmBackbone, DimensionValue::scalar("llm-2"))?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod error;
pub mod hooks;
mod kdma;
pub mod links;
pub mod propagate;
pub mod reload;
pub mod session;
pub mod store;
pub mod url;
pub mod validation;

// Re-exports for convenience
pub use error::EngineError;
pub use hooks::{NoopHooks, UiHooks};
pub use links::LinkManager;
pub use propagate::{PropagationOutcome, Propagator};
pub use reload::ReloadScheduler;
pub use session::{ComparisonSession, EngineConfig, KDMA_SLIDER_DEBOUNCE};
pub use store::{LoadStatus, Run, RunId, RunStateStore};
pub use url::{SessionSnapshot, UrlCodec};
pub use validation::ValidationEngine;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the comparison engine
    pub use crate::{
        ComparisonSession, EngineConfig, LoadStatus, Run, RunId, SessionSnapshot, UiHooks,
    };
    pub use vantage_catalog::{
        Catalog, Dimension, DimensionValue, KdmaMap, ParamSet, ResultFetcher,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
