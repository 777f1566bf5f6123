//! Result-fetch collaborator interface

use crate::params::ParamSet;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Fetched result payload for one run
///
/// The fields beyond `experiment_key` are opaque to the engine; they are
/// stored on the run and handed back out for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Key of the experiment the payload belongs to
    pub experiment_key: String,
    /// Input/output record for the run's scene
    pub input_output: serde_json::Value,
    /// Full input/output array for the experiment
    #[serde(default)]
    pub input_output_array: Vec<serde_json::Value>,
    /// Probe timing in seconds, when the manifest carries one
    #[serde(default)]
    pub timing_s: Option<f64>,
}

/// Transport-level fetch failure
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    /// The transport failed (network, decode, ...)
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Asynchronous source of run results
///
/// `Ok(None)` means the fetch ran but returned nothing usable; `Err`
/// means the transport itself failed. The distinction drives the run's
/// terminal status (`no-data` vs `error`).
#[async_trait]
pub trait ResultFetcher: Send + Sync {
    /// Fetch the result payload matching a concrete tuple
    async fn fetch(&self, params: &ParamSet) -> Result<Option<RunResult>, FetchError>;
}
