//! URL state codec
//!
//! Serializes the comparison state (ordered run tuples + linked
//! dimensions) into a compact, restorable `?state=` query string and
//! parses it back. Transient per-run fields (load status, in-flight
//! flags, result payloads) are deliberately not encoded; restoration
//! re-derives them by re-validating and reloading each run.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeSet;
use vantage_catalog::{Dimension, ParamSet};

/// The restorable portion of a comparison session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Run tuples in display order
    #[serde(default)]
    pub runs: Vec<ParamSet>,
    /// Linked dimensions
    #[serde(default)]
    pub linked: BTreeSet<Dimension>,
}

/// Query parameter carrying the encoded state
const STATE_PARAM: &str = "state=";

/// Encoder/decoder for the URL representation
#[derive(Debug, Clone, Copy)]
pub struct UrlCodec;

impl UrlCodec {
    /// Encode a snapshot as a `?state=` query string
    ///
    /// # Errors
    /// `EngineError::Encode` when the snapshot cannot be serialized.
    pub fn encode(snapshot: &SessionSnapshot) -> Result<String, EngineError> {
        let payload = serde_json::to_string(snapshot)?;
        Ok(format!("?{}{}", STATE_PARAM, urlencoding::encode(&payload)))
    }

    /// Decode a snapshot from a full URL or a bare query string
    ///
    /// Absent, empty, or malformed input yields `None` ("nothing to
    /// restore"), never an error.
    #[must_use]
    pub fn decode(input: &str) -> Option<SessionSnapshot> {
        let query = input.split_once('?').map_or(input, |(_, query)| query);
        let query = query.split('#').next().unwrap_or(query);
        let raw = query
            .split('&')
            .find_map(|pair| pair.strip_prefix(STATE_PARAM))?;
        if raw.is_empty() {
            return None;
        }
        let payload: Cow<'_, str> = urlencoding::decode(raw).ok()?;
        serde_json::from_str(&payload).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use vantage_catalog::KdmaMap;

    fn snapshot() -> SessionSnapshot {
        SessionSnapshot {
            runs: vec![
                ParamSet::new()
                    .with_scenario("S1")
                    .with_scene("A")
                    .with_adm_type("adm-x")
                    .with_llm_backbone("llm-1")
                    .with_kdmas(KdmaMap::new().with("mercy", 0.3).with("risk", 0.5)),
                ParamSet::new()
                    .with_scenario("S2")
                    .with_scene("A")
                    .with_adm_type("adm-y")
                    .with_llm_backbone("llm-2")
                    .with_run_variant("rerun"),
            ],
            linked: [Dimension::LlmBackbone, Dimension::Scene].into(),
        }
    }

    #[test]
    fn round_trip_preserves_tuples_and_links() {
        let original = snapshot();
        let url = UrlCodec::encode(&original).unwrap();
        let decoded = UrlCodec::decode(&url).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn decode_accepts_full_urls_and_extra_params() {
        let url = UrlCodec::encode(&snapshot()).unwrap();
        let full = format!("https://example.test/compare{url}&tab=results#anchor");
        assert_eq!(UrlCodec::decode(&full).unwrap(), snapshot());
    }

    #[test]
    fn decode_of_absent_or_malformed_state_is_none() {
        assert!(UrlCodec::decode("").is_none());
        assert!(UrlCodec::decode("?other=1").is_none());
        assert!(UrlCodec::decode("?state=").is_none());
        assert!(UrlCodec::decode("?state=%7Bnot-json").is_none());
        assert!(UrlCodec::decode("https://example.test/compare").is_none());
    }

    #[test]
    fn empty_snapshot_round_trips() {
        let url = UrlCodec::encode(&SessionSnapshot::default()).unwrap();
        let decoded = UrlCodec::decode(&url).unwrap();
        assert_eq!(decoded, SessionSnapshot::default());
    }
}
