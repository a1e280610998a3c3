//! Persistence and JSON interchange.
//!
//! The core never decides where state is stored. It exposes plain,
//! serde-serializable structures and these helpers so an external storage
//! layer can checkpoint and restore sessions.
//!
//! ```rust,ignore
//! use pada_map::graph::SpatialGraph;
//! use pada_map::io::AccumulatorSnapshot;
//!
//! let json = graph.export().to_json()?;
//! let restored = SpatialGraph::import(AccumulatorSnapshot::from_json(&json)?)?;
//! ```

mod snapshot;

pub use snapshot::{AccumulatorSnapshot, SNAPSHOT_VERSION};

use crate::error::Result;
use crate::graph::ConsensusView;
use crate::similarity::MatchDecision;

/// Encode a consensus view as JSON.
pub fn consensus_to_json(view: &ConsensusView) -> Result<String> {
    Ok(serde_json::to_string(view)?)
}

/// Decode a consensus view, e.g. a stored reference model.
pub fn consensus_from_json(json: &str) -> Result<ConsensusView> {
    Ok(serde_json::from_str(json)?)
}

/// Encode a decision in its wire shape
/// (`{matched, coverage, positionError, confidence, decision}`).
pub fn decision_to_json(decision: &MatchDecision) -> Result<String> {
    Ok(serde_json::to_string(decision)?)
}
