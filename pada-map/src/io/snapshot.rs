//! Versioned snapshot of a spatial graph.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::graph::{AccumulatorConfig, Contour, Edge, Node};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Complete raw state of a [`SpatialGraph`](crate::graph::SpatialGraph).
///
/// Produced by `export()` and consumed by `import()`. Holds everything
/// needed to continue accumulation where it stopped: the configuration,
/// the logical clock and all nodes, edges and contours.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccumulatorSnapshot {
    /// Format version
    pub version: u32,
    /// Configuration the graph was built with
    pub config: AccumulatorConfig,
    /// Logical clock
    pub step: u64,
    /// Observations ingested
    pub observation_count: u64,
    /// Highest observation id handed to the graph
    #[serde(default)]
    pub last_observation: u64,
    /// Node arena, in id order
    pub nodes: Vec<Node>,
    /// Edges at export time
    pub edges: Vec<Edge>,
    /// Stored contours
    #[serde(default)]
    pub contours: Vec<Contour>,
}

impl AccumulatorSnapshot {
    /// Encode as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Read from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
