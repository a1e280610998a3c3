//! Graph node, edge and report types.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::core::Point2D;
use crate::features::ClassTag;

/// Identifier of a node. Equal to its index in the node arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Arena index of this node.
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Identifier of one observation (one photograph).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObservationId(pub u64);

impl std::fmt::Display for ObservationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "obs-{}", self.0)
    }
}

/// Persistent per-feature accumulator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Node identifier (arena index)
    pub id: NodeId,
    /// Confidence-weighted position
    pub position: Point2D,
    /// Confidence, always within [floor, 1.0]
    pub confidence: f64,
    /// Number of observations fused into this node
    pub occurrences: u32,
    /// Step at which the node was created
    pub first_seen: u64,
    /// Step of the most recent reinforcement
    pub last_seen: u64,
    /// Observations that contributed to this node
    pub source_observations: BTreeSet<ObservationId>,
    /// Semantic class
    pub class: ClassTag,
}

impl Node {
    /// Steps since the node was last reinforced.
    #[inline]
    pub fn idle_steps(&self, now: u64) -> u64 {
        now.saturating_sub(self.last_seen)
    }
}

/// Edge between two confident, nearby nodes.
///
/// Edges are derived data: they are rebuilt from the nodes after every
/// update and never stored independently.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Lower node id
    pub a: NodeId,
    /// Higher node id
    pub b: NodeId,
    /// Distance between the node positions
    pub distance: f64,
    /// `min(confidence_a, confidence_b)`
    pub confidence: f64,
}

/// Aggregate statistics of a spatial graph.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
    /// Number of nodes
    pub node_count: usize,
    /// Number of edges
    pub edge_count: usize,
    /// Number of stored contours
    pub contour_count: usize,
    /// Mean node confidence (0 when empty)
    pub mean_confidence: f64,
    /// Observations ingested so far
    pub observation_count: u64,
    /// Logical clock
    pub step: u64,
    /// Node count per class
    pub nodes_by_class: BTreeMap<ClassTag, usize>,
}

/// Outcome of one `add_observation` call.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FusionReport {
    /// Observation that was ingested
    pub observation_id: Option<ObservationId>,
    /// Nodes created
    pub nodes_added: usize,
    /// Existing nodes reinforced
    pub nodes_updated: usize,
    /// Points dropped as malformed
    pub skipped: usize,
    /// Contours stored as new
    pub contours_added: usize,
    /// Contours merged into an existing one
    pub contours_merged: usize,
    /// Idle nodes whose confidence decayed during this step
    pub nodes_decayed: usize,
    /// Graph statistics after the update
    pub stats: GraphStats,
}

impl FusionReport {
    /// Whether the observation changed any node or contour.
    pub fn changed(&self) -> bool {
        self.nodes_added + self.nodes_updated + self.contours_added + self.contours_merged > 0
    }
}
