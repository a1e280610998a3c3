//! Confidence-filtered read-only view of the graph.

use serde::{Deserialize, Serialize};

use crate::core::Point2D;
use crate::features::ClassTag;
use crate::matching::WeightedPoint;

/// A node as exposed by the consensus view.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConsensusNode {
    /// Node identifier
    pub id: u32,
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Node confidence
    pub confidence: f64,
    /// Number of fused observations
    pub occurrences: u32,
    /// Semantic class
    pub class: ClassTag,
}

impl ConsensusNode {
    /// Position as a point.
    #[inline]
    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }
}

/// An edge between two nodes of the view.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConsensusEdge {
    /// Lower node id
    pub a: u32,
    /// Higher node id
    pub b: u32,
    /// Distance between the nodes
    pub distance: f64,
    /// `min(confidence_a, confidence_b)`
    pub confidence: f64,
}

/// Snapshot of the nodes at or above a confidence threshold and the edges
/// between them.
///
/// Produced by [`SpatialGraph::consensus`](super::SpatialGraph::consensus)
/// as a pure function of the graph state and the threshold.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsensusView {
    /// Retained nodes, in node-id order
    pub nodes: Vec<ConsensusNode>,
    /// Edges whose endpoints are both retained
    pub edges: Vec<ConsensusEdge>,
}

impl ConsensusView {
    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the view has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Alignment input: node positions with their confidences, optionally
    /// restricted to one class.
    pub fn weighted_points(&self, class: Option<ClassTag>) -> Vec<WeightedPoint> {
        self.nodes
            .iter()
            .filter(|n| class.is_none_or(|c| n.class == c))
            .map(|n| WeightedPoint::new(n.position(), n.confidence))
            .collect()
    }
}
