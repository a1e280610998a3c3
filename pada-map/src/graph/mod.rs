//! Persistent spatial graph accumulated across observations.
//!
//! Each observation's points are fused into nearby nodes of the same class
//! or start new nodes. Confidence rises with repetition and decays when a
//! node goes unobserved for several steps.
//!
//! ```text
//!   observation k          graph after k
//!   ─────────────          ─────────────────────────────
//!     •  •   •       ──►   ● node (pos, conf, occurrences)
//!       •                  ─ edge (conf ≥ 0.45, dist ≤ 130)
//!                          ◇ contour (polygon per class)
//! ```
//!
//! # Example
//!
//! ```rust
//! use pada_map::features::{ClassTag, PointObservation};
//! use pada_map::graph::{ObservationId, SpatialGraph};
//!
//! let mut graph = SpatialGraph::default();
//! let points = [
//!     PointObservation::new(0.0, 0.0, 0.6, ClassTag::Protector),
//!     PointObservation::new(80.0, 0.0, 0.7, ClassTag::Protector),
//! ];
//! graph.add_observation(&points, ObservationId(1));
//! graph.add_observation(&points, ObservationId(2));
//!
//! let view = graph.consensus(0.65);
//! assert_eq!(view.len(), 2);
//! ```

mod accumulator;
mod config;
mod consensus;
mod contour;
mod types;

pub use accumulator::SpatialGraph;
pub use config::AccumulatorConfig;
pub use consensus::{ConsensusEdge, ConsensusNode, ConsensusView};
pub use contour::{Contour, ContourFusion, ContourId, ContourStore};
pub use types::{Edge, FusionReport, GraphStats, Node, NodeId, ObservationId};
