//! # Pada-Map: Accumulative Pattern Model and Matcher
//!
//! Fuses repeated, noisy, partial observations of a planar pattern (a shoe
//! sole's protector layout) into one confidence-scored spatial model, and
//! decides whether a new observation or a second model shows the same
//! physical pattern under translation, rotation and left/right mirroring.
//!
//! ## Quick Start
//!
//! ```rust
//! use pada_map::features::{FeatureExtractor, Prediction};
//! use pada_map::core::Point2D;
//! use pada_map::graph::{ObservationId, SpatialGraph};
//! use pada_map::similarity::SimilarityEngine;
//!
//! fn square(x: f64, y: f64) -> Vec<Point2D> {
//!     vec![
//!         Point2D::new(x - 5.0, y - 5.0),
//!         Point2D::new(x + 5.0, y - 5.0),
//!         Point2D::new(x + 5.0, y + 5.0),
//!         Point2D::new(x - 5.0, y + 5.0),
//!     ]
//! }
//!
//! let predictions: Vec<Prediction> = [(0.0, 0.0), (120.0, 10.0), (40.0, 90.0), (200.0, 150.0), (90.0, 220.0)]
//!     .iter()
//!     .map(|&(x, y)| Prediction::new("protector", 0.9, square(x, y)))
//!     .collect();
//!
//! let features = FeatureExtractor::default().extract(&predictions);
//! let mut graph = SpatialGraph::default();
//! graph.add_features(&features, ObservationId(1));
//! graph.add_features(&features, ObservationId(2));
//!
//! let model = graph.consensus(0.5);
//! let decision = SimilarityEngine::default().compare_with_model(&model, &features);
//! assert!(decision.matched);
//! ```
//!
//! ## Data Flow
//!
//! ```text
//!   detector output
//!         │ FeatureExtractor::extract()
//!         ▼
//!   ExtractedFeatures ──► SpatialGraph::add_features()   (mutates the model)
//!                                 │ consensus(θ)         (pure read)
//!                                 ▼
//!                          ConsensusView
//!                                 │
//!   fragment ──► SimilarityEngine::compare_with_model()
//!                    ├─ normalize (centroid, optional PCA)
//!                    ├─ Aligner::align() direct + mirrored
//!                    └─ coverage / error / confidence ──► MatchDecision
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: Points, bounding boxes, rigid transforms, PCA
//! - [`features`]: Detector payload validation and per-class observations
//! - [`graph`]: The accumulating spatial graph and its consensus view
//! - [`matching`]: RANSAC rigid alignment with mirroring
//! - [`similarity`]: Metrics and same/similar/different decisions
//! - [`session`]: Per-session graphs and named reference models
//! - [`io`]: Snapshots and JSON interchange
//! - [`config`]: YAML configuration
//!
//! All computation is synchronous and CPU-bound. A [`SpatialGraph`] has no
//! internal locking; [`SessionStore`] serializes access per session.

#![warn(missing_docs)]

pub mod config;
pub mod core;
pub mod error;
pub mod features;
pub mod graph;
pub mod io;
pub mod matching;
pub mod session;
pub mod similarity;

pub use config::PadaConfig;
pub use error::{PadaError, Result};
pub use features::{ClassTag, ExtractedFeatures, FeatureExtractor, PointObservation, Prediction};
pub use graph::{AccumulatorConfig, ConsensusView, FusionReport, ObservationId, SpatialGraph};
pub use io::AccumulatorSnapshot;
pub use matching::{AlignmentConfig, AlignmentResult, Aligner, WeightedPoint};
pub use session::{SessionId, SessionStore};
pub use similarity::{Decision, MatchDecision, SimilarityConfig, SimilarityEngine};
