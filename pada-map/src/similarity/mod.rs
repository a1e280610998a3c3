//! Same / similar / different decisions between patterns.
//!
//! A comparison centres the fragment on the model, aligns it (directly and
//! reflected), derives coverage and positional error from the inliers and
//! maps the combined confidence onto a verdict:
//!
//! ```text
//! coverage   = inliers / model nodes
//! error      = mean inlier distance
//! confidence = clamp(0.7·coverage + 0.3·(1 − error / inlier_threshold), 0, 1)
//!
//! matched    = inliers ≥ min_nodes ∧ confidence ≥ match_threshold
//!              ∧ coverage ≥ min_coverage ∧ alignment supported
//! ```

mod config;
mod engine;
mod types;

pub use config::{MatchThresholds, SimilarityConfig};
pub use engine::SimilarityEngine;
pub use types::{ComparisonFailure, ComparisonReport, ComparisonStage, Decision, MatchDecision};
