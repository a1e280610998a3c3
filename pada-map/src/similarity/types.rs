//! Comparison results.

use serde::{Deserialize, Serialize};

use crate::matching::{AlignmentResult, AlignmentStatus};

/// Verdict band of a comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Same physical pattern
    Same,
    /// Partially consistent; not enough evidence for a match
    Similar,
    /// Different pattern, or no decision possible
    Different,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Decision::Same => "same",
            Decision::Similar => "similar",
            Decision::Different => "different",
        };
        f.write_str(name)
    }
}

/// Metrics and verdict of one comparison.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDecision {
    /// All match thresholds were met
    pub matched: bool,
    /// Matched fraction of the model
    pub coverage: f64,
    /// Mean inlier distance
    pub position_error: f64,
    /// Combined confidence in [0, 1]
    pub confidence: f64,
    /// Verdict band
    pub decision: Decision,
}

impl MatchDecision {
    /// The zero-confidence verdict returned when no comparison was possible.
    pub fn different() -> Self {
        Self {
            matched: false,
            coverage: 0.0,
            position_error: 0.0,
            confidence: 0.0,
            decision: Decision::Different,
        }
    }
}

impl Default for MatchDecision {
    fn default() -> Self {
        Self::different()
    }
}

/// Progress of a single comparison.
///
/// ```text
/// Start → Normalized → Aligned ─┬──────────────────┬→ Scored → Decided
///                               └→ MirrorAligned ──┘
/// ```
///
/// A comparison that stops early ends at the last stage it completed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonStage {
    /// Nothing done yet
    Start,
    /// Fragment moved into the model frame
    Normalized,
    /// Direct alignment done
    Aligned,
    /// Reflected alignment done
    MirrorAligned,
    /// Metrics derived
    Scored,
    /// Verdict rendered
    Decided,
}

/// Why a comparison stopped early.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonFailure {
    /// The model had no usable nodes
    EmptyModel,
    /// The fragment had no usable points
    EmptyFragment,
    /// The aligner produced no transform
    AlignmentFailed(AlignmentStatus),
}

/// Full record of a comparison, for callers that render the transform.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    /// Verdict and metrics
    pub decision: MatchDecision,
    /// Winning alignment, mapping the fragment as given onto the model
    pub alignment: Option<AlignmentResult>,
    /// Stages completed, in order
    pub stages: Vec<ComparisonStage>,
    /// Set when the comparison short-circuited
    pub failure: Option<ComparisonFailure>,
}

impl ComparisonReport {
    /// A report for a comparison that stopped after `stages`.
    pub fn failed(stages: Vec<ComparisonStage>, failure: ComparisonFailure) -> Self {
        Self {
            decision: MatchDecision::different(),
            alignment: None,
            stages,
            failure: Some(failure),
        }
    }

    /// Last stage completed.
    pub fn stage(&self) -> ComparisonStage {
        self.stages.last().copied().unwrap_or(ComparisonStage::Start)
    }
}
