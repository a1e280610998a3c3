//! Decision thresholds for pattern comparison.

use serde::{Deserialize, Serialize};

use crate::config::ConfigValidationError;
use crate::features::ClassTag;

/// Thresholds that turn alignment metrics into a decision.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchThresholds {
    /// Minimum inlier count for a match.
    /// Default: 5
    #[serde(default = "default_min_nodes_for_match")]
    pub min_nodes_for_match: usize,

    /// Minimum confidence for a match.
    /// Default: 0.7
    #[serde(default = "default_match_threshold")]
    pub match_threshold: f64,

    /// Minimum fraction of model nodes matched.
    /// Default: 0.3
    #[serde(default = "default_min_coverage")]
    pub min_coverage: f64,

    /// Minimum confidence for a "similar" verdict.
    /// Default: 0.45
    #[serde(default = "default_similar_threshold")]
    pub similar_threshold: f64,
}

fn default_min_nodes_for_match() -> usize {
    5
}
fn default_match_threshold() -> f64 {
    0.7
}
fn default_min_coverage() -> f64 {
    0.3
}
fn default_similar_threshold() -> f64 {
    0.45
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self {
            min_nodes_for_match: default_min_nodes_for_match(),
            match_threshold: default_match_threshold(),
            min_coverage: default_min_coverage(),
            similar_threshold: default_similar_threshold(),
        }
    }
}

impl MatchThresholds {
    /// Looser thresholds for quick field checks.
    pub fn quick() -> Self {
        Self {
            min_nodes_for_match: 3,
            match_threshold: 0.6,
            min_coverage: 0.2,
            ..Self::default()
        }
    }

    /// Validate the thresholds.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let unit = [
            ("match_threshold", self.match_threshold),
            ("min_coverage", self.min_coverage),
            ("similar_threshold", self.similar_threshold),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigValidationError::invalid(format!(
                    "similarity.{name} must be in [0, 1] (got {value})"
                )));
            }
        }
        if self.similar_threshold > self.match_threshold {
            return Err(ConfigValidationError::invalid(
                "similarity.similar_threshold must not exceed match_threshold",
            ));
        }
        Ok(())
    }
}

/// Configuration for the similarity engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimilarityConfig {
    /// Thresholds for full comparisons.
    #[serde(default)]
    pub thresholds: MatchThresholds,

    /// Thresholds for `quick_check`.
    #[serde(default = "MatchThresholds::quick")]
    pub quick: MatchThresholds,

    /// Minimum node confidence when taking a consensus for comparison.
    /// Default: 0.5
    #[serde(default = "default_consensus_threshold")]
    pub consensus_threshold: f64,

    /// Also try reflected alignments.
    /// Default: true
    #[serde(default = "default_true")]
    pub allow_mirroring: bool,

    /// Rotate fragments onto the model's principal axis before aligning.
    /// Default: false
    #[serde(default)]
    pub normalize_orientation: bool,

    /// Class whose points are compared; `None` compares all classes.
    /// Default: protector
    #[serde(default = "default_match_class")]
    pub match_class: Option<ClassTag>,
}

fn default_consensus_threshold() -> f64 {
    0.5
}
fn default_true() -> bool {
    true
}
fn default_match_class() -> Option<ClassTag> {
    Some(ClassTag::Protector)
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            thresholds: MatchThresholds::default(),
            quick: MatchThresholds::quick(),
            consensus_threshold: default_consensus_threshold(),
            allow_mirroring: true,
            normalize_orientation: false,
            match_class: default_match_class(),
        }
    }
}

impl SimilarityConfig {
    /// Builder-style setter for mirroring.
    pub fn with_mirroring(mut self, allow: bool) -> Self {
        self.allow_mirroring = allow;
        self
    }

    /// Builder-style setter for orientation normalization.
    pub fn with_orientation_normalization(mut self, enabled: bool) -> Self {
        self.normalize_orientation = enabled;
        self
    }

    /// Builder-style setter for the compared class.
    pub fn with_match_class(mut self, class: Option<ClassTag>) -> Self {
        self.match_class = class;
        self
    }

    /// Builder-style setter for the full-comparison thresholds.
    pub fn with_thresholds(mut self, thresholds: MatchThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.thresholds.validate()?;
        self.quick.validate()?;
        if !(0.0..=1.0).contains(&self.consensus_threshold) {
            return Err(ConfigValidationError::invalid(format!(
                "similarity.consensus_threshold must be in [0, 1] (got {})",
                self.consensus_threshold
            )));
        }
        if self.match_class.is_some_and(|c| !c.is_known()) {
            return Err(ConfigValidationError::invalid(
                "similarity.match_class must be a known class",
            ));
        }
        Ok(())
    }
}
