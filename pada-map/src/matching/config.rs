//! Alignment engine configuration.

use serde::{Deserialize, Serialize};

use crate::config::ConfigValidationError;

/// Configuration for RANSAC rigid alignment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlignmentConfig {
    /// Number of minimal samples drawn from the moving set.
    /// Default: 100
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Maximum post-transform distance for a correspondence to count.
    /// Default: 20.0
    #[serde(default = "default_inlier_threshold")]
    pub inlier_threshold: f64,

    /// Both points of an inlier need at least this confidence.
    /// Default: 0.3
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,

    /// Minimum inliers / min(|A|, |B|) for a supported alignment.
    /// Default: 0.6
    #[serde(default = "default_min_inliers_ratio")]
    pub min_inliers_ratio: f64,

    /// Minimum absolute inlier count for a supported alignment.
    /// Default: 3
    #[serde(default = "default_min_inliers_absolute")]
    pub min_inliers_absolute: usize,

    /// Multiplier applied to the score of unsupported alignments.
    /// Default: 0.1
    #[serde(default = "default_low_support_penalty")]
    pub low_support_penalty: f64,

    /// Maximum length difference between a sampled pair and a target pair
    /// for the two to be hypothesised as corresponding.
    /// Default: 20.0
    #[serde(default = "default_pair_length_tolerance")]
    pub pair_length_tolerance: f64,

    /// Sampled pairs shorter than this are degenerate and resampled.
    /// Default: 5.0
    #[serde(default = "default_min_sample_separation")]
    pub min_sample_separation: f64,

    /// Upper bound on target pairs tried per sample.
    /// Default: 64
    #[serde(default = "default_max_candidates_per_sample")]
    pub max_candidates_per_sample: usize,

    /// Stop sampling once this support ratio is reached.
    /// Default: 0.95
    #[serde(default = "default_early_termination_ratio")]
    pub early_termination_ratio: f64,

    /// Least-squares refinement rounds over the inliers.
    /// Default: 3
    #[serde(default = "default_refinement_iterations")]
    pub refinement_iterations: usize,

    /// Sampling seed. Identical inputs give identical results.
    /// Default: 42
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_max_iterations() -> usize {
    100
}
fn default_inlier_threshold() -> f64 {
    20.0
}
fn default_confidence_threshold() -> f64 {
    0.3
}
fn default_min_inliers_ratio() -> f64 {
    0.6
}
fn default_min_inliers_absolute() -> usize {
    3
}
fn default_low_support_penalty() -> f64 {
    0.1
}
fn default_pair_length_tolerance() -> f64 {
    20.0
}
fn default_min_sample_separation() -> f64 {
    5.0
}
fn default_max_candidates_per_sample() -> usize {
    64
}
fn default_early_termination_ratio() -> f64 {
    0.95
}
fn default_refinement_iterations() -> usize {
    3
}
fn default_seed() -> u64 {
    42
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            inlier_threshold: default_inlier_threshold(),
            confidence_threshold: default_confidence_threshold(),
            min_inliers_ratio: default_min_inliers_ratio(),
            min_inliers_absolute: default_min_inliers_absolute(),
            low_support_penalty: default_low_support_penalty(),
            pair_length_tolerance: default_pair_length_tolerance(),
            min_sample_separation: default_min_sample_separation(),
            max_candidates_per_sample: default_max_candidates_per_sample(),
            early_termination_ratio: default_early_termination_ratio(),
            refinement_iterations: default_refinement_iterations(),
            seed: default_seed(),
        }
    }
}

impl AlignmentConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter for maximum iterations.
    pub fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations;
        self
    }

    /// Builder-style setter for the inlier threshold.
    pub fn with_inlier_threshold(mut self, threshold: f64) -> Self {
        self.inlier_threshold = threshold;
        self
    }

    /// Builder-style setter for the confidence threshold.
    pub fn with_confidence_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// Builder-style setter for the support requirements.
    pub fn with_min_inliers(mut self, ratio: f64, absolute: usize) -> Self {
        self.min_inliers_ratio = ratio;
        self.min_inliers_absolute = absolute;
        self
    }

    /// Builder-style setter for the sampling seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.max_iterations == 0 {
            return Err(ConfigValidationError::invalid(
                "alignment.max_iterations must be > 0",
            ));
        }

        let positive = [
            ("alignment.inlier_threshold", self.inlier_threshold),
            ("alignment.pair_length_tolerance", self.pair_length_tolerance),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigValidationError::invalid(format!(
                    "{name} must be > 0 (got {value})"
                )));
            }
        }

        if !self.min_sample_separation.is_finite() || self.min_sample_separation < 0.0 {
            return Err(ConfigValidationError::invalid(
                "alignment.min_sample_separation must be >= 0",
            ));
        }

        let unit = [
            ("alignment.confidence_threshold", self.confidence_threshold),
            ("alignment.min_inliers_ratio", self.min_inliers_ratio),
            ("alignment.low_support_penalty", self.low_support_penalty),
            ("alignment.early_termination_ratio", self.early_termination_ratio),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigValidationError::invalid(format!(
                    "{name} must be in [0, 1] (got {value})"
                )));
            }
        }

        if self.max_candidates_per_sample == 0 {
            return Err(ConfigValidationError::invalid(
                "alignment.max_candidates_per_sample must be > 0",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = AlignmentConfig::default();
        assert_eq!(config.max_iterations, 100);
        assert_eq!(config.min_inliers_absolute, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_negative_threshold_rejected() {
        assert!(
            AlignmentConfig::default()
                .with_inlier_threshold(-5.0)
                .validate()
                .is_err()
        );
        assert!(
            AlignmentConfig::default()
                .with_confidence_threshold(1.5)
                .validate()
                .is_err()
        );
        assert!(
            AlignmentConfig::default()
                .with_max_iterations(0)
                .validate()
                .is_err()
        );
    }
}
