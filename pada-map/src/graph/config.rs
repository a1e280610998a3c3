//! Spatial graph configuration.

use serde::{Deserialize, Serialize};

use crate::config::ConfigValidationError;

/// Configuration for the accumulating spatial graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccumulatorConfig {
    /// Maximum distance from a node's current position for an observation
    /// of the same class to fuse into it.
    /// Default: 25.0
    #[serde(default = "default_fusion_radius")]
    pub fusion_radius: f64,

    /// Fraction of an incoming point's confidence used as its fusion weight
    /// and as the confidence gain of the node it fuses into.
    /// Default: 0.15
    #[serde(default = "default_boost_fraction")]
    pub boost_fraction: f64,

    /// Lower bound for node confidence. Decay never goes below it.
    /// Default: 0.1
    #[serde(default = "default_confidence_floor")]
    pub confidence_floor: f64,

    /// Maximum distance between two nodes joined by an edge.
    /// Default: 130.0
    #[serde(default = "default_edge_radius")]
    pub edge_radius: f64,

    /// Both endpoints need at least this confidence to be joined.
    /// Default: 0.45
    #[serde(default = "default_min_edge_confidence")]
    pub min_edge_confidence: f64,

    /// Confidence removed from an idle node per observation step.
    /// Default: 0.02
    #[serde(default = "default_decay_rate")]
    pub decay_rate: f64,

    /// Steps without reinforcement before a node starts to decay.
    /// Default: 3
    #[serde(default = "default_idle_steps")]
    pub idle_steps: u64,

    /// Centroid distance under which two same-class contours are merged.
    /// Default: 20.0
    #[serde(default = "default_contour_merge_distance")]
    pub contour_merge_distance: f64,
}

fn default_fusion_radius() -> f64 {
    25.0
}
fn default_boost_fraction() -> f64 {
    0.15
}
fn default_confidence_floor() -> f64 {
    0.1
}
fn default_edge_radius() -> f64 {
    130.0
}
fn default_min_edge_confidence() -> f64 {
    0.45
}
fn default_decay_rate() -> f64 {
    0.02
}
fn default_idle_steps() -> u64 {
    3
}
fn default_contour_merge_distance() -> f64 {
    20.0
}

impl Default for AccumulatorConfig {
    fn default() -> Self {
        Self {
            fusion_radius: default_fusion_radius(),
            boost_fraction: default_boost_fraction(),
            confidence_floor: default_confidence_floor(),
            edge_radius: default_edge_radius(),
            min_edge_confidence: default_min_edge_confidence(),
            decay_rate: default_decay_rate(),
            idle_steps: default_idle_steps(),
            contour_merge_distance: default_contour_merge_distance(),
        }
    }
}

impl AccumulatorConfig {
    /// Builder-style setter for the fusion radius.
    pub fn with_fusion_radius(mut self, radius: f64) -> Self {
        self.fusion_radius = radius;
        self
    }

    /// Builder-style setter for the boost fraction.
    pub fn with_boost_fraction(mut self, fraction: f64) -> Self {
        self.boost_fraction = fraction;
        self
    }

    /// Builder-style setter for the edge radius.
    pub fn with_edge_radius(mut self, radius: f64) -> Self {
        self.edge_radius = radius;
        self
    }

    /// Builder-style setter for the decay parameters.
    pub fn with_decay(mut self, rate: f64, idle_steps: u64) -> Self {
        self.decay_rate = rate;
        self.idle_steps = idle_steps;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let positive = [
            ("graph.fusion_radius", self.fusion_radius),
            ("graph.edge_radius", self.edge_radius),
            ("graph.contour_merge_distance", self.contour_merge_distance),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigValidationError::invalid(format!(
                    "{name} must be > 0 (got {value})"
                )));
            }
        }

        if !(self.boost_fraction > 0.0 && self.boost_fraction <= 1.0) {
            return Err(ConfigValidationError::invalid(
                "graph.boost_fraction must be in (0, 1]",
            ));
        }

        if !(self.confidence_floor > 0.0 && self.confidence_floor < 1.0) {
            return Err(ConfigValidationError::invalid(
                "graph.confidence_floor must be in (0, 1)",
            ));
        }

        if !(0.0..=1.0).contains(&self.min_edge_confidence) {
            return Err(ConfigValidationError::invalid(
                "graph.min_edge_confidence must be in [0, 1]",
            ));
        }

        if !self.decay_rate.is_finite() || self.decay_rate < 0.0 {
            return Err(ConfigValidationError::invalid(
                "graph.decay_rate must be >= 0",
            ));
        }

        Ok(())
    }
}
