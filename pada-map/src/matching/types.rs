//! Alignment input and result types.

use serde::{Deserialize, Serialize};

use crate::core::{Point2D, RigidTransform2D};
use crate::features::PointObservation;

/// A point with a confidence weight.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeightedPoint {
    /// Position
    pub position: Point2D,
    /// Confidence in [0, 1]
    pub confidence: f64,
}

impl WeightedPoint {
    /// Create a weighted point.
    #[inline]
    pub fn new(position: Point2D, confidence: f64) -> Self {
        Self {
            position,
            confidence,
        }
    }

    /// Finite position and confidence in [0, 1].
    #[inline]
    pub fn is_usable(&self) -> bool {
        self.position.is_finite() && (0.0..=1.0).contains(&self.confidence)
    }
}

impl From<&PointObservation> for WeightedPoint {
    fn from(obs: &PointObservation) -> Self {
        WeightedPoint::new(obs.position(), obs.confidence)
    }
}

/// A correspondence between `set_a[index_a]` and the transformed
/// `set_b[index_b]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Inlier {
    /// Index into the reference set
    pub index_a: usize,
    /// Index into the moving set
    pub index_b: usize,
    /// Post-transform distance
    pub distance: f64,
}

/// Outcome classification of an alignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentStatus {
    /// Supported alignment found
    Aligned,
    /// Best alignment fell short of the support requirements; score penalised
    LowSupport,
    /// Fewer than two usable points in either set
    InsufficientPoints,
    /// Every sample was degenerate; no transform could be hypothesised
    Degenerate,
}

impl AlignmentStatus {
    /// Whether a transform was estimated at all.
    pub fn has_transform(&self) -> bool {
        matches!(self, AlignmentStatus::Aligned | AlignmentStatus::LowSupport)
    }
}

/// Result of aligning a moving set B onto a reference set A.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlignmentResult {
    /// Rotation in radians
    pub rotation: f64,
    /// Translation applied after rotation
    pub translation: Point2D,
    /// Whether B was reflected (x → -x) before rotating
    pub mirrored: bool,
    /// One-to-one correspondences under the transform
    pub inliers: Vec<Inlier>,
    /// Confidence-weighted support in [0, 1]
    pub score: f64,
    /// Outcome classification
    pub status: AlignmentStatus,
    /// Minimal samples drawn
    pub iterations: usize,
}

impl AlignmentResult {
    /// A zero-score result carrying no transform.
    pub fn failed(status: AlignmentStatus) -> Self {
        Self {
            rotation: 0.0,
            translation: Point2D::ZERO,
            mirrored: false,
            inliers: Vec::new(),
            score: 0.0,
            status,
            iterations: 0,
        }
    }

    /// The estimated transform (B → A).
    pub fn transform(&self) -> RigidTransform2D {
        RigidTransform2D::new(self.rotation, self.translation).with_mirror(self.mirrored)
    }

    /// Rotation in degrees, for reporting.
    pub fn rotation_degrees(&self) -> f64 {
        self.rotation.to_degrees()
    }

    /// Number of inliers.
    pub fn inlier_count(&self) -> usize {
        self.inliers.len()
    }

    /// Mean inlier distance, 0 when there are none.
    pub fn mean_inlier_distance(&self) -> f64 {
        if self.inliers.is_empty() {
            return 0.0;
        }
        self.inliers.iter().map(|i| i.distance).sum::<f64>() / self.inliers.len() as f64
    }

    /// Whether the alignment met the support requirements.
    pub fn is_aligned(&self) -> bool {
        self.status == AlignmentStatus::Aligned
    }
}

impl Default for AlignmentResult {
    fn default() -> Self {
        Self::failed(AlignmentStatus::InsufficientPoints)
    }
}
