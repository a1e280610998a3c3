//! Typed observation records.

use serde::{Deserialize, Serialize};

use crate::core::Point2D;

/// Semantic class of a detected sole feature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassTag {
    /// Individual protector (tread) element
    Protector,
    /// Overall sole outline
    Outline,
    /// Heel region
    Heel,
    /// Toe region
    Toe,
    /// Any label the detector emits that this crate does not model
    Unknown,
}

impl ClassTag {
    /// All modelled classes, in stable order.
    pub const KNOWN: [ClassTag; 4] = [
        ClassTag::Protector,
        ClassTag::Outline,
        ClassTag::Heel,
        ClassTag::Toe,
    ];

    /// Parse a detector label. Unrecognised labels map to [`ClassTag::Unknown`].
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "protector" | "protectors" => ClassTag::Protector,
            "outline" | "sole" => ClassTag::Outline,
            "heel" => ClassTag::Heel,
            "toe" => ClassTag::Toe,
            _ => ClassTag::Unknown,
        }
    }

    /// Whether this class is one the model stores.
    #[inline]
    pub fn is_known(&self) -> bool {
        !matches!(self, ClassTag::Unknown)
    }

    /// Label used in logs and exports.
    pub fn name(&self) -> &'static str {
        match self {
            ClassTag::Protector => "protector",
            ClassTag::Outline => "outline",
            ClassTag::Heel => "heel",
            ClassTag::Toe => "toe",
            ClassTag::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ClassTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One detector prediction: a labelled polygon with a score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Raw class label as emitted by the detector
    pub class: String,
    /// Detector confidence in [0, 1]
    pub confidence: f64,
    /// Polygon vertices
    pub points: Vec<Point2D>,
}

impl Prediction {
    /// Create a prediction.
    pub fn new(class: impl Into<String>, confidence: f64, points: Vec<Point2D>) -> Self {
        Self {
            class: class.into(),
            confidence,
            points,
        }
    }

    /// Parsed class tag.
    pub fn class_tag(&self) -> ClassTag {
        ClassTag::parse(&self.class)
    }
}

/// A single point feature observed in one photograph.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointObservation {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Detector confidence in [0, 1]
    pub confidence: f64,
    /// Semantic class
    pub class: ClassTag,
}

impl PointObservation {
    /// Create an observation.
    #[inline]
    pub fn new(x: f64, y: f64, confidence: f64, class: ClassTag) -> Self {
        Self {
            x,
            y,
            confidence,
            class,
        }
    }

    /// Position as a point.
    #[inline]
    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    /// Finite coordinates, confidence in [0, 1] and a known class.
    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.confidence.is_finite()
            && (0.0..=1.0).contains(&self.confidence)
            && self.class.is_known()
    }
}

/// A validated polygon observed in one photograph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContourObservation {
    /// Semantic class
    pub class: ClassTag,
    /// Polygon vertices (at least three)
    pub polygon: Vec<Point2D>,
    /// Detector confidence in [0, 1]
    pub confidence: f64,
}
