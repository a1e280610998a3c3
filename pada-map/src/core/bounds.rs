//! Axis-aligned bounding box.
//!
//! Used for polygon extents in feature extraction and for sizing synthetic
//! patterns in tests.
//!
//! ```rust
//! use pada_map::core::{BoundingBox, Point2D};
//!
//! let bbox = BoundingBox::from_points(&[
//!     Point2D::new(0.0, 0.0),
//!     Point2D::new(10.0, 8.0),
//! ])
//! .unwrap();
//! assert_eq!(bbox.width(), 10.0);
//! assert_eq!(bbox.height(), 8.0);
//! ```

use serde::{Deserialize, Serialize};

use super::point::Point2D;

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum corner.
    pub min: Point2D,
    /// Maximum corner.
    pub max: Point2D,
}

impl BoundingBox {
    /// Create a bounding box from its corners.
    #[inline]
    pub const fn new(min: Point2D, max: Point2D) -> Self {
        Self { min, max }
    }

    /// Tight bounds around a point set. `None` for an empty set.
    pub fn from_points(points: &[Point2D]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bbox = Self::new(*first, *first);
        for p in rest {
            bbox.expand_to_include(*p);
        }
        Some(bbox)
    }

    /// Grow the box to contain `point`.
    #[inline]
    pub fn expand_to_include(&mut self, point: Point2D) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let mut out = *self;
        out.expand_to_include(other.min);
        out.expand_to_include(other.max);
        out
    }

    /// Width (x extent).
    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Height (y extent).
    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Center point.
    #[inline]
    pub fn center(&self) -> Point2D {
        Point2D::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
        )
    }

    /// Length of the diagonal.
    #[inline]
    pub fn diagonal(&self) -> f64 {
        self.min.distance(&self.max)
    }

    /// Whether `point` lies inside or on the boundary.
    #[inline]
    pub fn contains(&self, point: Point2D) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }
}
