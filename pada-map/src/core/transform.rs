//! 2D rigid transform with optional reflection.
//!
//! A transform maps a source point `p` to `R(θ) · M(p) + t`, where `M` is the
//! identity or, for mirrored transforms, a reflection across the Y axis
//! (`x → -x`). Reflecting across any other vertical axis differs from this
//! only by a translation, which the estimated `t` absorbs.

use serde::{Deserialize, Serialize};

use super::math::normalize_angle;
use super::point::Point2D;

/// Minimum distance between the two points of a minimal sample.
const MIN_PAIR_LENGTH: f64 = 1e-6;

/// Rotation + translation, optionally preceded by a reflection.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct RigidTransform2D {
    /// Rotation in radians, CCW positive, normalized to [-π, π).
    pub rotation: f64,
    /// Translation applied after rotation.
    pub translation: Point2D,
    /// Whether the source is reflected (x → -x) before rotating.
    pub mirrored: bool,
}

impl RigidTransform2D {
    /// Create a non-mirrored transform.
    #[inline]
    pub fn new(rotation: f64, translation: Point2D) -> Self {
        Self {
            rotation: normalize_angle(rotation),
            translation,
            mirrored: false,
        }
    }

    /// Identity transform.
    #[inline]
    pub fn identity() -> Self {
        Self::default()
    }

    /// Same transform with the reflection flag set.
    #[inline]
    pub fn with_mirror(mut self, mirrored: bool) -> Self {
        self.mirrored = mirrored;
        self
    }

    /// Rotation in degrees, for reporting.
    #[inline]
    pub fn rotation_degrees(&self) -> f64 {
        self.rotation.to_degrees()
    }

    /// Apply the transform to a point.
    #[inline]
    pub fn apply(&self, p: Point2D) -> Point2D {
        let src = if self.mirrored { p.mirror_x() } else { p };
        src.rotate(self.rotation) + self.translation
    }

    /// The transform equivalent to applying `first`, then `self`.
    pub fn compose(&self, first: &RigidTransform2D) -> RigidTransform2D {
        // A reflection flips the sense of any rotation applied before it
        let inner = if self.mirrored {
            -first.rotation
        } else {
            first.rotation
        };
        Self {
            rotation: normalize_angle(self.rotation + inner),
            translation: self.apply(first.translation),
            mirrored: self.mirrored != first.mirrored,
        }
    }

    /// Apply the transform to every point in a slice.
    pub fn apply_all(&self, points: &[Point2D]) -> Vec<Point2D> {
        let (sin, cos) = self.rotation.sin_cos();
        points
            .iter()
            .map(|p| {
                let x = if self.mirrored { -p.x } else { p.x };
                Point2D::new(
                    x * cos - p.y * sin + self.translation.x,
                    x * sin + p.y * cos + self.translation.y,
                )
            })
            .collect()
    }

    /// Closed-form rigid transform from two point pairs (`src_i → dst_i`).
    ///
    /// Rotation comes from the angle between the two pair vectors and the
    /// translation aligns the pair midpoints. Returns `None` when either
    /// pair is degenerate (points closer than `min_separation`).
    ///
    /// The source points are used as given; for mirrored hypotheses the
    /// caller reflects them first and sets the mirror flag afterwards.
    pub fn from_point_pairs(
        src: (Point2D, Point2D),
        dst: (Point2D, Point2D),
        min_separation: f64,
    ) -> Option<Self> {
        let min_len = min_separation.max(MIN_PAIR_LENGTH);

        let src_vec = src.1 - src.0;
        let dst_vec = dst.1 - dst.0;
        if src_vec.length() < min_len || dst_vec.length() < min_len {
            return None;
        }

        let theta = normalize_angle(dst_vec.angle() - src_vec.angle());

        let src_mid = (src.0 + src.1) * 0.5;
        let dst_mid = (dst.0 + dst.1) * 0.5;
        let translation = dst_mid - src_mid.rotate(theta);

        Some(Self::new(theta, translation))
    }

    /// Weighted least-squares rigid fit (2D Procrustes) mapping `src` onto `dst`.
    ///
    /// Returns `None` when the inputs are empty, mismatched, carry no weight,
    /// or are collapsed onto a single point (rotation undetermined).
    pub fn fit_least_squares(src: &[Point2D], dst: &[Point2D], weights: &[f64]) -> Option<Self> {
        if src.is_empty() || src.len() != dst.len() || src.len() != weights.len() {
            return None;
        }

        let src_c = super::math::weighted_centroid(src, weights)?;
        let dst_c = super::math::weighted_centroid(dst, weights)?;

        // Accumulate the 2x2 cross-covariance terms that determine the angle
        let mut sin_acc = 0.0;
        let mut cos_acc = 0.0;
        for ((s, d), &w) in src.iter().zip(dst).zip(weights) {
            let a = *s - src_c;
            let b = *d - dst_c;
            cos_acc += w * a.dot(&b);
            sin_acc += w * a.cross(&b);
        }

        if sin_acc.hypot(cos_acc) < MIN_PAIR_LENGTH {
            return None;
        }

        let theta = sin_acc.atan2(cos_acc);
        let translation = dst_c - src_c.rotate(theta);
        Some(Self::new(theta, translation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_points() -> Vec<Point2D> {
        vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(40.0, 5.0),
            Point2D::new(12.0, 60.0),
            Point2D::new(-30.0, 25.0),
        ]
    }

    #[test]
    fn test_identity() {
        let p = Point2D::new(3.0, -7.0);
        assert_eq!(RigidTransform2D::identity().apply(p), p);
    }

    #[test]
    fn test_mirror_then_rotate() {
        let t = RigidTransform2D::new(0.0, Point2D::new(1.0, 0.0)).with_mirror(true);
        assert_eq!(t.apply(Point2D::new(2.0, 3.0)), Point2D::new(-1.0, 3.0));
    }

    #[test]
    fn test_apply_all_matches_apply() {
        let t = RigidTransform2D::new(0.7, Point2D::new(5.0, -2.0)).with_mirror(true);
        let points = sample_points();
        for (a, b) in t.apply_all(&points).iter().zip(points.iter().map(|p| t.apply(*p))) {
            assert_relative_eq!(a.x, b.x, epsilon = 1e-9);
            assert_relative_eq!(a.y, b.y, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_compose_matches_sequential_application() {
        let first = RigidTransform2D::new(0.4, Point2D::new(3.0, -9.0));
        let second = RigidTransform2D::new(-1.1, Point2D::new(-2.0, 6.0)).with_mirror(true);
        let combined = second.compose(&first);

        assert!(combined.mirrored);
        for p in sample_points() {
            let expected = second.apply(first.apply(p));
            let actual = combined.apply(p);
            assert_relative_eq!(actual.x, expected.x, epsilon = 1e-9);
            assert_relative_eq!(actual.y, expected.y, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_from_point_pairs_recovers_transform() {
        let truth = RigidTransform2D::new(0.5, Point2D::new(12.0, -4.0));
        let src = (Point2D::new(1.0, 2.0), Point2D::new(30.0, -8.0));
        let dst = (truth.apply(src.0), truth.apply(src.1));

        let est = RigidTransform2D::from_point_pairs(src, dst, 1.0).unwrap();
        assert_relative_eq!(est.rotation, 0.5, epsilon = 1e-9);
        assert_relative_eq!(est.translation.x, 12.0, epsilon = 1e-9);
        assert_relative_eq!(est.translation.y, -4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_from_point_pairs_rejects_coincident() {
        let p = Point2D::new(1.0, 1.0);
        let q = Point2D::new(20.0, 1.0);
        assert!(RigidTransform2D::from_point_pairs((p, p), (p, q), 1.0).is_none());
        assert!(RigidTransform2D::from_point_pairs((p, q), (q, q), 1.0).is_none());
    }

    #[test]
    fn test_least_squares_exact() {
        let truth = RigidTransform2D::new(-1.2, Point2D::new(-7.0, 3.5));
        let src = sample_points();
        let dst = truth.apply_all(&src);
        let weights = vec![1.0; src.len()];

        let est = RigidTransform2D::fit_least_squares(&src, &dst, &weights).unwrap();
        assert_relative_eq!(est.rotation, -1.2, epsilon = 1e-9);
        assert_relative_eq!(est.translation.x, -7.0, epsilon = 1e-9);
        assert_relative_eq!(est.translation.y, 3.5, epsilon = 1e-9);
    }

    #[test]
    fn test_least_squares_degenerate() {
        let src = vec![Point2D::new(1.0, 1.0); 3];
        let dst = vec![Point2D::new(2.0, 2.0); 3];
        assert!(RigidTransform2D::fit_least_squares(&src, &dst, &[1.0; 3]).is_none());
        assert!(RigidTransform2D::fit_least_squares(&[], &[], &[]).is_none());
    }
}
