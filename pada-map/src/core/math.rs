//! Angle and point-set statistics.
//!
//! All angles are in radians.

use std::f64::consts::PI;

use super::point::Point2D;

/// Two times PI (full circle in radians).
pub const TWO_PI: f64 = 2.0 * PI;

/// Variance below which a point set is treated as having no orientation.
const DEGENERATE_VARIANCE: f64 = 1e-9;

/// Normalize angle to [-π, π).
///
/// # Example
/// ```
/// use pada_map::core::normalize_angle;
/// use std::f64::consts::PI;
///
/// assert!((normalize_angle(PI / 2.0) - PI / 2.0).abs() < 1e-12);
/// assert!((normalize_angle(2.5 * PI) - PI / 2.0).abs() < 1e-12);
/// ```
#[inline]
pub fn normalize_angle(angle: f64) -> f64 {
    let mut a = angle % TWO_PI;
    if a >= PI {
        a -= TWO_PI;
    } else if a < -PI {
        a += TWO_PI;
    }
    a
}

/// Shortest signed angular difference from `from` to `to`, in [-π, π).
#[inline]
pub fn angle_diff(from: f64, to: f64) -> f64 {
    normalize_angle(to - from)
}

/// Centroid (vertex mean) of a point set. `None` when empty.
///
/// # Example
/// ```
/// use pada_map::core::{Point2D, centroid};
///
/// let c = centroid(&[Point2D::new(0.0, 0.0), Point2D::new(2.0, 0.0), Point2D::new(1.0, 3.0)]).unwrap();
/// assert!((c.x - 1.0).abs() < 1e-12);
/// assert!((c.y - 1.0).abs() < 1e-12);
/// ```
pub fn centroid(points: &[Point2D]) -> Option<Point2D> {
    if points.is_empty() {
        return None;
    }

    let n = points.len() as f64;
    let (sum_x, sum_y) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));

    Some(Point2D::new(sum_x / n, sum_y / n))
}

/// Weighted centroid. `None` when empty or when the weights sum to zero.
pub fn weighted_centroid(points: &[Point2D], weights: &[f64]) -> Option<Point2D> {
    debug_assert_eq!(points.len(), weights.len());

    let mut sum_w = 0.0;
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    for (p, &w) in points.iter().zip(weights) {
        sum_w += w;
        sum_x += w * p.x;
        sum_y += w * p.y;
    }

    if sum_w <= f64::EPSILON {
        return None;
    }
    Some(Point2D::new(sum_x / sum_w, sum_y / sum_w))
}

/// Covariance matrix elements for a 2D point set.
///
/// ```text
/// | cxx  cxy |
/// | cxy  cyy |
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Covariance2D {
    /// Mean of (x - cx)^2
    pub cxx: f64,
    /// Mean of (y - cy)^2
    pub cyy: f64,
    /// Mean of (x - cx)(y - cy)
    pub cxy: f64,
}

impl Covariance2D {
    /// Compute covariance around a pre-computed centroid.
    pub fn compute(points: &[Point2D], center: Point2D) -> Self {
        if points.is_empty() {
            return Self::default();
        }

        let mut cov = Self::default();
        for p in points {
            let dx = p.x - center.x;
            let dy = p.y - center.y;
            cov.cxx += dx * dx;
            cov.cyy += dy * dy;
            cov.cxy += dx * dy;
        }

        let n = points.len() as f64;
        cov.cxx /= n;
        cov.cyy /= n;
        cov.cxy /= n;
        cov
    }

    /// Angle of the major principal axis, or `None` for zero-variance or
    /// isotropic spreads where no axis is preferred.
    pub fn major_axis_angle(&self) -> Option<f64> {
        let spread = self.cxx + self.cyy;
        let anisotropy = (self.cxx - self.cyy).hypot(2.0 * self.cxy);
        if spread < DEGENERATE_VARIANCE || anisotropy < DEGENERATE_VARIANCE * spread.max(1.0) {
            return None;
        }
        Some(0.5 * (2.0 * self.cxy).atan2(self.cxx - self.cyy))
    }
}

/// PCA orientation of a point set in radians, in (-π/2, π/2].
///
/// Falls back to `0.0` for empty, coincident or isotropic sets.
///
/// # Example
/// ```
/// use pada_map::core::{Point2D, principal_orientation};
///
/// let diagonal = [Point2D::new(0.0, 0.0), Point2D::new(1.0, 1.0), Point2D::new(2.0, 2.0)];
/// let angle = principal_orientation(&diagonal);
/// assert!((angle - std::f64::consts::FRAC_PI_4).abs() < 1e-9);
/// ```
pub fn principal_orientation(points: &[Point2D]) -> f64 {
    let Some(center) = centroid(points) else {
        return 0.0;
    };
    Covariance2D::compute(points, center)
        .major_axis_angle()
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_normalize_angle_wraps() {
        assert_relative_eq!(normalize_angle(3.0 * FRAC_PI_2), -FRAC_PI_2, epsilon = 1e-12);
        assert_relative_eq!(normalize_angle(-3.0 * FRAC_PI_2), FRAC_PI_2, epsilon = 1e-12);
        assert_relative_eq!(normalize_angle(0.25), 0.25);
    }

    #[test]
    fn test_angle_diff_crosses_boundary() {
        let diff = angle_diff(-0.9 * PI, 0.9 * PI);
        assert_relative_eq!(diff, -0.2 * PI, epsilon = 1e-9);
    }

    #[test]
    fn test_centroid_empty() {
        assert!(centroid(&[]).is_none());
    }

    #[test]
    fn test_weighted_centroid() {
        let points = [Point2D::new(0.0, 0.0), Point2D::new(10.0, 0.0)];
        let c = weighted_centroid(&points, &[1.0, 3.0]).unwrap();
        assert_relative_eq!(c.x, 7.5);
        assert!(weighted_centroid(&points, &[0.0, 0.0]).is_none());
    }

    #[test]
    fn test_orientation_horizontal() {
        let points = [
            Point2D::new(0.0, 0.0),
            Point2D::new(5.0, 0.1),
            Point2D::new(10.0, -0.1),
        ];
        assert!(principal_orientation(&points).abs() < 0.05);
    }

    #[test]
    fn test_orientation_vertical() {
        let points = [
            Point2D::new(0.0, 0.0),
            Point2D::new(0.0, 5.0),
            Point2D::new(0.0, 10.0),
        ];
        assert_relative_eq!(principal_orientation(&points).abs(), FRAC_PI_2, epsilon = 1e-9);
    }

    #[test]
    fn test_orientation_degenerate_falls_back_to_zero() {
        let same = [Point2D::new(4.0, 4.0); 5];
        assert_eq!(principal_orientation(&same), 0.0);

        // Square corners: isotropic spread
        let square = [
            Point2D::new(0.0, 0.0),
            Point2D::new(1.0, 0.0),
            Point2D::new(1.0, 1.0),
            Point2D::new(0.0, 1.0),
        ];
        assert_eq!(principal_orientation(&square), 0.0);
        assert_eq!(principal_orientation(&[]), 0.0);
    }
}
