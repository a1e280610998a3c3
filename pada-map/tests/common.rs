//! Synthetic pattern generators shared by the integration tests.
//!
//! All randomness comes from seeded `StdRng`s so failures reproduce.

#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use pada_map::core::{Point2D, RigidTransform2D};
use pada_map::features::{ClassTag, ExtractedFeatures, FeatureExtractor, PointObservation, Prediction};
use pada_map::matching::WeightedPoint;

/// Seeded generator.
pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// `n` points in `[0, extent)²`, pairwise at least `min_spacing` apart.
pub fn spaced_cluster(rng: &mut StdRng, n: usize, min_spacing: f64, extent: f64) -> Vec<Point2D> {
    let mut points: Vec<Point2D> = Vec::with_capacity(n);
    while points.len() < n {
        let candidate = Point2D::new(rng.random_range(0.0..extent), rng.random_range(0.0..extent));
        if points.iter().all(|p| p.distance(&candidate) >= min_spacing) {
            points.push(candidate);
        }
    }
    points
}

/// Uniformly random points in `[0, extent)²`.
pub fn uniform_points(rng: &mut StdRng, n: usize, extent: f64) -> Vec<Point2D> {
    (0..n)
        .map(|_| Point2D::new(rng.random_range(0.0..extent), rng.random_range(0.0..extent)))
        .collect()
}

/// Shift every point by up to `±jitter` on each axis.
pub fn jitter(rng: &mut StdRng, points: &[Point2D], jitter: f64) -> Vec<Point2D> {
    points
        .iter()
        .map(|p| {
            *p + Point2D::new(
                rng.random_range(-jitter..=jitter),
                rng.random_range(-jitter..=jitter),
            )
        })
        .collect()
}

/// Points with one shared confidence.
pub fn weighted(points: &[Point2D], confidence: f64) -> Vec<WeightedPoint> {
    points
        .iter()
        .map(|p| WeightedPoint::new(*p, confidence))
        .collect()
}

/// Points with confidences drawn from `low..high`.
pub fn weighted_random(rng: &mut StdRng, points: &[Point2D], low: f64, high: f64) -> Vec<WeightedPoint> {
    points
        .iter()
        .map(|p| WeightedPoint::new(*p, rng.random_range(low..high)))
        .collect()
}

/// Protector observations at the given points.
pub fn protectors(points: &[Point2D], confidences: &[f64]) -> Vec<PointObservation> {
    points
        .iter()
        .zip(confidences)
        .map(|(p, &c)| PointObservation::new(p.x, p.y, c, ClassTag::Protector))
        .collect()
}

/// A 10×10 square polygon centred on `center`.
pub fn square(center: Point2D) -> Vec<Point2D> {
    [(-5.0, -5.0), (5.0, -5.0), (5.0, 5.0), (-5.0, 5.0)]
        .iter()
        .map(|&(dx, dy)| center + Point2D::new(dx, dy))
        .collect()
}

/// Detector predictions for protectors at the given centres.
pub fn protector_predictions(centers: &[Point2D], confidences: &[f64]) -> Vec<Prediction> {
    centers
        .iter()
        .zip(confidences)
        .map(|(c, &conf)| Prediction::new("protector", conf, square(*c)))
        .collect()
}

/// Features as the extractor would produce them for one photograph.
pub fn features(centers: &[Point2D], confidence: f64) -> ExtractedFeatures {
    let confidences = vec![confidence; centers.len()];
    FeatureExtractor::default().extract(&protector_predictions(centers, &confidences))
}

/// Apply a rigid transform to every point.
pub fn transformed(points: &[Point2D], transform: RigidTransform2D) -> Vec<Point2D> {
    transform.apply_all(points)
}
