//! RANSAC rigid alignment between two weighted point sets.
//!
//! # Algorithm
//!
//! ```text
//! 1. Draw a pair (b1, b2) from B, biased by confidence
//! 2. Find pairs (a1, a2) in A with |a1-a2| ≈ |b1-b2|
//! 3. Each pair (both orderings) gives a rigid hypothesis B → A
//! 4. Score: greedy one-to-one nearest matching, weighted by min(cA, cB)
//! 5. Keep the best hypothesis; refine by least squares over its inliers
//! 6. Optionally repeat with B reflected (x → -x); keep the better result
//! ```
//!
//! Sampling uses a seeded [`StdRng`], so identical inputs always produce
//! identical results.

use log::{debug, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::config::AlignmentConfig;
use super::traits::PointAligner;
use super::types::{AlignmentResult, AlignmentStatus, Inlier, WeightedPoint};
use crate::core::{Point2D, RigidTransform2D};

/// Guards the relative support test against rounding (3/5 vs 0.6).
const RATIO_EPSILON: f64 = 1e-9;

/// Attempts at drawing a non-degenerate sample per iteration.
const MAX_RESAMPLES: usize = 8;

/// Sampling weight floor so zero-confidence points can still be drawn.
const MIN_SAMPLE_WEIGHT: f64 = 0.05;

/// Confidence-weighted RANSAC aligner.
#[derive(Clone, Debug)]
pub struct Aligner {
    config: AlignmentConfig,
}

/// A pair of reference points with its length, for candidate lookup.
#[derive(Clone, Copy, Debug)]
struct TargetPair {
    i: usize,
    j: usize,
    length: f64,
}

/// Score of a single hypothesis.
#[derive(Clone, Debug)]
struct Evaluation {
    transform: RigidTransform2D,
    /// Correspondences as (index into A, index into B, distance)
    inliers: Vec<Inlier>,
    score: f64,
    supported: bool,
    total_distance: f64,
}

impl Evaluation {
    /// Higher score wins; ties prefer more inliers then tighter fit.
    fn better_than(&self, other: &Evaluation) -> bool {
        if self.score != other.score {
            return self.score > other.score;
        }
        if self.inliers.len() != other.inliers.len() {
            return self.inliers.len() > other.inliers.len();
        }
        self.total_distance < other.total_distance
    }
}

/// Usable points of one input set, keeping their original indices.
struct PointSet {
    indices: Vec<usize>,
    points: Vec<Point2D>,
    confidences: Vec<f64>,
    mass: f64,
}

impl PointSet {
    fn from_weighted(input: &[WeightedPoint], mirror: bool) -> Self {
        let mut set = PointSet {
            indices: Vec::with_capacity(input.len()),
            points: Vec::with_capacity(input.len()),
            confidences: Vec::with_capacity(input.len()),
            mass: 0.0,
        };
        for (idx, wp) in input.iter().enumerate() {
            if !wp.is_usable() {
                continue;
            }
            set.indices.push(idx);
            set.points.push(if mirror {
                wp.position.mirror_x()
            } else {
                wp.position
            });
            set.confidences.push(wp.confidence);
            set.mass += wp.confidence;
        }
        set
    }

    fn len(&self) -> usize {
        self.points.len()
    }
}

impl Aligner {
    /// Create an aligner.
    ///
    /// # Panics
    ///
    /// Panics if the configuration fails validation.
    pub fn new(config: AlignmentConfig) -> Self {
        if let Err(e) = config.validate() {
            panic!("invalid alignment configuration: {e}");
        }
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &AlignmentConfig {
        &self.config
    }

    /// Align `set_b` onto `set_a`.
    ///
    /// The returned transform maps B's coordinates into A's frame. Inlier
    /// indices refer to the original input slices.
    pub fn align(
        &self,
        set_a: &[WeightedPoint],
        set_b: &[WeightedPoint],
        mirror: bool,
    ) -> AlignmentResult {
        let a = PointSet::from_weighted(set_a, false);
        let b = PointSet::from_weighted(set_b, false);

        if a.len() < 2 || b.len() < 2 {
            debug!(
                "[Align] insufficient points: |A|={} |B|={} (usable)",
                a.len(),
                b.len()
            );
            return AlignmentResult::failed(AlignmentStatus::InsufficientPoints);
        }

        let direct = self.search(&a, &b, false);
        if !mirror {
            return direct;
        }

        let reflected = PointSet::from_weighted(set_b, true);
        let mirrored = self.search(&a, &reflected, true);

        trace!(
            "[Align] direct score {:.3}, mirrored score {:.3}",
            direct.score, mirrored.score
        );

        if mirrored.score > direct.score {
            mirrored
        } else {
            direct
        }
    }

    /// Run the sampling loop for one orientation of B.
    fn search(&self, a: &PointSet, b: &PointSet, mirrored: bool) -> AlignmentResult {
        let config = &self.config;
        let mut rng = StdRng::seed_from_u64(config.seed ^ u64::from(mirrored));

        let targets = Self::target_pairs(a);
        let cumulative = Self::cumulative_weights(b);
        let min_size = a.len().min(b.len());

        let mut best: Option<Evaluation> = None;
        let mut iterations = 0;

        for _ in 0..config.max_iterations {
            iterations += 1;

            let Some((b1, b2)) = self.draw_sample(&mut rng, b, &cumulative) else {
                continue;
            };

            let sample_len = b.points[b1].distance(&b.points[b2]);
            let candidates = self.candidate_pairs(&targets, sample_len);

            for pair in candidates {
                for (a1, a2) in [(pair.i, pair.j), (pair.j, pair.i)] {
                    let Some(transform) = RigidTransform2D::from_point_pairs(
                        (b.points[b1], b.points[b2]),
                        (a.points[a1], a.points[a2]),
                        config.min_sample_separation,
                    ) else {
                        continue;
                    };

                    let evaluation = self.evaluate(transform, a, b);
                    if best.as_ref().is_none_or(|cur| evaluation.better_than(cur)) {
                        best = Some(evaluation);
                    }
                }
            }

            if let Some(cur) = &best {
                let ratio = cur.inliers.len() as f64 / min_size as f64;
                if cur.supported && ratio >= config.early_termination_ratio {
                    trace!("[Align] early termination after {iterations} iterations");
                    break;
                }
            }
        }

        let Some(best) = best else {
            debug!("[Align] no valid hypothesis in {iterations} iterations");
            let mut result = AlignmentResult::failed(AlignmentStatus::Degenerate);
            result.iterations = iterations;
            return result;
        };

        let best = self.refine(best, a, b);
        self.finish(best, a, b, mirrored, iterations)
    }

    /// All pairs of A with their lengths, sorted by length.
    fn target_pairs(a: &PointSet) -> Vec<TargetPair> {
        let n = a.len();
        let mut pairs = Vec::with_capacity(n * (n - 1) / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                pairs.push(TargetPair {
                    i,
                    j,
                    length: a.points[i].distance(&a.points[j]),
                });
            }
        }
        pairs.sort_by(|x, y| x.length.total_cmp(&y.length));
        pairs
    }

    /// Pairs of A whose length matches `length` within tolerance, closest
    /// first, capped at `max_candidates_per_sample`.
    fn candidate_pairs(&self, targets: &[TargetPair], length: f64) -> Vec<TargetPair> {
        let tol = self.config.pair_length_tolerance;
        let lo = targets.partition_point(|p| p.length < length - tol);
        let hi = targets.partition_point(|p| p.length <= length + tol);

        let mut candidates = targets[lo..hi].to_vec();
        if candidates.len() > self.config.max_candidates_per_sample {
            candidates.sort_by(|x, y| {
                (x.length - length)
                    .abs()
                    .total_cmp(&(y.length - length).abs())
            });
            candidates.truncate(self.config.max_candidates_per_sample);
        }
        candidates
    }

    fn cumulative_weights(set: &PointSet) -> Vec<f64> {
        let mut acc = 0.0;
        set.confidences
            .iter()
            .map(|c| {
                acc += c.max(MIN_SAMPLE_WEIGHT);
                acc
            })
            .collect()
    }

    fn weighted_index(rng: &mut StdRng, cumulative: &[f64]) -> usize {
        let total = cumulative.last().copied().unwrap_or(0.0);
        let target = rng.random::<f64>() * total;
        cumulative
            .partition_point(|&c| c <= target)
            .min(cumulative.len() - 1)
    }

    /// Draw two distinct, well-separated points from B.
    fn draw_sample(
        &self,
        rng: &mut StdRng,
        b: &PointSet,
        cumulative: &[f64],
    ) -> Option<(usize, usize)> {
        for _ in 0..MAX_RESAMPLES {
            let first = Self::weighted_index(rng, cumulative);
            let mut second = Self::weighted_index(rng, cumulative);
            if second == first {
                second = (first + 1 + rng.random_range(0..b.len() - 1)) % b.len();
            }

            let separation = b.points[first].distance(&b.points[second]);
            if separation >= self.config.min_sample_separation {
                return Some((first, second));
            }
        }
        None
    }

    /// Score a hypothesis by greedy one-to-one nearest matching.
    fn evaluate(&self, transform: RigidTransform2D, a: &PointSet, b: &PointSet) -> Evaluation {
        let config = &self.config;
        let threshold_sq = config.inlier_threshold * config.inlier_threshold;

        // (distance, index into A, index into B), all in local set indices
        let mut matches: Vec<(f64, usize, usize)> = Vec::new();
        for (bi, point) in b.points.iter().enumerate() {
            if b.confidences[bi] < config.confidence_threshold {
                continue;
            }
            let moved = transform.apply(*point);

            let mut nearest: Option<(f64, usize)> = None;
            for (ai, target) in a.points.iter().enumerate() {
                if a.confidences[ai] < config.confidence_threshold {
                    continue;
                }
                let d_sq = moved.distance_squared(target);
                if d_sq < threshold_sq && nearest.is_none_or(|(best, _)| d_sq < best) {
                    nearest = Some((d_sq, ai));
                }
            }
            if let Some((d_sq, ai)) = nearest {
                matches.push((d_sq.sqrt(), ai, bi));
            }
        }

        matches.sort_by(|x, y| x.0.total_cmp(&y.0));

        let mut used_a = vec![false; a.len()];
        let mut inliers = Vec::with_capacity(matches.len());
        let mut weight = 0.0;
        let mut total_distance = 0.0;
        for (distance, ai, bi) in matches {
            if used_a[ai] {
                continue;
            }
            used_a[ai] = true;
            weight += a.confidences[ai].min(b.confidences[bi]);
            total_distance += distance;
            inliers.push(Inlier {
                index_a: ai,
                index_b: bi,
                distance,
            });
        }

        let mass = a.mass.max(b.mass);
        let raw = if mass > 0.0 {
            (weight / mass).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let min_size = a.len().min(b.len()) as f64;
        let supported = inliers.len() >= config.min_inliers_absolute
            && inliers.len() as f64 / min_size + RATIO_EPSILON >= config.min_inliers_ratio;

        let score = if supported {
            raw
        } else {
            raw * config.low_support_penalty
        };

        Evaluation {
            transform,
            inliers,
            score,
            supported,
            total_distance,
        }
    }

    /// Least-squares refinement over the current inliers.
    fn refine(&self, mut best: Evaluation, a: &PointSet, b: &PointSet) -> Evaluation {
        for _ in 0..self.config.refinement_iterations {
            if best.inliers.len() < 2 {
                break;
            }

            let src: Vec<Point2D> = best.inliers.iter().map(|m| b.points[m.index_b]).collect();
            let dst: Vec<Point2D> = best.inliers.iter().map(|m| a.points[m.index_a]).collect();
            let weights: Vec<f64> = best
                .inliers
                .iter()
                .map(|m| a.confidences[m.index_a].min(b.confidences[m.index_b]))
                .collect();

            let Some(transform) = RigidTransform2D::fit_least_squares(&src, &dst, &weights)
            else {
                break;
            };

            let refined = self.evaluate(transform, a, b);
            if refined.score + RATIO_EPSILON < best.score {
                break;
            }
            let converged = refined.inliers.len() == best.inliers.len()
                && (refined.total_distance - best.total_distance).abs() < RATIO_EPSILON;
            best = refined;
            if converged {
                break;
            }
        }
        best
    }

    /// Map local indices back to the caller's and attach the mirror flag.
    fn finish(
        &self,
        best: Evaluation,
        a: &PointSet,
        b: &PointSet,
        mirrored: bool,
        iterations: usize,
    ) -> AlignmentResult {
        let status = if best.supported {
            AlignmentStatus::Aligned
        } else {
            AlignmentStatus::LowSupport
        };

        let inliers = best
            .inliers
            .iter()
            .map(|m| Inlier {
                index_a: a.indices[m.index_a],
                index_b: b.indices[m.index_b],
                distance: m.distance,
            })
            .collect();

        debug!(
            "[Align] {:?}: {} inliers, score {:.3}, rotation {:.1}°, mirrored={}",
            status,
            best.inliers.len(),
            best.score,
            best.transform.rotation.to_degrees(),
            mirrored
        );

        AlignmentResult {
            rotation: best.transform.rotation,
            translation: best.transform.translation,
            mirrored,
            inliers,
            score: best.score,
            status,
            iterations,
        }
    }
}

impl Default for Aligner {
    fn default() -> Self {
        Self::new(AlignmentConfig::default())
    }
}

impl PointAligner for Aligner {
    fn align(
        &self,
        set_a: &[WeightedPoint],
        set_b: &[WeightedPoint],
        mirror: bool,
    ) -> AlignmentResult {
        Aligner::align(self, set_a, set_b, mirror)
    }

    fn inlier_threshold(&self) -> f64 {
        self.config.inlier_threshold
    }

    fn name(&self) -> &str {
        "RANSAC"
    }
}
