//! Comparison of fragments and models.

use log::debug;

use crate::core::{Point2D, RigidTransform2D, angle_diff, centroid, principal_orientation};
use crate::features::ExtractedFeatures;
use crate::graph::ConsensusView;
use crate::matching::{AlignmentConfig, AlignmentResult, Aligner, PointAligner, WeightedPoint};

use super::config::{MatchThresholds, SimilarityConfig};
use super::types::{ComparisonFailure, ComparisonReport, ComparisonStage, Decision, MatchDecision};

/// Weight of coverage in the combined confidence.
const COVERAGE_WEIGHT: f64 = 0.7;
/// Weight of positional accuracy in the combined confidence.
const ACCURACY_WEIGHT: f64 = 0.3;

/// Decides whether a fragment or a second model shows the same pattern as
/// a reference model.
///
/// Every comparison yields a decision; missing or degenerate input becomes
/// a zero-confidence [`Decision::Different`].
///
/// Generic over the [`PointAligner`]; the RANSAC [`Aligner`] is the default.
#[derive(Clone, Debug)]
pub struct SimilarityEngine<A: PointAligner = Aligner> {
    config: SimilarityConfig,
    aligner: A,
}

impl SimilarityEngine {
    /// Create an engine backed by the RANSAC aligner.
    ///
    /// # Panics
    ///
    /// Panics if either configuration fails validation.
    pub fn new(config: SimilarityConfig, alignment: AlignmentConfig) -> Self {
        Self::with_aligner(config, Aligner::new(alignment))
    }
}

impl<A: PointAligner> SimilarityEngine<A> {
    /// Create an engine around any aligner.
    ///
    /// # Panics
    ///
    /// Panics if the configuration fails validation.
    pub fn with_aligner(config: SimilarityConfig, aligner: A) -> Self {
        if let Err(e) = config.validate() {
            panic!("invalid similarity configuration: {e}");
        }
        Self { config, aligner }
    }

    /// Get the configuration.
    pub fn config(&self) -> &SimilarityConfig {
        &self.config
    }

    /// Get the underlying aligner.
    pub fn aligner(&self) -> &A {
        &self.aligner
    }

    /// Compare one observation against a model.
    pub fn compare_with_model(
        &self,
        model: &ConsensusView,
        fragment: &ExtractedFeatures,
    ) -> MatchDecision {
        self.compare_with_model_detailed(model, fragment).decision
    }

    /// Compare one observation against a model, keeping the alignment.
    pub fn compare_with_model_detailed(
        &self,
        model: &ConsensusView,
        fragment: &ExtractedFeatures,
    ) -> ComparisonReport {
        let model_points = model.weighted_points(self.config.match_class);
        let fragment_points = self.fragment_points(fragment);
        let coverage_base = model_points.len();
        self.run(
            &model_points,
            &fragment_points,
            &self.config.thresholds,
            coverage_base,
        )
    }

    /// Compare with the looser quick-check thresholds.
    pub fn quick_check(&self, model: &ConsensusView, fragment: &ExtractedFeatures) -> MatchDecision {
        let model_points = model.weighted_points(self.config.match_class);
        let fragment_points = self.fragment_points(fragment);
        let coverage_base = model_points.len();
        self.run(
            &model_points,
            &fragment_points,
            &self.config.quick,
            coverage_base,
        )
        .decision
    }

    /// Compare two accumulated models.
    pub fn compare_models(&self, a: &ConsensusView, b: &ConsensusView) -> MatchDecision {
        self.compare_models_detailed(a, b).decision
    }

    /// Compare two accumulated models, keeping the alignment.
    ///
    /// Coverage is normalised by the larger model, so a small model that
    /// fits inside a large one is not reported as the same pattern.
    pub fn compare_models_detailed(&self, a: &ConsensusView, b: &ConsensusView) -> ComparisonReport {
        let points_a = a.weighted_points(self.config.match_class);
        let points_b = b.weighted_points(self.config.match_class);
        let coverage_base = points_a.len().max(points_b.len());
        self.run(&points_a, &points_b, &self.config.thresholds, coverage_base)
    }

    fn fragment_points(&self, fragment: &ExtractedFeatures) -> Vec<WeightedPoint> {
        match self.config.match_class {
            Some(class) => fragment
                .points_of(class)
                .iter()
                .map(WeightedPoint::from)
                .collect(),
            None => fragment.points().iter().map(WeightedPoint::from).collect(),
        }
    }

    /// One pass through the comparison stages.
    fn run(
        &self,
        model: &[WeightedPoint],
        fragment: &[WeightedPoint],
        thresholds: &MatchThresholds,
        coverage_base: usize,
    ) -> ComparisonReport {
        let mut stages = vec![ComparisonStage::Start];

        let Some(normalization) = self.normalization(model, fragment) else {
            let failure = if model.iter().any(WeightedPoint::is_usable) {
                ComparisonFailure::EmptyFragment
            } else {
                ComparisonFailure::EmptyModel
            };
            debug!("[Similarity] {failure:?}: no comparison possible");
            return ComparisonReport::failed(stages, failure);
        };
        stages.push(ComparisonStage::Normalized);

        let normalized: Vec<WeightedPoint> = fragment
            .iter()
            .map(|wp| WeightedPoint::new(normalization.apply(wp.position), wp.confidence))
            .collect();

        let mut alignment = self
            .aligner
            .align(model, &normalized, self.config.allow_mirroring);

        if !alignment.status.has_transform() {
            debug!(
                "[Similarity] {} alignment failed: {:?}",
                self.aligner.name(),
                alignment.status
            );
            let mut report = ComparisonReport::failed(
                stages,
                ComparisonFailure::AlignmentFailed(alignment.status),
            );
            report.alignment = Some(alignment);
            return report;
        }
        stages.push(ComparisonStage::Aligned);
        if self.config.allow_mirroring {
            stages.push(ComparisonStage::MirrorAligned);
        }

        // Report the transform for the fragment as given
        let total = alignment.transform().compose(&normalization);
        alignment.rotation = total.rotation;
        alignment.translation = total.translation;
        alignment.mirrored = total.mirrored;

        let scores = self.score(&alignment, coverage_base);
        stages.push(ComparisonStage::Scored);

        let decision = decide(&alignment, scores, thresholds);
        stages.push(ComparisonStage::Decided);
        debug!(
            "[Similarity] {}: coverage {:.2}, error {:.1}, confidence {:.2}, mirrored={}",
            decision.decision,
            decision.coverage,
            decision.position_error,
            decision.confidence,
            alignment.mirrored
        );

        ComparisonReport {
            decision,
            alignment: Some(alignment),
            stages,
            failure: None,
        }
    }

    /// Transform moving the fragment's centroid onto the model's, optionally
    /// rotating it onto the model's principal axis. `None` when either side
    /// has no usable points.
    fn normalization(
        &self,
        model: &[WeightedPoint],
        fragment: &[WeightedPoint],
    ) -> Option<RigidTransform2D> {
        let model_positions = usable_positions(model);
        let fragment_positions = usable_positions(fragment);
        let model_center = centroid(&model_positions)?;
        let fragment_center = centroid(&fragment_positions)?;

        let rotation = if self.config.normalize_orientation {
            angle_diff(
                principal_orientation(&fragment_positions),
                principal_orientation(&model_positions),
            )
        } else {
            0.0
        };

        let transform = RigidTransform2D::new(rotation, Point2D::ZERO);
        let offset = model_center - transform.apply(fragment_center);
        Some(RigidTransform2D::new(rotation, offset))
    }

    /// Coverage, positional error and combined confidence of an alignment.
    fn score(&self, alignment: &AlignmentResult, coverage_base: usize) -> Scores {
        let inliers = alignment.inlier_count();
        let coverage = if coverage_base == 0 {
            0.0
        } else {
            (inliers as f64 / coverage_base as f64).min(1.0)
        };
        let position_error = alignment.mean_inlier_distance();

        let confidence = if inliers == 0 {
            0.0
        } else {
            let accuracy = 1.0 - position_error / self.aligner.inlier_threshold();
            (COVERAGE_WEIGHT * coverage + ACCURACY_WEIGHT * accuracy).clamp(0.0, 1.0)
        };

        Scores {
            coverage,
            position_error,
            confidence,
        }
    }
}

struct Scores {
    coverage: f64,
    position_error: f64,
    confidence: f64,
}

/// Verdict from the scores of a finished alignment.
fn decide(alignment: &AlignmentResult, scores: Scores, thresholds: &MatchThresholds) -> MatchDecision {
    let Scores {
        coverage,
        position_error,
        confidence,
    } = scores;

    let matched = alignment.inlier_count() >= thresholds.min_nodes_for_match
        && confidence >= thresholds.match_threshold
        && coverage >= thresholds.min_coverage
        && alignment.is_aligned();

    let decision = if matched {
        Decision::Same
    } else if confidence >= thresholds.similar_threshold {
        Decision::Similar
    } else {
        Decision::Different
    };

    MatchDecision {
        matched,
        coverage,
        position_error,
        confidence,
        decision,
    }
}

impl Default for SimilarityEngine {
    fn default() -> Self {
        Self::new(SimilarityConfig::default(), AlignmentConfig::default())
    }
}

fn usable_positions(points: &[WeightedPoint]) -> Vec<Point2D> {
    points
        .iter()
        .filter(|wp| wp.is_usable())
        .map(|wp| wp.position)
        .collect()
}
