//! Trait for point-set alignment algorithms.

use super::types::{AlignmentResult, WeightedPoint};

/// Estimates the rigid transform mapping a moving point set onto a
/// reference set.
///
/// # Example
///
/// ```ignore
/// use pada_map::matching::{PointAligner, WeightedPoint};
///
/// fn best_score<A: PointAligner>(aligner: &A, model: &[WeightedPoint], fragment: &[WeightedPoint]) -> f64 {
///     aligner.align(model, fragment, true).score
/// }
/// ```
pub trait PointAligner: Send + Sync {
    /// Align `set_b` onto `set_a`. With `mirror`, reflected hypotheses are
    /// tried as well and the better of the two is returned.
    fn align(&self, set_a: &[WeightedPoint], set_b: &[WeightedPoint], mirror: bool)
    -> AlignmentResult;

    /// Distance under which a correspondence counts as an inlier.
    fn inlier_threshold(&self) -> f64;

    /// Name for logging.
    fn name(&self) -> &str;
}
