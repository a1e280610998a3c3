//! Conversion of detector predictions into typed observations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ConfigValidationError;
use crate::core::{BoundingBox, Point2D, centroid};

use super::types::{ClassTag, ContourObservation, PointObservation, Prediction};

/// Configuration for feature extraction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Predictions scoring below this are dropped.
    /// Default: 0.25
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,

    /// Minimum polygon vertex count.
    /// Default: 3
    #[serde(default = "default_min_vertices")]
    pub min_vertices: usize,
}

fn default_min_confidence() -> f64 {
    0.25
}
fn default_min_vertices() -> usize {
    3
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
            min_vertices: default_min_vertices(),
        }
    }
}

impl ExtractorConfig {
    /// Builder-style setter for the confidence cut-off.
    pub fn with_min_confidence(mut self, confidence: f64) -> Self {
        self.min_confidence = confidence;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ConfigValidationError::invalid(
                "features.min_confidence must be in [0, 1]",
            ));
        }
        if self.min_vertices < 3 {
            return Err(ConfigValidationError::invalid(
                "features.min_vertices must be >= 3",
            ));
        }
        Ok(())
    }
}

/// Counts of dropped input items, by reason.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipCounts {
    /// Item was not shaped like a prediction (missing or mistyped fields)
    pub invalid_shape: usize,
    /// Label not recognised
    pub unknown_class: usize,
    /// Fewer polygon vertices than required
    pub too_few_points: usize,
    /// NaN or infinite coordinates
    pub non_finite: usize,
    /// Below the configured confidence cut-off
    pub low_confidence: usize,
}

impl SkipCounts {
    /// Total number of skipped items.
    pub fn total(&self) -> usize {
        self.invalid_shape
            + self.unknown_class
            + self.too_few_points
            + self.non_finite
            + self.low_confidence
    }

    /// Add another set of counts into this one.
    pub fn merge(&mut self, other: &SkipCounts) {
        self.invalid_shape += other.invalid_shape;
        self.unknown_class += other.unknown_class;
        self.too_few_points += other.too_few_points;
        self.non_finite += other.non_finite;
        self.low_confidence += other.low_confidence;
    }
}

/// Everything extracted from one observation (one photograph).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ExtractedFeatures {
    /// Polygon centroids grouped by class
    pub by_class: BTreeMap<ClassTag, Vec<PointObservation>>,
    /// The validated polygons, in input order
    pub contours: Vec<ContourObservation>,
    /// Mean center per class
    pub class_centers: BTreeMap<ClassTag, Point2D>,
    /// Extent of all accepted polygons
    pub bounds: Option<BoundingBox>,
    /// Dropped items
    pub skipped: SkipCounts,
}

impl ExtractedFeatures {
    /// All point observations, grouped in class order.
    pub fn points(&self) -> Vec<PointObservation> {
        self.by_class.values().flatten().copied().collect()
    }

    /// Observations of a single class.
    pub fn points_of(&self, class: ClassTag) -> &[PointObservation] {
        self.by_class.get(&class).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of accepted predictions.
    pub fn accepted(&self) -> usize {
        self.contours.len()
    }

    /// Whether nothing usable was extracted.
    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }
}

/// Validates detector output and groups it by class.
#[derive(Clone, Debug, Default)]
pub struct FeatureExtractor {
    config: ExtractorConfig,
}

impl FeatureExtractor {
    /// Create an extractor.
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract features from typed predictions.
    pub fn extract(&self, predictions: &[Prediction]) -> ExtractedFeatures {
        let mut features = ExtractedFeatures::default();
        for prediction in predictions {
            self.accept(prediction, &mut features);
        }
        self.finish(&mut features);
        features
    }

    /// Extract features from a raw detector payload.
    ///
    /// Accepts either a bare array of predictions or an object with a
    /// `predictions` array. Elements that do not have the expected shape
    /// are counted as `invalid_shape` and skipped individually.
    pub fn extract_json(&self, payload: &Value) -> ExtractedFeatures {
        let mut features = ExtractedFeatures::default();

        let items = match payload {
            Value::Array(items) => items.as_slice(),
            Value::Object(map) => match map.get("predictions") {
                Some(Value::Array(items)) => items.as_slice(),
                _ => {
                    log::debug!("Detector payload has no predictions array");
                    features.skipped.invalid_shape += 1;
                    return features;
                }
            },
            _ => {
                features.skipped.invalid_shape += 1;
                return features;
            }
        };

        for item in items {
            match parse_prediction(item) {
                Some(prediction) => self.accept(&prediction, &mut features),
                None => {
                    log::trace!("Skipping malformed prediction: {}", item);
                    features.skipped.invalid_shape += 1;
                }
            }
        }

        self.finish(&mut features);
        features
    }

    /// Validate one prediction and add it to `features`, or count the skip.
    fn accept(&self, prediction: &Prediction, features: &mut ExtractedFeatures) {
        let class = prediction.class_tag();
        if !class.is_known() {
            log::trace!("Skipping unknown class '{}'", prediction.class);
            features.skipped.unknown_class += 1;
            return;
        }

        let confidence = prediction.confidence;
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            features.skipped.invalid_shape += 1;
            return;
        }
        if confidence < self.config.min_confidence {
            features.skipped.low_confidence += 1;
            return;
        }
        if prediction.points.len() < self.config.min_vertices {
            features.skipped.too_few_points += 1;
            return;
        }
        if !prediction.points.iter().all(Point2D::is_finite) {
            features.skipped.non_finite += 1;
            return;
        }

        // Non-empty and finite, so the centroid exists
        let Some(center) = centroid(&prediction.points) else {
            features.skipped.too_few_points += 1;
            return;
        };

        if let Some(bbox) = BoundingBox::from_points(&prediction.points) {
            features.bounds = Some(match features.bounds {
                Some(existing) => existing.union(&bbox),
                None => bbox,
            });
        }

        features
            .by_class
            .entry(class)
            .or_default()
            .push(PointObservation::new(center.x, center.y, confidence, class));
        features.contours.push(ContourObservation {
            class,
            polygon: prediction.points.clone(),
            confidence,
        });
    }

    /// Compute per-class centers once all predictions are in.
    fn finish(&self, features: &mut ExtractedFeatures) {
        features.class_centers = features
            .by_class
            .iter()
            .filter_map(|(class, points)| {
                let positions: Vec<Point2D> = points.iter().map(PointObservation::position).collect();
                centroid(&positions).map(|c| (*class, c))
            })
            .collect();

        log::debug!(
            "Extracted {} features ({} protectors), skipped {}",
            features.accepted(),
            features.points_of(ClassTag::Protector).len(),
            features.skipped.total()
        );
    }
}

/// Parse one JSON element into a prediction, or `None` if its shape is wrong.
fn parse_prediction(item: &Value) -> Option<Prediction> {
    let obj = item.as_object()?;
    let class = obj.get("class")?.as_str()?;
    let confidence = obj.get("confidence")?.as_f64()?;
    let points = obj
        .get("points")?
        .as_array()?
        .iter()
        .map(|p| {
            let x = p.get("x")?.as_f64()?;
            let y = p.get("y")?.as_f64()?;
            Some(Point2D::new(x, y))
        })
        .collect::<Option<Vec<_>>>()?;

    Some(Prediction::new(class, confidence, points))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::json;

    fn square(cx: f64, cy: f64, half: f64) -> Vec<Point2D> {
        vec![
            Point2D::new(cx - half, cy - half),
            Point2D::new(cx + half, cy - half),
            Point2D::new(cx + half, cy + half),
            Point2D::new(cx - half, cy + half),
        ]
    }

    #[test]
    fn test_extract_groups_by_class() {
        let extractor = FeatureExtractor::default();
        let features = extractor.extract(&[
            Prediction::new("protector", 0.9, square(10.0, 10.0, 4.0)),
            Prediction::new("protector", 0.8, square(50.0, 10.0, 4.0)),
            Prediction::new("heel", 0.7, square(30.0, 100.0, 20.0)),
        ]);

        assert_eq!(features.accepted(), 3);
        assert_eq!(features.points_of(ClassTag::Protector).len(), 2);
        assert_eq!(features.points_of(ClassTag::Heel).len(), 1);
        assert!(features.points_of(ClassTag::Toe).is_empty());

        let center = features.class_centers[&ClassTag::Protector];
        assert_relative_eq!(center.x, 30.0);
        assert_relative_eq!(center.y, 10.0);

        let bounds = features.bounds.unwrap();
        assert_relative_eq!(bounds.min.x, 6.0);
        assert_relative_eq!(bounds.max.y, 120.0);
        assert_eq!(features.skipped.total(), 0);
    }

    #[test]
    fn test_extract_skips_invalid_items() {
        let extractor = FeatureExtractor::default();
        let features = extractor.extract(&[
            Prediction::new("lace", 0.9, square(0.0, 0.0, 1.0)),
            Prediction::new("protector", 0.1, square(0.0, 0.0, 1.0)),
            Prediction::new("protector", 0.9, vec![Point2D::new(0.0, 0.0), Point2D::new(1.0, 1.0)]),
            Prediction::new("protector", 0.9, vec![Point2D::new(f64::NAN, 0.0); 3]),
            Prediction::new("protector", 1.7, square(0.0, 0.0, 1.0)),
            Prediction::new("toe", 0.6, square(5.0, 5.0, 2.0)),
        ]);

        assert_eq!(features.accepted(), 1);
        assert_eq!(features.skipped.unknown_class, 1);
        assert_eq!(features.skipped.low_confidence, 1);
        assert_eq!(features.skipped.too_few_points, 1);
        assert_eq!(features.skipped.non_finite, 1);
        assert_eq!(features.skipped.invalid_shape, 1);
        assert_eq!(features.skipped.total(), 5);
    }

    #[test]
    fn test_extract_json_lenient() {
        let payload = json!({
            "predictions": [
                {"class": "protector", "confidence": 0.92,
                 "points": [{"x": 0, "y": 0}, {"x": 10, "y": 0}, {"x": 10, "y": 10}]},
                {"class": "protector", "confidence": 0.9,
                 "points": [{"x": "a", "y": 0}, {"x": 1, "y": 1}, {"x": 2, "y": 2}]},
                {"class": "outline", "confidence": 0.8},
                "not an object",
                {"class": "toe", "confidence": 0.75,
                 "points": [{"x": 100, "y": 0}, {"x": 110, "y": 0}, {"x": 105, "y": 9}]}
            ]
        });

        let features = FeatureExtractor::default().extract_json(&payload);
        assert_eq!(features.accepted(), 2);
        assert_eq!(features.skipped.invalid_shape, 3);

        let protector = features.points_of(ClassTag::Protector)[0];
        assert_relative_eq!(protector.x, 20.0 / 3.0);
        assert_relative_eq!(protector.y, 10.0 / 3.0);
        assert_relative_eq!(protector.confidence, 0.92);
    }

    #[test]
    fn test_extract_json_bare_array_and_garbage() {
        let extractor = FeatureExtractor::default();

        let bare = json!([
            {"class": "heel", "confidence": 0.6,
             "points": [{"x": 0, "y": 0}, {"x": 4, "y": 0}, {"x": 2, "y": 3}]}
        ]);
        assert_eq!(extractor.extract_json(&bare).accepted(), 1);

        let garbage = extractor.extract_json(&json!(42));
        assert!(garbage.is_empty());
        assert_eq!(garbage.skipped.invalid_shape, 1);
    }

    #[test]
    fn test_points_in_class_order() {
        let features = FeatureExtractor::default().extract(&[
            Prediction::new("toe", 0.9, square(0.0, 0.0, 2.0)),
            Prediction::new("protector", 0.9, square(10.0, 0.0, 2.0)),
        ]);
        let classes: Vec<ClassTag> = features.points().iter().map(|p| p.class).collect();
        assert_eq!(classes, vec![ClassTag::Protector, ClassTag::Toe]);
    }
}
