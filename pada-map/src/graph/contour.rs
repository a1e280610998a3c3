//! Deduplicated polygon storage.
//!
//! Keeps one representative polygon per physical feature so callers can
//! render or export the accumulated sole. Contours take no part in matching
//! decisions and are never decayed.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::core::{Point2D, centroid};
use crate::features::{ClassTag, ContourObservation};

use super::types::ObservationId;

/// Identifier of a stored contour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContourId(pub u32);

/// A representative polygon accumulated over observations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contour {
    /// Contour identifier
    pub id: ContourId,
    /// Semantic class
    pub class: ClassTag,
    /// Highest-confidence polygon seen so far
    pub polygon: Vec<Point2D>,
    /// Vertex mean of `polygon`
    pub centroid: Point2D,
    /// Highest confidence seen so far
    pub confidence: f64,
    /// Number of observations merged into this contour
    pub occurrences: u32,
    /// Observations that contributed
    pub source_observations: BTreeSet<ObservationId>,
}

/// What happened to an incoming contour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContourFusion {
    /// Stored as a new contour
    Added(ContourId),
    /// Merged into an existing contour
    Merged(ContourId),
}

/// Per-class, proximity-deduplicated contour store.
#[derive(Clone, Debug)]
pub struct ContourStore {
    merge_distance: f64,
    contours: Vec<Contour>,
    next_id: u32,
}

impl ContourStore {
    /// Create an empty store.
    pub fn new(merge_distance: f64) -> Self {
        Self {
            merge_distance,
            contours: Vec::new(),
            next_id: 0,
        }
    }

    /// Rebuild a store from previously exported contours.
    pub(crate) fn from_contours(merge_distance: f64, contours: Vec<Contour>) -> Self {
        let next_id = contours.iter().map(|c| c.id.0 + 1).max().unwrap_or(0);
        Self {
            merge_distance,
            contours,
            next_id,
        }
    }

    /// All stored contours.
    pub fn contours(&self) -> &[Contour] {
        &self.contours
    }

    /// Contours of one class.
    pub fn of_class(&self, class: ClassTag) -> impl Iterator<Item = &Contour> {
        self.contours.iter().filter(move |c| c.class == class)
    }

    /// Number of stored contours.
    pub fn len(&self) -> usize {
        self.contours.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    /// Add an observed polygon.
    ///
    /// A contour of the same class whose centroid lies within the merge
    /// distance absorbs it: confidence becomes the maximum of both, the
    /// polygon is replaced if the newcomer is more confident, and the
    /// occurrence count grows. Contours already fed by `observation` are
    /// not candidates, so distinct features of one photograph stay distinct.
    ///
    /// Returns `None` for polygons with no vertices or non-finite coordinates.
    pub fn add(
        &mut self,
        observed: &ContourObservation,
        observation: ObservationId,
    ) -> Option<ContourFusion> {
        if !observed.polygon.iter().all(Point2D::is_finite) {
            return None;
        }
        let center = centroid(&observed.polygon)?;

        let nearest = self
            .contours
            .iter()
            .enumerate()
            .filter(|(_, c)| {
                c.class == observed.class && !c.source_observations.contains(&observation)
            })
            .map(|(i, c)| (i, c.centroid.distance(&center)))
            .filter(|&(_, d)| d < self.merge_distance)
            .min_by(|a, b| a.1.total_cmp(&b.1));

        if let Some((idx, _)) = nearest {
            let contour = &mut self.contours[idx];
            if observed.confidence > contour.confidence {
                contour.polygon = observed.polygon.clone();
                contour.centroid = center;
                contour.confidence = observed.confidence;
            }
            contour.occurrences += 1;
            contour.source_observations.insert(observation);
            return Some(ContourFusion::Merged(contour.id));
        }

        let id = ContourId(self.next_id);
        self.next_id += 1;
        self.contours.push(Contour {
            id,
            class: observed.class,
            polygon: observed.polygon.clone(),
            centroid: center,
            confidence: observed.confidence,
            occurrences: 1,
            source_observations: BTreeSet::from([observation]),
        });
        Some(ContourFusion::Added(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle(class: ClassTag, cx: f64, cy: f64, confidence: f64) -> ContourObservation {
        ContourObservation {
            class,
            polygon: vec![
                Point2D::new(cx - 3.0, cy - 3.0),
                Point2D::new(cx + 3.0, cy - 3.0),
                Point2D::new(cx, cy + 6.0),
            ],
            confidence,
        }
    }

    #[test]
    fn test_near_duplicate_same_class_merges() {
        let mut store = ContourStore::new(20.0);
        let first = store.add(&triangle(ClassTag::Heel, 100.0, 100.0, 0.6), ObservationId(1));
        let second = store.add(&triangle(ClassTag::Heel, 108.0, 104.0, 0.9), ObservationId(2));

        assert_eq!(first, Some(ContourFusion::Added(ContourId(0))));
        assert_eq!(second, Some(ContourFusion::Merged(ContourId(0))));
        assert_eq!(store.len(), 1);

        let heel = &store.contours()[0];
        assert_eq!(heel.occurrences, 2);
        assert_eq!(heel.confidence, 0.9);
        assert_eq!(heel.centroid, Point2D::new(108.0, 104.0));
        assert_eq!(heel.source_observations.len(), 2);
    }

    #[test]
    fn test_lower_confidence_keeps_polygon() {
        let mut store = ContourStore::new(20.0);
        store.add(&triangle(ClassTag::Toe, 0.0, 0.0, 0.9), ObservationId(1));
        store.add(&triangle(ClassTag::Toe, 5.0, 0.0, 0.4), ObservationId(2));

        let toe = &store.contours()[0];
        assert_eq!(toe.confidence, 0.9);
        assert_eq!(toe.centroid, Point2D::new(0.0, 0.0));
        assert_eq!(toe.occurrences, 2);
    }

    #[test]
    fn test_never_merges_across_classes() {
        let mut store = ContourStore::new(20.0);
        store.add(&triangle(ClassTag::Heel, 50.0, 50.0, 0.8), ObservationId(1));
        store.add(&triangle(ClassTag::Outline, 50.0, 50.0, 0.8), ObservationId(2));
        assert_eq!(store.len(), 2);
        assert_eq!(store.of_class(ClassTag::Heel).count(), 1);
        assert_eq!(store.of_class(ClassTag::Outline).count(), 1);
    }

    #[test]
    fn test_far_apart_stays_separate() {
        let mut store = ContourStore::new(20.0);
        store.add(&triangle(ClassTag::Protector, 0.0, 0.0, 0.8), ObservationId(1));
        store.add(&triangle(ClassTag::Protector, 40.0, 0.0, 0.8), ObservationId(2));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_same_observation_not_merged() {
        let mut store = ContourStore::new(20.0);
        store.add(&triangle(ClassTag::Protector, 0.0, 0.0, 0.8), ObservationId(1));
        store.add(&triangle(ClassTag::Protector, 10.0, 0.0, 0.8), ObservationId(1));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_rejects_invalid_polygon() {
        let mut store = ContourStore::new(20.0);
        let mut bad = triangle(ClassTag::Heel, 0.0, 0.0, 0.5);
        bad.polygon[1].x = f64::INFINITY;
        assert!(store.add(&bad, ObservationId(1)).is_none());

        bad.polygon.clear();
        assert!(store.add(&bad, ObservationId(1)).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_from_contours_continues_ids() {
        let mut store = ContourStore::new(20.0);
        store.add(&triangle(ClassTag::Heel, 0.0, 0.0, 0.5), ObservationId(1));
        store.add(&triangle(ClassTag::Toe, 100.0, 0.0, 0.5), ObservationId(1));

        let mut restored = ContourStore::from_contours(20.0, store.contours().to_vec());
        let added = restored.add(&triangle(ClassTag::Outline, 0.0, 0.0, 0.5), ObservationId(2));
        assert_eq!(added, Some(ContourFusion::Added(ContourId(2))));
    }
}
