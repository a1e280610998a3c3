//! The accumulating spatial graph.

use std::collections::{BTreeMap, BTreeSet};

use crate::core::Point2D;
use crate::error::{PadaError, Result};
use crate::features::{ExtractedFeatures, PointObservation};
use crate::io::{AccumulatorSnapshot, SNAPSHOT_VERSION};

use super::config::AccumulatorConfig;
use super::consensus::{ConsensusEdge, ConsensusNode, ConsensusView};
use super::contour::{Contour, ContourFusion, ContourStore};
use super::types::{Edge, FusionReport, GraphStats, Node, NodeId, ObservationId};

/// Upper bound for node confidence.
const MAX_CONFIDENCE: f64 = 1.0;

/// Persistent model fused from many partial observations.
///
/// Nodes live in a dense arena (`NodeId` = index) and are never removed;
/// unreinforced nodes decay toward the confidence floor instead. Edges
/// reference nodes by id and are rebuilt from scratch after every update.
///
/// The graph has no internal locking. Callers serialize mutation, e.g.
/// through [`SessionStore`](crate::session::SessionStore).
#[derive(Clone, Debug)]
pub struct SpatialGraph {
    config: AccumulatorConfig,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    contours: ContourStore,
    /// Logical clock, advanced once per non-empty observation or idle tick.
    step: u64,
    observation_count: u64,
    /// Highest observation id handed to the graph, fed or not.
    last_observation: u64,
}

impl SpatialGraph {
    /// Create an empty graph.
    ///
    /// # Panics
    /// Panics if the configuration is invalid.
    pub fn new(config: AccumulatorConfig) -> Self {
        if let Err(e) = config.validate() {
            panic!("invalid accumulator configuration: {e}");
        }

        let contours = ContourStore::new(config.contour_merge_distance);
        Self {
            config,
            nodes: Vec::new(),
            edges: Vec::new(),
            contours,
            step: 0,
            observation_count: 0,
            last_observation: 0,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &AccumulatorConfig {
        &self.config
    }

    /// All nodes, in id order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Node by id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Current edge set.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Contour store.
    pub fn contours(&self) -> &ContourStore {
        &self.contours
    }

    /// Logical clock.
    pub fn step(&self) -> u64 {
        self.step
    }

    /// Whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// An observation id above every id this graph has been given,
    /// including ids of observations that added nothing.
    pub fn next_observation_id(&self) -> ObservationId {
        ObservationId(self.last_observation + 1)
    }

    /// Ingest the point observations of one photograph.
    ///
    /// Each valid point fuses into the nearest node of the same class within
    /// the fusion radius, or creates a new node. Nodes already fed by this
    /// observation are not candidates. Malformed points are counted in
    /// `skipped`. Afterwards idle nodes decay and the edge set is rebuilt.
    ///
    /// An observation without a single valid point is a no-op apart from
    /// the skip count: the clock does not advance and nothing decays.
    pub fn add_observation(
        &mut self,
        points: &[PointObservation],
        observation: ObservationId,
    ) -> FusionReport {
        self.note_observation(observation);

        let (valid, malformed): (Vec<&PointObservation>, Vec<&PointObservation>) =
            points.iter().partition(|p| p.is_valid());
        for point in &malformed {
            log::trace!("{observation}: skipping malformed point {point:?}");
        }

        if valid.is_empty() {
            let mut report = self.empty_report(observation);
            report.skipped = malformed.len();
            return report;
        }

        self.step += 1;
        self.observation_count += 1;

        let mut report = FusionReport {
            observation_id: Some(observation),
            skipped: malformed.len(),
            ..Default::default()
        };

        for point in valid {
            match self.find_fusion_target(point, observation) {
                Some(idx) => {
                    self.fuse_into(idx, point, observation);
                    report.nodes_updated += 1;
                }
                None => {
                    self.create_node(point, observation);
                    report.nodes_added += 1;
                }
            }
        }

        report.nodes_decayed = self.decay_idle_nodes();
        self.rebuild_edges();
        report.stats = self.stats();

        log::debug!(
            "{observation}: +{} nodes, {} fused, {} skipped, {} decayed ({} nodes, {} edges)",
            report.nodes_added,
            report.nodes_updated,
            report.skipped,
            report.nodes_decayed,
            report.stats.node_count,
            report.stats.edge_count
        );

        report
    }

    /// Ingest everything extracted from one photograph: point observations
    /// into the node graph and polygons into the contour store.
    pub fn add_features(
        &mut self,
        features: &ExtractedFeatures,
        observation: ObservationId,
    ) -> FusionReport {
        self.note_observation(observation);

        let mut contours_added = 0;
        let mut contours_merged = 0;
        for contour in &features.contours {
            match self.contours.add(contour, observation) {
                Some(ContourFusion::Added(_)) => contours_added += 1,
                Some(ContourFusion::Merged(_)) => contours_merged += 1,
                None => {}
            }
        }

        let mut report = self.add_observation(&features.points(), observation);
        report.contours_added = contours_added;
        report.contours_merged = contours_merged;
        report.stats.contour_count = self.contours.len();
        report
    }

    /// Advance the logical clock by `steps` without new observations,
    /// decaying idle nodes at each step. Returns the number of decay events.
    pub fn advance(&mut self, steps: u64) -> usize {
        let mut decayed = 0;
        for _ in 0..steps {
            self.step += 1;
            decayed += self.decay_idle_nodes();
        }
        if steps > 0 {
            self.rebuild_edges();
        }
        decayed
    }

    /// Nodes at or above `min_confidence` and the edges between them.
    ///
    /// Pure read: repeated calls on an unchanged graph return identical views.
    pub fn consensus(&self, min_confidence: f64) -> ConsensusView {
        let kept: Vec<&Node> = self
            .nodes
            .iter()
            .filter(|n| n.confidence >= min_confidence)
            .collect();
        let kept_ids: BTreeSet<NodeId> = kept.iter().map(|n| n.id).collect();

        let nodes = kept
            .iter()
            .map(|n| ConsensusNode {
                id: n.id.0,
                x: n.position.x,
                y: n.position.y,
                confidence: n.confidence,
                occurrences: n.occurrences,
                class: n.class,
            })
            .collect();

        let edges = self
            .edges
            .iter()
            .filter(|e| kept_ids.contains(&e.a) && kept_ids.contains(&e.b))
            .map(|e| ConsensusEdge {
                a: e.a.0,
                b: e.b.0,
                distance: e.distance,
                confidence: e.confidence,
            })
            .collect();

        ConsensusView { nodes, edges }
    }

    /// Aggregate statistics.
    pub fn stats(&self) -> GraphStats {
        let mean_confidence = if self.nodes.is_empty() {
            0.0
        } else {
            self.nodes.iter().map(|n| n.confidence).sum::<f64>() / self.nodes.len() as f64
        };

        let mut nodes_by_class = BTreeMap::new();
        for node in &self.nodes {
            *nodes_by_class.entry(node.class).or_insert(0) += 1;
        }

        GraphStats {
            node_count: self.nodes.len(),
            edge_count: self.edges.len(),
            contour_count: self.contours.len(),
            mean_confidence,
            observation_count: self.observation_count,
            step: self.step,
            nodes_by_class,
        }
    }

    /// Export the complete graph state.
    pub fn export(&self) -> AccumulatorSnapshot {
        AccumulatorSnapshot {
            version: SNAPSHOT_VERSION,
            config: self.config.clone(),
            step: self.step,
            observation_count: self.observation_count,
            last_observation: self.last_observation,
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            contours: self.contours.contours().to_vec(),
        }
    }

    /// Restore a graph from an exported snapshot.
    ///
    /// Node ids must be dense (id equal to position) and positions finite.
    /// Out-of-range confidences are clamped. Edges are rebuilt from the
    /// restored nodes, which reproduces the exported edge set for any
    /// snapshot produced by [`export`](Self::export).
    pub fn import(snapshot: AccumulatorSnapshot) -> Result<Self> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(PadaError::UnsupportedSnapshotVersion(snapshot.version));
        }
        snapshot
            .config
            .validate()
            .map_err(|e| PadaError::InvalidSnapshot(e.to_string()))?;

        let floor = snapshot.config.confidence_floor;
        let mut nodes = snapshot.nodes;
        for (idx, node) in nodes.iter_mut().enumerate() {
            if node.id.index() != idx {
                return Err(PadaError::InvalidSnapshot(format!(
                    "node at position {idx} has id {}",
                    node.id.0
                )));
            }
            if !node.position.is_finite() {
                return Err(PadaError::InvalidSnapshot(format!(
                    "node {idx} has a non-finite position"
                )));
            }
            if !node.class.is_known() {
                return Err(PadaError::InvalidSnapshot(format!(
                    "node {idx} has an unknown class"
                )));
            }
            let clamped = clamp_confidence(node.confidence, floor);
            if clamped != node.confidence {
                log::warn!(
                    "Snapshot node {idx} confidence {} clamped to {clamped}",
                    node.confidence
                );
                node.confidence = clamped;
            }
            node.occurrences = node.occurrences.max(1);
        }

        validate_contours(&snapshot.contours)?;

        // Never reissue an id that already fed a node or contour
        let last_observation = nodes
            .iter()
            .flat_map(|n| n.source_observations.iter())
            .chain(snapshot.contours.iter().flat_map(|c| c.source_observations.iter()))
            .map(|o| o.0)
            .fold(snapshot.last_observation, u64::max);

        let contours =
            ContourStore::from_contours(snapshot.config.contour_merge_distance, snapshot.contours);
        let mut graph = Self {
            config: snapshot.config,
            nodes,
            edges: Vec::new(),
            contours,
            step: snapshot.step,
            observation_count: snapshot.observation_count,
            last_observation,
        };
        graph.rebuild_edges();

        if graph.edges.len() != snapshot.edges.len() {
            log::debug!(
                "Snapshot listed {} edges, rebuilt {}",
                snapshot.edges.len(),
                graph.edges.len()
            );
        }

        Ok(graph)
    }

    /// Nearest same-class node within the fusion radius that this
    /// observation has not already fed.
    fn find_fusion_target(
        &self,
        point: &PointObservation,
        observation: ObservationId,
    ) -> Option<usize> {
        let position = point.position();
        let radius_sq = self.config.fusion_radius * self.config.fusion_radius;

        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.class == point.class && !n.source_observations.contains(&observation))
            .map(|(i, n)| (i, n.position.distance_squared(&position)))
            .filter(|&(_, d2)| d2 <= radius_sq)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    /// Confidence-weighted running average of position plus a confidence boost.
    fn fuse_into(&mut self, idx: usize, point: &PointObservation, observation: ObservationId) {
        let boost = self.config.boost_fraction * point.confidence;
        let floor = self.config.confidence_floor;
        let step = self.step;
        let node = &mut self.nodes[idx];

        let total = node.confidence + boost;
        if total > 0.0 {
            node.position = (node.position * node.confidence + point.position() * boost) * (1.0 / total);
        }
        node.confidence = clamp_confidence(node.confidence + boost, floor);
        node.occurrences += 1;
        node.last_seen = step;
        node.source_observations.insert(observation);
    }

    fn create_node(&mut self, point: &PointObservation, observation: ObservationId) {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            id,
            position: point.position(),
            confidence: clamp_confidence(point.confidence, self.config.confidence_floor),
            occurrences: 1,
            first_seen: self.step,
            last_seen: self.step,
            source_observations: BTreeSet::from([observation]),
            class: point.class,
        });
    }

    /// Apply one step of decay to nodes idle for at least `idle_steps`.
    fn decay_idle_nodes(&mut self) -> usize {
        let floor = self.config.confidence_floor;
        let rate = self.config.decay_rate;
        let idle_threshold = self.config.idle_steps;
        let now = self.step;

        let mut decayed = 0;
        for node in &mut self.nodes {
            if node.idle_steps(now) >= idle_threshold && node.confidence > floor && rate > 0.0 {
                node.confidence = (node.confidence - rate).max(floor);
                decayed += 1;
                log::trace!(
                    "Node {} decayed to {:.3} (idle {} steps)",
                    node.id.0,
                    node.confidence,
                    node.idle_steps(now)
                );
            }
        }
        decayed
    }

    /// Recompute every edge from the current nodes.
    fn rebuild_edges(&mut self) {
        self.edges.clear();

        let min_conf = self.config.min_edge_confidence;
        let radius_sq = self.config.edge_radius * self.config.edge_radius;

        for (i, a) in self.nodes.iter().enumerate() {
            if a.confidence < min_conf {
                continue;
            }
            for b in &self.nodes[i + 1..] {
                if b.confidence < min_conf {
                    continue;
                }
                let d2 = a.position.distance_squared(&b.position);
                if d2 <= radius_sq {
                    self.edges.push(Edge {
                        a: a.id,
                        b: b.id,
                        distance: d2.sqrt(),
                        confidence: a.confidence.min(b.confidence),
                    });
                }
            }
        }
    }

    fn note_observation(&mut self, observation: ObservationId) {
        self.last_observation = self.last_observation.max(observation.0);
    }

    fn empty_report(&self, observation: ObservationId) -> FusionReport {
        FusionReport {
            observation_id: Some(observation),
            stats: self.stats(),
            ..Default::default()
        }
    }
}

impl Default for SpatialGraph {
    fn default() -> Self {
        Self::new(AccumulatorConfig::default())
    }
}

#[inline]
fn clamp_confidence(confidence: f64, floor: f64) -> f64 {
    if confidence.is_nan() {
        return floor;
    }
    confidence.clamp(floor, MAX_CONFIDENCE)
}

fn validate_contours(contours: &[Contour]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for contour in contours {
        if !seen.insert(contour.id) {
            return Err(PadaError::InvalidSnapshot(format!(
                "duplicate contour id {}",
                contour.id.0
            )));
        }
        if !contour.polygon.iter().all(Point2D::is_finite) || !contour.centroid.is_finite() {
            return Err(PadaError::InvalidSnapshot(format!(
                "contour {} has non-finite coordinates",
                contour.id.0
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::ClassTag;
    use approx::assert_relative_eq;

    fn protector(x: f64, y: f64, confidence: f64) -> PointObservation {
        PointObservation::new(x, y, confidence, ClassTag::Protector)
    }

    #[test]
    fn test_empty_observation_is_noop() {
        let mut graph = SpatialGraph::default();
        let report = graph.add_observation(&[], ObservationId(1));
        assert!(!report.changed());
        assert_eq!(graph.step(), 0);
        assert!(graph.is_empty());
    }

    #[test]
    fn test_first_observation_creates_nodes() {
        let mut graph = SpatialGraph::default();
        let report = graph.add_observation(
            &[protector(0.0, 0.0, 0.8), protector(100.0, 0.0, 0.6)],
            ObservationId(1),
        );

        assert_eq!(report.nodes_added, 2);
        assert_eq!(report.nodes_updated, 0);
        assert_eq!(graph.nodes()[0].confidence, 0.8);
        assert_eq!(graph.nodes()[1].occurrences, 1);
        assert_eq!(graph.edges().len(), 1);
    }

    #[test]
    fn test_fusion_weighted_average() {
        let mut graph = SpatialGraph::default();
        graph.add_observation(&[protector(0.0, 0.0, 0.6)], ObservationId(1));
        let report = graph.add_observation(&[protector(10.0, 0.0, 1.0)], ObservationId(2));

        assert_eq!(report.nodes_updated, 1);
        let node = &graph.nodes()[0];
        // boost = 0.15 * 1.0, pos = (0 * 0.6 + 10 * 0.15) / 0.75
        assert_relative_eq!(node.position.x, 2.0, epsilon = 1e-12);
        assert_relative_eq!(node.confidence, 0.75, epsilon = 1e-12);
        assert_eq!(node.occurrences, 2);
        assert_eq!(node.last_seen, 2);
        assert_eq!(node.first_seen, 1);
    }

    #[test]
    fn test_fusion_requires_same_class_and_radius() {
        let mut graph = SpatialGraph::default();
        graph.add_observation(&[protector(0.0, 0.0, 0.8)], ObservationId(1));
        graph.add_observation(
            &[
                PointObservation::new(5.0, 0.0, 0.8, ClassTag::Heel),
                protector(30.0, 0.0, 0.8),
            ],
            ObservationId(2),
        );
        assert_eq!(graph.nodes().len(), 3);
    }

    #[test]
    fn test_fusion_uses_current_position() {
        let mut graph = SpatialGraph::default();
        graph.add_observation(&[protector(0.0, 0.0, 0.5)], ObservationId(1));
        // Pull the node towards +x several times
        for i in 0..6 {
            graph.add_observation(&[protector(20.0, 0.0, 1.0)], ObservationId(2 + i));
        }
        let x = graph.nodes()[0].position.x;
        assert!(x > 5.0, "node should have moved, x = {x}");

        // 28 from the origin but within 25 of the moved node
        graph.add_observation(&[protector(28.0, 0.0, 1.0)], ObservationId(20));
        assert_eq!(graph.nodes().len(), 1);
    }

    #[test]
    fn test_same_observation_points_stay_distinct() {
        let mut graph = SpatialGraph::default();
        graph.add_observation(
            &[protector(0.0, 0.0, 0.8), protector(10.0, 0.0, 0.8)],
            ObservationId(1),
        );
        assert_eq!(graph.nodes().len(), 2);
    }

    #[test]
    fn test_malformed_points_skipped() {
        let mut graph = SpatialGraph::default();
        let report = graph.add_observation(
            &[
                protector(f64::NAN, 0.0, 0.8),
                protector(0.0, 0.0, -0.2),
                PointObservation::new(0.0, 0.0, 0.8, ClassTag::Unknown),
                protector(1.0, 1.0, 0.9),
            ],
            ObservationId(1),
        );
        assert_eq!(report.skipped, 3);
        assert_eq!(report.nodes_added, 1);
    }

    #[test]
    fn test_all_malformed_observation_does_not_tick() {
        let mut graph = SpatialGraph::default();
        graph.add_observation(&[protector(0.0, 0.0, 0.9)], ObservationId(1));

        for i in 0..10 {
            let report = graph.add_observation(
                &[protector(f64::NAN, 0.0, 0.8), protector(5.0, 5.0, 1.5)],
                ObservationId(2 + i),
            );
            assert_eq!(report.skipped, 2);
            assert_eq!(report.nodes_decayed, 0);
        }

        assert_eq!(graph.step(), 1);
        assert_eq!(graph.stats().observation_count, 1);
        assert_eq!(graph.nodes()[0].confidence, 0.9);
    }

    #[test]
    fn test_next_observation_id_counts_unused_ids() {
        let mut graph = SpatialGraph::default();
        assert_eq!(graph.next_observation_id(), ObservationId(1));

        graph.add_observation(&[], ObservationId(1));
        graph.add_observation(&[protector(0.0, 0.0, 0.9)], ObservationId(2));
        assert_eq!(graph.next_observation_id(), ObservationId(3));

        let mut snapshot = graph.export();
        snapshot.last_observation = 0;
        let restored = SpatialGraph::import(snapshot).unwrap();
        assert_eq!(restored.next_observation_id(), ObservationId(3));
    }

    #[test]
    fn test_confidence_caps_at_one() {
        let mut graph = SpatialGraph::default();
        for i in 0..20 {
            graph.add_observation(&[protector(0.0, 0.0, 1.0)], ObservationId(i));
        }
        assert_eq!(graph.nodes()[0].confidence, 1.0);
        assert_eq!(graph.nodes()[0].occurrences, 20);
    }

    #[test]
    fn test_low_confidence_clamped_to_floor() {
        let mut graph = SpatialGraph::default();
        graph.add_observation(&[protector(0.0, 0.0, 0.02)], ObservationId(1));
        assert_eq!(graph.nodes()[0].confidence, 0.1);
    }

    #[test]
    fn test_decay_after_idle_steps() {
        let config = AccumulatorConfig::default().with_decay(0.1, 2);
        let mut graph = SpatialGraph::new(config);
        graph.add_observation(&[protector(0.0, 0.0, 0.5)], ObservationId(1));

        // Step 2: idle 1, no decay
        graph.add_observation(&[protector(500.0, 0.0, 0.5)], ObservationId(2));
        assert_relative_eq!(graph.nodes()[0].confidence, 0.5);

        // Step 3: idle 2, decays
        let report = graph.add_observation(&[protector(500.0, 0.0, 0.5)], ObservationId(3));
        assert_eq!(report.nodes_decayed, 1);
        assert_relative_eq!(graph.nodes()[0].confidence, 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_advance_decays_to_floor() {
        let mut graph = SpatialGraph::new(AccumulatorConfig::default().with_decay(0.2, 1));
        graph.add_observation(&[protector(0.0, 0.0, 0.9)], ObservationId(1));
        graph.advance(50);
        assert_eq!(graph.nodes()[0].confidence, 0.1);
        assert_eq!(graph.step(), 51);
    }

    #[test]
    fn test_edges_rebuilt_by_threshold() {
        let mut graph = SpatialGraph::default();
        graph.add_observation(
            &[
                protector(0.0, 0.0, 0.9),
                protector(100.0, 0.0, 0.9),
                protector(300.0, 0.0, 0.9),
                protector(0.0, 50.0, 0.3),
            ],
            ObservationId(1),
        );

        let edges = graph.edges();
        assert_eq!(edges.len(), 1);
        assert_eq!((edges[0].a, edges[0].b), (NodeId(0), NodeId(1)));
        assert_relative_eq!(edges[0].distance, 100.0);
        assert_relative_eq!(edges[0].confidence, 0.9);
    }

    #[test]
    fn test_consensus_filters_nodes_and_edges() {
        let mut graph = SpatialGraph::default();
        graph.add_observation(
            &[
                protector(0.0, 0.0, 0.9),
                protector(60.0, 0.0, 0.5),
                protector(0.0, 60.0, 0.7),
            ],
            ObservationId(1),
        );

        let view = graph.consensus(0.6);
        assert_eq!(view.len(), 2);
        assert_eq!(view.edges.len(), 1);
        assert_eq!((view.edges[0].a, view.edges[0].b), (0, 2));

        assert_eq!(graph.consensus(0.6), view);
    }

    #[test]
    fn test_add_features_counts_contours() {
        use crate::features::{FeatureExtractor, Prediction};

        let tri = |cx: f64| {
            vec![
                Point2D::new(cx, 0.0),
                Point2D::new(cx + 6.0, 0.0),
                Point2D::new(cx + 3.0, 6.0),
            ]
        };
        let extractor = FeatureExtractor::default();
        let mut graph = SpatialGraph::default();

        let first = extractor.extract(&[
            Prediction::new("protector", 0.9, tri(0.0)),
            Prediction::new("heel", 0.8, tri(200.0)),
        ]);
        let report = graph.add_features(&first, ObservationId(1));
        assert_eq!(report.contours_added, 2);
        assert_eq!(report.nodes_added, 2);

        let second = extractor.extract(&[Prediction::new("protector", 0.7, tri(4.0))]);
        let report = graph.add_features(&second, ObservationId(2));
        assert_eq!(report.contours_merged, 1);
        assert_eq!(report.nodes_updated, 1);
        assert_eq!(report.stats.contour_count, 2);
    }

    #[test]
    #[should_panic(expected = "invalid accumulator configuration")]
    fn test_invalid_config_panics() {
        SpatialGraph::new(AccumulatorConfig::default().with_fusion_radius(0.0));
    }
}
