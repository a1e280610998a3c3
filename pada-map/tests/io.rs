//! Snapshot persistence and configuration files.

mod common;

use std::io::Write;

use approx::assert_relative_eq;

use pada_map::config::{ConfigLoadError, PadaConfig};
use pada_map::core::Point2D;
use pada_map::features::{ClassTag, ExtractedFeatures};
use pada_map::graph::{ObservationId, SpatialGraph};
use pada_map::io::{AccumulatorSnapshot, SNAPSHOT_VERSION};
use pada_map::{FeatureExtractor, PadaError, SessionStore};

use common::*;

fn accumulated_graph() -> SpatialGraph {
    let mut rng = rng(9);
    let pattern = spaced_cluster(&mut rng, 10, 60.0, 400.0);
    let mut graph = SpatialGraph::default();
    for obs in 0..3 {
        graph.add_features(&features(&jitter(&mut rng, &pattern, 4.0), 0.7), ObservationId(obs));
    }
    graph.advance(2);
    graph
}

#[test]
fn test_snapshot_file_round_trip() {
    let graph = accumulated_graph();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");

    graph.export().save(&path).unwrap();
    let restored = SpatialGraph::import(AccumulatorSnapshot::load(&path).unwrap()).unwrap();

    assert_eq!(restored.nodes(), graph.nodes());
    assert_eq!(restored.edges(), graph.edges());
    assert_eq!(restored.contours().contours(), graph.contours().contours());
    assert_eq!(restored.stats(), graph.stats());
}

#[test]
fn test_restored_graph_keeps_accumulating() {
    let mut rng = rng(10);
    let pattern = spaced_cluster(&mut rng, 6, 60.0, 300.0);
    let observations: Vec<_> = (0..4)
        .map(|_| features(&jitter(&mut rng, &pattern, 3.0), 0.6))
        .collect();

    let mut continuous = SpatialGraph::default();
    let mut interrupted = SpatialGraph::default();
    for (i, obs) in observations.iter().enumerate() {
        let id = ObservationId(i as u64);
        continuous.add_features(obs, id);
        if i == 2 {
            let json = interrupted.export().to_json().unwrap();
            interrupted = SpatialGraph::import(AccumulatorSnapshot::from_json(&json).unwrap()).unwrap();
        }
        interrupted.add_features(obs, id);
    }

    assert_eq!(interrupted.nodes(), continuous.nodes());
    assert_eq!(interrupted.step(), continuous.step());
}

#[test]
fn test_session_restore_from_snapshot() {
    let graph = accumulated_graph();
    let store = SessionStore::default();
    let id = store.restore_session(graph.export()).unwrap();

    let report = store
        .submit(id, &features(&[Point2D::new(2000.0, 2000.0)], 0.9))
        .unwrap();
    assert_eq!(report.observation_id, Some(ObservationId(3)));
    assert_eq!(report.stats.node_count, graph.nodes().len() + 1);
}

#[test]
fn test_restored_session_fuses_after_empty_observation() {
    let store = SessionStore::default();
    let id = store.create_session();

    // A photograph without detections still uses up an observation id
    let empty = store.submit(id, &ExtractedFeatures::default()).unwrap();
    let first = store
        .submit(id, &features(&[Point2D::new(0.0, 0.0)], 0.8))
        .unwrap();
    assert_eq!(empty.observation_id, Some(ObservationId(1)));
    assert_eq!(first.observation_id, Some(ObservationId(2)));

    let snapshot = store.destroy_session(id).unwrap();
    let json = snapshot.to_json().unwrap();
    let restored = store
        .restore_session(AccumulatorSnapshot::from_json(&json).unwrap())
        .unwrap();

    let again = store
        .submit(restored, &features(&[Point2D::new(2.0, 0.0)], 0.8))
        .unwrap();
    assert_eq!(again.observation_id, Some(ObservationId(3)));
    assert_eq!(again.nodes_updated, 1);
    assert_eq!(again.nodes_added, 0);
    assert_eq!(again.stats.node_count, 1);
}

#[test]
fn test_import_rejects_bad_snapshots() {
    let graph = accumulated_graph();

    let mut wrong_version = graph.export();
    wrong_version.version = SNAPSHOT_VERSION + 1;
    assert!(matches!(
        SpatialGraph::import(wrong_version),
        Err(PadaError::UnsupportedSnapshotVersion(_))
    ));

    let mut shuffled = graph.export();
    shuffled.nodes.swap(0, 1);
    assert!(matches!(
        SpatialGraph::import(shuffled),
        Err(PadaError::InvalidSnapshot(_))
    ));

    let mut non_finite = graph.export();
    non_finite.nodes[0].position.x = f64::NAN;
    assert!(matches!(
        SpatialGraph::import(non_finite),
        Err(PadaError::InvalidSnapshot(_))
    ));

    assert!(matches!(
        AccumulatorSnapshot::from_json("not json"),
        Err(PadaError::Snapshot(_))
    ));
}

#[test]
fn test_import_clamps_confidence() {
    let mut snapshot = accumulated_graph().export();
    snapshot.nodes[0].confidence = 1.7;
    snapshot.nodes[1].confidence = 0.0;

    let graph = SpatialGraph::import(snapshot).unwrap();
    assert_relative_eq!(graph.nodes()[0].confidence, 1.0);
    assert_relative_eq!(graph.nodes()[1].confidence, 0.1);
}

#[test]
fn test_config_file_loading() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "features:\n  min_confidence: 0.4\ngraph:\n  fusion_radius: 18.0\nalignment:\n  seed: 7\nsimilarity:\n  allow_mirroring: false"
    )
    .unwrap();

    let config = PadaConfig::load(file.path()).unwrap();
    assert_eq!(config.features.min_confidence, 0.4);
    assert_eq!(config.graph.fusion_radius, 18.0);
    assert_eq!(config.alignment.seed, 7);
    assert!(!config.similarity.allow_mirroring);
    assert_eq!(config.similarity.match_class, Some(ClassTag::Protector));

    let engine = config.similarity_engine();
    assert!(!engine.config().allow_mirroring);
}

#[test]
fn test_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        PadaConfig::load(&dir.path().join("absent.yaml")),
        Err(ConfigLoadError::Io(_))
    ));
}

#[test]
fn test_detector_payload_file() {
    let payload = serde_json::json!({
        "predictions": [
            {"class": "protector", "confidence": 0.9,
             "points": [{"x": 0, "y": 0}, {"x": 10, "y": 0}, {"x": 10, "y": 10}, {"x": 0, "y": 10}]},
            {"class": "heel", "confidence": 0.8,
             "points": [{"x": 100, "y": 100}, {"x": 160, "y": 100}, {"x": 130, "y": 150}]},
            {"class": "protector", "confidence": 0.9, "points": [{"x": "a", "y": 1}]},
            {"class": "laces", "confidence": 0.9,
             "points": [{"x": 0, "y": 0}, {"x": 1, "y": 0}, {"x": 1, "y": 1}]}
        ]
    });

    let features = FeatureExtractor::default().extract_json(&payload);
    assert_eq!(features.accepted(), 2);
    assert_eq!(features.skipped.total(), 2);

    let mut graph = SpatialGraph::default();
    let report = graph.add_features(&features, ObservationId(1));
    assert_eq!(report.nodes_added, 2);
    assert_eq!(report.contours_added, 2);
    assert_eq!(graph.stats().nodes_by_class.get(&ClassTag::Heel), Some(&1));
}
