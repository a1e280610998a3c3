//! Build a pattern model from detector outputs and compare a fragment.
//!
//! Usage:
//!   pada_match --model obs1.json --model obs2.json --fragment photo.json
//!   pada_match --model obs*.json --export model.json
//!   pada_match --snapshot model.json --fragment photo.json --quick
//!
//! Observation files hold the raw detector payload: an array of predictions
//! or an object with a `predictions` array.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use log::{error, info, warn};

use pada_map::config::PadaConfig;
use pada_map::features::{ExtractedFeatures, FeatureExtractor};
use pada_map::graph::SpatialGraph;
use pada_map::io::{AccumulatorSnapshot, decision_to_json};
use pada_map::similarity::MatchThresholds;

/// Accumulate observations into a model and compare a fragment against it
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path (defaults to configs/pada.yaml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Observation files to accumulate, in order
    #[arg(short, long = "model", num_args = 1..)]
    models: Vec<PathBuf>,

    /// Start from an exported snapshot instead of an empty model
    #[arg(short, long)]
    snapshot: Option<PathBuf>,

    /// Fragment observation to compare against the model
    #[arg(short, long)]
    fragment: Option<PathBuf>,

    /// Consensus threshold override
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Use the looser quick-check thresholds
    #[arg(long)]
    quick: bool,

    /// Disable mirrored alignment
    #[arg(long)]
    no_mirror: bool,

    /// Write the accumulated model snapshot here
    #[arg(short, long)]
    export: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> pada_map::Result<()> {
    let mut config = match &args.config {
        Some(path) => PadaConfig::load(path)?,
        None => PadaConfig::load_default()?,
    };
    if let Some(threshold) = args.threshold {
        config.similarity.consensus_threshold = threshold;
    }
    if args.no_mirror {
        config.similarity.allow_mirroring = false;
    }
    if args.quick {
        config.similarity.thresholds = MatchThresholds::quick();
    }
    config.validate().map_err(pada_map::config::ConfigLoadError::from)?;

    let extractor = config.extractor();
    let mut graph = match &args.snapshot {
        Some(path) => SpatialGraph::import(AccumulatorSnapshot::load(path)?)?,
        None => config.new_graph(),
    };

    for path in &args.models {
        let features = read_observation(&extractor, path)?;
        let observation = graph.next_observation_id();
        let report = graph.add_features(&features, observation);
        info!(
            "{}: +{} nodes, {} reinforced, {} skipped",
            path.display(),
            report.nodes_added,
            report.nodes_updated,
            report.skipped + features.skipped.total()
        );
    }

    let stats = graph.stats();
    info!(
        "Model: {} nodes, {} edges, {} contours, mean confidence {:.2}",
        stats.node_count, stats.edge_count, stats.contour_count, stats.mean_confidence
    );

    if let Some(path) = &args.export {
        graph.export().save(path)?;
        info!("Exported snapshot to {}", path.display());
    }

    let Some(fragment_path) = &args.fragment else {
        if args.export.is_none() {
            warn!("Nothing to do: pass --fragment and/or --export");
        }
        return Ok(());
    };

    let fragment = read_observation(&extractor, fragment_path)?;
    let model = graph.consensus(config.similarity.consensus_threshold);
    let report = config
        .similarity_engine()
        .compare_with_model_detailed(&model, &fragment);

    if let Some(alignment) = &report.alignment {
        info!(
            "Alignment: {} inliers, rotation {:.1}°, mirrored={}",
            alignment.inlier_count(),
            alignment.rotation_degrees(),
            alignment.mirrored
        );
    }
    if let Some(failure) = report.failure {
        warn!("Comparison stopped at {:?}: {:?}", report.stage(), failure);
    }

    println!("{}", decision_to_json(&report.decision)?);
    Ok(())
}

fn read_observation(extractor: &FeatureExtractor, path: &Path) -> pada_map::Result<ExtractedFeatures> {
    let contents = std::fs::read_to_string(path)?;
    let payload: serde_json::Value = serde_json::from_str(&contents)?;
    Ok(extractor.extract_json(&payload))
}
