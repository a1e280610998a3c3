//! The top-level configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::features::{ExtractorConfig, FeatureExtractor};
use crate::graph::{AccumulatorConfig, SpatialGraph};
use crate::matching::AlignmentConfig;
use crate::similarity::{SimilarityConfig, SimilarityEngine};

use super::error::{ConfigLoadError, ConfigValidationError};

/// Path read by [`PadaConfig::load_default`].
pub const DEFAULT_CONFIG_PATH: &str = "configs/pada.yaml";

/// Full configuration, loaded from YAML.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PadaConfig {
    /// Feature extraction
    #[serde(default)]
    pub features: ExtractorConfig,

    /// Spatial graph accumulation
    #[serde(default)]
    pub graph: AccumulatorConfig,

    /// Rigid alignment
    #[serde(default)]
    pub alignment: AlignmentConfig,

    /// Decision thresholds
    #[serde(default)]
    pub similarity: SimilarityConfig,
}

impl PadaConfig {
    /// Load and validate configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load from [`DEFAULT_CONFIG_PATH`], or defaults when the file is absent.
    pub fn load_default() -> Result<Self, ConfigLoadError> {
        let path = Path::new(DEFAULT_CONFIG_PATH);
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse and validate a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| ConfigLoadError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, ConfigLoadError> {
        serde_yaml::to_string(self).map_err(|e| ConfigLoadError::Parse(e.to_string()))
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.features.validate()?;
        self.graph.validate()?;
        self.alignment.validate()?;
        self.similarity.validate()?;
        Ok(())
    }

    /// A feature extractor for this configuration.
    pub fn extractor(&self) -> FeatureExtractor {
        FeatureExtractor::new(self.features.clone())
    }

    /// An empty spatial graph for this configuration.
    pub fn new_graph(&self) -> SpatialGraph {
        SpatialGraph::new(self.graph.clone())
    }

    /// A similarity engine for this configuration.
    pub fn similarity_engine(&self) -> SimilarityEngine {
        SimilarityEngine::new(self.similarity.clone(), self.alignment.clone())
    }
}
