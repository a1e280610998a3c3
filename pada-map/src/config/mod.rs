//! Unified configuration loading.
//!
//! All tunables live in one YAML file; every section and field is optional
//! and falls back to its default.
//!
//! ```rust,ignore
//! use pada_map::config::PadaConfig;
//!
//! // Load from default path (configs/pada.yaml), or defaults if absent
//! let config = PadaConfig::load_default()?;
//!
//! let extractor = config.extractor();
//! let graph = config.new_graph();
//! let engine = config.similarity_engine();
//! ```
//!
//! ## Configuration Sections
//!
//! | Section | Type |
//! |---------|------|
//! | `features` | [`ExtractorConfig`](crate::features::ExtractorConfig) |
//! | `graph` | [`AccumulatorConfig`](crate::graph::AccumulatorConfig) |
//! | `alignment` | [`AlignmentConfig`](crate::matching::AlignmentConfig) |
//! | `similarity` | [`SimilarityConfig`](crate::similarity::SimilarityConfig) |
//!
//! ## Example YAML
//!
//! ```yaml
//! graph:
//!   fusion_radius: 25.0
//!   decay_rate: 0.02
//! alignment:
//!   inlier_threshold: 20.0
//!   seed: 42
//! similarity:
//!   allow_mirroring: true
//!   thresholds:
//!     match_threshold: 0.7
//! ```

mod error;
mod pada;

pub use error::{ConfigLoadError, ConfigValidationError};
pub use pada::{DEFAULT_CONFIG_PATH, PadaConfig};
