//! Error types for pada-map.
//!
//! Noisy input never surfaces here: malformed detections are counted and
//! skipped, and failed comparisons yield a zero-confidence decision. These
//! errors cover session bookkeeping, persistence and configuration.

use crate::config::ConfigLoadError;
use crate::session::SessionId;

/// Result type alias
pub type Result<T> = std::result::Result<T, PadaError>;

/// pada-map error types
#[derive(Debug, thiserror::Error)]
pub enum PadaError {
    /// No session with this id
    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    /// No reference model with this name
    #[error("Reference model not found: {0}")]
    ReferenceNotFound(String),

    /// JSON could not be encoded or decoded
    #[error("JSON error: {0}")]
    Snapshot(String),

    /// Snapshot decoded but is structurally inconsistent
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// Snapshot written by an incompatible version
    #[error("Unsupported snapshot version: {0}")]
    UnsupportedSnapshotVersion(u32),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigLoadError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for PadaError {
    fn from(e: serde_json::Error) -> Self {
        PadaError::Snapshot(e.to_string())
    }
}
