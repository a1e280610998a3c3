//! Configuration errors.

/// A configuration value is out of its valid range.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigValidationError {
    /// Invalid configuration value.
    #[error("Invalid config: {0}")]
    InvalidValue(String),
}

impl ConfigValidationError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        ConfigValidationError::InvalidValue(msg.into())
    }
}

/// Error while loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Parsed, but a value is out of range
    #[error(transparent)]
    Invalid(#[from] ConfigValidationError),
}
