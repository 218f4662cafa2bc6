//! Error types for loading designs and configuration files.
//!
//! Validation diagnostics are not errors of this kind: they are collected in
//! [`ValidationErrors`](crate::ValidationErrors).

use thiserror::Error;

/// Errors that can occur while reading or writing design and config files.
#[derive(Debug, Error)]
pub enum DesignError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Convenience alias for results with [`DesignError`].
pub type Result<T> = std::result::Result<T, DesignError>;
