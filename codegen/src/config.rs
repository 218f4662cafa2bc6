//! Transform compiler settings, stored as YAML.
//!
//! ```yaml
//! unmatched_required: error
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// What to do with a required target field that no source field maps to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnmatchedRequiredPolicy {
    /// Leave the field at its zero value.
    #[default]
    Ignore,
    /// Fail the compile with [`UnmatchedRequired`](crate::TransformError::UnmatchedRequired).
    Error,
}

/// Settings for [`compile_transform_with`](crate::compile_transform_with).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformConfig {
    #[serde(default)]
    pub unmatched_required: UnmatchedRequiredPolicy,
}

impl TransformConfig {
    /// Returns a config that rejects unmatched required target fields.
    pub fn strict() -> Self {
        Self {
            unmatched_required: UnmatchedRequiredPolicy::Error,
        }
    }

    /// Loads configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let reader = BufReader::new(std::fs::File::open(path)?);
        Ok(serde_yaml::from_reader(reader)?)
    }

    /// Saves the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let writer = BufWriter::new(std::fs::File::create(path)?);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }
}
