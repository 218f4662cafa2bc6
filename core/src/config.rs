//! Validation settings.
//!
//! Loaded from YAML so that projects with their own encoder packages can
//! extend the built-in registry without code changes.
//!
//! # Example YAML
//!
//! ```yaml
//! known_encoders:
//!   - application/json
//!   - application/msgpack
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::encoding::KNOWN_ENCODERS;
use crate::error::Result;

/// Settings that tune [`validate_design_with`](crate::validate_design_with).
///
/// # Examples
///
/// ```
/// use api_design_core::ValidationConfig;
///
/// let config = ValidationConfig::default();
/// assert!(config.is_known_encoder("application/json"));
/// assert!(!config.is_known_encoder("application/msgpack"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// MIME types that need no implementation package.
    #[serde(default = "default_known_encoders")]
    pub known_encoders: Vec<String>,
}

fn default_known_encoders() -> Vec<String> {
    KNOWN_ENCODERS.iter().map(|m| m.to_string()).collect()
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            known_encoders: default_known_encoders(),
        }
    }
}

impl ValidationConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](crate::DesignError::Io) if the file cannot be read, or
    /// [`Yaml`](crate::DesignError::Yaml) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](crate::DesignError::Io) if the file cannot be written,
    /// or [`Yaml`](crate::DesignError::Yaml) if serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Returns `true` if `mime_type` has a built-in or configured encoder.
    pub fn is_known_encoder(&self, mime_type: &str) -> bool {
        self.known_encoders.iter().any(|m| m == mime_type)
    }

    /// Returns the known MIME types, sorted, for diagnostics.
    pub fn sorted_known_encoders(&self) -> Vec<&str> {
        let mut known: Vec<&str> = self.known_encoders.iter().map(String::as_str).collect();
        known.sort_unstable();
        known
    }
}
