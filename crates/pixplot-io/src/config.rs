//! Complete conversion configuration: pipeline stages plus G-code
//! emission.

use std::path::{Path, PathBuf};

use pixplot_export::{GCodeConfig, GCodeConfigError};
use pixplot_pipeline::{PipelineConfig, PipelineError};
use serde::{Deserialize, Serialize};

/// Every option of a conversion request.
///
/// Serializes as `{"pipeline": {...}, "gcode": {...}}`; missing sections
/// and fields take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Image-to-toolpath stages.
    pub pipeline: PipelineConfig,
    /// Machine parameters for the emitted program.
    pub gcode: GCodeConfig,
}

impl ConversionConfig {
    /// Validate both halves.
    ///
    /// # Errors
    ///
    /// Returns the first problem found, pipeline before G-code.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pipeline.validate()?;
        self.gcode.validate()?;
        Ok(())
    }

    /// Read a JSON configuration file.
    ///
    /// The result is not validated.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigFileError`] if the file cannot be read or parsed.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigFileError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigFileError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// A configuration value is out of range.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Rejected by the pipeline.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Rejected by the G-code emitter.
    #[error("invalid G-code configuration: {0}")]
    GCode(#[from] GCodeConfigError),
}

/// A configuration file could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    /// The file could not be read.
    #[error("failed to read config file {}", path.display())]
    Read {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid configuration JSON.
    #[error("failed to parse config file {}", path.display())]
    Parse {
        /// File that was parsed.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
}
