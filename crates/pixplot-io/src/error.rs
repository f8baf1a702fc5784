//! Request-level errors.
//!
//! Every variant is terminal for its conversion request; nothing here is
//! retried.

use std::path::PathBuf;

use pixplot_pipeline::PipelineError;

use crate::config::ConfigError;

/// Why a conversion request failed.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// Configuration rejected before any file was touched.
    #[error("invalid configuration")]
    InvalidConfig(#[from] ConfigError),

    /// The source image could not be read or decoded.
    #[error("failed to load image {}", path.display())]
    ImageLoad {
        /// Source image path.
        path: PathBuf,
        /// What went wrong.
        #[source]
        source: ImageLoadError,
    },

    /// The program could not be written.
    #[error(transparent)]
    Emit(#[from] EmitError),
}

/// Cause of a [`ConvertError::ImageLoad`].
#[derive(Debug, thiserror::Error)]
pub enum ImageLoadError {
    /// Reading the file failed.
    #[error("read failed")]
    Read(#[from] std::io::Error),

    /// The bytes are empty, corrupt or an unsupported format.
    #[error("decode failed")]
    Decode(#[from] PipelineError),
}

/// Writing the G-code program to its destination failed.
///
/// No file is left at `path` when this is returned.
#[derive(Debug, thiserror::Error)]
#[error("failed to write G-code to {}", path.display())]
pub struct EmitError {
    /// Destination path.
    pub path: PathBuf,
    /// Underlying I/O error.
    #[source]
    pub source: std::io::Error,
}
