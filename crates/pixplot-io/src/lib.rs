//! pixplot-io: Filesystem I/O for the conversion engine.
//!
//! Loads source images, validates configuration, runs the sans-IO
//! pipeline and G-code serializer, and writes the program atomically.
//! Everything here is one-shot: failures are returned to the caller,
//! never retried.

pub mod config;
pub mod convert;
pub mod error;
pub mod load;
pub mod write;

pub use config::{ConfigError, ConfigFileError, ConversionConfig};
pub use convert::{ConversionRequest, ConversionSummary, convert};
pub use error::{ConvertError, EmitError, ImageLoadError};
pub use load::load_image;
pub use write::write_program;
