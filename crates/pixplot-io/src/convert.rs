//! One conversion request: image file in, G-code file out.

use std::path::PathBuf;

use pixplot_export::{GCodeMetadata, emit};
use pixplot_pipeline::{Dimensions, PipelineDiagnostics, PipelineError};
use serde::Serialize;

use crate::config::{ConfigError, ConversionConfig};
use crate::error::ConvertError;
use crate::load::load_image;
use crate::write::write_program;

/// Inputs of a single conversion.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    /// Source raster image (PNG, JPEG, BMP, WebP).
    pub input: PathBuf,
    /// Destination for the G-code program.
    pub output: PathBuf,
    /// Pipeline and machine parameters.
    pub config: ConversionConfig,
    /// Prefix the program with `;` comments naming the source file and
    /// the full configuration.
    pub embed_metadata: bool,
}

impl ConversionRequest {
    /// A request with default configuration and no metadata comments.
    #[must_use]
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            config: ConversionConfig::default(),
            embed_metadata: false,
        }
    }
}

/// What a successful conversion produced.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionSummary {
    /// Working-resolution dimensions the toolpaths were traced at.
    pub dimensions: Dimensions,
    /// Paths in the plan, including dots.
    pub path_count: usize,
    /// Points across all planned paths.
    pub point_count: usize,
    /// Tool-up travel between paths, in pixels.
    pub total_travel: f64,
    /// Lines in the written program.
    pub line_count: usize,
    /// Per-stage timings and counts.
    pub diagnostics: PipelineDiagnostics,
}

/// Run one conversion request end to end.
///
/// Steps, each terminal on failure:
///
/// 1. Validate the configuration (no file is touched if this fails)
/// 2. Load and decode the source image
/// 3. Run the pipeline and serialize the plan
/// 4. Atomically write the program
///
/// # Errors
///
/// - [`ConvertError::InvalidConfig`] for out-of-range parameters.
/// - [`ConvertError::ImageLoad`] if the input is unreadable or corrupt.
/// - [`ConvertError::Emit`] if the output cannot be written; no partial
///   file is left behind.
pub fn convert(request: &ConversionRequest) -> Result<ConversionSummary, ConvertError> {
    let config = &request.config;
    config.validate()?;

    let image = load_image(&request.input)?;
    let (staged, diagnostics) =
        pixplot_pipeline::process_image_with_diagnostics(&image, &config.pipeline)
            .map_err(into_convert_error)?;
    let result = staged.into_result();

    let source_name = request
        .input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());
    let config_json = if request.embed_metadata {
        serde_json::to_string(config).ok()
    } else {
        None
    };
    let metadata = if request.embed_metadata {
        GCodeMetadata {
            source: source_name.as_deref(),
            config_json: config_json.as_deref(),
        }
    } else {
        GCodeMetadata::default()
    };

    let program = emit(&result.plan, result.dimensions, &config.gcode, &metadata);
    write_program(&program, &request.output)?;

    let summary = ConversionSummary {
        dimensions: result.dimensions,
        path_count: result.plan.paths.len(),
        point_count: result.plan.point_count(),
        total_travel: result.plan.total_travel,
        line_count: program.len(),
        diagnostics,
    };

    tracing::info!(
        input = %request.input.display(),
        output = %request.output.display(),
        width = summary.dimensions.width,
        height = summary.dimensions.height,
        paths = summary.path_count,
        lines = summary.line_count,
        "converted image to G-code"
    );

    Ok(summary)
}

/// The pipeline only fails on configuration once the image is decoded.
fn into_convert_error(err: PipelineError) -> ConvertError {
    ConvertError::InvalidConfig(ConfigError::Pipeline(err))
}
