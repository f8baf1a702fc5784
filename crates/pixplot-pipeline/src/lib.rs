//! pixplot-pipeline: Pure raster-to-toolpath pipeline (sans-IO).
//!
//! Converts raster images into ordered drawing paths through:
//! intensity -> downsample -> blur -> threshold -> contour tracing ->
//! simplification -> travel optimization.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and returns structured data. Filesystem interaction lives
//! in `pixplot-io`, and G-code serialization in `pixplot-export`.

pub mod blur;
pub mod contour;
pub mod diagnostics;
pub mod downsample;
pub mod grayscale;
pub mod mask;
pub mod optimize;
pub mod simplify;
pub mod types;

use std::time::Instant;

use image::DynamicImage;

pub use contour::{ContourTracer, ContourTracerKind};
pub use diagnostics::{PipelineDiagnostics, StageDiagnostics, StageMetrics};
pub use types::{
    BinaryMask, BorderKind, Contour, Dimensions, Path, PipelineConfig, PipelineError, Point,
    Polyline, ProcessResult, StagedResult, ToolpathPlan,
};

/// Output of the preprocessing stage plus what diagnostics need to know
/// about it.
struct Preprocessed {
    mask: BinaryMask,
    source: Dimensions,
    downsampled: bool,
}

/// Stage 1: turn a decoded image into a binary mask.
///
/// Converts to intensity, downsamples to `config.max_dimension`, applies
/// the optional blur and thresholds.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `config` is invalid or the
/// image has a zero dimension.
pub fn preprocess(
    image: &DynamicImage,
    config: &PipelineConfig,
) -> Result<BinaryMask, PipelineError> {
    config.validate()?;
    preprocess_inner(image, config).map(|p| p.mask)
}

fn preprocess_inner(
    image: &DynamicImage,
    config: &PipelineConfig,
) -> Result<Preprocessed, PipelineError> {
    let intensity = grayscale::to_intensity(image);
    let source = Dimensions {
        width: intensity.width(),
        height: intensity.height(),
    };
    let (resized, downsampled) = downsample::downsample(&intensity, config.max_dimension);
    let blurred = blur::gaussian_blur(&resized, config.blur_sigma);
    let mask = mask::threshold(&blurred, config.threshold_u8(), config.invert)?;

    tracing::debug!(
        source_width = source.width,
        source_height = source.height,
        width = mask.width(),
        height = mask.height(),
        downsampled,
        foreground = mask.foreground_count(),
        "preprocessed"
    );

    Ok(Preprocessed {
        mask,
        source,
        downsampled,
    })
}

/// Stages 2-4 on a finished mask: trace, simplify, optimize.
///
/// With `config.simplify` disabled, contours become paths point-for-point
/// and keep their discovery order.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `config` is invalid.
pub fn process_mask(
    mask: BinaryMask,
    config: &PipelineConfig,
) -> Result<StagedResult, PipelineError> {
    config.validate()?;
    Ok(run_stages(
        Preprocessed {
            source: mask.dimensions(),
            mask,
            downsampled: false,
        },
        config,
        &mut NoTimings,
    ))
}

/// Run the full image processing pipeline.
///
/// Takes raw image bytes (PNG, JPEG, BMP, WebP) and a configuration,
/// then produces a [`ProcessResult`] containing the ordered toolpath
/// plan and the working-resolution dimensions. The dimensions are needed
/// by the G-code emitter to flip the Y axis.
///
/// # Pipeline steps
///
/// 1. Decode image, convert to intensity, downsample, blur, threshold
/// 2. Contour tracing (pluggable strategy)
/// 3. Path simplification (Ramer-Douglas-Peucker)
/// 4. Travel optimization (nearest-neighbor reordering)
///
/// An image with no foreground yields an empty plan, not an error.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `config` is invalid (checked
/// before decoding).
/// Returns [`PipelineError::EmptyInput`] if `image_bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is unrecognized.
pub fn process(
    image_bytes: &[u8],
    config: &PipelineConfig,
) -> Result<ProcessResult, PipelineError> {
    process_staged(image_bytes, config).map(StagedResult::into_result)
}

/// Run the pipeline on an already-decoded image.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `config` is invalid.
pub fn process_image(
    image: &DynamicImage,
    config: &PipelineConfig,
) -> Result<ProcessResult, PipelineError> {
    config.validate()?;
    let pre = preprocess_inner(image, config)?;
    Ok(run_stages(pre, config, &mut NoTimings).into_result())
}

/// Run the pipeline and keep every intermediate result.
///
/// # Errors
///
/// Same as [`process`].
pub fn process_staged(
    image_bytes: &[u8],
    config: &PipelineConfig,
) -> Result<StagedResult, PipelineError> {
    config.validate()?;
    let image = grayscale::decode(image_bytes)?;
    let pre = preprocess_inner(&image, config)?;
    Ok(run_stages(pre, config, &mut NoTimings))
}

/// Run the pipeline, keeping every intermediate result and collecting
/// per-stage timings and counts.
///
/// Decoding is timed as part of preprocessing.
///
/// # Errors
///
/// Same as [`process`].
pub fn process_staged_with_diagnostics(
    image_bytes: &[u8],
    config: &PipelineConfig,
) -> Result<(StagedResult, PipelineDiagnostics), PipelineError> {
    config.validate()?;
    let start = Instant::now();
    let image = grayscale::decode(image_bytes)?;
    staged_with_diagnostics(&image, config, start)
}

/// [`process_staged_with_diagnostics`] for an already-decoded image.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `config` is invalid.
pub fn process_image_with_diagnostics(
    image: &DynamicImage,
    config: &PipelineConfig,
) -> Result<(StagedResult, PipelineDiagnostics), PipelineError> {
    config.validate()?;
    staged_with_diagnostics(image, config, Instant::now())
}

fn staged_with_diagnostics(
    image: &DynamicImage,
    config: &PipelineConfig,
    start: Instant,
) -> Result<(StagedResult, PipelineDiagnostics), PipelineError> {
    let pre = preprocess_inner(image, config)?;
    let preprocess = StageDiagnostics {
        duration: start.elapsed(),
        metrics: StageMetrics::Preprocess {
            source_width: pre.source.width,
            source_height: pre.source.height,
            width: pre.mask.width(),
            height: pre.mask.height(),
            downsampled: pre.downsampled,
            foreground_pixels: pre.mask.foreground_count(),
        },
    };

    let mut timings = Timings::default();
    let staged = run_stages(pre, config, &mut timings);

    let diagnostics = PipelineDiagnostics {
        preprocess,
        contour_tracing: StageDiagnostics {
            duration: timings.tracing,
            metrics: StageMetrics::ContourTracing {
                contour_count: staged.contours.len(),
                hole_count: diagnostics::hole_count(&staged.contours),
                total_point_count: diagnostics::contour_points(&staged.contours),
            },
        },
        simplification: {
            let before = diagnostics::contour_points(&staged.contours);
            let after = diagnostics::path_points(&staged.paths);
            StageDiagnostics {
                duration: timings.simplification,
                metrics: StageMetrics::Simplification {
                    tolerance: if config.simplify {
                        config.simplify_tolerance.max(0.0)
                    } else {
                        0.0
                    },
                    points_before: before,
                    points_after: after,
                    reduction_ratio: diagnostics::reduction_ratio(before, after),
                },
            }
        },
        optimization: StageDiagnostics {
            duration: timings.optimization,
            metrics: StageMetrics::Optimization {
                path_count: staged.plan.paths.len(),
                travel_before: optimize::travel_distance(&staged.paths),
                travel_after: staged.plan.total_travel,
            },
        },
        total_duration: start.elapsed(),
    };

    Ok((staged, diagnostics))
}

/// Receives per-stage durations from [`run_stages`].
trait StageTimer {
    fn record(&mut self, stage: Stage, duration: std::time::Duration);
}

#[derive(Clone, Copy)]
enum Stage {
    Tracing,
    Simplification,
    Optimization,
}

struct NoTimings;

impl StageTimer for NoTimings {
    fn record(&mut self, _stage: Stage, _duration: std::time::Duration) {}
}

#[derive(Default)]
struct Timings {
    tracing: std::time::Duration,
    simplification: std::time::Duration,
    optimization: std::time::Duration,
}

impl StageTimer for Timings {
    fn record(&mut self, stage: Stage, duration: std::time::Duration) {
        match stage {
            Stage::Tracing => self.tracing = duration,
            Stage::Simplification => self.simplification = duration,
            Stage::Optimization => self.optimization = duration,
        }
    }
}

fn run_stages(
    pre: Preprocessed,
    config: &PipelineConfig,
    timer: &mut impl StageTimer,
) -> StagedResult {
    let mask = pre.mask;

    // 2. Contour tracing.
    let start = Instant::now();
    let mut contours = config.contour_tracer.trace(&mask);
    if !config.include_holes {
        contours.retain(|c| c.kind() == BorderKind::Outer);
    }
    timer.record(Stage::Tracing, start.elapsed());
    tracing::debug!(
        contours = contours.len(),
        points = diagnostics::contour_points(&contours),
        "traced contours"
    );

    // 3. Simplification, then 4. travel optimization. Disabled together:
    // the unsimplified contours are drawn in discovery order.
    let start = Instant::now();
    let paths = if config.simplify {
        simplify::simplify_all(&contours, config.simplify_tolerance)
    } else {
        contours.iter().map(Path::from).collect()
    };
    timer.record(Stage::Simplification, start.elapsed());
    tracing::debug!(
        paths = paths.len(),
        points = diagnostics::path_points(&paths),
        "simplified paths"
    );

    let start = Instant::now();
    let plan = if config.simplify {
        optimize::optimize(&paths)
    } else {
        let ordered: Vec<Path> = paths.iter().filter(|p| !p.is_empty()).cloned().collect();
        ToolpathPlan {
            total_travel: optimize::travel_distance(&ordered),
            paths: ordered,
        }
    };
    timer.record(Stage::Optimization, start.elapsed());
    tracing::debug!(
        paths = plan.paths.len(),
        travel = plan.total_travel,
        "ordered toolpaths"
    );

    StagedResult {
        mask,
        contours,
        paths,
        plan,
    }
}
