//! Pipeline diagnostics: timing and counts for each stage.
//!
//! Collected by [`process_staged_with_diagnostics`](crate::process_staged_with_diagnostics)
//! for parameter tuning. Durations are serialized as fractional seconds
//! (`f64`) for JSON compatibility, since `std::time::Duration` does not
//! implement serde traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{BorderKind, Contour, Path};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Stage 1: intensity conversion, downsampling, blur, threshold.
    pub preprocess: StageDiagnostics,
    /// Stage 2: contour tracing.
    pub contour_tracing: StageDiagnostics,
    /// Stage 3: RDP path simplification.
    pub simplification: StageDiagnostics,
    /// Stage 4: travel optimization.
    pub optimization: StageDiagnostics,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics that vary by pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Preprocessing metrics.
    Preprocess {
        /// Decoded image width in pixels.
        source_width: u32,
        /// Decoded image height in pixels.
        source_height: u32,
        /// Mask width in pixels.
        width: u32,
        /// Mask height in pixels.
        height: u32,
        /// Whether area-averaging downsampling was applied.
        downsampled: bool,
        /// Number of foreground pixels in the mask.
        foreground_pixels: usize,
    },
    /// Contour tracing metrics.
    ContourTracing {
        /// Number of contours kept (holes included when enabled).
        contour_count: usize,
        /// Number of hole contours among them.
        hole_count: usize,
        /// Total number of points across all contours.
        total_point_count: usize,
    },
    /// Path simplification metrics.
    Simplification {
        /// Tolerance actually applied (0 when simplification is disabled).
        tolerance: f64,
        /// Total points before simplification.
        points_before: usize,
        /// Total points after simplification.
        points_after: usize,
        /// Reduction ratio: `1.0 - (after / before)`.
        reduction_ratio: f64,
    },
    /// Travel optimization metrics.
    Optimization {
        /// Number of paths in the plan.
        path_count: usize,
        /// Travel in discovery order.
        travel_before: f64,
        /// Travel in the planned order.
        travel_after: f64,
    },
}

impl PipelineDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());
        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        let stages = [
            ("Preprocess", &self.preprocess),
            ("Contour Tracing", &self.contour_tracing),
            ("Simplification", &self.simplification),
            ("Optimization", &self.optimization),
        ];

        for (name, diag) in stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
const fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Preprocess {
            source_width,
            source_height,
            width,
            height,
            downsampled,
            foreground_pixels,
        } => {
            let resize = if *downsampled { " (downsampled)" } else { "" };
            format!(
                "{source_width}x{source_height} -> {width}x{height}{resize}, {foreground_pixels} fg px",
            )
        }
        StageMetrics::ContourTracing {
            contour_count,
            hole_count,
            total_point_count,
        } => format!("{contour_count} contours ({hole_count} holes), {total_point_count} pts"),
        StageMetrics::Simplification {
            tolerance,
            points_before,
            points_after,
            reduction_ratio,
        } => format!(
            "tol={tolerance:.2} {points_before}->{points_after} pts ({:.1}% reduction)",
            reduction_ratio * 100.0,
        ),
        StageMetrics::Optimization {
            path_count,
            travel_before,
            travel_after,
        } => format!("{path_count} paths, travel {travel_before:.1} -> {travel_after:.1}"),
    }
}

/// Total points across a slice of contours.
pub(crate) fn contour_points(contours: &[Contour]) -> usize {
    contours.iter().map(Contour::len).sum()
}

/// Number of hole contours.
pub(crate) fn hole_count(contours: &[Contour]) -> usize {
    contours
        .iter()
        .filter(|c| c.kind() == BorderKind::Hole)
        .count()
}

/// Total points across a slice of paths.
pub(crate) fn path_points(paths: &[Path]) -> usize {
    paths.iter().map(Path::len).sum()
}

/// `1.0 - after / before`, or zero when there was nothing to reduce.
#[allow(clippy::cast_precision_loss)]
pub(crate) const fn reduction_ratio(before: usize, after: usize) -> f64 {
    if before == 0 {
        0.0
    } else {
        1.0 - after as f64 / before as f64
    }
}
