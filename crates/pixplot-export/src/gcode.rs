//! G-code export serializer.
//!
//! Converts an ordered [`ToolpathPlan`] into a line-oriented G-code
//! program for pen plotters, laser engravers and similar single-tool
//! machines.
//!
//! ## Dialect
//!
//! - Millimetres (`G21`), absolute positioning (`G90`).
//! - `G0` travel moves and `G1` drawing moves, each tagged with a feed
//!   rate.
//! - Tool up/down are configurable raw command lines (a Z move by
//!   default, but `M3`/`M5` style laser switching works too).
//! - No arcs, no tool changes, no spindle speed.
//!
//! ## Coordinates
//!
//! Image pixel coordinates are transformed in this order: optional Y
//! flip (`y' = (height - 1) - y`), scale by `units_per_pixel`, then
//! translate by `origin_offset`. Values are printed with three decimal
//! places, trailing zeros trimmed down to a single decimal digit.
//!
//! This is a pure function with no I/O: it returns a [`GCodeProgram`].

use std::fmt;

use pixplot_pipeline::{Dimensions, Path, Point, ToolpathPlan};
use serde::{Deserialize, Serialize};

/// Decimal places printed for coordinates and feed rates.
pub const PRECISION: usize = 3;

/// What to do with paths whose points all coincide (isolated pixels).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DotPolicy {
    /// Emit nothing for the path.
    Skip,
    /// Travel to the point and lower then raise the tool, leaving a dot.
    #[default]
    Dab,
}

/// Machine parameters for G-code emission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GCodeConfig {
    /// Command line that lifts the tool off the work.
    pub tool_up: String,
    /// Command line that lowers the tool onto the work.
    pub tool_down: String,
    /// Feed rate for drawing moves (units/min).
    pub feed_rate: f64,
    /// Feed rate for travel moves (units/min).
    pub travel_feed_rate: f64,
    /// Pause after lowering the tool, in milliseconds. `0` disables the
    /// `G4` dwell.
    pub dwell_ms: u32,
    /// Machine units per image pixel.
    pub units_per_pixel: f64,
    /// Added to every coordinate after scaling.
    pub origin_offset: Point,
    /// Flip the Y axis so the image's top row lands at the highest Y.
    pub invert_y: bool,
    /// Handling of degenerate single-point paths.
    pub dot_policy: DotPolicy,
}

impl GCodeConfig {
    /// Default tool-up command.
    pub const DEFAULT_TOOL_UP: &'static str = "G1 Z5";
    /// Default tool-down command.
    pub const DEFAULT_TOOL_DOWN: &'static str = "G1 Z0";
    /// Default drawing feed rate.
    pub const DEFAULT_FEED_RATE: f64 = 1000.0;
    /// Default travel feed rate.
    pub const DEFAULT_TRAVEL_FEED_RATE: f64 = 3000.0;

    /// Check every field against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns the first offending field as a [`GCodeConfigError`].
    pub fn validate(&self) -> Result<(), GCodeConfigError> {
        for (field, command) in [("tool_up", &self.tool_up), ("tool_down", &self.tool_down)] {
            if command.trim().is_empty() || command.contains(['\n', '\r']) {
                return Err(GCodeConfigError::InvalidCommand {
                    field,
                    command: command.clone(),
                });
            }
        }
        for (field, value) in [
            ("feed_rate", self.feed_rate),
            ("travel_feed_rate", self.travel_feed_rate),
            ("units_per_pixel", self.units_per_pixel),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(GCodeConfigError::NotPositive { field, value });
            }
        }
        if !self.origin_offset.x.is_finite() || !self.origin_offset.y.is_finite() {
            return Err(GCodeConfigError::NonFiniteOffset {
                x: self.origin_offset.x,
                y: self.origin_offset.y,
            });
        }
        Ok(())
    }

    /// Map an image-space point to machine coordinates.
    fn transform(&self, point: Point, dimensions: Dimensions) -> Point {
        let y = if self.invert_y {
            f64::from(dimensions.height) - 1.0 - point.y
        } else {
            point.y
        };
        Point::new(
            point.x.mul_add(self.units_per_pixel, self.origin_offset.x),
            y.mul_add(self.units_per_pixel, self.origin_offset.y),
        )
    }
}

impl Default for GCodeConfig {
    fn default() -> Self {
        Self {
            tool_up: Self::DEFAULT_TOOL_UP.to_owned(),
            tool_down: Self::DEFAULT_TOOL_DOWN.to_owned(),
            feed_rate: Self::DEFAULT_FEED_RATE,
            travel_feed_rate: Self::DEFAULT_TRAVEL_FEED_RATE,
            dwell_ms: 0,
            units_per_pixel: 1.0,
            origin_offset: Point::new(0.0, 0.0),
            invert_y: false,
            dot_policy: DotPolicy::default(),
        }
    }
}

/// Invalid G-code emission parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GCodeConfigError {
    /// A tool command is empty or spans several lines.
    #[error("{field} must be a single non-empty command line, got {command:?}")]
    InvalidCommand {
        /// Offending field name.
        field: &'static str,
        /// Rejected command text.
        command: String,
    },

    /// A rate or scale is zero, negative or not finite.
    #[error("{field} must be positive and finite, got {value}")]
    NotPositive {
        /// Offending field name.
        field: &'static str,
        /// Rejected value.
        value: f64,
    },

    /// The origin offset has a non-finite component.
    #[error("origin_offset must be finite, got ({x}, {y})")]
    NonFiniteOffset {
        /// X component.
        x: f64,
        /// Y component.
        y: f64,
    },
}

/// Metadata to embed as `;`-prefixed comment lines before the header.
///
/// All fields are optional. When present, the corresponding comment
/// line is emitted. Controllers ignore everything after `;`.
#[derive(Debug, Clone, Default)]
pub struct GCodeMetadata<'a> {
    /// Source image filename, emitted as `; Source: <filename>`.
    pub source: Option<&'a str>,

    /// Full configuration JSON, emitted as `; Config: <json>`.
    ///
    /// Allows reproducing the exact same output later.
    pub config_json: Option<&'a str>,
}

/// An append-only sequence of G-code lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GCodeProgram {
    lines: Vec<String>,
}

impl GCodeProgram {
    /// Create an empty program.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Append one line.
    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// All lines in order, without terminators.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of lines.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether no lines have been appended.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Each line followed by `\n`.
impl fmt::Display for GCodeProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Serialize a toolpath plan into a G-code program.
///
/// `dimensions` are the working-resolution dimensions the plan's
/// coordinates refer to; they are only used for the Y flip. The config
/// is assumed valid (see [`GCodeConfig::validate`]).
///
/// An empty plan yields only the header and trailer.
///
/// # Examples
///
/// ```
/// use pixplot_export::gcode::{GCodeConfig, GCodeMetadata, emit};
/// use pixplot_pipeline::{Dimensions, Path, Point, ToolpathPlan};
///
/// let plan = ToolpathPlan {
///     paths: vec![Path::new(vec![Point::new(1.0, 1.0), Point::new(2.0, 1.0)], false)],
///     total_travel: 0.0,
/// };
/// let dims = Dimensions { width: 4, height: 4 };
/// let program = emit(&plan, dims, &GCodeConfig::default(), &GCodeMetadata::default());
/// assert!(program.to_string().contains("G1 X2.0 Y1.0 F1000\n"));
/// ```
#[must_use]
pub fn emit(
    plan: &ToolpathPlan,
    dimensions: Dimensions,
    config: &GCodeConfig,
    metadata: &GCodeMetadata<'_>,
) -> GCodeProgram {
    let mut program = GCodeProgram::new();

    // --- Metadata comments ---
    if let Some(source) = metadata.source {
        for line in source.lines() {
            program.push(format!("; Source: {line}"));
        }
    }
    if let Some(config_json) = metadata.config_json {
        for line in config_json.lines() {
            program.push(format!("; Config: {line}"));
        }
    }

    // --- Header ---
    program.push("G21");
    program.push("G90");
    program.push(config.tool_up.as_str());

    // --- Paths ---
    let travel_feed = format_feed(config.travel_feed_rate);
    let draw_feed = format_feed(config.feed_rate);
    let mut skipped = 0_usize;

    for path in &plan.paths {
        let Some(&first) = path.points().first() else {
            continue;
        };
        if path.is_degenerate() && config.dot_policy == DotPolicy::Skip {
            skipped += 1;
            continue;
        }

        let start = config.transform(first, dimensions);
        program.push(format!(
            "G0 X{} Y{} F{travel_feed}",
            format_coord(start.x),
            format_coord(start.y),
        ));
        program.push(config.tool_down.as_str());
        if config.dwell_ms > 0 {
            program.push(format!("G4 P{}", config.dwell_ms));
        }

        if !path.is_degenerate() {
            for &point in drawing_points(path) {
                let p = config.transform(point, dimensions);
                program.push(format!(
                    "G1 X{} Y{} F{draw_feed}",
                    format_coord(p.x),
                    format_coord(p.y),
                ));
            }
            if path.is_closed() {
                program.push(format!(
                    "G1 X{} Y{} F{draw_feed}",
                    format_coord(start.x),
                    format_coord(start.y),
                ));
            }
        }

        program.push(config.tool_up.as_str());
    }

    // --- Trailer ---
    program.push(config.tool_up.as_str());
    program.push(format!("G0 X0.0 Y0.0 F{travel_feed}"));
    program.push("M2");

    tracing::debug!(
        paths = plan.paths.len(),
        skipped_dots = skipped,
        lines = program.len(),
        "emitted G-code"
    );

    program
}

/// Points after the entry point.
fn drawing_points(path: &Path) -> &[Point] {
    path.points().get(1..).unwrap_or_default()
}

/// Format a coordinate with [`PRECISION`] decimals, trimming trailing
/// zeros but keeping at least one decimal digit.
///
/// `-0.0` (and anything that rounds to it) prints as `0.0`.
#[must_use]
pub fn format_coord(value: f64) -> String {
    let mut s = format!("{:.*}", PRECISION, value);
    let trimmed_len = s.trim_end_matches('0').len();
    s.truncate(trimmed_len);
    if s.ends_with('.') {
        s.push('0');
    }
    if s == "-0.0" {
        s.remove(0);
    }
    s
}

/// Format a feed rate: integral values print without a decimal part.
fn format_feed(value: f64) -> String {
    let s = format_coord(value);
    match s.strip_suffix(".0") {
        Some(integral) => integral.to_owned(),
        None => s,
    }
}
