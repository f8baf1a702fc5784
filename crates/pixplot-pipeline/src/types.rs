//! Shared types for the pixplot conversion pipeline.

use serde::{Deserialize, Serialize};

use crate::contour::ContourTracerKind;

/// A 2D point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Distance from this point to the segment `a`-`b`.
    ///
    /// Projects onto the segment and clamps to its endpoints, so points
    /// beyond either end measure to the nearer endpoint. When `a` and `b`
    /// coincide this is the distance to `a`.
    #[must_use]
    pub fn distance_to_segment(self, a: Self, b: Self) -> f64 {
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let length_sq = dx.mul_add(dx, dy * dy);
        if length_sq == 0.0 {
            return self.distance(a);
        }
        let t = (self.x - a.x).mul_add(dx, (self.y - a.y) * dy) / length_sq;
        let t = t.clamp(0.0, 1.0);
        self.distance(Self::new(t.mul_add(dx, a.x), t.mul_add(dy, a.y)))
    }
}

/// A sequence of connected points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline(Vec<Point>);

impl Polyline {
    /// Create a new polyline from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns `true` if the polyline has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the polyline.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the first point, if any.
    #[must_use]
    pub fn first(&self) -> Option<&Point> {
        self.0.first()
    }

    /// Returns the last point, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Point> {
        self.0.last()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Consumes the polyline and returns the underlying vector of points.
    #[must_use]
    pub fn into_points(self) -> Vec<Point> {
        self.0
    }
}

/// Which side of a foreground region a contour runs along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BorderKind {
    /// The outer boundary of a connected foreground region.
    Outer,
    /// The boundary of a background hole enclosed by a foreground region.
    Hole,
}

/// A traced boundary of a foreground region.
///
/// Closed contours do not repeat their first point at the end; the
/// closing edge is implied by [`is_closed`](Self::is_closed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contour {
    polyline: Polyline,
    closed: bool,
    kind: BorderKind,
}

impl Contour {
    /// Create a contour from its points.
    #[must_use]
    pub const fn new(points: Vec<Point>, closed: bool, kind: BorderKind) -> Self {
        Self {
            polyline: Polyline::new(points),
            closed,
            kind,
        }
    }

    /// The contour's points in tracing order.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        self.polyline.points()
    }

    /// The contour's points as a polyline.
    #[must_use]
    pub const fn polyline(&self) -> &Polyline {
        &self.polyline
    }

    /// Number of points.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.polyline.len()
    }

    /// Returns `true` if the contour has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.polyline.is_empty()
    }

    /// Whether the last point connects back to the first.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Outer boundary or hole boundary.
    #[must_use]
    pub const fn kind(&self) -> BorderKind {
        self.kind
    }
}

/// A simplified, drawable polyline: one continuous tool-down stroke.
///
/// Paths are never mutated after creation. Reordering and reversal
/// produce new values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    polyline: Polyline,
    closed: bool,
}

impl Path {
    /// Create a path from its points.
    #[must_use]
    pub const fn new(points: Vec<Point>, closed: bool) -> Self {
        Self {
            polyline: Polyline::new(points),
            closed,
        }
    }

    /// The path's points in drawing order.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        self.polyline.points()
    }

    /// Number of points.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.polyline.len()
    }

    /// Returns `true` if the path has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.polyline.is_empty()
    }

    /// Whether drawing returns to the first point after the last.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Where the tool goes down.
    #[must_use]
    pub fn entry(&self) -> Option<Point> {
        self.polyline.first().copied()
    }

    /// Where the tool lifts: the last point, or the first point for a
    /// closed path since drawing finishes along the closing edge.
    #[must_use]
    pub fn exit(&self) -> Option<Point> {
        if self.closed {
            self.polyline.first().copied()
        } else {
            self.polyline.last().copied()
        }
    }

    /// The same path drawn in the opposite direction.
    #[must_use]
    pub fn reversed(&self) -> Self {
        let mut points = self.polyline.points().to_vec();
        points.reverse();
        Self::new(points, self.closed)
    }

    /// Returns `true` when every point coincides with the first, i.e. the
    /// path draws nothing but a dot.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        let points = self.polyline.points();
        points.first().is_none_or(|&first| points.iter().all(|&p| p == first))
    }

    /// Total tool-down drawing distance, including the closing edge.
    #[must_use]
    pub fn draw_length(&self) -> f64 {
        let points = self.polyline.points();
        let open: f64 = points.windows(2).map(|w| w[0].distance(w[1])).sum();
        match (self.closed, points.first(), points.last()) {
            (true, Some(&first), Some(&last)) => open + last.distance(first),
            _ => open,
        }
    }
}

impl From<&Contour> for Path {
    fn from(contour: &Contour) -> Self {
        Self::new(contour.points().to_vec(), contour.is_closed())
    }
}

/// Paths in visit order, produced by the toolpath optimizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolpathPlan {
    /// Paths in the order they are drawn, each possibly reversed.
    pub paths: Vec<Path>,
    /// Sum of tool-up travel between consecutive paths.
    pub total_travel: f64,
}

impl ToolpathPlan {
    /// A plan with nothing to draw.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            paths: Vec::new(),
            total_travel: 0.0,
        }
    }

    /// Total number of points across all paths.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.paths.iter().map(Path::len).sum()
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// A 2D grid of foreground (`true`) / background (`false`) pixels.
///
/// Width and height are always non-zero. An all-background mask is
/// valid and traces to no contours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryMask {
    width: u32,
    height: u32,
    pixels: Vec<bool>,
}

impl BinaryMask {
    /// Build a mask by evaluating `f(x, y)` for every pixel.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if either dimension is zero.
    pub fn from_fn(
        width: u32,
        height: u32,
        mut f: impl FnMut(u32, u32) -> bool,
    ) -> Result<Self, PipelineError> {
        if width == 0 || height == 0 {
            return Err(PipelineError::InvalidConfig(format!(
                "mask dimensions must be non-zero, got {width}x{height}"
            )));
        }
        let pixels = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| f(x, y))
            .collect();
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Mask width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Mask height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Mask dimensions.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width,
            height: self.height,
        }
    }

    /// Whether the pixel at `(x, y)` is foreground. Out-of-bounds
    /// coordinates are background.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    /// Number of foreground pixels.
    #[must_use]
    pub fn foreground_count(&self) -> usize {
        self.pixels.iter().filter(|&&p| p).count()
    }
}

/// Configuration for the raster-to-toolpath pipeline (stages 1-4).
///
/// Every field falls back to its default when missing from serialized
/// input. Call [`validate`](Self::validate) before running the pipeline;
/// [`crate::process`] does so itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Intensity cutoff (0-255). A pixel is foreground when its
    /// intensity is at or below this value.
    ///
    /// Wider than `u8` so out-of-range requests can be represented and
    /// rejected by [`validate`](Self::validate).
    pub threshold: u16,

    /// Flip mask polarity: foreground when intensity is above
    /// `threshold` (light-on-dark artwork).
    pub invert: bool,

    /// Longest allowed image axis before area-averaging downsampling.
    pub max_dimension: u32,

    /// Gaussian blur sigma applied to the intensity image before
    /// thresholding. `0.0` disables blurring.
    pub blur_sigma: f32,

    /// Which contour tracing algorithm to use.
    pub contour_tracer: ContourTracerKind,

    /// Trace boundaries of holes inside foreground regions.
    pub include_holes: bool,

    /// Enable path simplification and travel optimization. When `false`,
    /// traced contours are emitted point-for-point in discovery order.
    pub simplify: bool,

    /// Ramer-Douglas-Peucker tolerance in pixels. Zero or negative
    /// keeps every point.
    pub simplify_tolerance: f64,
}

impl PipelineConfig {
    /// Default intensity threshold.
    pub const DEFAULT_THRESHOLD: u16 = 128;
    /// Default working resolution (longest axis, pixels).
    pub const DEFAULT_MAX_DIMENSION: u32 = 500;
    /// Default blur sigma (disabled).
    pub const DEFAULT_BLUR_SIGMA: f32 = 0.0;
    /// Default simplification tolerance in pixels.
    pub const DEFAULT_SIMPLIFY_TOLERANCE: f64 = 1.0;

    /// Check every field against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] describing the first
    /// offending field.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.threshold > u16::from(u8::MAX) {
            return Err(PipelineError::InvalidConfig(format!(
                "threshold must be in 0..=255, got {}",
                self.threshold
            )));
        }
        if self.max_dimension == 0 {
            return Err(PipelineError::InvalidConfig(
                "max_dimension must be positive".to_owned(),
            ));
        }
        if !self.blur_sigma.is_finite() || self.blur_sigma < 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "blur_sigma must be finite and non-negative, got {}",
                self.blur_sigma
            )));
        }
        if self.simplify_tolerance.is_nan() {
            return Err(PipelineError::InvalidConfig(
                "simplify_tolerance must be a number".to_owned(),
            ));
        }
        Ok(())
    }

    /// The threshold as an intensity value. Only meaningful after
    /// [`validate`](Self::validate) succeeded; larger values saturate.
    #[must_use]
    pub fn threshold_u8(&self) -> u8 {
        u8::try_from(self.threshold).unwrap_or(u8::MAX)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            threshold: Self::DEFAULT_THRESHOLD,
            invert: false,
            max_dimension: Self::DEFAULT_MAX_DIMENSION,
            blur_sigma: Self::DEFAULT_BLUR_SIGMA,
            contour_tracer: ContourTracerKind::default(),
            include_holes: true,
            simplify: true,
            simplify_tolerance: Self::DEFAULT_SIMPLIFY_TOLERANCE,
        }
    }
}

/// Result of running the full pipeline.
///
/// Contains the ordered toolpath plan and the working-resolution
/// dimensions the coordinates refer to. The G-code emitter needs the
/// dimensions to flip the Y axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessResult {
    /// Paths in visit order.
    pub plan: ToolpathPlan,

    /// Dimensions of the binary mask (after downsampling).
    pub dimensions: Dimensions,
}

/// Result of running the pipeline with every intermediate preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedResult {
    /// Stage 1: thresholded mask.
    pub mask: BinaryMask,
    /// Stage 2: traced contours in discovery order.
    pub contours: Vec<Contour>,
    /// Stage 3: simplified paths, same order as `contours`.
    pub paths: Vec<Path>,
    /// Stage 4: ordered plan.
    pub plan: ToolpathPlan,
}

impl StagedResult {
    /// Drop the intermediates, keeping only what the emitter needs.
    #[must_use]
    pub fn into_result(self) -> ProcessResult {
        ProcessResult {
            dimensions: self.mask.dimensions(),
            plan: self.plan,
        }
    }
}

/// Errors that can occur during pipeline processing.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Pipeline configuration is invalid.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),
}
