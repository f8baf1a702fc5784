//! Contour tracing: extract boundary polylines from a binary mask.
//!
//! This module defines the [`ContourTracer`] trait for pluggable contour
//! tracing algorithms and the [`ContourTracerKind`] enum for selecting
//! which algorithm to use at runtime.
//!
//! # Output contract
//!
//! - Every 8-connected foreground region yields exactly one
//!   [`BorderKind::Outer`] contour; every enclosed background hole yields
//!   one [`BorderKind::Hole`] contour.
//! - Contours are ordered by the raster-scan position of the first pixel
//!   on each border, so the same mask always traces to the same output.
//! - Nothing is dropped for being small: an isolated pixel becomes the
//!   degenerate closed contour `[p, p]`, and a 1-pixel-wide line becomes
//!   an out-and-back contour along its pixels.
//! - An all-background mask yields no contours.

use image::{GrayImage, Luma};
use imageproc::contours::BorderType;
use serde::{Deserialize, Serialize};

use crate::types::{BinaryMask, BorderKind, Contour, Point};

/// Selects which contour tracing algorithm to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ContourTracerKind {
    /// Suzuki-Abe border following via `imageproc::contours::find_contours`.
    ///
    /// Traces pixel-centre boundaries of 8-connected regions and
    /// classifies each border as outer or hole.
    #[default]
    BorderFollowing,
}

/// Trait for contour tracing strategies.
///
/// Input: a binary mask. Output: closed contours in deterministic
/// raster-scan discovery order.
pub trait ContourTracer {
    /// Trace contours in the given mask.
    fn trace(&self, mask: &BinaryMask) -> Vec<Contour>;
}

impl ContourTracer for ContourTracerKind {
    fn trace(&self, mask: &BinaryMask) -> Vec<Contour> {
        match *self {
            Self::BorderFollowing => trace_border_following(mask),
        }
    }
}

/// Trace `mask` with the default tracer.
#[must_use = "returns the traced contours"]
pub fn trace(mask: &BinaryMask) -> Vec<Contour> {
    ContourTracerKind::default().trace(mask)
}

/// Suzuki-Abe border following via `imageproc::contours::find_contours`.
///
/// The mask is copied into a `GrayImage` with a one-pixel background
/// border so regions touching the image edge start their trace from a
/// real background neighbor. Coordinates are shifted back afterwards.
fn trace_border_following(mask: &BinaryMask) -> Vec<Contour> {
    let padded = GrayImage::from_fn(mask.width() + 2, mask.height() + 2, |x, y| {
        let foreground = x > 0 && y > 0 && mask.get(x - 1, y - 1);
        Luma([if foreground { u8::MAX } else { 0 }])
    });

    let contours: Vec<imageproc::contours::Contour<u32>> =
        imageproc::contours::find_contours(&padded);

    contours
        .into_iter()
        .filter(|c| !c.points.is_empty())
        .map(|c| {
            let kind = match c.border_type {
                BorderType::Outer => BorderKind::Outer,
                BorderType::Hole => BorderKind::Hole,
            };
            let mut points: Vec<Point> = c
                .points
                .iter()
                .map(|p| Point::new(f64::from(p.x) - 1.0, f64::from(p.y) - 1.0))
                .collect();
            // Isolated pixel: keep it as a zero-length stroke.
            if let [only] = points[..] {
                points.push(only);
            }
            Contour::new(points, true, kind)
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn mask_from_rows(rows: &[&str]) -> BinaryMask {
        let height = u32::try_from(rows.len()).unwrap();
        let width = u32::try_from(rows[0].len()).unwrap();
        BinaryMask::from_fn(width, height, |x, y| {
            rows[y as usize].as_bytes()[x as usize] == b'#'
        })
        .unwrap()
    }

    fn sorted(points: &[Point]) -> Vec<(i64, i64)> {
        #[allow(clippy::cast_possible_truncation)]
        let mut v: Vec<(i64, i64)> = points.iter().map(|p| (p.x as i64, p.y as i64)).collect();
        v.sort_unstable();
        v
    }

    #[test]
    fn default_is_border_following() {
        assert_eq!(
            ContourTracerKind::default(),
            ContourTracerKind::BorderFollowing
        );
    }

    #[test]
    fn empty_mask_produces_no_contours() {
        let mask = mask_from_rows(&["....", "....", "...."]);
        assert!(trace(&mask).is_empty());
    }

    #[test]
    fn single_pixel_is_kept_as_degenerate_contour() {
        let mask = mask_from_rows(&[".....", ".....", "..#..", ".....", "....."]);
        let contours = trace(&mask);
        assert_eq!(contours.len(), 1);
        let c = &contours[0];
        assert_eq!(c.points(), &[Point::new(2.0, 2.0), Point::new(2.0, 2.0)]);
        assert!(c.is_closed());
        assert_eq!(c.kind(), BorderKind::Outer);
    }

    #[test]
    fn centred_square_traces_its_corners() {
        let mask = mask_from_rows(&["....", ".##.", ".##.", "...."]);
        let contours = trace(&mask);
        assert_eq!(contours.len(), 1);
        let c = &contours[0];
        assert_eq!(c.len(), 4);
        assert_eq!(c.points()[0], Point::new(1.0, 1.0));
        assert_eq!(sorted(c.points()), [(1, 1), (1, 2), (2, 1), (2, 2)]);
    }

    #[test]
    fn thin_line_is_not_dropped() {
        let mask = mask_from_rows(&["......", ".####.", "......"]);
        let contours = trace(&mask);
        assert_eq!(contours.len(), 1);
        let c = &contours[0];
        assert!(c.len() >= 2);
        let xs: Vec<i64> = sorted(c.points()).iter().map(|&(x, _)| x).collect();
        assert_eq!(xs.first(), Some(&1));
        assert_eq!(xs.last(), Some(&4));
        assert!(c.points().iter().all(|p| (p.y - 1.0).abs() < f64::EPSILON));
    }

    #[test]
    fn region_touching_image_edge_is_traced() {
        let mask = mask_from_rows(&["###", "###", "###"]);
        let contours = trace(&mask);
        assert_eq!(contours.len(), 1);
        let points = sorted(contours[0].points());
        assert_eq!(points.first(), Some(&(0, 0)));
        assert_eq!(points.last(), Some(&(2, 2)));
    }

    #[test]
    fn ring_yields_outer_and_hole() {
        let mask = mask_from_rows(&[
            ".......", ".#####.", ".#...#.", ".#...#.", ".#...#.", ".#####.", ".......",
        ]);
        let contours = trace(&mask);
        let kinds: Vec<BorderKind> = contours.iter().map(Contour::kind).collect();
        assert_eq!(kinds, [BorderKind::Outer, BorderKind::Hole]);
    }

    #[test]
    fn separate_regions_in_raster_order() {
        let mask = mask_from_rows(&["......", ".#..#.", "......", "..##..", "......"]);
        let contours = trace(&mask);
        assert_eq!(contours.len(), 3);
        assert_eq!(contours[0].points()[0], Point::new(1.0, 1.0));
        assert_eq!(contours[1].points()[0], Point::new(4.0, 1.0));
        assert_eq!(contours[2].points()[0], Point::new(2.0, 3.0));
    }

    #[test]
    fn diagonal_pixels_are_one_region() {
        let mask = mask_from_rows(&["#..", ".#.", "..#"]);
        let contours = trace(&mask);
        assert_eq!(contours.len(), 1);
    }

    #[test]
    fn tracing_is_deterministic() {
        let mask = mask_from_rows(&[
            "..........",
            ".###...#..",
            ".#.#..###.",
            ".###...#..",
            "......#.#.",
            "..........",
        ]);
        assert_eq!(trace(&mask), trace(&mask));
    }
}
