//! Path simplification using the Ramer-Douglas-Peucker algorithm.
//!
//! Reduces point count in contours by removing points that lie within
//! `tolerance` of the simplified polyline. Deviation is measured to the
//! chord *segment* rather than its infinite line, so the bound holds
//! against the output polyline itself even for points that project past
//! a chord's endpoints.
//!
//! Closed contours keep their first point as a fixed anchor. The ring is
//! split at the point farthest from that anchor and each half is
//! simplified on its own, so the implied closing edge still ends at the
//! original first point.
//!
//! This is step 3 in the pipeline, between contour tracing and toolpath
//! optimization.

use rayon::prelude::*;

use crate::types::{Contour, Path, Point};

/// Simplify a single contour into a drawable [`Path`].
///
/// A `tolerance` of zero or below (or NaN) keeps every point. Contours
/// with fewer than 3 points are returned unchanged (nothing to simplify).
/// The closed flag is preserved.
#[must_use = "returns the simplified path"]
pub fn simplify(contour: &Contour, tolerance: f64) -> Path {
    let points = contour.points();
    if points.len() < 3 || tolerance.is_nan() || tolerance <= 0.0 {
        return Path::from(contour);
    }

    let kept = if contour.is_closed() {
        simplify_ring(points, tolerance)
    } else {
        simplify_open(points, tolerance)
    };

    Path::new(kept, contour.is_closed())
}

/// Simplify multiple contours in parallel.
///
/// Each contour is independent, so the work is spread across the rayon
/// thread pool; the output keeps the input order regardless of which
/// contour finishes first.
#[must_use = "returns the simplified paths"]
pub fn simplify_all(contours: &[Contour], tolerance: f64) -> Vec<Path> {
    contours
        .par_iter()
        .map(|contour| simplify(contour, tolerance))
        .collect()
}

fn simplify_open(points: &[Point], tolerance: f64) -> Vec<Point> {
    let mut kept = vec![false; points.len()];
    kept[0] = true;
    kept[points.len() - 1] = true;
    rdp_recurse(points, 0, points.len() - 1, tolerance, &mut kept);
    collect_kept(points, &kept)
}

/// Simplify a closed ring anchored at `points[0]`.
fn simplify_ring(points: &[Point], tolerance: f64) -> Vec<Point> {
    // Close the ring explicitly so the closing edge takes part in the
    // deviation checks, then drop the duplicate at the end.
    let mut ring = points.to_vec();
    ring.push(points[0]);
    let last = ring.len() - 1;

    let anchor = ring[0];
    let (split, split_dist) = ring[1..last]
        .iter()
        .enumerate()
        .map(|(i, p)| (i + 1, p.distance(anchor)))
        .rev()
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .unwrap_or((0, 0.0));

    let mut kept = vec![false; ring.len()];
    kept[0] = true;
    kept[last] = true;

    if split_dist > tolerance {
        kept[split] = true;
        rdp_recurse(&ring, 0, split, tolerance, &mut kept);
        rdp_recurse(&ring, split, last, tolerance, &mut kept);
    }

    let mut out = collect_kept(&ring, &kept);
    out.pop();
    if out.len() < 2 {
        // Whole ring lies within tolerance of the anchor: keep the
        // farthest point so the path still has extent.
        out.push(ring[split]);
    }
    out
}

fn collect_kept(points: &[Point], kept: &[bool]) -> Vec<Point> {
    points
        .iter()
        .zip(kept)
        .filter(|&(_, k)| *k)
        .map(|(&p, _)| p)
        .collect()
}

/// Recursive step of the Ramer-Douglas-Peucker algorithm.
///
/// Finds the point between `start` and `end` that is farthest from the
/// segment between them. If that distance exceeds `tolerance`, the
/// point is kept and both sub-segments are processed recursively.
fn rdp_recurse(points: &[Point], start: usize, end: usize, tolerance: f64, kept: &mut [bool]) {
    if end <= start + 1 {
        return;
    }

    let mut max_dist = 0.0;
    let mut max_idx = start;

    for i in (start + 1)..end {
        let d = points[i].distance_to_segment(points[start], points[end]);
        if d > max_dist {
            max_dist = d;
            max_idx = i;
        }
    }

    if max_dist > tolerance {
        kept[max_idx] = true;
        rdp_recurse(points, start, max_idx, tolerance, kept);
        rdp_recurse(points, max_idx, end, tolerance, kept);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BorderKind;

    fn open(points: &[(f64, f64)]) -> Contour {
        Contour::new(
            points.iter().map(|&(x, y)| Point::new(x, y)).collect(),
            false,
            BorderKind::Outer,
        )
    }

    fn closed(points: &[(f64, f64)]) -> Contour {
        Contour::new(
            points.iter().map(|&(x, y)| Point::new(x, y)).collect(),
            true,
            BorderKind::Outer,
        )
    }

    /// A traced 5x5 square outline: 16 boundary pixels, clockwise.
    fn traced_square() -> Contour {
        let mut pts = Vec::new();
        for x in 0..4 {
            pts.push((f64::from(x), 0.0));
        }
        for y in 0..4 {
            pts.push((4.0, f64::from(y)));
        }
        for x in (1..=4).rev() {
            pts.push((f64::from(x), 4.0));
        }
        for y in (1..=4).rev() {
            pts.push((0.0, f64::from(y)));
        }
        closed(&pts)
    }

    #[test]
    fn empty_contour_unchanged() {
        let result = simplify(&open(&[]), 1.0);
        assert!(result.is_empty());
    }

    #[test]
    fn two_points_unchanged() {
        let result = simplify(&open(&[(0.0, 0.0), (10.0, 0.0)]), 1.0);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn zero_tolerance_is_identity() {
        // Exactly collinear points would be dropped by RDP at any
        // tolerance; zero must keep them anyway.
        let contour = open(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (3.0, 3.0)]);
        let result = simplify(&contour, 0.0);
        assert_eq!(result.points(), contour.points());
        assert!(!result.is_closed());
    }

    #[test]
    fn negative_and_nan_tolerance_are_identity() {
        let contour = traced_square();
        assert_eq!(simplify(&contour, -2.0).len(), contour.len());
        assert_eq!(simplify(&contour, f64::NAN).len(), contour.len());
    }

    #[test]
    fn collinear_points_collapse_to_endpoints() {
        let result = simplify(
            &open(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (3.0, 3.0), (4.0, 4.0)]),
            0.1,
        );
        assert_eq!(
            result.points(),
            &[Point::new(0.0, 0.0), Point::new(4.0, 4.0)]
        );
    }

    #[test]
    fn zigzag_retains_peaks() {
        let zigzag = open(&[(0.0, 0.0), (2.0, 5.0), (4.0, 0.0), (6.0, 5.0), (8.0, 0.0)]);
        assert_eq!(simplify(&zigzag, 1.0).len(), 5);
        assert_eq!(simplify(&zigzag, 10.0).len(), 2);
    }

    #[test]
    fn point_past_chord_end_is_kept() {
        // (10, 0) sits on the chord's line but 8 units beyond its end.
        let contour = open(&[(0.0, 0.0), (10.0, 0.0), (2.0, 0.0)]);
        let result = simplify(&contour, 1.0);
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn closed_square_reduces_to_corners() {
        let result = simplify(&traced_square(), 0.5);
        assert!(result.is_closed());
        assert_eq!(
            result.points(),
            &[
                Point::new(0.0, 0.0),
                Point::new(4.0, 0.0),
                Point::new(4.0, 4.0),
                Point::new(0.0, 4.0),
            ]
        );
    }

    #[test]
    fn closed_contour_keeps_first_point() {
        let contour = closed(&[(1.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0), (0.0, 0.0)]);
        let result = simplify(&contour, 0.5);
        assert_eq!(result.points()[0], Point::new(1.0, 0.0));
    }

    #[test]
    fn tiny_ring_keeps_two_points() {
        let contour = closed(&[(0.0, 0.0), (0.5, 0.0), (0.5, 0.5), (0.0, 0.5)]);
        let result = simplify(&contour, 5.0);
        assert_eq!(result.len(), 2);
        assert_eq!(result.points()[0], Point::new(0.0, 0.0));
        assert_eq!(result.points()[1], Point::new(0.5, 0.5));
    }

    #[test]
    fn degenerate_dot_unchanged() {
        let contour = closed(&[(3.0, 3.0), (3.0, 3.0)]);
        let result = simplify(&contour, 1.0);
        assert_eq!(result.len(), 2);
        assert!(result.is_degenerate());
    }

    #[test]
    fn simplify_all_keeps_order() {
        let contours = vec![
            open(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]),
            open(&[(0.0, 0.0), (1.0, 5.0), (2.0, 0.0)]),
            traced_square(),
        ];
        let results = simplify_all(&contours, 0.5);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].len(), 2);
        assert_eq!(results[1].len(), 3);
        assert_eq!(results[2].len(), 4);
    }
}
