//! Toolpath optimization: reorder and orient paths to minimize travel.
//!
//! Uses a nearest-neighbor greedy heuristic on path endpoints, starting
//! from a fixed position (the machine origin by default). At each step
//! the unvisited path whose entry or exit point is nearest to the
//! current position is drawn next, reversed when approaching from its
//! far end is shorter.
//!
//! Greedy ordering is not optimal and can lose to a lucky input order,
//! so the result is compared against the input order and whichever
//! travels less is returned. The returned plan therefore never travels
//! more than the input order.
//!
//! This is step 4 in the pipeline, between path simplification and
//! G-code emission.

use crate::types::{Path, Point, ToolpathPlan};

/// Distances closer than this are ties, resolved in favour of the
/// earliest input path and of the forward direction.
pub const TIE_EPSILON: f64 = 1e-9;

/// Optimize starting from the origin `(0, 0)`.
#[must_use = "returns the optimized toolpath plan"]
pub fn optimize(paths: &[Path]) -> ToolpathPlan {
    optimize_from(paths, Point::new(0.0, 0.0))
}

/// Reorder and orient `paths` to minimize tool-up travel, starting with
/// the tool at `start`.
///
/// Empty paths are dropped. Closed paths are never reversed: they exit
/// where they enter, so direction does not affect travel.
#[must_use = "returns the optimized toolpath plan"]
pub fn optimize_from(paths: &[Path], start: Point) -> ToolpathPlan {
    let candidates: Vec<&Path> = paths.iter().filter(|p| !p.is_empty()).collect();
    if candidates.is_empty() {
        return ToolpathPlan::empty();
    }

    let greedy = nearest_neighbor_order(&candidates, start);
    let greedy_travel = travel_distance(&greedy);

    let original: Vec<Path> = candidates.into_iter().cloned().collect();
    let original_travel = travel_distance(&original);

    if greedy_travel <= original_travel {
        ToolpathPlan {
            paths: greedy,
            total_travel: greedy_travel,
        }
    } else {
        tracing::debug!(
            greedy_travel,
            original_travel,
            "greedy ordering lost to input order, keeping input order"
        );
        ToolpathPlan {
            paths: original,
            total_travel: original_travel,
        }
    }
}

/// Tool-up travel of drawing `paths` in the given order: the sum of the
/// distances from each path's exit point to the next path's entry point.
///
/// Travel to the first path is not counted; it is the same for every
/// order that starts with that path.
#[must_use]
pub fn travel_distance(paths: &[Path]) -> f64 {
    let mut total = 0.0;
    let mut position: Option<Point> = None;
    for path in paths {
        let (Some(entry), Some(exit)) = (path.entry(), path.exit()) else {
            continue;
        };
        if let Some(prev) = position {
            total += prev.distance(entry);
        }
        position = Some(exit);
    }
    total
}

/// Greedy nearest-neighbor ordering over non-empty candidates.
fn nearest_neighbor_order(candidates: &[&Path], start: Point) -> Vec<Path> {
    let n = candidates.len();
    let mut visited = vec![false; n];
    let mut result = Vec::with_capacity(n);
    let mut current = start;

    for _ in 0..n {
        let mut best: Option<(usize, bool)> = None;
        let mut best_dist = f64::INFINITY;

        for (j, candidate) in candidates.iter().enumerate() {
            if visited[j] {
                continue;
            }
            let (Some(entry), Some(last)) = (candidate.entry(), candidate.points().last().copied())
            else {
                continue;
            };

            let dist_forward = current.distance(entry);
            let dist_reverse = if candidate.is_closed() {
                f64::INFINITY
            } else {
                current.distance(last)
            };

            // Forward wins ties against reverse.
            let (dist, reversed) = if dist_reverse < dist_forward - TIE_EPSILON {
                (dist_reverse, true)
            } else {
                (dist_forward, false)
            };

            // Strictly better by more than epsilon, so earlier paths
            // win ties.
            if dist < best_dist - TIE_EPSILON {
                best_dist = dist;
                best = Some((j, reversed));
            }
        }

        // At least one unvisited candidate remains on every iteration,
        // so `best` is always `Some` here.
        let Some((idx, reversed)) = best else {
            break;
        };
        visited[idx] = true;

        let path = if reversed {
            candidates[idx].reversed()
        } else {
            candidates[idx].clone()
        };
        if let Some(exit) = path.exit() {
            current = exit;
        }
        result.push(path);
    }

    result
}
