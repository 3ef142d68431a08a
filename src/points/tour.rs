//! Greedy nearest-neighbour ordering
//!
//! Quadratic in the number of points and not globally optimal; the result
//! depends on the input order because the tour starts at the first point
//! and ties go to the earliest remaining point.

use crate::types::Point;

/// Reorder points to shorten travel between consecutive burns
pub fn optimize_tour(points: &[Point]) -> Vec<Point> {
    let Some((&first, rest)) = points.split_first() else {
        return Vec::new();
    };

    let mut remaining: Vec<Point> = rest.to_vec();
    let mut ordered = Vec::with_capacity(points.len());
    let mut current = first;
    ordered.push(current);

    while !remaining.is_empty() {
        let mut nearest = 0;
        let mut min_dist = f64::INFINITY;
        for (i, p) in remaining.iter().enumerate() {
            let dist = (p.x - current.x).powi(2) + (p.y - current.y).powi(2);
            if dist < min_dist {
                min_dist = dist;
                nearest = i;
            }
        }
        // `remove` keeps the remaining order so ties stay deterministic
        current = remaining.remove(nearest);
        ordered.push(current);
    }

    ordered
}
