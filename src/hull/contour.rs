use std::collections::VecDeque;

use crate::math::{orient_2d, points_equal, Point2};

use super::{collinear_extremes, finish_hull, sort_and_dedup};

/// Contour-based convex hull.
///
/// Builds the four monotone staircases seen from the left and right extremes,
/// concatenates them clockwise starting at the leftmost point, and removes
/// concavities in one sweep, backtracking to the last vertex that keeps the
/// boundary convex.
#[must_use]
pub fn hull_contour(points: &[Point2], eps: f64) -> Vec<Point2> {
    let sorted = sort_and_dedup(points, eps);
    if sorted.len() < 3 {
        return sorted;
    }

    let contour = staircases(&sorted, eps);
    if contour.len() < 3 {
        return collinear_extremes(&contour);
    }

    // Clockwise sweep: every kept vertex must turn right.
    let mut hull: Vec<Point2> = Vec::with_capacity(contour.len());
    for p in &contour {
        while hull.len() >= 2 && orient_2d(&hull[hull.len() - 2], &hull[hull.len() - 1], p) >= -eps {
            hull.pop();
        }
        hull.push(*p);
    }
    // Close the loop against the starting vertex.
    while hull.len() >= 3 && orient_2d(&hull[hull.len() - 2], &hull[hull.len() - 1], &hull[0]) >= -eps {
        hull.pop();
    }

    if hull.len() < 3 {
        return collinear_extremes(&sorted);
    }
    finish_hull(hull, eps)
}

/// Upper-left, upper-right, lower-right and lower-left staircases, clockwise.
fn staircases(sorted: &[Point2], eps: f64) -> Vec<Point2> {
    let mut left_top = Vec::new();
    let mut left_bottom = VecDeque::new();
    let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
    for p in sorted {
        if p.y > max_y {
            max_y = p.y;
            left_top.push(*p);
        }
        if p.y < min_y {
            min_y = p.y;
            left_bottom.push_front(*p);
        }
    }

    let mut right_top = VecDeque::new();
    let mut right_bottom = Vec::new();
    let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
    for p in sorted.iter().rev() {
        if p.y > max_y {
            max_y = p.y;
            right_top.push_front(*p);
        }
        if p.y < min_y {
            min_y = p.y;
            right_bottom.push(*p);
        }
    }

    let mut contour: Vec<Point2> = Vec::with_capacity(
        left_top.len() + right_top.len() + right_bottom.len() + left_bottom.len(),
    );
    let chained = left_top
        .iter()
        .chain(right_top.iter())
        .chain(right_bottom.iter())
        .chain(left_bottom.iter());
    for p in chained {
        if contour.last().is_none_or(|q| !points_equal(p, q, eps)) {
            contour.push(*p);
        }
    }
    if contour.len() >= 2 && points_equal(&contour[0], &contour[contour.len() - 1], eps) {
        contour.pop();
    }
    contour
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hull::cyclic_equal;

    #[test]
    fn staircases_run_clockwise() {
        let sorted = [
            Point2::new(0.0, 1.0),
            Point2::new(1.0, 3.0),
            Point2::new(2.0, 0.0),
            Point2::new(3.0, 2.0),
            Point2::new(4.0, 1.0),
        ];
        let c = staircases(&sorted, 1e-12);
        assert!(points_equal(&c[0], &Point2::new(0.0, 1.0), 1e-12));
        assert!(points_equal(&c[1], &Point2::new(1.0, 3.0), 1e-12));
        assert!(c.iter().any(|p| points_equal(p, &Point2::new(2.0, 0.0), 1e-12)));
    }

    #[test]
    fn concavity_removed() {
        let pts = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.5),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 2.0),
            Point2::new(1.0, 1.5),
            Point2::new(0.0, 2.0),
        ];
        let hull = hull_contour(&pts, 1e-12);
        let expected = [
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 2.0),
            Point2::new(0.0, 2.0),
        ];
        assert!(cyclic_equal(&hull, &expected, 1e-12), "{hull:?}");
    }
}
