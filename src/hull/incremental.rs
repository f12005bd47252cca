use crate::math::circular::CircularVec;
use crate::math::{centroid, orient_2d, Point2};

use super::{collinear_extremes, dedup_in_order, finish_hull, initial_triangle};

/// Where a new point lies relative to the current hull.
pub(crate) enum Placement {
    /// Inside or on the boundary.
    Inside,
    /// Outside, in the angular wedge of the edge `(i, i + 1)`.
    Outside(usize),
}

/// Locates `p` by the wedge around the interior point `center` that contains it.
pub(crate) fn locate(hull: &CircularVec<Point2>, center: &Point2, p: &Point2, eps: f64) -> Placement {
    for i in 0..hull.len() {
        let a = &hull[i];
        let b = &hull[i + 1];
        if orient_2d(center, a, p) >= 0.0 && orient_2d(center, b, p) < 0.0 {
            if orient_2d(a, b, p) < -eps {
                return Placement::Outside(i);
            }
            return Placement::Inside;
        }
    }
    Placement::Inside
}

/// Edge `(i, i + 1)` faces away from `p` or is collinear with it.
pub(crate) fn visible(a: &Point2, b: &Point2, p: &Point2, eps: f64) -> bool {
    orient_2d(a, b, p) <= eps
}

/// Incremental convex hull over an array.
///
/// Starts from the first non-degenerate triangle and inserts the remaining
/// points in input order, replacing the visible hull chain of each outside
/// point by the point itself.
#[must_use]
pub fn hull_incremental(points: &[Point2], eps: f64) -> Vec<Point2> {
    let pts = dedup_in_order(points, eps);
    let Some(tri) = initial_triangle(&pts, eps) else {
        return collinear_extremes(&pts);
    };

    let start: Vec<Point2> = tri.iter().map(|&i| pts[i]).collect();
    let center = centroid(&start).unwrap_or(start[0]);
    let mut hull = CircularVec::new(start);

    for (idx, p) in pts.iter().enumerate() {
        if tri.contains(&idx) {
            continue;
        }
        let Placement::Outside(edge) = locate(&hull, &center, p, eps) else {
            continue;
        };

        let n = hull.len();
        let mut lower = edge;
        for _ in 0..n {
            let prev = hull.prev(lower);
            if !visible(&hull[prev], &hull[lower], p, eps) {
                break;
            }
            lower = prev;
        }
        let mut upper = hull.next(edge);
        for _ in 0..n {
            let next = hull.next(upper);
            if !visible(&hull[upper], &hull[next], p, eps) {
                break;
            }
            upper = next;
        }
        hull.replace_between(lower, upper, *p);
    }

    finish_hull(hull.into_inner(), eps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hull::cyclic_equal;

    #[test]
    fn point_replaces_visible_chain() {
        let pts = [
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(4.0, 4.0),
            Point2::new(0.0, 4.0),
            Point2::new(2.0, 10.0),
            Point2::new(-10.0, 2.0),
        ];
        let hull = hull_incremental(&pts, 1e-12);
        let expected = [
            Point2::new(-10.0, 2.0),
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(4.0, 4.0),
            Point2::new(2.0, 10.0),
        ];
        assert!(cyclic_equal(&hull, &expected, 1e-12), "{hull:?}");
    }

    #[test]
    fn collinear_start_is_skipped() {
        let pts = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(1.0, 1.0),
        ];
        let hull = hull_incremental(&pts, 1e-12);
        let expected = [
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(1.0, 1.0),
        ];
        assert!(cyclic_equal(&hull, &expected, 1e-12), "{hull:?}");
    }
}
