use crate::math::circular::CircularVec;
use crate::math::{orient_2d, Point2};

use super::{collinear_extremes, finish_hull, lex_cmp, remove_collinear, sort_and_dedup};

/// Divide-and-conquer convex hull, `O(n log n)`.
///
/// Points are sorted lexicographically, both halves are hulled recursively and
/// merged by walking the upper and lower bridges between them.
#[must_use]
pub fn hull_divide_conquer(points: &[Point2], eps: f64) -> Vec<Point2> {
    let sorted = sort_and_dedup(points, eps);
    if sorted.len() < 3 {
        return sorted;
    }
    let hull = recurse(&sorted, eps);
    if hull.len() < 3 {
        return collinear_extremes(&hull);
    }
    finish_hull(hull, eps)
}

fn recurse(sorted: &[Point2], eps: f64) -> Vec<Point2> {
    if sorted.len() <= 3 {
        return base_hull(sorted, eps);
    }
    let mid = sorted.len() / 2;
    let left = recurse(&sorted[..mid], eps);
    let right = recurse(&sorted[mid..], eps);
    merge(left, right, eps)
}

/// Counter-clockwise hull of at most three points.
fn base_hull(pts: &[Point2], eps: f64) -> Vec<Point2> {
    match pts {
        [a, b, c] => {
            let o = orient_2d(a, b, c);
            if o > eps {
                vec![*a, *b, *c]
            } else if o < -eps {
                vec![*a, *c, *b]
            } else {
                collinear_extremes(pts)
            }
        }
        _ => pts.to_vec(),
    }
}

/// Merges two counter-clockwise hulls separated by a lexicographic split.
fn merge(left: Vec<Point2>, right: Vec<Point2>, eps: f64) -> Vec<Point2> {
    let left = CircularVec::new(left);
    let right = CircularVec::new(right);
    let guard = 2 * (left.len() + right.len()) + 4;

    let left_max = argmax(left.as_slice());
    let right_min = argmin(right.as_slice());

    // Upper bridge: advance counter-clockwise on the left, clockwise on the right.
    let (mut iu, mut ju) = (left_max, right_min);
    for _ in 0..guard {
        let mut changed = false;
        while orient_2d(&left[iu], &right[ju], &left[left.next(iu)]) > eps {
            iu = left.next(iu);
            changed = true;
        }
        while orient_2d(&left[iu], &right[ju], &right[right.prev(ju)]) > eps {
            ju = right.prev(ju);
            changed = true;
        }
        if !changed {
            break;
        }
    }

    // Lower bridge: the mirror walk.
    let (mut il, mut jl) = (left_max, right_min);
    for _ in 0..guard {
        let mut changed = false;
        while orient_2d(&left[il], &right[jl], &left[left.prev(il)]) < -eps {
            il = left.prev(il);
            changed = true;
        }
        while orient_2d(&left[il], &right[jl], &right[right.next(jl)]) < -eps {
            jl = right.next(jl);
            changed = true;
        }
        if !changed {
            break;
        }
    }

    // Left hull from the upper to the lower bridge, then the right hull from
    // the lower to the upper bridge, both counter-clockwise.
    let mut merged = Vec::with_capacity(left.len() + right.len());
    walk(&left, iu, il, &mut merged);
    walk(&right, jl, ju, &mut merged);
    remove_collinear(&mut merged, eps);
    merged
}

fn walk(hull: &CircularVec<Point2>, from: usize, to: usize, out: &mut Vec<Point2>) {
    let mut i = from;
    for _ in 0..hull.len() {
        out.push(hull[i]);
        if i == to {
            break;
        }
        i = hull.next(i);
    }
}

fn argmax(points: &[Point2]) -> usize {
    (0..points.len())
        .max_by(|&a, &b| lex_cmp(&points[a], &points[b]))
        .unwrap_or(0)
}

fn argmin(points: &[Point2]) -> usize {
    (0..points.len())
        .min_by(|&a, &b| lex_cmp(&points[a], &points[b]))
        .unwrap_or(0)
}
