use std::f64::consts::{FRAC_PI_2, PI};

use super::polygon_2d::polygon_self_intersects;
use super::{line_angle, normalize_angle, turn_angle, Point2};

fn angles_equal(a: f64, b: f64, eps: f64) -> bool {
    let diff = normalize_angle(a - b);
    diff < eps || diff > 2.0 * PI - eps
}

fn axis_aligned(angle: f64, eps: f64) -> bool {
    let r = angle.rem_euclid(FRAC_PI_2);
    r < eps || r > FRAC_PI_2 - eps
}

/// Simplifies a closed contour traced from a pixel grid.
///
/// The first pass replaces single-step "staircases" (two parallel runs
/// joined by an axis-aligned step, spanning at most `min_dist`) by a
/// diagonal. The second pass drops vertices whose turning angle is below
/// `eps_angular` radians.
///
/// Strongly concave inputs can come out self-intersecting; callers that need
/// a simple polygon must check with [`contour_self_intersects`].
pub fn simplify_contour(contour: &mut Vec<Point2>, min_dist: f64, eps_angular: f64) {
    remove_staircases(contour, min_dist, eps_angular);
    remove_collinear(contour, eps_angular);
}

fn remove_staircases(contour: &mut Vec<Point2>, min_dist: f64, eps: f64) {
    let mut i = 0;
    while i < contour.len() && contour.len() > 4 {
        let n = contour.len();
        let v1 = contour[i];
        let v2 = contour[(i + 1) % n];
        let v3 = contour[(i + 2) % n];
        let v4 = contour[(i + 3) % n];

        let is_step = (v4 - v1).norm() <= min_dist
            && axis_aligned(line_angle(&v2, &v3), eps)
            && angles_equal(line_angle(&v1, &v2), line_angle(&v3, &v4), eps);

        if is_step {
            let a = (i + 1) % n;
            let b = (i + 2) % n;
            let (hi, lo) = if a > b { (a, b) } else { (b, a) };
            contour.remove(hi);
            contour.remove(lo);
            // Removals before `i` shift it down.
            i -= [a, b].iter().filter(|&&k| k < i).count();
        }
        i += 1;
    }
}

fn remove_collinear(contour: &mut Vec<Point2>, eps: f64) {
    let mut i = 0;
    while contour.len() > 3 && i < contour.len() {
        let n = contour.len();
        let prev = contour[(i + n - 1) % n];
        let cur = contour[i];
        let next = contour[(i + 1) % n];
        let angle = turn_angle(&(cur - prev), &(next - cur));
        if angle.abs() < eps {
            contour.remove(i);
        } else {
            i += 1;
        }
    }
}

/// Checks a closed contour for crossing edges.
#[must_use]
pub fn contour_self_intersects(contour: &[Point2]) -> bool {
    contour.len() > 3 && polygon_self_intersects(contour)
}

/// Splits every segment of an open polyline into pieces no longer than `max_len`.
#[must_use]
pub fn subdivide_lines(vertices: &[Point2], max_len: f64) -> Vec<Point2> {
    if vertices.len() < 2 || max_len <= 0.0 {
        return vertices.to_vec();
    }
    let mut out = Vec::with_capacity(vertices.len());
    out.push(vertices[0]);
    for pair in vertices.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let len = (b - a).norm();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let pieces = (len / max_len).ceil().max(1.0) as usize;
        for k in 1..=pieces {
            #[allow(clippy::cast_precision_loss)]
            let t = k as f64 / pieces as f64;
            out.push(if k == pieces { b } else { a + (b - a) * t });
        }
    }
    out
}

/// Drops vertices closer than `min_dist` to the previously kept one.
///
/// The first and last vertex are always kept.
#[must_use]
pub fn remove_close_vertices(vertices: &[Point2], min_dist: f64) -> Vec<Point2> {
    let Some((last, rest)) = vertices.split_last() else {
        return Vec::new();
    };
    if rest.is_empty() {
        return vec![*last];
    }
    let mut out: Vec<Point2> = Vec::with_capacity(vertices.len());
    for v in rest {
        match out.last() {
            Some(kept) if (v - kept).norm() < min_dist => {}
            _ => out.push(*v),
        }
    }
    if out.len() > 1 && out.last().is_some_and(|kept| (last - kept).norm() < min_dist) {
        out.pop();
    }
    out.push(*last);
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::polygon_2d::signed_area_2d;
    use crate::math::TOLERANCE;

    #[test]
    fn collinear_vertices_removed() {
        let mut c = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 2.0),
            Point2::new(0.0, 2.0),
            Point2::new(0.0, 1.0),
        ];
        simplify_contour(&mut c, 0.0, 1e-3);
        assert_eq!(c.len(), 4);
        assert!((signed_area_2d(&c) - 4.0).abs() < TOLERANCE);
    }

    #[test]
    fn staircase_replaced_by_diagonal() {
        // Right triangle with a one-pixel staircase hypotenuse.
        let mut c = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(2.0, 1.0),
            Point2::new(2.0, 2.0),
            Point2::new(3.0, 2.0),
            Point2::new(3.0, 3.0),
            Point2::new(0.0, 3.0),
        ];
        let before = c.len();
        simplify_contour(&mut c, 3.0, 1e-3);
        assert!(c.len() < before, "len={}", c.len());
        assert!(signed_area_2d(&c) > 0.0);
    }

    #[test]
    fn bow_tie_self_intersects() {
        let bow = [
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 2.0),
            Point2::new(2.0, 0.0),
            Point2::new(0.0, 2.0),
        ];
        assert!(contour_self_intersects(&bow));
        let square = [
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 2.0),
            Point2::new(0.0, 2.0),
        ];
        assert!(!contour_self_intersects(&square));
    }

    #[test]
    fn subdivide_respects_max_len() {
        let v = [Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(1.0, 0.25)];
        let out = subdivide_lines(&v, 0.3);
        assert_eq!(out.len(), 1 + 4 + 1);
        for w in out.windows(2) {
            assert!((w[1] - w[0]).norm() <= 0.3 + TOLERANCE);
        }
        assert!((out.last().unwrap() - v[2]).norm() < TOLERANCE);
    }

    #[test]
    fn close_vertices_removed_keeping_ends() {
        let v = [
            Point2::new(0.0, 0.0),
            Point2::new(0.01, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.005, 0.0),
        ];
        let out = remove_close_vertices(&v, 0.1);
        assert_eq!(out.len(), 2);
        assert!((out[0] - v[0]).norm() < TOLERANCE);
        assert!((out[1] - v[3]).norm() < TOLERANCE);
    }
}
