use super::intersect_2d::{intersect_line_line, segments_cross};
use super::{orient_2d, points_equal, Point2, TOLERANCE};

/// Computes the signed area of a polygon (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise.
#[must_use]
pub fn signed_area_2d(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Winding number of `polygon` around `p`.
///
/// Non-zero means `p` is inside. Points exactly on the boundary may go either way.
#[must_use]
pub fn winding_number(polygon: &[Point2], p: &Point2) -> i32 {
    let n = polygon.len();
    let mut wn = 0;
    for i in 0..n {
        let a = &polygon[i];
        let b = &polygon[(i + 1) % n];
        if a.y <= p.y {
            if b.y > p.y && orient_2d(a, b, p) > 0.0 {
                wn += 1;
            }
        } else if b.y <= p.y && orient_2d(a, b, p) < 0.0 {
            wn -= 1;
        }
    }
    wn
}

/// Point-in-polygon test for simple polygons of either orientation.
#[must_use]
pub fn point_in_polygon(polygon: &[Point2], p: &Point2) -> bool {
    polygon.len() >= 3 && winding_number(polygon, p) != 0
}

/// Checks whether any two non-adjacent edges of a closed polygon cross.
#[must_use]
pub fn polygon_self_intersects(polygon: &[Point2]) -> bool {
    let n = polygon.len();
    if n < 4 {
        return false;
    }
    let eps = TOLERANCE * 100.0;
    for i in 0..n {
        let a0 = &polygon[i];
        let a1 = &polygon[(i + 1) % n];
        for j in (i + 2)..n {
            // Skip adjacent segments.
            if i == 0 && j == n - 1 {
                continue;
            }
            let b0 = &polygon[j];
            let b1 = &polygon[(j + 1) % n];
            if segments_cross(a0, a1, b0, b1, eps) {
                return true;
            }
        }
    }
    false
}

/// Splits a simple polygon into convex sub-polygons.
///
/// Finds a reflex vertex, casts a ray from it along its incoming edge, and cuts
/// the polygon where the ray first meets the boundary again; both halves are
/// split recursively. Returns an empty list if the polygon has fewer than four
/// vertices or is already convex.
#[must_use]
pub fn convex_split(polygon: &[Point2], eps: f64) -> Vec<Vec<Point2>> {
    if polygon.len() < 4 {
        return Vec::new();
    }
    let mut poly = polygon.to_vec();
    if signed_area_2d(&poly) < 0.0 {
        poly.reverse();
    }
    let max_depth = 2 * poly.len();
    let mut out = Vec::new();
    split_recursive(poly, eps, max_depth, &mut out);
    if out.len() <= 1 {
        return Vec::new();
    }
    out
}

fn split_recursive(poly: Vec<Point2>, eps: f64, depth: usize, out: &mut Vec<Vec<Point2>>) {
    if depth == 0 || poly.len() < 4 {
        if poly.len() >= 3 {
            out.push(poly);
        }
        return;
    }
    match split_once(&poly, eps) {
        Some((first, second)) => {
            split_recursive(first, eps, depth - 1, out);
            split_recursive(second, eps, depth - 1, out);
        }
        None => out.push(poly),
    }
}

/// Splits a counter-clockwise polygon at its first reflex vertex.
fn split_once(poly: &[Point2], eps: f64) -> Option<(Vec<Point2>, Vec<Point2>)> {
    let n = poly.len();

    // Reflex corner at `v`: right turn from the incoming to the outgoing edge.
    let v = (0..n).find(|&i| {
        let prev = &poly[(i + n - 1) % n];
        let next = &poly[(i + 1) % n];
        orient_2d(prev, &poly[i], next) < -eps
    })?;
    let prev = poly[(v + n - 1) % n];
    let dir = poly[v] - prev;

    // Nearest boundary hit of the ray, ignoring the two edges at `v`.
    let mut best: Option<(f64, usize, Point2, f64)> = None;
    for k in 1..n {
        let j = (v + k) % n;
        let j_next = (j + 1) % n;
        if j_next == v {
            continue;
        }
        let edge = poly[j_next] - poly[j];
        let Some(hit) = intersect_line_line(&poly[v], &dir, &poly[j], &edge, TOLERANCE) else {
            continue;
        };
        let (t, u) = (hit.param_first, hit.param_second);
        if t <= eps || u < -eps || u >= 1.0 - eps {
            continue;
        }
        if best.is_none_or(|(bt, ..)| t < bt) {
            best = Some((t, j, hit.point_first, u));
        }
    }
    let (_, j, point, u) = best?;

    // First half walks forward from `v` to the hit, second half from the hit back to `v`.
    let mut first = Vec::with_capacity(n);
    let mut second = Vec::with_capacity(n);
    let on_vertex = u <= eps || points_equal(&point, &poly[j], eps);

    let mut i = v;
    loop {
        first.push(poly[i]);
        if i == j {
            break;
        }
        i = (i + 1) % n;
    }
    if !on_vertex {
        first.push(point);
        second.push(point);
    }
    let mut i = if on_vertex { j } else { (j + 1) % n };
    loop {
        second.push(poly[i]);
        if i == v {
            break;
        }
        i = (i + 1) % n;
    }

    if first.len() < 3 || second.len() < 3 {
        return None;
    }
    Some((first, second))
}
