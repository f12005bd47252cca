use super::Point2;

/// Returns the minimum distance from point `p` to the segment `a -> b`.
#[must_use]
pub fn point_to_segment_dist(p: &Point2, a: &Point2, b: &Point2) -> f64 {
    (p - closest_point_on_segment(p, a, b)).norm()
}

/// Returns the point on segment `a -> b` closest to `p`.
#[must_use]
pub fn closest_point_on_segment(p: &Point2, a: &Point2, b: &Point2) -> Point2 {
    let d = b - a;
    let len_sq = d.norm_squared();

    if len_sq < 1e-20 {
        // Degenerate segment (zero length).
        return *a;
    }

    // Project point onto the infinite line, clamp to [0, 1].
    let t = ((p - a).dot(&d) / len_sq).clamp(0.0, 1.0);
    a + d * t
}

/// Distance from `p` to the infinite line through `a` and `b`.
#[must_use]
pub fn point_to_line_dist(p: &Point2, a: &Point2, b: &Point2) -> f64 {
    let d = b - a;
    let len = d.norm();
    if len < 1e-20 {
        return (p - a).norm();
    }
    (d.x * (p.y - a.y) - d.y * (p.x - a.x)).abs() / len
}

/// Index and distance of the point in `points` closest to `p`.
#[must_use]
pub fn nearest_point(points: &[Point2], p: &Point2) -> Option<(usize, f64)> {
    points
        .iter()
        .enumerate()
        .map(|(i, q)| (i, (q - p).norm_squared()))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, d2)| (i, d2.sqrt()))
}
