use super::{cross_2d, Point2, Vector2, TOLERANCE};

/// Result of intersecting two parametric lines `p1 + t * d1` and `p2 + u * d2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineIntersection {
    /// Intersection point evaluated on the first line.
    pub point_first: Point2,
    /// Intersection point evaluated on the second line.
    pub point_second: Point2,
    /// Parameter `t` on the first line.
    pub param_first: f64,
    /// Parameter `u` on the second line.
    pub param_second: f64,
}

/// Parametric 2D line-line intersection.
///
/// Returns `None` for parallel or coincident lines.
#[must_use]
pub fn intersect_line_line(
    p1: &Point2,
    d1: &Vector2,
    p2: &Point2,
    d2: &Vector2,
    eps: f64,
) -> Option<LineIntersection> {
    let cross = cross_2d(d1, d2);
    if cross.abs() < eps {
        return None;
    }
    let dp = p2 - p1;
    let t = cross_2d(&dp, d2) / cross;
    let u = cross_2d(&dp, d1) / cross;
    Some(LineIntersection {
        point_first: p1 + d1 * t,
        point_second: p2 + d2 * u,
        param_first: t,
        param_second: u,
    })
}

/// Bounded segment-segment intersection in 2D.
///
/// Returns `(intersection_point, t, u)` where `t` and `u` are in `[0, 1]`.
#[must_use]
pub fn segment_segment_intersect_2d(
    a0: &Point2,
    a1: &Point2,
    b0: &Point2,
    b1: &Point2,
) -> Option<(Point2, f64, f64)> {
    let da = a1 - a0;
    let db = b1 - b0;
    let hit = intersect_line_line(a0, &da, b0, &db, TOLERANCE)?;
    let (t, u) = (hit.param_first, hit.param_second);

    // Use a small epsilon to include endpoints.
    let eps = TOLERANCE;
    if t >= -eps && t <= 1.0 + eps && u >= -eps && u <= 1.0 + eps {
        let t_clamped = t.clamp(0.0, 1.0);
        Some((a0 + da * t_clamped, t_clamped, u.clamp(0.0, 1.0)))
    } else {
        None
    }
}

/// Checks whether two closed segments cross in their interiors.
///
/// Touching at endpoints (parameters within `eps` of 0 or 1) does not count.
#[must_use]
pub fn segments_cross(a0: &Point2, a1: &Point2, b0: &Point2, b1: &Point2, eps: f64) -> bool {
    match segment_segment_intersect_2d(a0, a1, b0, b1) {
        Some((_, t, u)) => t > eps && t < 1.0 - eps && u > eps && u < 1.0 - eps,
        None => false,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn line_line_perpendicular() {
        let p1 = Point2::new(0.0, 0.0);
        let d1 = Vector2::new(1.0, 0.0);
        let p2 = Point2::new(0.5, -1.0);
        let d2 = Vector2::new(0.0, 1.0);
        let hit = intersect_line_line(&p1, &d1, &p2, &d2, TOLERANCE).unwrap();
        assert!((hit.param_first - 0.5).abs() < TOLERANCE);
        assert!((hit.param_second - 1.0).abs() < TOLERANCE);
        assert!((hit.point_first - hit.point_second).norm() < TOLERANCE);
    }

    #[test]
    fn line_line_parallel_returns_none() {
        let p1 = Point2::new(0.0, 0.0);
        let d1 = Vector2::new(1.0, 0.0);
        let p2 = Point2::new(0.0, 1.0);
        let d2 = Vector2::new(1.0, 0.0);
        assert!(intersect_line_line(&p1, &d1, &p2, &d2, TOLERANCE).is_none());
    }

    #[test]
    fn segment_segment_crossing() {
        let a0 = Point2::new(0.0, 0.0);
        let a1 = Point2::new(2.0, 2.0);
        let b0 = Point2::new(0.0, 2.0);
        let b1 = Point2::new(2.0, 0.0);
        let (pt, t, u) = segment_segment_intersect_2d(&a0, &a1, &b0, &b1).unwrap();
        assert!((pt.x - 1.0).abs() < TOLERANCE);
        assert!((pt.y - 1.0).abs() < TOLERANCE);
        assert!((t - 0.5).abs() < TOLERANCE);
        assert!((u - 0.5).abs() < TOLERANCE);
    }

    #[test]
    fn segments_touching_at_endpoint_do_not_cross() {
        let a0 = Point2::new(0.0, 0.0);
        let a1 = Point2::new(1.0, 0.0);
        let b0 = Point2::new(1.0, 0.0);
        let b1 = Point2::new(1.0, 1.0);
        assert!(!segments_cross(&a0, &a1, &b0, &b1, 1e-9));
    }
}
