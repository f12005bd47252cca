use crate::math::distance_2d::closest_point_on_segment;
use crate::math::{Point2, Vector2, TOLERANCE};

use super::LineSegment;

/// Shape of a Voronoi bisector between two generating sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BisectorKind {
    /// Point/point or segment/segment sites.
    Linear,
    /// Point/segment sites.
    Parabolic,
}

/// Discretizes the parabola equidistant from `focus` and the supporting line
/// of `directrix`, between the points `from` and `to`.
///
/// Both end points are expected to lie on the parabola and are returned
/// unchanged as the first and last polyline vertex. Interior vertices are
/// spaced at most `step` apart along the directrix. A focus lying on the
/// directrix degenerates to a straight line.
#[must_use]
pub fn parabolic_bisector(
    focus: &Point2,
    directrix: &LineSegment,
    from: &Point2,
    to: &Point2,
    step: f64,
) -> Vec<Point2> {
    let len = directrix.length();
    if len < TOLERANCE || step <= 0.0 {
        return vec![*from, *to];
    }

    // Local frame: origin at the segment start, x along the segment, y towards the focus.
    let origin = directrix.start;
    let ex = directrix.direction() / len;
    let mut ey = Vector2::new(-ex.y, ex.x);
    let mut py = (focus - origin).dot(&ey);
    if py < 0.0 {
        ey = -ey;
        py = -py;
    }
    if py < TOLERANCE {
        return vec![*from, *to];
    }
    let px = (focus - origin).dot(&ex);

    let x0 = (from - origin).dot(&ex);
    let x1 = (to - origin).dot(&ex);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let pieces = ((x1 - x0).abs() / step).ceil().max(1.0) as usize;

    let mut out = Vec::with_capacity(pieces + 1);
    out.push(*from);
    for k in 1..pieces {
        #[allow(clippy::cast_precision_loss)]
        let x = x0 + (x1 - x0) * (k as f64 / pieces as f64);
        let y = ((x - px).powi(2) + py * py) / (2.0 * py);
        out.push(origin + ex * x + ey * y);
    }
    out.push(*to);
    out
}

/// Length of a polyline.
#[must_use]
pub fn polyline_length(points: &[Point2]) -> f64 {
    points.windows(2).map(|w| (w[1] - w[0]).norm()).sum()
}

/// Closest point of a polyline to `p`, as `(fraction, distance)`: the arc
/// length up to that point as a fraction of the total, and its distance to
/// `p`. `None` for an empty polyline.
#[must_use]
pub fn polyline_closest(points: &[Point2], p: &Point2) -> Option<(f64, f64)> {
    let first = points.first()?;
    let total = polyline_length(points);
    let mut best = (0.0, (p - first).norm());
    let mut walked = 0.0;
    for w in points.windows(2) {
        let q = closest_point_on_segment(p, &w[0], &w[1]);
        let d = (p - q).norm();
        if d < best.1 {
            let at = walked + (q - w[0]).norm();
            best = (if total > 0.0 { at / total } else { 0.0 }, d);
        }
        walked += (w[1] - w[0]).norm();
    }
    Some(best)
}

/// Point at the arc-length fraction `t` of a polyline, clamped to its ends.
fn polyline_point(points: &[Point2], t: f64) -> Option<Point2> {
    let total = polyline_length(points);
    let mut left = t.clamp(0.0, 1.0) * total;
    for w in points.windows(2) {
        let len = (w[1] - w[0]).norm();
        if left <= len && len > 0.0 {
            return Some(w[0] + (w[1] - w[0]) * (left / len));
        }
        left -= len;
    }
    points.last().copied()
}

/// Part of a polyline between the arc-length fractions `from` and `to`,
/// reversed if `from > to`.
#[must_use]
pub fn polyline_between(points: &[Point2], from: f64, to: f64) -> Vec<Point2> {
    if from > to {
        let reversed: Vec<Point2> = points.iter().rev().copied().collect();
        return polyline_between(&reversed, 1.0 - from, 1.0 - to);
    }
    let (Some(a), Some(b)) = (polyline_point(points, from), polyline_point(points, to)) else {
        return Vec::new();
    };
    let total = polyline_length(points);
    let mut out = vec![a];
    let mut walked = 0.0;
    for w in points.windows(2) {
        walked += (w[1] - w[0]).norm();
        if walked < total && walked > from * total && walked < to * total {
            out.push(w[1]);
        }
    }
    out.push(b);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parabola_points_are_equidistant() {
        let seg = LineSegment::new(Point2::new(-5.0, 0.0), Point2::new(5.0, 0.0));
        let focus = Point2::new(0.0, 2.0);
        // y = (x^2 + 4) / 4
        let from = Point2::new(-2.0, 2.0);
        let to = Point2::new(2.0, 2.0);
        let pts = parabolic_bisector(&focus, &seg, &from, &to, 0.25);
        assert_eq!(pts.len(), 17);
        for p in &pts {
            let d_focus = (p - focus).norm();
            let d_line = seg.distance_to(p);
            assert!((d_focus - d_line).abs() < 1e-9, "p={p}");
        }
        assert!(polyline_length(&pts) > 4.0);
    }

    #[test]
    fn focus_below_directrix_flips_frame() {
        let seg = LineSegment::new(Point2::new(5.0, 0.0), Point2::new(-5.0, 0.0));
        let focus = Point2::new(0.0, -2.0);
        let from = Point2::new(-2.0, -2.0);
        let to = Point2::new(2.0, -2.0);
        let pts = parabolic_bisector(&focus, &seg, &from, &to, 1.0);
        let apex = pts[2];
        assert!((apex.x).abs() < 1e-9 && (apex.y + 1.0).abs() < 1e-9, "apex={apex}");
    }

    #[test]
    fn polyline_closest_and_trim() {
        let line = [
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(4.0, 4.0),
        ];
        let (t, d) = polyline_closest(&line, &Point2::new(1.0, 2.0)).unwrap();
        assert!((t - 0.125).abs() < 1e-12 && (d - 2.0).abs() < 1e-12);
        let (t, d) = polyline_closest(&line, &Point2::new(6.0, 3.0)).unwrap();
        assert!((t - 0.875).abs() < 1e-12 && (d - 2.0).abs() < 1e-12);
        assert!(polyline_closest(&[], &Point2::origin()).is_none());

        let part = polyline_between(&line, 0.25, 0.75);
        assert_eq!(
            part,
            vec![Point2::new(2.0, 0.0), Point2::new(4.0, 0.0), Point2::new(4.0, 2.0)]
        );
        let back = polyline_between(&line, 0.75, 0.25);
        assert_eq!(back.first(), part.last());
        assert_eq!(back.last(), part.first());
        assert_eq!(polyline_between(&line, 0.0, 1.0), line.to_vec());
    }

    #[test]
    fn degenerate_focus_on_line() {
        let seg = LineSegment::new(Point2::new(0.0, 0.0), Point2::new(1.0, 0.0));
        let pts = parabolic_bisector(
            &Point2::new(0.5, 0.0),
            &seg,
            &Point2::new(0.0, 1.0),
            &Point2::new(1.0, 1.0),
            0.1,
        );
        assert_eq!(pts.len(), 2);
    }
}
