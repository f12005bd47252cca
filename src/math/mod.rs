pub mod circular;
pub mod contour_2d;
pub mod distance_2d;
pub mod intersect_2d;
pub mod polygon_2d;

use std::f64::consts::PI;

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Position of a point relative to a directed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
    On,
}

/// Twice the signed area of the triangle `(a, b, p)`.
///
/// Positive if `p` lies left of the directed line `a -> b`.
#[must_use]
pub fn orient_2d(a: &Point2, b: &Point2, p: &Point2) -> f64 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// Classifies `p` against the directed line `a -> b`.
///
/// Points within `eps` (in signed-area units) of the line are reported as [`Side::On`].
#[must_use]
pub fn side_of_line(a: &Point2, b: &Point2, p: &Point2, eps: f64) -> Side {
    let area = orient_2d(a, b, p);
    if area > eps {
        Side::Left
    } else if area < -eps {
        Side::Right
    } else {
        Side::On
    }
}

/// 2D cross product (z component of the 3D cross product).
#[must_use]
pub fn cross_2d(a: &Vector2, b: &Vector2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Direction angle of the line `a -> b` in `(-pi, pi]`.
#[must_use]
pub fn line_angle(a: &Point2, b: &Point2) -> f64 {
    (b.y - a.y).atan2(b.x - a.x)
}

/// Signed turning angle from direction `v1` to direction `v2` in `(-pi, pi]`.
#[must_use]
pub fn turn_angle(v1: &Vector2, v2: &Vector2) -> f64 {
    cross_2d(v1, v2).atan2(v1.dot(v2))
}

/// Wraps an angle into `[0, 2pi)`.
#[must_use]
pub fn normalize_angle(angle: f64) -> f64 {
    angle.rem_euclid(2.0 * PI)
}

/// Checks two points for equality within `eps` per coordinate.
#[must_use]
pub fn points_equal(a: &Point2, b: &Point2, eps: f64) -> bool {
    (a.x - b.x).abs() <= eps && (a.y - b.y).abs() <= eps
}

/// Circumcentre of the triangle `(a, b, c)`, or `None` if the points are collinear.
#[must_use]
pub fn circumcentre(a: &Point2, b: &Point2, c: &Point2) -> Option<Point2> {
    let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
    if d.abs() < TOLERANCE {
        return None;
    }
    let a2 = a.x * a.x + a.y * a.y;
    let b2 = b.x * b.x + b.y * b.y;
    let c2 = c.x * c.x + c.y * c.y;
    let x = (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d;
    let y = (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d;
    Some(Point2::new(x, y))
}

/// In-circle determinant.
///
/// For a counter-clockwise triangle `(a, b, c)` the result is positive if `p`
/// lies strictly inside its circumcircle, negative outside and zero on it.
#[must_use]
pub fn in_circle(a: &Point2, b: &Point2, c: &Point2, p: &Point2) -> f64 {
    let (adx, ady) = (a.x - p.x, a.y - p.y);
    let (bdx, bdy) = (b.x - p.x, b.y - p.y);
    let (cdx, cdy) = (c.x - p.x, c.y - p.y);

    let ad = adx * adx + ady * ady;
    let bd = bdx * bdx + bdy * bdy;
    let cd = cdx * cdx + cdy * cdy;

    ad * (bdx * cdy - cdx * bdy) + bd * (cdx * ady - adx * cdy) + cd * (adx * bdy - bdx * ady)
}

/// Arithmetic mean of a point set.
#[must_use]
pub fn centroid(points: &[Point2]) -> Option<Point2> {
    if points.is_empty() {
        return None;
    }
    let mut sum = Vector2::zeros();
    for p in points {
        sum += p.coords;
    }
    #[allow(clippy::cast_precision_loss)]
    let n = points.len() as f64;
    Some(Point2::from(sum / n))
}
