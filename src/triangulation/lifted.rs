use crate::math::{orient_2d, points_equal, Point2, Vector3};

use super::Triangulation;

fn lift(p: &Point2) -> Vector3 {
    Vector3::new(p.x, p.y, p.x * p.x + p.y * p.y)
}

/// Delaunay triangulation as the lower convex hull of the points lifted onto
/// the paraboloid `z = x^2 + y^2`.
///
/// Every triple whose lifted plane has no other lifted point strictly below it
/// is a downward-facing hull facet, hence a Delaunay triangle. Runs in
/// `O(n^4)`; meant for cross-checking the other backends on small inputs.
/// Cocircular quadruples yield overlapping triangles.
#[must_use]
pub fn triangulate_lifted(points: &[Point2], eps: f64) -> Triangulation {
    let mut distinct: Vec<usize> = Vec::with_capacity(points.len());
    for (i, p) in points.iter().enumerate() {
        if !distinct.iter().any(|&j| points_equal(p, &points[j], eps)) {
            distinct.push(i);
        }
    }

    let lifted: Vec<Vector3> = distinct.iter().map(|&i| lift(&points[i])).collect();
    let n = distinct.len();
    let mut triples = Vec::new();

    for i in 0..n {
        for j in (i + 1)..n {
            for k in (j + 1)..n {
                let (a, b, c) = (distinct[i], distinct[j], distinct[k]);
                let o = orient_2d(&points[a], &points[b], &points[c]);
                if o.abs() <= eps {
                    continue;
                }
                // Counter-clockwise in the plane means the facet normal points up.
                let (b, c, lb, lc) = if o > 0.0 {
                    (b, c, lifted[j], lifted[k])
                } else {
                    (c, b, lifted[k], lifted[j])
                };
                let la = lifted[i];
                let normal = (lb - la).cross(&(lc - la));

                let lower = (0..n)
                    .filter(|&m| m != i && m != j && m != k)
                    .all(|m| (lifted[m] - la).dot(&normal) >= -eps);
                if lower {
                    triples.push([a, b, c]);
                }
            }
        }
    }

    Triangulation::from_triangles(points.to_vec(), triples)
}
