//! Convex hulls of planar point sets.
//!
//! Four interchangeable algorithms share one contract: the hull is returned
//! counter-clockwise, without duplicate or collinear vertices. The starting
//! vertex differs between algorithms, so results are compared as cyclic
//! sequences (see [`cyclic_equal`]).

mod angle_tree;
mod contour;
mod divide_conquer;
mod incremental;

pub use angle_tree::hull_angle_tree;
pub use contour::hull_contour;
pub use divide_conquer::hull_divide_conquer;
pub use incremental::hull_incremental;

use std::cmp::Ordering;

use crate::math::polygon_2d::signed_area_2d;
use crate::math::{orient_2d, points_equal, Point2};

/// Selects the convex hull algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HullAlgorithm {
    /// Sort by x, hull both halves, merge along upper and lower bridges.
    #[default]
    DivideAndConquer,
    /// Insert points one by one into an array-based hull.
    Incremental,
    /// Insert points one by one into a hull kept in an angle-ordered tree.
    AngleTree,
    /// Four monotone staircases followed by a concavity-removing sweep.
    Contour,
}

/// Parameters for [`ConvexHull`].
#[derive(Debug, Clone, Copy)]
pub struct HullParams {
    pub algorithm: HullAlgorithm,
    /// Points closer than this are treated as one; orientation tests use it as dead band.
    pub eps: f64,
}

impl Default for HullParams {
    fn default() -> Self {
        Self {
            algorithm: HullAlgorithm::default(),
            eps: 1e-9,
        }
    }
}

/// Computes the convex hull of a point set.
#[derive(Debug, Clone, Default)]
pub struct ConvexHull {
    params: HullParams,
}

impl ConvexHull {
    #[must_use]
    pub fn new(params: HullParams) -> Self {
        Self { params }
    }

    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HullAlgorithm) -> Self {
        self.params.algorithm = algorithm;
        self
    }

    /// Returns the hull vertices counter-clockwise.
    ///
    /// Inputs with fewer than three distinct, non-collinear points return the
    /// distinct extreme points.
    #[must_use]
    pub fn execute(&self, points: &[Point2]) -> Vec<Point2> {
        let eps = self.params.eps;
        let hull = match self.params.algorithm {
            HullAlgorithm::DivideAndConquer => hull_divide_conquer(points, eps),
            HullAlgorithm::Incremental => hull_incremental(points, eps),
            HullAlgorithm::AngleTree => hull_angle_tree(points, eps),
            HullAlgorithm::Contour => hull_contour(points, eps),
        };
        tracing::trace!(
            algorithm = ?self.params.algorithm,
            input = points.len(),
            hull = hull.len(),
            "convex hull"
        );
        hull
    }
}

/// Lexicographic order on (x, y).
pub(crate) fn lex_cmp(a: &Point2, b: &Point2) -> Ordering {
    a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y))
}

/// Sorts lexicographically and drops points within `eps` of their predecessor.
pub(crate) fn sort_and_dedup(points: &[Point2], eps: f64) -> Vec<Point2> {
    let mut sorted = points.to_vec();
    sorted.sort_by(lex_cmp);
    sorted.dedup_by(|b, a| points_equal(a, b, eps));
    sorted
}

/// Drops points within `eps` of any earlier point, preserving input order.
pub(crate) fn dedup_in_order(points: &[Point2], eps: f64) -> Vec<Point2> {
    let mut out: Vec<Point2> = Vec::with_capacity(points.len());
    for p in points {
        if !out.iter().any(|q| points_equal(p, q, eps)) {
            out.push(*p);
        }
    }
    out
}

/// Finds three non-collinear points, returned counter-clockwise with their indices.
pub(crate) fn initial_triangle(points: &[Point2], eps: f64) -> Option<[usize; 3]> {
    let (a, b) = (0, 1);
    if points.len() < 3 {
        return None;
    }
    let c = (2..points.len()).find(|&c| orient_2d(&points[a], &points[b], &points[c]).abs() > eps)?;
    if orient_2d(&points[a], &points[b], &points[c]) > 0.0 {
        Some([a, b, c])
    } else {
        Some([a, c, b])
    }
}

/// The two extreme points of a collinear set (or the set itself if smaller).
pub(crate) fn collinear_extremes(points: &[Point2]) -> Vec<Point2> {
    let min = points.iter().min_by(|a, b| lex_cmp(a, b));
    let max = points.iter().max_by(|a, b| lex_cmp(a, b));
    match (min, max) {
        (Some(a), Some(b)) if a != b => vec![*a, *b],
        (Some(a), _) => vec![*a],
        _ => Vec::new(),
    }
}

/// Removes vertices where the hull does not turn strictly left.
pub(crate) fn remove_collinear(hull: &mut Vec<Point2>, eps: f64) {
    let mut i = 0;
    let mut unchanged = 0;
    while hull.len() > 2 && unchanged < hull.len() {
        let n = hull.len();
        let prev = hull[(i + n - 1) % n];
        let next = hull[(i + 1) % n];
        if orient_2d(&prev, &hull[i], &next) <= eps {
            hull.remove(i);
            unchanged = 0;
            if i >= hull.len() {
                i = 0;
            }
        } else {
            unchanged += 1;
            i = (i + 1) % n;
        }
    }
}

/// Puts a finished hull into canonical counter-clockwise form.
pub(crate) fn finish_hull(mut hull: Vec<Point2>, eps: f64) -> Vec<Point2> {
    if hull.len() >= 3 && signed_area_2d(&hull) < 0.0 {
        hull.reverse();
    }
    remove_collinear(&mut hull, eps);
    hull
}

/// Checks whether two polygons list the same vertices in the same cyclic order.
#[must_use]
pub fn cyclic_equal(a: &[Point2], b: &[Point2], eps: f64) -> bool {
    if a.len() != b.len() {
        return false;
    }
    if a.is_empty() {
        return true;
    }
    let n = a.len();
    (0..n).any(|offset| (0..n).all(|i| points_equal(&a[i], &b[(i + offset) % n], eps)))
}
