use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};

use crate::math::{centroid, line_angle, orient_2d, Point2};

use super::incremental::visible;
use super::{collinear_extremes, dedup_in_order, finish_hull, initial_triangle};

/// Polar angle around the interior reference point, totally ordered.
#[derive(Debug, Clone, Copy)]
struct Angle(f64);

impl PartialEq for Angle {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Angle {}

impl PartialOrd for Angle {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Angle {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Hull vertices keyed by their angle around a fixed interior point.
struct AngleTree {
    center: Point2,
    nodes: BTreeMap<Angle, Point2>,
}

impl AngleTree {
    fn key(&self, p: &Point2) -> Angle {
        Angle(line_angle(&self.center, p))
    }

    /// First vertex with a strictly larger angle, wrapping to the smallest.
    fn successor(&self, key: Angle) -> Option<(Angle, Point2)> {
        self.nodes
            .range((Excluded(key), Unbounded))
            .next()
            .or_else(|| self.nodes.iter().next())
            .map(|(k, v)| (*k, *v))
    }

    /// Last vertex with a smaller or equal angle, wrapping to the largest.
    fn predecessor_or_equal(&self, key: Angle) -> Option<(Angle, Point2)> {
        self.nodes
            .range(..=key)
            .next_back()
            .or_else(|| self.nodes.iter().next_back())
            .map(|(k, v)| (*k, *v))
    }

    /// Last vertex with a strictly smaller angle, wrapping to the largest.
    fn predecessor(&self, key: Angle) -> Option<(Angle, Point2)> {
        self.nodes
            .range(..key)
            .next_back()
            .or_else(|| self.nodes.iter().next_back())
            .map(|(k, v)| (*k, *v))
    }

    fn insert(&mut self, p: Point2, eps: f64) {
        let key = self.key(&p);
        let (Some((mut lo_key, mut lo)), Some((mut hi_key, mut hi))) =
            (self.predecessor_or_equal(key), self.successor(key))
        else {
            return;
        };
        if orient_2d(&lo, &hi, &p) >= -eps {
            return;
        }

        // Drop vertices between two visible edges on either side.
        while self.nodes.len() > 2 {
            let Some((prev_key, prev)) = self.predecessor(lo_key) else {
                break;
            };
            if prev_key == hi_key || !visible(&prev, &lo, &p, eps) {
                break;
            }
            self.nodes.remove(&lo_key);
            (lo_key, lo) = (prev_key, prev);
        }
        while self.nodes.len() > 2 {
            let Some((next_key, next)) = self.successor(hi_key) else {
                break;
            };
            if next_key == lo_key || !visible(&hi, &next, &p, eps) {
                break;
            }
            self.nodes.remove(&hi_key);
            (hi_key, hi) = (next_key, next);
        }

        self.nodes.insert(key, p);
    }
}

/// Incremental convex hull kept in an angle-ordered search tree.
///
/// Same insertion scheme as [`hull_incremental`](super::hull_incremental),
/// but the wedge containing a new point is found by a tree lookup instead of
/// a linear scan. The hull is read out by in-order traversal.
#[must_use]
pub fn hull_angle_tree(points: &[Point2], eps: f64) -> Vec<Point2> {
    let pts = dedup_in_order(points, eps);
    let Some(tri) = initial_triangle(&pts, eps) else {
        return collinear_extremes(&pts);
    };

    let start: Vec<Point2> = tri.iter().map(|&i| pts[i]).collect();
    let center = centroid(&start).unwrap_or(start[0]);
    let mut tree = AngleTree {
        center,
        nodes: BTreeMap::new(),
    };
    for p in &start {
        tree.nodes.insert(tree.key(p), *p);
    }

    for (idx, p) in pts.iter().enumerate() {
        if !tri.contains(&idx) {
            tree.insert(*p, eps);
        }
    }

    finish_hull(tree.nodes.into_values().collect(), eps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hull::cyclic_equal;

    #[test]
    fn in_order_readout_is_counter_clockwise() {
        let pts = [
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(0.0, 4.0),
            Point2::new(4.0, 4.0),
            Point2::new(-3.0, 2.0),
            Point2::new(1.0, 1.0),
        ];
        let hull = hull_angle_tree(&pts, 1e-12);
        let expected = [
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(4.0, 4.0),
            Point2::new(0.0, 4.0),
            Point2::new(-3.0, 2.0),
        ];
        assert!(cyclic_equal(&hull, &expected, 1e-12), "{hull:?}");
    }

    #[test]
    fn point_on_ray_through_vertex() {
        // (8, 10) lies on the ray from the start centroid (4, 2) through (6, 6).
        let pts = [
            Point2::new(0.0, 0.0),
            Point2::new(6.0, 0.0),
            Point2::new(6.0, 6.0),
            Point2::new(0.0, 6.0),
            Point2::new(4.0, 4.0),
            Point2::new(8.0, 10.0),
        ];
        let hull = hull_angle_tree(&pts, 1e-12);
        let expected = [
            Point2::new(0.0, 0.0),
            Point2::new(6.0, 0.0),
            Point2::new(8.0, 10.0),
            Point2::new(0.0, 6.0),
        ];
        assert!(cyclic_equal(&hull, &expected, 1e-12), "{hull:?}");
    }
}
