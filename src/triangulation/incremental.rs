use std::collections::HashMap;

use crate::math::{in_circle, orient_2d, points_equal, Point2};

use super::{Triangle, Triangulation};

/// Result of locating a new point in the current triangulation.
enum Location {
    /// Strictly inside triangle `t`.
    Inside(usize),
    /// On the edge of `t` opposite vertex slot `slot`.
    OnEdge(usize, usize),
    /// Outside the convex hull.
    Outside,
}

struct Builder<'a> {
    points: &'a [Point2],
    tris: Vec<Triangle>,
    eps: f64,
}

impl Builder<'_> {
    fn pt(&self, i: usize) -> &Point2 {
        &self.points[i]
    }

    fn locate(&self, p: &Point2) -> Location {
        for (t, tri) in self.tris.iter().enumerate() {
            let mut on_edge = None;
            let mut inside = true;
            for slot in 0..3 {
                let (a, b) = tri.edge(slot);
                let o = orient_2d(self.pt(a), self.pt(b), p);
                if o < -self.eps {
                    inside = false;
                    break;
                }
                if o <= self.eps {
                    on_edge = Some(slot);
                }
            }
            if inside {
                return match on_edge {
                    Some(slot) => Location::OnEdge(t, slot),
                    None => Location::Inside(t),
                };
            }
        }
        Location::Outside
    }

    /// Points the neighbor reference of `tri` that pointed at `old` to `new`.
    fn relink(&mut self, tri: Option<usize>, old: usize, new: usize) {
        if let Some(t) = tri {
            if let Some(slot) = self.tris[t].neighbor_slot(old) {
                self.tris[t].neighbors[slot] = Some(new);
            }
        }
    }

    fn push(&mut self, vertices: [usize; 3], neighbors: [Option<usize>; 3]) -> usize {
        self.tris.push(Triangle {
            vertices,
            neighbors,
        });
        self.tris.len() - 1
    }

    /// Splits triangle `t` into three around `p`.
    fn split_inside(&mut self, t: usize, p: usize) -> Vec<usize> {
        let [v0, v1, v2] = self.tris[t].vertices;
        let [n0, n1, n2] = self.tris[t].neighbors;

        let a = t;
        let b = self.tris.len();
        let c = b + 1;

        self.tris[a] = Triangle {
            vertices: [p, v1, v2],
            neighbors: [n0, Some(c), Some(b)],
        };
        self.push([p, v0, v1], [n2, Some(a), Some(c)]);
        self.push([p, v2, v0], [n1, Some(b), Some(a)]);
        self.relink(n1, t, c);
        self.relink(n2, t, b);
        vec![a, b, c]
    }

    /// Splits the triangle(s) sharing the edge opposite `slot` of `t` at `p`.
    fn split_edge(&mut self, t: usize, slot: usize, p: usize) -> Vec<usize> {
        let tri = self.tris[t];
        let c = tri.vertices[slot];
        let (a, b) = tri.edge(slot);
        let u = tri.neighbors[slot];
        let nb = tri.neighbors[(slot + 1) % 3];
        let na = tri.neighbors[(slot + 2) % 3];

        let t1 = t;
        let t2 = self.tris.len();
        let mut created = vec![t1, t2];

        match u {
            None => {
                self.tris[t1] = Triangle {
                    vertices: [c, a, p],
                    neighbors: [None, Some(t2), na],
                };
                self.push([c, p, b], [None, nb, Some(t1)]);
                self.relink(nb, t, t2);
            }
            Some(u) => {
                let other = self.tris[u];
                let j = other.neighbor_slot(t).unwrap_or(0);
                let d = other.vertices[j];
                let ua = other.neighbors[(j + 1) % 3];
                let ub = other.neighbors[(j + 2) % 3];

                let u1 = u;
                let u2 = t2 + 1;
                self.tris[t1] = Triangle {
                    vertices: [c, a, p],
                    neighbors: [Some(u2), Some(t2), na],
                };
                self.push([c, p, b], [Some(u1), nb, Some(t1)]);
                self.tris[u1] = Triangle {
                    vertices: [d, b, p],
                    neighbors: [Some(t2), Some(u2), ub],
                };
                self.push([d, p, a], [Some(t1), ua, Some(u1)]);
                self.relink(nb, t, t2);
                self.relink(ua, u, u2);
                created.extend([u1, u2]);
            }
        }
        created
    }

    /// Fans new triangles from `p` over every hull edge visible from it.
    fn extend_hull(&mut self, p: usize) -> Vec<usize> {
        let mut visible = Vec::new();
        for (t, tri) in self.tris.iter().enumerate() {
            for slot in 0..3 {
                if tri.neighbors[slot].is_none() {
                    let (a, b) = tri.edge(slot);
                    if orient_2d(self.pt(a), self.pt(b), self.pt(p)) < -self.eps {
                        visible.push((t, slot, a, b));
                    }
                }
            }
        }

        // Edges (p, x) of the new fan, keyed by x.
        let mut open: HashMap<usize, (usize, usize)> = HashMap::new();
        let mut created = Vec::with_capacity(visible.len());
        for (t, slot, a, b) in visible {
            let nt = self.push([p, b, a], [Some(t), None, None]);
            self.tris[t].neighbors[slot] = Some(nt);
            // Slot 1 is the edge (a, p), slot 2 the edge (p, b).
            for (x, s) in [(a, 1), (b, 2)] {
                if let Some((other, other_slot)) = open.remove(&x) {
                    self.tris[nt].neighbors[s] = Some(other);
                    self.tris[other].neighbors[other_slot] = Some(nt);
                } else {
                    open.insert(x, (nt, s));
                }
            }
            created.push(nt);
        }
        created
    }

    /// Lawson flips until every edge opposite `p` is locally Delaunay.
    fn legalize(&mut self, p: usize, mut stack: Vec<usize>) {
        let mut flips = 0usize;
        let max_flips = 64 * (self.tris.len() + 16);
        while let Some(t) = stack.pop() {
            let tri = self.tris[t];
            let Some(k) = tri.vertices.iter().position(|&v| v == p) else {
                continue;
            };
            let Some(u) = tri.neighbors[k] else {
                continue;
            };
            let other = self.tris[u];
            let Some(j) = other.neighbor_slot(t) else {
                continue;
            };
            let d = other.vertices[j];
            let a = tri.vertices[(k + 1) % 3];
            let b = tri.vertices[(k + 2) % 3];
            if in_circle(self.pt(p), self.pt(a), self.pt(b), self.pt(d)) <= self.eps {
                continue;
            }
            flips += 1;
            if flips > max_flips {
                tracing::warn!(flips, "edge flipping did not settle");
                return;
            }

            let tb = tri.neighbors[(k + 1) % 3];
            let ta = tri.neighbors[(k + 2) % 3];
            let ua = other.neighbors[(j + 1) % 3];
            let ub = other.neighbors[(j + 2) % 3];

            self.tris[t] = Triangle {
                vertices: [p, a, d],
                neighbors: [ua, Some(u), ta],
            };
            self.tris[u] = Triangle {
                vertices: [p, d, b],
                neighbors: [ub, tb, Some(t)],
            };
            self.relink(ua, u, t);
            self.relink(tb, t, u);
            stack.push(t);
            stack.push(u);
        }
    }

    fn insert(&mut self, p: usize) {
        let created = match self.locate(self.pt(p)) {
            Location::Inside(t) => self.split_inside(t, p),
            Location::OnEdge(t, slot) => self.split_edge(t, slot, p),
            Location::Outside => self.extend_hull(p),
        };
        self.legalize(p, created);
    }
}

/// Incremental Delaunay triangulation with edge flipping.
///
/// Starts from the first non-collinear triple, inserts the remaining points in
/// input order and restores the empty-circumcircle property by flipping.
/// Points within `eps` of an inserted point are skipped.
#[must_use]
pub fn triangulate_incremental(points: &[Point2], eps: f64) -> Triangulation {
    let mut inserted: Vec<usize> = Vec::with_capacity(points.len());
    for (i, p) in points.iter().enumerate() {
        if inserted.iter().any(|&j| points_equal(p, &points[j], eps)) {
            continue;
        }
        inserted.push(i);
    }

    // Two distinct points fix a line; the first point off it completes the start triangle.
    let start = match inserted.as_slice() {
        [a, b, rest @ ..] => rest.iter().find_map(|&c| {
            let o = orient_2d(&points[*a], &points[*b], &points[c]);
            if o > eps {
                Some([*a, *b, c])
            } else if o < -eps {
                Some([*a, c, *b])
            } else {
                None
            }
        }),
        _ => None,
    };
    let Some(start) = start else {
        return Triangulation {
            points: points.to_vec(),
            triangles: Vec::new(),
        };
    };
    let pending: Vec<usize> = inserted.into_iter().filter(|i| !start.contains(i)).collect();

    let mut builder = Builder {
        points,
        tris: vec![Triangle::new(start)],
        eps,
    };
    for p in pending {
        builder.insert(p);
    }

    Triangulation {
        points: points.to_vec(),
        triangles: builder.tris,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn square_gets_two_triangles() {
        let pts = [
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        let tri = triangulate_incremental(&pts, 1e-9);
        assert_eq!(tri.triangles.len(), 2);
        assert!(tri.is_consistent());
        assert!(tri.is_delaunay(1e-9));
    }

    #[test]
    fn point_on_interior_edge_splits_both_sides() {
        let pts = [
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(0.0, 4.0),
            Point2::new(4.0, 4.0),
            Point2::new(2.0, 2.0),
        ];
        let tri = triangulate_incremental(&pts, 1e-9);
        assert_eq!(tri.triangles.len(), 4);
        assert!(tri.is_consistent());
        assert!(tri.is_delaunay(1e-9));
    }

    #[test]
    fn point_on_hull_edge() {
        let pts = [
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(2.0, 3.0),
            Point2::new(2.0, 0.0),
        ];
        let tri = triangulate_incremental(&pts, 1e-9);
        assert_eq!(tri.triangles.len(), 2);
        assert!(tri.is_consistent());
        assert_eq!(tri.hull_edges().len(), 4);
    }

    #[test]
    fn duplicates_and_collinear_prefix() {
        let pts = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(1.0, -1.0),
        ];
        let tri = triangulate_incremental(&pts, 1e-9);
        assert!(tri.is_consistent());
        assert!(tri.is_delaunay(1e-9));
        assert!(tri.triangles.iter().all(|t| !t.vertices.contains(&2)));
        assert_eq!(tri.triangles.len(), 4);
    }

    #[test]
    fn outside_points_extend_hull() {
        let pts = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
            Point2::new(5.0, 5.0),
            Point2::new(-3.0, 2.0),
            Point2::new(2.0, -4.0),
        ];
        let tri = triangulate_incremental(&pts, 1e-9);
        assert!(tri.is_consistent());
        assert!(tri.is_delaunay(1e-9));
        let used: std::collections::BTreeSet<usize> =
            tri.triangles.iter().flat_map(|t| t.vertices).collect();
        assert_eq!(used.len(), 6);
    }
}
