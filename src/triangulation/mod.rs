//! Delaunay triangulations of planar point sets.
//!
//! Three backends produce the same [`Triangulation`] for points in general
//! position: an incremental edge-flipping algorithm, the `spade` crate with
//! exact predicates, and a brute-force lower hull of the points lifted onto a
//! paraboloid.

mod incremental;
mod lifted;
mod spade_backend;

pub use incremental::triangulate_incremental;
pub use lifted::triangulate_lifted;
pub use spade_backend::triangulate_spade;

use std::collections::{BTreeSet, HashMap};

use crate::error::{GeometryError, Result};
use crate::math::{circumcentre, orient_2d, Point2};

/// A triangle of a [`Triangulation`].
///
/// Vertices are counter-clockwise indices into [`Triangulation::points`].
/// `neighbors[i]` is the triangle across the edge opposite `vertices[i]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triangle {
    pub vertices: [usize; 3],
    pub neighbors: [Option<usize>; 3],
}

impl Triangle {
    #[must_use]
    pub fn new(vertices: [usize; 3]) -> Self {
        Self {
            vertices,
            neighbors: [None; 3],
        }
    }

    /// End points of the edge opposite vertex slot `i`.
    #[must_use]
    pub fn edge(&self, i: usize) -> (usize, usize) {
        (self.vertices[(i + 1) % 3], self.vertices[(i + 2) % 3])
    }

    /// Slot of the neighbor reference pointing at `tri`, if any.
    #[must_use]
    pub fn neighbor_slot(&self, tri: usize) -> Option<usize> {
        self.neighbors.iter().position(|&n| n == Some(tri))
    }
}

/// A triangulation over a point list.
///
/// Points that duplicate an earlier point are kept in `points` but are not
/// referenced by any triangle.
#[derive(Debug, Clone, Default)]
pub struct Triangulation {
    pub points: Vec<Point2>,
    pub triangles: Vec<Triangle>,
}

impl Triangulation {
    /// Builds a triangulation from counter-clockwise vertex triples and fills
    /// in the neighbor references.
    #[must_use]
    pub fn from_triangles(points: Vec<Point2>, triples: Vec<[usize; 3]>) -> Self {
        let triangles = triples.into_iter().map(Triangle::new).collect();
        let mut tri = Self { points, triangles };
        tri.rebuild_neighbors();
        tri
    }

    /// Recomputes all neighbor references from shared edges.
    pub fn rebuild_neighbors(&mut self) {
        let mut edges: HashMap<(usize, usize), (usize, usize)> = HashMap::new();
        for (t, tri) in self.triangles.iter().enumerate() {
            for slot in 0..3 {
                edges.insert(tri.edge(slot), (t, slot));
            }
        }
        for t in 0..self.triangles.len() {
            for slot in 0..3 {
                let (a, b) = self.triangles[t].edge(slot);
                self.triangles[t].neighbors[slot] = edges.get(&(b, a)).map(|&(u, _)| u);
            }
        }
    }

    #[must_use]
    pub fn triangle_points(&self, t: usize) -> [Point2; 3] {
        let v = self.triangles[t].vertices;
        [self.points[v[0]], self.points[v[1]], self.points[v[2]]]
    }

    /// Circumcentre of triangle `t`, `None` for a degenerate sliver.
    #[must_use]
    pub fn circumcentre(&self, t: usize) -> Option<Point2> {
        let [a, b, c] = self.triangle_points(t);
        circumcentre(&a, &b, &c)
    }

    /// Unique undirected edges as sorted index pairs.
    #[must_use]
    pub fn edges(&self) -> BTreeSet<(usize, usize)> {
        let mut out = BTreeSet::new();
        for tri in &self.triangles {
            for slot in 0..3 {
                let (a, b) = tri.edge(slot);
                out.insert((a.min(b), a.max(b)));
            }
        }
        out
    }

    /// Directed boundary edges (interior on the left).
    #[must_use]
    pub fn hull_edges(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for tri in &self.triangles {
            for slot in 0..3 {
                if tri.neighbors[slot].is_none() {
                    out.push(tri.edge(slot));
                }
            }
        }
        out
    }

    /// Checks the empty-circumcircle property.
    ///
    /// A vertex closer than `radius - eps` to a circumcentre violates it.
    #[must_use]
    pub fn is_delaunay(&self, eps: f64) -> bool {
        let used: BTreeSet<usize> = self
            .triangles
            .iter()
            .flat_map(|t| t.vertices.iter().copied())
            .collect();
        self.triangles.iter().enumerate().all(|(t, tri)| {
            let Some(centre) = self.circumcentre(t) else {
                return true;
            };
            let radius = (self.points[tri.vertices[0]] - centre).norm();
            used.iter()
                .filter(|v| !tri.vertices.contains(v))
                .all(|&v| (self.points[v] - centre).norm() >= radius - eps)
        })
    }

    /// Checks that every triangle is counter-clockwise and neighbors are mutual.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.triangles.iter().enumerate().all(|(t, tri)| {
            let [a, b, c] = self.triangle_points(t);
            orient_2d(&a, &b, &c) > 0.0
                && tri.neighbors.iter().enumerate().all(|(slot, n)| match n {
                    None => true,
                    Some(u) => {
                        let (a, b) = tri.edge(slot);
                        let other = &self.triangles[*u];
                        other.neighbor_slot(t).is_some_and(|s| other.edge(s) == (b, a))
                    }
                })
        })
    }
}

/// Selects the Delaunay backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DelaunayBackend {
    /// Incremental insertion with Lawson edge flips.
    Incremental,
    /// The `spade` crate, exact predicates.
    #[default]
    Spade,
    /// Lower hull of the points lifted onto `z = x^2 + y^2`; `O(n^4)`.
    ParabolicLift,
}

/// Parameters for [`Delaunay`].
#[derive(Debug, Clone, Copy)]
pub struct DelaunayParams {
    pub backend: DelaunayBackend,
    /// Points closer than this are merged; also the in-circle dead band.
    pub eps: f64,
}

impl Default for DelaunayParams {
    fn default() -> Self {
        Self {
            backend: DelaunayBackend::default(),
            eps: 1e-9,
        }
    }
}

/// Computes a Delaunay triangulation.
#[derive(Debug, Clone, Default)]
pub struct Delaunay {
    params: DelaunayParams,
}

impl Delaunay {
    #[must_use]
    pub fn new(params: DelaunayParams) -> Self {
        Self { params }
    }

    #[must_use]
    pub fn with_backend(mut self, backend: DelaunayBackend) -> Self {
        self.params.backend = backend;
        self
    }

    /// Triangulates `points`.
    ///
    /// # Errors
    ///
    /// - `GeometryError::NotEnoughPoints` for fewer than three points
    /// - `GeometryError::Degenerate` if all points are collinear
    /// - `VoronoiError::Backend` if the `spade` backend rejects a point
    pub fn execute(&self, points: &[Point2]) -> Result<Triangulation> {
        if points.len() < 3 {
            return Err(GeometryError::NotEnoughPoints {
                required: 3,
                actual: points.len(),
            }
            .into());
        }
        let tri = match self.params.backend {
            DelaunayBackend::Incremental => triangulate_incremental(points, self.params.eps),
            DelaunayBackend::Spade => triangulate_spade(points)?,
            DelaunayBackend::ParabolicLift => triangulate_lifted(points, self.params.eps),
        };
        if tri.triangles.is_empty() {
            return Err(GeometryError::Degenerate("all points are collinear".into()).into());
        }
        tracing::trace!(
            backend = ?self.params.backend,
            points = points.len(),
            triangles = tri.triangles.len(),
            "delaunay triangulation"
        );
        Ok(tri)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::hull::tests::lcg_points;

    const ALL: [DelaunayBackend; 3] = [
        DelaunayBackend::Incremental,
        DelaunayBackend::Spade,
        DelaunayBackend::ParabolicLift,
    ];

    #[test]
    fn backends_agree_on_random_points() {
        for seed in 1..4 {
            let pts = lcg_points(40, seed, 50.0);
            let reference = Delaunay::default().execute(&pts).unwrap();
            assert!(reference.is_delaunay(1e-9));
            for backend in ALL {
                let tri = Delaunay::default().with_backend(backend).execute(&pts).unwrap();
                assert!(tri.is_consistent(), "{backend:?}");
                assert!(tri.is_delaunay(1e-9), "{backend:?}");
                assert_eq!(tri.edges(), reference.edges(), "seed {seed}, {backend:?}");
            }
        }
    }

    #[test]
    fn euler_characteristic() {
        let pts = lcg_points(60, 9, 10.0);
        let tri = Delaunay::default()
            .with_backend(DelaunayBackend::Incremental)
            .execute(&pts)
            .unwrap();
        // V - E + F = 1 for a triangulated disc (outer face excluded).
        let v = pts.len();
        let e = tri.edges().len();
        let f = tri.triangles.len();
        assert_eq!(v + f, e + 1);
        // F = 2V - 2 - H with H hull edges.
        assert_eq!(f, 2 * v - 2 - tri.hull_edges().len());
    }

    #[test]
    fn too_few_or_collinear_points_fail() {
        let two = [Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)];
        assert!(Delaunay::default().execute(&two).is_err());
        let line = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
        ];
        for backend in ALL {
            assert!(Delaunay::default().with_backend(backend).execute(&line).is_err());
        }
    }

    #[test]
    fn from_triangles_links_neighbors() {
        let pts = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        let tri = Triangulation::from_triangles(pts, vec![[0, 1, 2], [0, 2, 3]]);
        assert_eq!(tri.triangles[0].neighbors, [None, Some(1), None]);
        assert_eq!(tri.triangles[1].neighbors, [None, None, Some(0)]);
        assert!(tri.is_consistent());
        assert_eq!(tri.hull_edges().len(), 4);
    }
}
