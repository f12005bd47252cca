use crate::error::Result;
use crate::graph::Graph;
use crate::math::{centroid, Point2, Vector2};
use crate::triangulation::{Delaunay, DelaunayParams, Triangulation};

use super::{LinearBisector, VoronoiDiagram};

/// Voronoi diagram of the triangulation's points as its dual.
///
/// Vertex `t` is the circumcentre of triangle `t`. Adjacent triangles give
/// finite bisectors; convex hull edges give bisectors running to infinity
/// along their outward normal.
///
/// # Errors
///
/// Fails only if the graph rejects a vertex, which cannot happen for a
/// freshly built diagram.
pub fn voronoi_from_triangulation(tri: &Triangulation) -> Result<VoronoiDiagram> {
    let mut diagram = VoronoiDiagram::default();
    for t in 0..tri.triangles.len() {
        let centre = tri
            .circumcentre(t)
            .or_else(|| centroid(&tri.triangle_points(t)))
            .unwrap_or_else(Point2::origin);
        diagram.vertices.push(centre);
        diagram.graph.add_vertex(&t.to_string())?;
    }

    let (min, max) = bounds(&tri.points);
    let far = 10.0 * (max - min).norm().max(1.0);

    for (t, triangle) in tri.triangles.iter().enumerate() {
        for slot in 0..3 {
            match triangle.neighbors[slot] {
                Some(u) if t < u => {
                    let len = (diagram.vertices[u] - diagram.vertices[t]).norm();
                    diagram.graph.add_undirected_edge_by_index(t, u, len)?;
                    diagram.linear_edges.push(LinearBisector {
                        line: (diagram.vertices[t], diagram.vertices[u]),
                        vertices: [Some(t), Some(u)],
                    });
                }
                Some(_) => {}
                None => {
                    // Counter-clockwise triangle: the outside lies right of a -> b.
                    let (a, b) = triangle.edge(slot);
                    let d = tri.points[b] - tri.points[a];
                    let outward = Vector2::new(d.y, -d.x).normalize();
                    let start = diagram.vertices[t];
                    diagram.linear_edges.push(LinearBisector {
                        line: (start, start + outward * far),
                        vertices: [Some(t), None],
                    });
                }
            }
        }
    }
    Ok(diagram)
}

fn bounds(points: &[Point2]) -> (Point2, Point2) {
    points.iter().fold(
        (
            Point2::new(f64::INFINITY, f64::INFINITY),
            Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        ),
        |(lo, hi), p| {
            (
                Point2::new(lo.x.min(p.x), lo.y.min(p.y)),
                Point2::new(hi.x.max(p.x), hi.y.max(p.y)),
            )
        },
    )
}

/// Voronoi diagram of a point set.
#[derive(Debug, Clone, Default)]
pub struct PointVoronoi {
    params: DelaunayParams,
}

impl PointVoronoi {
    #[must_use]
    pub fn new(params: DelaunayParams) -> Self {
        Self { params }
    }

    /// Triangulates `points` and returns the dual diagram with the triangulation.
    ///
    /// # Errors
    ///
    /// Propagates triangulation errors (too few or collinear points, backend failure).
    pub fn execute(&self, points: &[Point2]) -> Result<(VoronoiDiagram, Triangulation)> {
        let tri = Delaunay::new(self.params).execute(points)?;
        let diagram = voronoi_from_triangulation(&tri)?;
        tracing::debug!(
            vertices = diagram.vertices.len(),
            edges = diagram.linear_edges.len(),
            "point voronoi diagram"
        );
        Ok((diagram, tri))
    }
}
