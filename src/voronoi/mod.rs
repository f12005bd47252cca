pub mod points;
pub mod segments;

pub use points::{voronoi_from_triangulation, PointVoronoi};
pub use segments::{SegmentVoronoi, SegmentVoronoiParams};

use crate::error::{Result, VoronoiError};
use crate::graph::{AdjacencyList, Graph};
use crate::math::distance_2d::nearest_point;
use crate::math::Point2;
use crate::triangulation::DelaunayBackend;

/// Triangulation used underneath the segment Voronoi construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoronoiBackend {
    /// `spade` with exact predicates.
    #[default]
    Spade,
    /// The in-crate incremental flip algorithm.
    Incremental,
}

impl From<VoronoiBackend> for DelaunayBackend {
    fn from(backend: VoronoiBackend) -> Self {
        match backend {
            VoronoiBackend::Spade => DelaunayBackend::Spade,
            VoronoiBackend::Incremental => DelaunayBackend::Incremental,
        }
    }
}

/// A straight bisector. A `None` vertex marks an end at infinity, in which
/// case the matching end of `line` is a far point along the bisector.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearBisector {
    pub line: (Point2, Point2),
    pub vertices: [Option<usize>; 2],
}

impl LinearBisector {
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.vertices.iter().all(Option::is_some)
    }
}

/// A parabolic bisector discretized as a polyline from `vertices[0]` to `vertices[1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParabolicBisector {
    pub points: Vec<Point2>,
    pub vertices: [usize; 2],
}

/// Voronoi vertices, bisectors and the weighted vertex graph.
///
/// Graph vertex `i` is Voronoi vertex `i`; every finite bisector is stored
/// as two directed edges weighted by its length.
#[derive(Debug, Clone, Default)]
pub struct VoronoiDiagram {
    pub vertices: Vec<Point2>,
    pub linear_edges: Vec<LinearBisector>,
    pub parabolic_edges: Vec<ParabolicBisector>,
    pub graph: AdjacencyList<f64>,
}

impl VoronoiDiagram {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Index of the Voronoi vertex closest to `p`.
    #[must_use]
    pub fn nearest_vertex(&self, p: &Point2) -> Option<usize> {
        nearest_point(&self.vertices, p).map(|(i, _)| i)
    }

    /// Polyline of the bisector between two adjacent vertices, oriented from
    /// `from` to `to`. Straight bisectors yield their two end points.
    #[must_use]
    pub fn bisector_points(&self, from: usize, to: usize) -> Option<Vec<Point2>> {
        for edge in &self.parabolic_edges {
            match edge.vertices {
                [a, b] if a == from && b == to => return Some(edge.points.clone()),
                [a, b] if a == to && b == from => {
                    return Some(edge.points.iter().rev().copied().collect())
                }
                _ => {}
            }
        }
        if self.graph.is_adjacent(from, to) {
            return Some(vec![*self.vertices.get(from)?, *self.vertices.get(to)?]);
        }
        None
    }

    /// Removes every vertex without graph edges, together with the bisectors
    /// that reference it. Later indices shift down by one per removal.
    /// Returns the number of removed vertices.
    ///
    /// # Errors
    ///
    /// Returns `VoronoiError::IndexOutOfRange` if the graph and the vertex list
    /// disagree in size.
    pub fn remove_unconnected_vertices(&mut self) -> Result<usize> {
        let n = self.graph.num_vertices();
        if n != self.vertices.len() {
            return Err(VoronoiError::IndexOutOfRange {
                index: n,
                len: self.vertices.len(),
            }
            .into());
        }
        let unconnected: Vec<usize> = (0..n)
            .filter(|&v| self.graph.out_edges(v).next().is_none())
            .collect();
        self.remove_vertices(&unconnected)?;
        Ok(unconnected.len())
    }

    /// Removes the given vertex indices (as numbered before the call).
    ///
    /// # Errors
    ///
    /// Returns `VoronoiError::IndexOutOfRange` for an index beyond the vertex list.
    pub fn remove_vertices(&mut self, indices: &[usize]) -> Result<()> {
        let mut indices = indices.to_vec();
        indices.sort_unstable();
        indices.dedup();

        for &idx in indices.iter().rev() {
            if idx >= self.vertices.len() {
                return Err(VoronoiError::IndexOutOfRange {
                    index: idx,
                    len: self.vertices.len(),
                }
                .into());
            }
            self.vertices.remove(idx);
            if idx < self.graph.num_vertices() {
                self.graph.remove_vertex_by_index(idx)?;
            }

            self.linear_edges
                .retain(|e| !e.vertices.iter().any(|v| *v == Some(idx)));
            for edge in &mut self.linear_edges {
                for v in edge.vertices.iter_mut().flatten() {
                    if *v > idx {
                        *v -= 1;
                    }
                }
            }

            self.parabolic_edges.retain(|e| !e.vertices.contains(&idx));
            for edge in &mut self.parabolic_edges {
                for v in &mut edge.vertices {
                    if *v > idx {
                        *v -= 1;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> VoronoiDiagram {
        let mut d = VoronoiDiagram {
            vertices: vec![
                Point2::new(0.0, 0.0),
                Point2::new(1.0, 0.0),
                Point2::new(5.0, 5.0),
                Point2::new(2.0, 0.0),
            ],
            ..VoronoiDiagram::default()
        };
        for i in 0..4 {
            d.graph.add_vertex(&i.to_string()).unwrap();
        }
        d.graph.add_undirected_edge_by_index(0, 1, 1.0).unwrap();
        d.graph.add_undirected_edge_by_index(1, 3, 1.0).unwrap();
        d.linear_edges.push(LinearBisector {
            line: (d.vertices[0], d.vertices[1]),
            vertices: [Some(0), Some(1)],
        });
        d.linear_edges.push(LinearBisector {
            line: (d.vertices[2], Point2::new(50.0, 5.0)),
            vertices: [Some(2), None],
        });
        d.parabolic_edges.push(ParabolicBisector {
            points: vec![d.vertices[1], Point2::new(1.5, 0.2), d.vertices[3]],
            vertices: [1, 3],
        });
        d
    }

    #[test]
    fn unconnected_vertex_removed_and_indices_shift() {
        let mut d = sample();
        assert_eq!(d.remove_unconnected_vertices().unwrap(), 1);
        assert_eq!(d.vertices.len(), 3);
        assert_eq!(d.linear_edges.len(), 1);
        assert_eq!(d.parabolic_edges[0].vertices, [1, 2]);
        assert_eq!(d.graph.num_vertices(), 3);
        assert_eq!(d.graph.weight(1, 2), Some(1.0));
    }

    #[test]
    fn out_of_range_is_reported() {
        let mut d = sample();
        let err = d.remove_vertices(&[1, 9]).unwrap_err();
        assert!(matches!(
            err,
            crate::error::PathsError::Voronoi(VoronoiError::IndexOutOfRange { index: 9, len: 4 })
        ));
    }

    #[test]
    fn bisector_points_follow_direction() {
        let d = sample();
        let fwd = d.bisector_points(1, 3).unwrap();
        let back = d.bisector_points(3, 1).unwrap();
        assert_eq!(fwd.len(), 3);
        assert_eq!(fwd[0], back[2]);
        assert_eq!(d.bisector_points(0, 1).unwrap().len(), 2);
        assert!(d.bisector_points(0, 2).is_none());
        assert_eq!(d.nearest_vertex(&Point2::new(4.0, 4.0)), Some(2));
    }
}
