pub mod dijkstra;
pub mod dot;
pub mod list;
pub mod matrix;

use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::ops::Add;

pub use dijkstra::{
    bellman_ford, dijkstra, dijkstra_from, dijkstra_scan, dijkstra_scan_from, shortest_path,
    Predecessors, ShortestPaths, WeightFn,
};
pub use dot::to_dot;
pub use list::AdjacencyList;
pub use matrix::AdjacencyMatrix;

use crate::error::{GraphError, Result};

/// Edge weight of a [`Graph`].
pub trait Weight: Copy + PartialOrd + Add<Output = Self> + Debug + Display + Send + Sync {
    /// Additive identity.
    const ZERO: Self;
    /// Distance of an unreached vertex.
    const INFINITY: Self;

    /// Addition that never wraps past [`Weight::INFINITY`].
    #[must_use]
    fn saturating_add(self, rhs: Self) -> Self;
}

impl Weight for f64 {
    const ZERO: Self = 0.0;
    const INFINITY: Self = f64::INFINITY;

    fn saturating_add(self, rhs: Self) -> Self {
        self + rhs
    }
}

impl Weight for u32 {
    const ZERO: Self = 0;
    const INFINITY: Self = u32::MAX;

    fn saturating_add(self, rhs: Self) -> Self {
        u32::saturating_add(self, rhs)
    }
}

impl Weight for i64 {
    const ZERO: Self = 0;
    const INFINITY: Self = i64::MAX;

    fn saturating_add(self, rhs: Self) -> Self {
        i64::saturating_add(self, rhs)
    }
}

/// Edge direction relative to a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Edges leaving the vertex.
    #[default]
    Outgoing,
    /// Edges entering the vertex.
    Incoming,
}

/// Directed weighted graph with string-identified vertices.
///
/// Vertices are numbered densely in insertion order. Removing a vertex
/// renumbers every vertex after it, so callers holding indices must look them
/// up again by identifier.
pub trait Graph<W: Weight> {
    fn num_vertices(&self) -> usize;

    /// Adds a vertex and returns its index.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::DuplicateVertex` if `ident` is already present.
    fn add_vertex(&mut self, ident: &str) -> Result<usize>;

    fn vertex_index(&self, ident: &str) -> Option<usize>;

    fn vertex_ident(&self, index: usize) -> Option<&str>;

    /// Inserts or replaces the directed edge `from -> to`.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::IndexOutOfRange` for an unknown vertex index.
    fn add_edge_by_index(&mut self, from: usize, to: usize, weight: W) -> Result<()>;

    /// Removes the directed edge `from -> to`, returning its weight.
    fn remove_edge_by_index(&mut self, from: usize, to: usize) -> Option<W>;

    fn weight(&self, from: usize, to: usize) -> Option<W>;

    /// Indices adjacent to `index` along `direction`, in ascending order.
    fn neighbours(&self, index: usize, direction: Direction) -> Vec<usize>;

    /// Removes a vertex with all incident edges and renumbers the rest.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::IndexOutOfRange` for an unknown vertex index.
    fn remove_vertex_by_index(&mut self, index: usize) -> Result<()>;

    fn clear(&mut self);

    /// Index of `ident`.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::VertexNotFound` if no vertex has this identifier.
    fn index_of(&self, ident: &str) -> Result<usize> {
        self.vertex_index(ident)
            .ok_or_else(|| GraphError::VertexNotFound(ident.to_string()).into())
    }

    /// Inserts or replaces the directed edge between two identified vertices.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::VertexNotFound` if either vertex is unknown.
    fn add_edge(&mut self, from: &str, to: &str, weight: W) -> Result<()> {
        let from = self.index_of(from)?;
        let to = self.index_of(to)?;
        self.add_edge_by_index(from, to, weight)
    }

    /// Removes the directed edge between two identified vertices.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::VertexNotFound` if either vertex is unknown.
    fn remove_edge(&mut self, from: &str, to: &str) -> Result<Option<W>> {
        let from = self.index_of(from)?;
        let to = self.index_of(to)?;
        Ok(self.remove_edge_by_index(from, to))
    }

    /// Removes an identified vertex.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::VertexNotFound` if the vertex is unknown.
    fn remove_vertex(&mut self, ident: &str) -> Result<()> {
        let index = self.index_of(ident)?;
        self.remove_vertex_by_index(index)
    }

    /// Neighbours of an identified vertex.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::VertexNotFound` if the vertex is unknown.
    fn neighbours_of(&self, ident: &str, direction: Direction) -> Result<Vec<usize>> {
        Ok(self.neighbours(self.index_of(ident)?, direction))
    }

    fn is_adjacent(&self, from: usize, to: usize) -> bool {
        self.weight(from, to).is_some()
    }

    /// All edges as `(from, to, weight)`, ordered by source then target.
    fn edges(&self) -> Vec<(usize, usize, W)> {
        (0..self.num_vertices())
            .flat_map(|from| {
                self.neighbours(from, Direction::Outgoing)
                    .into_iter()
                    .filter_map(move |to| self.weight(from, to).map(|w| (from, to, w)))
            })
            .collect()
    }

    fn num_edges(&self) -> usize {
        (0..self.num_vertices())
            .map(|v| self.neighbours(v, Direction::Outgoing).len())
            .sum()
    }

    /// Inserts the edge in both directions.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::IndexOutOfRange` for an unknown vertex index.
    fn add_undirected_edge_by_index(&mut self, a: usize, b: usize, weight: W) -> Result<()> {
        self.add_edge_by_index(a, b, weight)?;
        self.add_edge_by_index(b, a, weight)
    }
}

/// Identifier table shared by both graph representations.
#[derive(Debug, Clone, Default)]
pub(crate) struct VertexIdents {
    names: Vec<String>,
    lookup: HashMap<String, usize>,
}

impl VertexIdents {
    pub(crate) fn len(&self) -> usize {
        self.names.len()
    }

    pub(crate) fn insert(&mut self, ident: &str) -> Result<usize> {
        if self.lookup.contains_key(ident) {
            return Err(GraphError::DuplicateVertex(ident.to_string()).into());
        }
        let index = self.names.len();
        self.names.push(ident.to_string());
        self.lookup.insert(ident.to_string(), index);
        Ok(index)
    }

    pub(crate) fn index(&self, ident: &str) -> Option<usize> {
        self.lookup.get(ident).copied()
    }

    pub(crate) fn ident(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub(crate) fn remove(&mut self, index: usize) -> Result<()> {
        check_index(index, self.names.len())?;
        let name = self.names.remove(index);
        self.lookup.remove(&name);
        for slot in self.lookup.values_mut() {
            if *slot > index {
                *slot -= 1;
            }
        }
        Ok(())
    }

    pub(crate) fn clear(&mut self) {
        self.names.clear();
        self.lookup.clear();
    }
}

pub(crate) fn check_index(index: usize, len: usize) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(GraphError::IndexOutOfRange { index, len }.into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    /// Five-vertex test graph shared by the representation and search tests.
    pub(crate) fn build_sample<G: Graph<u32>>(graph: &mut G) {
        for v in ["v1", "v2", "v3", "v4", "v5"] {
            graph.add_vertex(v).unwrap();
        }
        let edges = [
            ("v1", "v2", 1),
            ("v1", "v4", 9),
            ("v1", "v5", 10),
            ("v2", "v3", 3),
            ("v2", "v4", 7),
            ("v3", "v1", 10),
            ("v3", "v4", 1),
            ("v3", "v5", 2),
            ("v4", "v2", 1),
            ("v4", "v5", 2),
        ];
        for (a, b, w) in edges {
            graph.add_edge(a, b, w).unwrap();
        }
    }

    fn exercise<G: Graph<u32>>(mut graph: G) {
        build_sample(&mut graph);
        assert_eq!(graph.num_vertices(), 5);
        assert_eq!(graph.num_edges(), 10);
        assert_eq!(graph.vertex_ident(2), Some("v3"));
        assert_eq!(graph.neighbours(0, Direction::Outgoing), vec![1, 3, 4]);
        assert_eq!(graph.neighbours(3, Direction::Incoming), vec![0, 1, 2]);
        assert_eq!(graph.weight(2, 4), Some(2));
        assert!(graph.add_vertex("v1").is_err());
        assert!(graph.add_edge("v1", "v9", 1).is_err());

        graph.remove_vertex("v2").unwrap();
        assert_eq!(graph.num_vertices(), 4);
        assert_eq!(graph.vertex_index("v3"), Some(1));
        assert_eq!(graph.vertex_index("v2"), None);
        // v3 -> v4 survives with renumbered endpoints.
        assert_eq!(graph.weight(1, 2), Some(1));
        assert_eq!(graph.neighbours(2, Direction::Incoming), vec![0, 1]);
        assert_eq!(graph.num_edges(), 6);

        assert_eq!(graph.remove_edge("v3", "v4").unwrap(), Some(1));
        assert!(!graph.is_adjacent(1, 2));

        graph.clear();
        assert_eq!(graph.num_vertices(), 0);
    }

    #[test]
    fn matrix_contract() {
        exercise(AdjacencyMatrix::<u32>::new());
    }

    #[test]
    fn list_contract() {
        exercise(AdjacencyList::<u32>::new());
    }

    #[test]
    fn representations_agree_on_edges() {
        let mut m = AdjacencyMatrix::<u32>::new();
        let mut l = AdjacencyList::<u32>::new();
        build_sample(&mut m);
        build_sample(&mut l);
        assert_eq!(m.edges(), l.edges());
    }
}
