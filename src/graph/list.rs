use std::collections::BTreeMap;

use crate::error::Result;

use super::{check_index, Direction, Graph, VertexIdents, Weight};

/// Graph stored as per-vertex sorted maps of outgoing edges.
///
/// Sparse graphs such as Voronoi roadmaps stay linear in their edge count.
#[derive(Debug, Clone)]
pub struct AdjacencyList<W> {
    idents: VertexIdents,
    outgoing: Vec<BTreeMap<usize, W>>,
}

impl<W: Weight> AdjacencyList<W> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            idents: VertexIdents::default(),
            outgoing: Vec::new(),
        }
    }

    /// Outgoing edges of `index` with their weights.
    pub fn out_edges(&self, index: usize) -> impl Iterator<Item = (usize, W)> + '_ {
        self.outgoing
            .get(index)
            .into_iter()
            .flat_map(|edges| edges.iter().map(|(&to, &w)| (to, w)))
    }
}

impl<W: Weight> Default for AdjacencyList<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Weight> Graph<W> for AdjacencyList<W> {
    fn num_vertices(&self) -> usize {
        self.idents.len()
    }

    fn add_vertex(&mut self, ident: &str) -> Result<usize> {
        let index = self.idents.insert(ident)?;
        self.outgoing.push(BTreeMap::new());
        Ok(index)
    }

    fn vertex_index(&self, ident: &str) -> Option<usize> {
        self.idents.index(ident)
    }

    fn vertex_ident(&self, index: usize) -> Option<&str> {
        self.idents.ident(index)
    }

    fn add_edge_by_index(&mut self, from: usize, to: usize, weight: W) -> Result<()> {
        let n = self.num_vertices();
        check_index(from, n)?;
        check_index(to, n)?;
        self.outgoing[from].insert(to, weight);
        Ok(())
    }

    fn remove_edge_by_index(&mut self, from: usize, to: usize) -> Option<W> {
        self.outgoing.get_mut(from)?.remove(&to)
    }

    fn weight(&self, from: usize, to: usize) -> Option<W> {
        self.outgoing.get(from)?.get(&to).copied()
    }

    fn neighbours(&self, index: usize, direction: Direction) -> Vec<usize> {
        match direction {
            Direction::Outgoing => self
                .outgoing
                .get(index)
                .map(|edges| edges.keys().copied().collect())
                .unwrap_or_default(),
            Direction::Incoming => self
                .outgoing
                .iter()
                .enumerate()
                .filter(|(_, edges)| edges.contains_key(&index))
                .map(|(from, _)| from)
                .collect(),
        }
    }

    fn remove_vertex_by_index(&mut self, index: usize) -> Result<()> {
        self.idents.remove(index)?;
        self.outgoing.remove(index);
        for edges in &mut self.outgoing {
            edges.remove(&index);
            *edges = std::mem::take(edges)
                .into_iter()
                .map(|(to, w)| (if to > index { to - 1 } else { to }, w))
                .collect();
        }
        Ok(())
    }

    fn clear(&mut self) {
        self.idents.clear();
        self.outgoing.clear();
    }

    fn num_edges(&self) -> usize {
        self.outgoing.iter().map(BTreeMap::len).sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn replacing_an_edge_keeps_one_entry() {
        let mut g = AdjacencyList::<f64>::new();
        g.add_vertex("a").unwrap();
        g.add_vertex("b").unwrap();
        g.add_edge("a", "b", 1.0).unwrap();
        g.add_edge("a", "b", 3.0).unwrap();
        assert_eq!(g.num_edges(), 1);
        assert_eq!(g.out_edges(0).collect::<Vec<_>>(), vec![(1, 3.0)]);
    }

    #[test]
    fn removal_renumbers_targets() {
        let mut g = AdjacencyList::<u32>::new();
        for v in ["a", "b", "c", "d"] {
            g.add_vertex(v).unwrap();
        }
        g.add_edge("a", "d", 4).unwrap();
        g.add_edge("d", "c", 3).unwrap();
        g.remove_vertex("b").unwrap();
        assert_eq!(g.weight(0, 2), Some(4));
        assert_eq!(g.weight(2, 1), Some(3));
        assert_eq!(g.vertex_ident(2), Some("d"));
    }
}
