use crate::error::Result;

use super::{check_index, Direction, Graph, VertexIdents, Weight};

/// Graph stored as a dense `n x n` weight matrix.
#[derive(Debug, Clone)]
pub struct AdjacencyMatrix<W> {
    idents: VertexIdents,
    weights: Vec<Vec<Option<W>>>,
}

impl<W: Weight> AdjacencyMatrix<W> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            idents: VertexIdents::default(),
            weights: Vec::new(),
        }
    }
}

impl<W: Weight> Default for AdjacencyMatrix<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Weight> Graph<W> for AdjacencyMatrix<W> {
    fn num_vertices(&self) -> usize {
        self.idents.len()
    }

    fn add_vertex(&mut self, ident: &str) -> Result<usize> {
        let index = self.idents.insert(ident)?;
        for row in &mut self.weights {
            row.push(None);
        }
        self.weights.push(vec![None; index + 1]);
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
        self.weights[from][to] = Some(weight);
        Ok(())
    }

    fn remove_edge_by_index(&mut self, from: usize, to: usize) -> Option<W> {
        self.weights.get_mut(from)?.get_mut(to)?.take()
    }

    fn weight(&self, from: usize, to: usize) -> Option<W> {
        *self.weights.get(from)?.get(to)?
    }

    fn neighbours(&self, index: usize, direction: Direction) -> Vec<usize> {
        if index >= self.num_vertices() {
            return Vec::new();
        }
        match direction {
            Direction::Outgoing => self.weights[index]
                .iter()
                .enumerate()
                .filter_map(|(j, w)| w.map(|_| j))
                .collect(),
            Direction::Incoming => self
                .weights
                .iter()
                .enumerate()
                .filter_map(|(j, row)| row[index].map(|_| j))
                .collect(),
        }
    }

    fn remove_vertex_by_index(&mut self, index: usize) -> Result<()> {
        self.idents.remove(index)?;
        self.weights.remove(index);
        for row in &mut self.weights {
            row.remove(index);
        }
        Ok(())
    }

    fn clear(&mut self) {
        self.idents.clear();
        self.weights.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn rows_grow_with_vertices() {
        let mut g = AdjacencyMatrix::<f64>::new();
        g.add_vertex("a").unwrap();
        g.add_vertex("b").unwrap();
        g.add_vertex("c").unwrap();
        g.add_edge("c", "a", 2.5).unwrap();
        assert_eq!(g.weight(2, 0), Some(2.5));
        assert_eq!(g.weight(0, 2), None);
        assert!(g.add_edge_by_index(0, 3, 1.0).is_err());
        assert_eq!(g.neighbours(7, Direction::Outgoing), Vec::<usize>::new());
    }
}
