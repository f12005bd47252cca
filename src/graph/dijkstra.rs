//! Single-source shortest paths.
//!
//! The heap-based and scan-based Dijkstra variants relax edges in different
//! orders but return identical predecessor arrays: among equally short
//! routes, every vertex records the smallest predecessor index that does not
//! itself route through that vertex.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::error::{GraphError, Result};

use super::{check_index, Direction, Graph, Weight};

/// Predecessor of every vertex on its shortest path from the source; `None`
/// for the source itself and for unreachable vertices.
pub type Predecessors = Vec<Option<usize>>;

/// Optional reshaping of edge weights: `(from, to, weight) -> weight`.
pub type WeightFn<'a, W> = &'a dyn Fn(usize, usize, W) -> W;

/// Distances and predecessors from one source vertex.
#[derive(Debug, Clone)]
pub struct ShortestPaths<W> {
    pub source: usize,
    pub distances: Vec<W>,
    pub predecessors: Predecessors,
}

impl<W: Weight> ShortestPaths<W> {
    fn init(n: usize, source: usize) -> Self {
        let mut distances = vec![W::INFINITY; n];
        distances[source] = W::ZERO;
        Self {
            source,
            distances,
            predecessors: vec![None; n],
        }
    }

    #[must_use]
    pub fn is_reachable(&self, target: usize) -> bool {
        self.distances
            .get(target)
            .is_some_and(|d| *d < W::INFINITY)
    }

    /// Vertex indices from the source to `target`, or `None` if unreachable.
    #[must_use]
    pub fn path_to(&self, target: usize) -> Option<Vec<usize>> {
        if !self.is_reachable(target) {
            return None;
        }
        let mut path = vec![target];
        let mut current = target;
        while current != self.source {
            current = self.predecessors[current]?;
            path.push(current);
            if path.len() > self.distances.len() {
                return None;
            }
        }
        path.reverse();
        Some(path)
    }

    /// Whether the predecessor chain of `from` passes through `to`.
    fn routes_through(&self, from: usize, to: usize) -> bool {
        let mut current = Some(from);
        for _ in 0..=self.predecessors.len() {
            match current {
                Some(v) if v == to => return true,
                Some(v) => current = self.predecessors[v],
                None => return false,
            }
        }
        true
    }

    /// Relaxes `from -> to`. Returns `(improved, changed)`.
    fn relax(&mut self, from: usize, to: usize, weight: W) -> (bool, bool) {
        if self.distances[from].partial_cmp(&W::INFINITY) != Some(Ordering::Less) {
            return (false, false);
        }
        let candidate = self.distances[from].saturating_add(weight);
        match candidate.partial_cmp(&self.distances[to]) {
            // The source only improves on a negative cycle.
            Some(Ordering::Less) => {
                self.distances[to] = candidate;
                self.predecessors[to] = Some(from);
                (true, true)
            }
            Some(Ordering::Equal)
                if to != self.source
                    && self.predecessors[to].is_some_and(|p| from < p)
                    && !self.routes_through(from, to) =>
            {
                self.predecessors[to] = Some(from);
                (false, true)
            }
            _ => (false, false),
        }
    }
}

fn edge_weight<W: Weight, G: Graph<W> + ?Sized>(
    graph: &G,
    weight_fn: Option<WeightFn<'_, W>>,
    from: usize,
    to: usize,
) -> Option<W> {
    let w = graph.weight(from, to)?;
    Some(weight_fn.map_or(w, |f| f(from, to, w)))
}

#[derive(Debug, Clone, Copy)]
struct QueueEntry<W> {
    cost: W,
    node: usize,
}

impl<W: Weight> PartialEq for QueueEntry<W> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<W: Weight> Eq for QueueEntry<W> {}

impl<W: Weight> Ord for QueueEntry<W> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap.
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl<W: Weight> PartialOrd for QueueEntry<W> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Dijkstra with a binary heap and lazy deletion of stale entries.
///
/// Weights must be non-negative.
///
/// # Errors
///
/// Returns `GraphError::IndexOutOfRange` if `source` is not a vertex.
pub fn dijkstra_from<W: Weight, G: Graph<W> + ?Sized>(
    graph: &G,
    source: usize,
    weight_fn: Option<WeightFn<'_, W>>,
) -> Result<ShortestPaths<W>> {
    let n = graph.num_vertices();
    check_index(source, n)?;
    let mut sp = ShortestPaths::init(n, source);

    let mut heap = BinaryHeap::new();
    heap.push(QueueEntry {
        cost: W::ZERO,
        node: source,
    });
    while let Some(QueueEntry { cost, node }) = heap.pop() {
        if cost > sp.distances[node] {
            continue;
        }
        for next in graph.neighbours(node, Direction::Outgoing) {
            let Some(w) = edge_weight(graph, weight_fn, node, next) else {
                continue;
            };
            if sp.relax(node, next, w).0 {
                heap.push(QueueEntry {
                    cost: sp.distances[next],
                    node: next,
                });
            }
        }
    }
    Ok(sp)
}

/// Dijkstra selecting the closest unsettled vertex by a linear scan, `O(V^2)`.
///
/// Weights must be non-negative.
///
/// # Errors
///
/// Returns `GraphError::IndexOutOfRange` if `source` is not a vertex.
pub fn dijkstra_scan_from<W: Weight, G: Graph<W> + ?Sized>(
    graph: &G,
    source: usize,
    weight_fn: Option<WeightFn<'_, W>>,
) -> Result<ShortestPaths<W>> {
    let n = graph.num_vertices();
    check_index(source, n)?;
    let mut sp = ShortestPaths::init(n, source);
    let mut settled = vec![false; n];

    loop {
        let mut closest: Option<usize> = None;
        for v in (0..n).filter(|&v| !settled[v] && sp.distances[v] < W::INFINITY) {
            if closest.is_none_or(|c| sp.distances[v] < sp.distances[c]) {
                closest = Some(v);
            }
        }
        let Some(node) = closest else {
            break;
        };
        settled[node] = true;

        for next in graph.neighbours(node, Direction::Outgoing) {
            if let Some(w) = edge_weight(graph, weight_fn, node, next) {
                sp.relax(node, next, w);
            }
        }
    }
    Ok(sp)
}

/// Predecessor array of the heap-based Dijkstra from the vertex `source`.
///
/// # Errors
///
/// Returns `GraphError::VertexNotFound` if `source` is unknown.
pub fn dijkstra<W: Weight, G: Graph<W> + ?Sized>(graph: &G, source: &str) -> Result<Predecessors> {
    Ok(dijkstra_from(graph, graph.index_of(source)?, None)?.predecessors)
}

/// Predecessor array of the scan-based Dijkstra from the vertex `source`.
///
/// # Errors
///
/// Returns `GraphError::VertexNotFound` if `source` is unknown.
pub fn dijkstra_scan<W: Weight, G: Graph<W> + ?Sized>(
    graph: &G,
    source: &str,
) -> Result<Predecessors> {
    Ok(dijkstra_scan_from(graph, graph.index_of(source)?, None)?.predecessors)
}

/// Bellman-Ford shortest paths; accepts negative weights.
///
/// # Errors
///
/// Returns `GraphError::VertexNotFound` if `source` is unknown and
/// `GraphError::NegativeCycle` if a negative cycle is reachable from it.
pub fn bellman_ford<W: Weight, G: Graph<W> + ?Sized>(
    graph: &G,
    source: &str,
) -> Result<ShortestPaths<W>> {
    let source = graph.index_of(source)?;
    let n = graph.num_vertices();
    let mut sp = ShortestPaths::init(n, source);
    let edges = graph.edges();

    let mut improving_passes = 0usize;
    loop {
        let (mut improved, mut changed) = (false, false);
        for &(from, to, w) in &edges {
            let (i, c) = sp.relax(from, to, w);
            improved |= i;
            changed |= c;
        }
        if !changed {
            break;
        }
        if improved {
            improving_passes += 1;
            if improving_passes >= n {
                return Err(GraphError::NegativeCycle.into());
            }
        }
    }
    Ok(sp)
}

/// Shortest vertex path between two indices, or `None` if unreachable.
///
/// # Errors
///
/// Returns `GraphError::IndexOutOfRange` for an unknown index.
pub fn shortest_path<W: Weight, G: Graph<W> + ?Sized>(
    graph: &G,
    from: usize,
    to: usize,
    weight_fn: Option<WeightFn<'_, W>>,
) -> Result<Option<Vec<usize>>> {
    check_index(to, graph.num_vertices())?;
    Ok(dijkstra_from(graph, from, weight_fn)?.path_to(to))
}
