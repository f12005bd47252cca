use std::fmt::Write as _;

use super::{Graph, Weight};

/// Renders a graph in Graphviz DOT format, vertices labelled by identifier
/// and edges by weight.
#[must_use]
pub fn to_dot<W: Weight, G: Graph<W> + ?Sized>(graph: &G) -> String {
    let mut out = String::from("digraph paths\n{\n\t// vertices\n");
    for i in 0..graph.num_vertices() {
        let ident = graph.vertex_ident(i).unwrap_or_default();
        let _ = writeln!(out, "\t{i} [label=\"{ident}\"];");
    }
    out.push_str("\n\t// edges and weights\n");
    for (from, to, w) in graph.edges() {
        let _ = writeln!(out, "\t{from} -> {to} [label=\"{w}\"];");
    }
    out.push_str("}\n");
    out
}
