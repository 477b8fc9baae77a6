//! Conversion to and from petgraph.

use crate::graph::GraphData;
use crate::Result;
use petgraph::graph::{DiGraph, Graph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::EdgeType;

impl GraphData {
    /// Build the edge index of a petgraph graph.
    ///
    /// Node ids are petgraph's node indices. Undirected graphs contribute both
    /// directions of every edge. Weights are dropped.
    pub fn from_petgraph<N, E, Ty: EdgeType>(graph: &Graph<N, E, Ty>) -> Result<Self> {
        let per_edge = if graph.is_directed() { 1 } else { 2 };
        let mut edges = Vec::with_capacity(graph.edge_count() * per_edge);
        for edge in graph.edge_references() {
            let (src, dst) = (edge.source().index(), edge.target().index());
            edges.push((src, dst));
            if !graph.is_directed() && src != dst {
                edges.push((dst, src));
            }
        }
        Self::from_edges(&edges, graph.node_count())
    }

    /// Directed petgraph view of the topology; node weights are node ids.
    pub fn to_petgraph(&self) -> DiGraph<usize, ()> {
        let mut graph = DiGraph::with_capacity(self.num_nodes(), self.num_edges());
        for v in 0..self.num_nodes() {
            graph.add_node(v);
        }
        for (src, dst) in self.edges() {
            graph.add_edge(NodeIndex::new(src), NodeIndex::new(dst), ());
        }
        graph
    }
}
