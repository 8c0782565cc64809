//! Self-loop completion.

use crate::builder::GraphBuilder;
use crate::error::GraphResult;
use crate::graph::Graph;

impl Graph {
    /// Return a copy where every node lacking a self-loop gets one with
    /// weight `fill_value`.
    ///
    /// Existing self-loops keep their weight. New loops are appended after
    /// the original edges, in node order.
    pub fn with_remaining_self_loops(&self, fill_value: f64) -> GraphResult<Graph> {
        let mut builder = GraphBuilder::new(self.num_nodes);
        for edge in &self.edges {
            builder.add_weighted_edge(edge.src.index(), edge.dst.index(), edge.weight);
        }

        let mut has_loop = vec![false; self.num_nodes];
        for edge in self.edges.iter().filter(|e| e.is_self_loop()) {
            has_loop[edge.src.index()] = true;
        }
        for (node, _) in has_loop.iter().enumerate().filter(|(_, present)| !**present) {
            builder.add_weighted_edge(node, node, fill_value);
        }

        builder.build()
    }
}
