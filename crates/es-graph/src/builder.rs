//! Incremental graph builder.

use es_core::{EdgeId, NodeId};

use crate::error::{GraphError, GraphResult};
use crate::graph::{Edge, Graph};
use crate::validate;

/// Edge as recorded by the builder, before ids are assigned.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RawEdge {
    pub src: usize,
    pub dst: usize,
    pub weight: f64,
}

/// Builder for constructing a graph over a fixed node set `0..num_nodes`.
///
/// Use `add_edge` and friends to record connectivity, then call `build()` to
/// validate and freeze it into an immutable `Graph`.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    num_nodes: usize,
    edges: Vec<RawEdge>,
}

impl GraphBuilder {
    /// Create an empty builder over `num_nodes` nodes.
    pub fn new(num_nodes: usize) -> Self {
        Self {
            num_nodes,
            edges: Vec::new(),
        }
    }

    /// Build directly from split edge-index arrays with optional weights.
    ///
    /// Missing weights default to 1.0.
    pub fn from_edge_index(
        num_nodes: usize,
        rows: &[usize],
        cols: &[usize],
        weights: Option<&[f64]>,
    ) -> GraphResult<Graph> {
        if rows.len() != cols.len() || weights.is_some_and(|w| w.len() != rows.len()) {
            return Err(GraphError::TooLarge {
                what: "edge index entries (row/col/weight lengths differ)",
                len: rows.len().max(cols.len()),
            });
        }
        let mut builder = Self::new(num_nodes);
        for (i, (&src, &dst)) in rows.iter().zip(cols).enumerate() {
            let weight = weights.map_or(1.0, |w| w[i]);
            builder.add_weighted_edge(src, dst, weight);
        }
        builder.build()
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Add a unit-weight directed edge.
    pub fn add_edge(&mut self, src: usize, dst: usize) -> &mut Self {
        self.add_weighted_edge(src, dst, 1.0)
    }

    /// Add a weighted directed edge.
    pub fn add_weighted_edge(&mut self, src: usize, dst: usize, weight: f64) -> &mut Self {
        self.edges.push(RawEdge { src, dst, weight });
        self
    }

    /// Add both `a -> b` and `b -> a` with unit weight.
    pub fn add_undirected_edge(&mut self, a: usize, b: usize) -> &mut Self {
        self.add_edge(a, b);
        self.add_edge(b, a)
    }

    /// Build and validate the graph, returning an immutable `Graph`.
    pub fn build(self) -> GraphResult<Graph> {
        validate::validate_edges(self.num_nodes, &self.edges)?;

        let edges = self
            .edges
            .iter()
            .map(|raw| {
                let src = NodeId::from_usize(raw.src);
                let dst = NodeId::from_usize(raw.dst);
                match (src, dst) {
                    (Some(src), Some(dst)) => Ok(Edge {
                        src,
                        dst,
                        weight: raw.weight,
                    }),
                    _ => Err(GraphError::TooLarge {
                        what: "nodes",
                        len: self.num_nodes,
                    }),
                }
            })
            .collect::<GraphResult<Vec<_>>>()?;

        let (src_offsets, src_edges) = Self::build_adjacency(self.num_nodes, &edges)?;

        validate::validate_adjacency(self.num_nodes, &edges, &src_offsets, &src_edges)?;

        Ok(Graph {
            num_nodes: self.num_nodes,
            edges,
            src_offsets,
            src_edges,
        })
    }

    /// Counting sort of edges by source node, keeping edge-index order within a node.
    fn build_adjacency(num_nodes: usize, edges: &[Edge]) -> GraphResult<(Vec<usize>, Vec<EdgeId>)> {
        let mut counts = vec![0usize; num_nodes];
        for edge in edges {
            counts[edge.src.index()] += 1;
        }

        let mut offsets = Vec::with_capacity(num_nodes + 1);
        offsets.push(0);
        for count in &counts {
            let last = offsets[offsets.len() - 1];
            offsets.push(last + count);
        }

        let mut cursor = offsets[..num_nodes].to_vec();
        let mut flat = vec![None; edges.len()];
        for (i, edge) in edges.iter().enumerate() {
            let slot = &mut cursor[edge.src.index()];
            flat[*slot] = EdgeId::from_usize(i);
            *slot += 1;
        }

        let flat = flat
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or(GraphError::TooLarge {
                what: "edges",
                len: edges.len(),
            })?;

        Ok((offsets, flat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_records_edges() {
        let mut builder = GraphBuilder::new(3);
        builder.add_edge(0, 1).add_undirected_edge(1, 2);
        assert_eq!(builder.edges.len(), 3);
        assert_eq!(builder.num_nodes(), 3);
    }

    #[test]
    fn builder_build_adjacency() {
        let mut builder = GraphBuilder::new(3);
        builder.add_edge(2, 0).add_edge(0, 1).add_edge(2, 1);
        let graph = builder.build().unwrap();

        let n0 = NodeId::new(0).unwrap();
        let n1 = NodeId::new(1).unwrap();
        let n2 = NodeId::new(2).unwrap();
        assert_eq!(graph.out_edges(n0).len(), 1);
        assert!(graph.out_edges(n1).is_empty());

        let from_two: Vec<usize> = graph.out_edges(n2).iter().map(|e| e.index()).collect();
        assert_eq!(from_two, vec![0, 2]);
    }

    #[test]
    fn builder_rejects_dangling_edge() {
        let mut builder = GraphBuilder::new(2);
        builder.add_edge(0, 5);
        let err = builder.build().unwrap_err();
        assert!(matches!(err, GraphError::InvalidNodeRef { node: 5, .. }));
    }

    #[test]
    fn from_edge_index_defaults_weights() {
        let graph = GraphBuilder::from_edge_index(2, &[0, 1], &[1, 0], None).unwrap();
        assert!(graph.edges().iter().all(|e| e.weight == 1.0));

        let err = GraphBuilder::from_edge_index(2, &[0, 1], &[1], None);
        assert!(err.is_err());
    }
}
