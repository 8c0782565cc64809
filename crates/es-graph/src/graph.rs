//! Core graph data structures.

use es_core::{EdgeId, NodeId};

/// A directed, weighted edge `src -> dst`.
///
/// Attention and message passing aggregate into `src`, matching the
/// row-major convention of a sparse `(row, col)` edge index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub src: NodeId,
    pub dst: NodeId,
    pub weight: f64,
}

impl Edge {
    pub fn is_self_loop(&self) -> bool {
        self.src == self.dst
    }
}

/// A validated, immutable graph.
///
/// Edges keep their insertion order (the edge index is positional), and a
/// compact source adjacency maps each node to the edges leaving it.
#[derive(Debug, Clone)]
pub struct Graph {
    pub(crate) num_nodes: usize,
    pub(crate) edges: Vec<Edge>,

    /// Node i's outgoing edges are `src_edges[src_offsets[i]..src_offsets[i+1]]`.
    pub(crate) src_offsets: Vec<usize>,
    pub(crate) src_edges: Vec<EdgeId>,
}

impl Graph {
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// All edges in edge-index order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Get an edge by ID (returns None if out of bounds).
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.index())
    }

    /// Edges whose source is `node`, in edge-index order.
    pub fn out_edges(&self, node: NodeId) -> &[EdgeId] {
        let idx = node.index();
        if idx >= self.num_nodes {
            return &[];
        }
        &self.src_edges[self.src_offsets[idx]..self.src_offsets[idx + 1]]
    }

    /// Whether `node` already carries a self-loop.
    pub fn has_self_loop(&self, node: NodeId) -> bool {
        self.out_edges(node)
            .iter()
            .any(|&e| self.edges[e.index()].is_self_loop())
    }

    /// Row/column index arrays, the `[2, E]` edge index in split form.
    pub fn edge_index(&self) -> (Vec<usize>, Vec<usize>) {
        self.edges
            .iter()
            .map(|e| (e.src.index(), e.dst.index()))
            .unzip()
    }
}
