//! Graph-specific error types.

use es_core::{EdgeId, EsError, NodeId};

pub type GraphResult<T> = Result<T, GraphError>;

/// Graph construction and validation errors.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphError {
    /// An edge refers to a node that doesn't exist.
    InvalidNodeRef {
        edge: usize,
        node: usize,
        num_nodes: usize,
    },

    /// An edge carries a NaN or infinite weight.
    NonFiniteWeight { edge: usize, weight: f64 },

    /// The graph has more nodes or edges than an `Id` can address.
    TooLarge { what: &'static str, len: usize },

    /// Adjacency list is inconsistent (edge in node's list but edge doesn't start there).
    InconsistentAdjacency { edge: EdgeId, node: NodeId },
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphError::InvalidNodeRef {
                edge,
                node,
                num_nodes,
            } => {
                write!(
                    f,
                    "Edge {} refers to non-existent node {} (graph has {} nodes)",
                    edge, node, num_nodes
                )
            }
            GraphError::NonFiniteWeight { edge, weight } => {
                write!(f, "Edge {} has non-finite weight {}", edge, weight)
            }
            GraphError::TooLarge { what, len } => {
                write!(f, "Too many {} ({}) for compact ids", what, len)
            }
            GraphError::InconsistentAdjacency { edge, node } => {
                write!(
                    f,
                    "Edge {} in node {}'s adjacency list but doesn't start at that node",
                    edge, node
                )
            }
        }
    }
}

impl std::error::Error for GraphError {}

impl From<GraphError> for EsError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::InvalidNodeRef {
                node, num_nodes, ..
            } => EsError::IndexOob {
                what: "edge endpoint",
                index: node,
                len: num_nodes,
            },
            GraphError::NonFiniteWeight { weight, .. } => EsError::NonFinite {
                what: "edge weight",
                value: weight,
            },
            GraphError::TooLarge { .. } => EsError::InvalidArg { what: "graph size" },
            GraphError::InconsistentAdjacency { .. } => EsError::InvalidArg {
                what: "graph adjacency",
            },
        }
    }
}
