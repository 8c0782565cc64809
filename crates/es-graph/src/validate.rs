//! Graph validation logic.

use es_core::{EdgeId, NodeId};

use crate::builder::RawEdge;
use crate::error::{GraphError, GraphResult};
use crate::graph::Edge;

/// Every endpoint must exist and every weight must be finite.
pub(crate) fn validate_edges(num_nodes: usize, edges: &[RawEdge]) -> GraphResult<()> {
    for (i, edge) in edges.iter().enumerate() {
        for node in [edge.src, edge.dst] {
            if node >= num_nodes {
                return Err(GraphError::InvalidNodeRef {
                    edge: i,
                    node,
                    num_nodes,
                });
            }
        }
        if !edge.weight.is_finite() {
            return Err(GraphError::NonFiniteWeight {
                edge: i,
                weight: edge.weight,
            });
        }
    }
    Ok(())
}

/// Validate the source adjacency against the edge list.
pub(crate) fn validate_adjacency(
    num_nodes: usize,
    edges: &[Edge],
    src_offsets: &[usize],
    src_edges: &[EdgeId],
) -> GraphResult<()> {
    if src_offsets.len() != num_nodes + 1 || src_edges.len() != edges.len() {
        return Err(GraphError::TooLarge {
            what: "adjacency entries",
            len: src_edges.len(),
        });
    }

    for node in 0..num_nodes {
        let (start, end) = (src_offsets[node], src_offsets[node + 1]);
        for &edge_id in &src_edges[start..end] {
            let Some(edge) = edges.get(edge_id.index()) else {
                return Err(GraphError::TooLarge {
                    what: "edge id",
                    len: edge_id.index(),
                });
            };
            if edge.src.index() != node {
                return Err(GraphError::InconsistentAdjacency {
                    edge: edge_id,
                    node: NodeId::from_usize(node).unwrap_or(edge.src),
                });
            }
        }
    }

    Ok(())
}
