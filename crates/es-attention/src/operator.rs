//! Dense node-space operator built from edge attention.

use std::borrow::Cow;

use es_core::{Real, State};
use es_graph::Graph;
use nalgebra::DMatrix;

use crate::config::AttentionOptions;
use crate::error::AttentionResult;
use crate::layer::GraphAttentionLayer;

/// Head-averaged attention operator over one graph.
///
/// `matrix[(src, dst)]` accumulates the attention weight of every edge
/// `src -> dst`, averaged across heads. `features` holds the head-averaged
/// attention-weighted projections mapped back through the output projection;
/// they are diagnostic only and play no part in the implicit solve.
#[derive(Debug, Clone)]
pub struct AttentionOperator {
    matrix: DMatrix<Real>,
    features: State,
    num_edges: usize,
}

impl AttentionOperator {
    /// Run `layer` over `x` and aggregate the result.
    ///
    /// Missing self-loops are added first when `opts.self_loop_weight > 0`.
    pub fn compute(
        layer: &GraphAttentionLayer,
        x: &State,
        graph: &Graph,
        opts: &AttentionOptions,
    ) -> AttentionResult<Self> {
        opts.validate()?;
        let graph = if opts.self_loop_weight > 0.0 {
            Cow::Owned(graph.with_remaining_self_loops(opts.self_loop_weight)?)
        } else {
            Cow::Borrowed(graph)
        };

        let out = layer.forward(x, &graph)?;
        let n = x.nrows();
        let heads = layer.heads();
        let d_k = layer.head_dim();
        let inv_heads = 1.0 / heads as Real;

        let mut matrix = DMatrix::zeros(n, n);
        let mut aggregated = DMatrix::zeros(n, d_k);
        for (e, edge) in graph.edges().iter().enumerate() {
            let (src, dst) = (edge.src.index(), edge.dst.index());
            for h in 0..heads {
                let weight = out.attention[(e, h)] * inv_heads;
                matrix[(src, dst)] += weight;
                for k in 0..d_k {
                    aggregated[(src, k)] += weight * out.wx[(dst, h * d_k + k)];
                }
            }
        }
        let features = aggregated * layer.output_projection();

        tracing::debug!(
            nodes = n,
            edges = graph.num_edges(),
            heads,
            "attention operator computed"
        );

        Ok(Self {
            matrix,
            features,
            num_edges: graph.num_edges(),
        })
    }

    /// Wrap an explicit operator, mainly for tests and external attention.
    pub fn from_matrix(matrix: DMatrix<Real>) -> Self {
        let n = matrix.nrows();
        Self {
            features: State::zeros(n, 0),
            num_edges: matrix.iter().filter(|v| **v != 0.0).count(),
            matrix,
        }
    }

    pub fn matrix(&self) -> &DMatrix<Real> {
        &self.matrix
    }

    pub fn features(&self) -> &State {
        &self.features
    }

    pub fn num_nodes(&self) -> usize {
        self.matrix.nrows()
    }

    /// Edges the operator was built from, self-loops included.
    pub fn num_edges(&self) -> usize {
        self.num_edges
    }
}
