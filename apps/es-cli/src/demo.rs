//! Synthetic two-community diffusion problem.

use std::sync::Arc;

use es_core::{Real, State};
use es_eval::{Decoder, GraphDataset, NodeMask};
use es_graph::{Graph, GraphBuilder};
use nalgebra::{DMatrix, DVector};

use crate::error::{CliError, CliResult};

/// Two rings joined by a few bridges. Class `c` leans towards feature
/// column `c`, blurred by a deterministic perturbation.
pub fn two_communities(nodes: usize) -> CliResult<Arc<GraphDataset>> {
    if nodes < 4 {
        return Err(CliError::InvalidArg {
            what: "demo needs at least four nodes",
        });
    }
    let half = nodes / 2;
    let class = |i: usize| usize::from(i >= half);

    let mut builder = GraphBuilder::new(nodes);
    for (lo, hi) in [(0, half), (half, nodes)] {
        for i in lo..hi {
            let next = if i + 1 == hi { lo } else { i + 1 };
            if next != i {
                builder.add_undirected_edge(i, next);
            }
        }
    }
    for k in (0..half).step_by(4) {
        builder.add_undirected_edge(k, half + k % (nodes - half));
    }
    let graph = builder.build()?;

    let x = State::from_fn(nodes, 2, |i, j| {
        let noise = 0.6 * ((i * 7 + j * 13) as Real).sin();
        if class(i) == j { 0.5 + noise } else { noise.abs() * 0.5 }
    });
    let y = (0..nodes).map(class).collect();

    let train = NodeMask::from_indices((0..nodes).filter(|i| i % 5 < 2));
    let val = NodeMask::from_indices((0..nodes).filter(|i| i % 5 == 2));
    let test = NodeMask::from_indices((0..nodes).filter(|i| i % 5 > 2));
    Ok(Arc::new(GraphDataset::new(x, y, graph, train, val, test)?))
}

pub fn identity_decoder() -> CliResult<Decoder> {
    Ok(Decoder::new(DMatrix::identity(2, 2), DVector::zeros(2))?)
}

/// Row-normalized adjacency, the explicit diffusion operator.
pub fn mean_adjacency(graph: &Graph) -> DMatrix<Real> {
    let n = graph.num_nodes();
    let mut a = DMatrix::zeros(n, n);
    for edge in graph.edges() {
        a[(edge.src.index(), edge.dst.index())] += edge.weight;
    }
    for mut row in a.row_iter_mut() {
        let sum = row.sum();
        if sum > 0.0 {
            row /= sum;
        }
    }
    a
}

/// `dy/dt = (A - I) y`.
pub fn diffusion(a: DMatrix<Real>) -> impl FnMut(Real, &State) -> State {
    move |_t: Real, y: &State| &a * y - y
}
