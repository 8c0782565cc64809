//! Shared fixtures for unit tests.

use std::sync::Arc;

use es_core::{Real, State};
use es_eval::{Decoder, GraphDataset, NodeMask};
use es_graph::GraphBuilder;
use nalgebra::{DMatrix, DVector};

/// Path graph with `n` nodes and two feature columns; node `i` has class
/// `i % 2`, decodable by the identity readout.
pub(crate) fn toy_problem(n: usize) -> (Decoder, Arc<GraphDataset>) {
    let mut builder = GraphBuilder::new(n);
    for i in 1..n {
        builder.add_undirected_edge(i - 1, i);
    }
    let x = State::from_fn(n, 2, |i, j| if i % 2 == j { 1.0 } else { 0.1 * i as Real });
    let y = (0..n).map(|i| i % 2).collect();
    let data = GraphDataset::new(
        x,
        y,
        builder.build().unwrap(),
        NodeMask::from_indices(0..n),
        NodeMask::from_indices(0..n),
        NodeMask::from_indices(0..n),
    )
    .unwrap();
    let decoder = Decoder::new(DMatrix::identity(2, 2), DVector::zeros(2)).unwrap();
    (decoder, Arc::new(data))
}
