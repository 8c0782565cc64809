#![allow(dead_code)]

use std::sync::Arc;

use es_core::{Real, State};
use es_eval::{Decoder, GraphDataset, NodeMask};
use es_graph::{Graph, GraphBuilder};
use es_solver::{EarlyStopIntegrator, Method, SolverOptions};
use nalgebra::{DMatrix, DVector};

pub fn ring(n: usize) -> Graph {
    let mut builder = GraphBuilder::new(n);
    for i in 0..n {
        builder.add_undirected_edge(i, (i + 1) % n);
    }
    builder.build().unwrap()
}

/// Two communities on a ring; class `c` is hot in feature column `c`.
pub fn two_class_dataset(n: usize) -> Arc<GraphDataset> {
    let x = State::from_fn(n, 2, |i, j| {
        let class = usize::from(i >= n / 2);
        if class == j { 1.0 } else { 0.25 * (i % 3) as Real / 3.0 }
    });
    let y = (0..n).map(|i| usize::from(i >= n / 2)).collect();
    let evens: Vec<usize> = (0..n).step_by(2).collect();
    let odds: Vec<usize> = (1..n).step_by(2).collect();
    Arc::new(
        GraphDataset::new(
            x,
            y,
            ring(n),
            NodeMask::from_indices(evens),
            NodeMask::from_indices(odds),
            NodeMask::from_indices(0..n),
        )
        .unwrap(),
    )
}

pub fn identity_decoder() -> Decoder {
    Decoder::new(DMatrix::identity(2, 2), DVector::zeros(2)).unwrap()
}

pub fn integrator(opts: SolverOptions, data: &Arc<GraphDataset>) -> EarlyStopIntegrator {
    let mut integrator = EarlyStopIntegrator::new(opts).unwrap();
    integrator.set_decoder(identity_decoder());
    integrator.set_data(Arc::clone(data));
    integrator
}

pub fn options(method: Method) -> SolverOptions {
    SolverOptions::with_method(method)
}

/// Largest minus smallest entry of each column, summed.
pub fn spread(y: &State) -> Real {
    y.column_iter().map(|c| c.max() - c.min()).sum()
}
