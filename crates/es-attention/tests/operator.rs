//! Attention operator normalization and head averaging.

use es_attention::{AttentionOperator, AttentionOptions, GraphAttentionLayer, NormIndex};
use es_core::{Real, State};
use es_graph::{Graph, GraphBuilder};
use nalgebra::DMatrix;

fn ring(n: usize) -> Graph {
    let mut builder = GraphBuilder::new(n);
    for i in 0..n {
        builder.add_undirected_edge(i, (i + 1) % n);
    }
    builder.build().unwrap()
}

fn features(n: usize, d: usize) -> State {
    State::from_fn(n, d, |i, j| ((i * 7 + j * 3) % 5) as Real - 2.0)
}

#[test]
fn rows_sum_to_one_with_source_normalization() {
    let graph = ring(6);
    let opts = AttentionOptions {
        heads: 2,
        ..Default::default()
    };
    let layer = GraphAttentionLayer::xavier(4, &opts, 11).unwrap();
    let op = AttentionOperator::compute(&layer, &features(6, 4), &graph, &opts).unwrap();

    for row in op.matrix().row_iter() {
        assert!((row.sum() - 1.0).abs() < 1e-12);
    }
    assert!(op.matrix().iter().all(|v| *v >= 0.0));
}

#[test]
fn columns_sum_to_one_with_target_normalization() {
    let graph = ring(5);
    let opts = AttentionOptions {
        norm_index: NormIndex::Target,
        ..Default::default()
    };
    let layer = GraphAttentionLayer::xavier(3, &opts, 5).unwrap();
    let op = AttentionOperator::compute(&layer, &features(5, 3), &graph, &opts).unwrap();

    for col in op.matrix().column_iter() {
        assert!((col.sum() - 1.0).abs() < 1e-12);
    }
}

#[test]
fn multi_head_operator_is_mean_of_single_heads() {
    let graph = ring(5);
    let x = features(5, 2);
    let two = AttentionOptions {
        heads: 2,
        attention_dim: Some(4),
        ..Default::default()
    };
    let layer = GraphAttentionLayer::xavier(2, &two, 9).unwrap();

    // Rebuild each head as its own single-head layer from the same weights.
    let w = DMatrix::from_fn(2, 4, |i, j| 0.3 * i as Real - 0.2 * j as Real + 0.1);
    let w_out = DMatrix::from_fn(2, 2, |i, j| if i == j { 1.0 } else { 0.5 });
    let a = DMatrix::from_fn(4, 2, |i, h| (i as Real - 1.5) * if h == 0 { 1.0 } else { -0.7 });
    let both = GraphAttentionLayer::from_parameters(w.clone(), w_out.clone(), a.clone(), &two)
        .unwrap();
    assert_eq!(both.heads(), layer.heads());

    let one = AttentionOptions::default();
    let head = |h: usize| {
        GraphAttentionLayer::from_parameters(
            w.columns(2 * h, 2).into_owned(),
            w_out.clone(),
            a.columns(h, 1).into_owned(),
            &one,
        )
        .unwrap()
    };

    let combined = AttentionOperator::compute(&both, &x, &graph, &two).unwrap();
    let h0 = AttentionOperator::compute(&head(0), &x, &graph, &one).unwrap();
    let h1 = AttentionOperator::compute(&head(1), &x, &graph, &one).unwrap();

    let mean = (h0.matrix() + h1.matrix()) * 0.5;
    assert!((combined.matrix() - mean).amax() < 1e-12);

    let mean_features = (h0.features() + h1.features()) * 0.5;
    assert!((combined.features() - mean_features).amax() < 1e-12);
}

#[test]
fn operator_rejects_mismatched_graph() {
    let opts = AttentionOptions::default();
    let layer = GraphAttentionLayer::xavier(2, &opts, 1).unwrap();
    assert!(AttentionOperator::compute(&layer, &features(3, 2), &ring(4), &opts).is_err());
}
