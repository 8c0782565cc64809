//! Evaluation probe and tracker scenarios on a tiny separable graph.

use std::sync::Arc;

use es_core::State;
use es_eval::{
    BestSnapshot, Decoder, EarlyStopMonitor, EvalError, EvaluationProbe, GraphDataset, MaskKind,
    NodeMask,
};
use es_graph::GraphBuilder;
use nalgebra::{DMatrix, DVector};

/// Two classes, four nodes; feature column `c` is hot for class `c`.
fn separable_dataset() -> GraphDataset {
    let x = State::from_row_slice(4, 2, &[2.0, 0.0, 1.5, 0.1, 0.0, 1.0, 0.2, 3.0]);
    let mut builder = GraphBuilder::new(4);
    builder.add_undirected_edge(0, 1).add_undirected_edge(2, 3);
    GraphDataset::new(
        x,
        vec![0, 0, 1, 1],
        builder.build().unwrap(),
        NodeMask::from_indices([0, 2]),
        NodeMask::from_indices([1, 3]),
        NodeMask::from_indices([0, 1, 2, 3]),
    )
    .unwrap()
}

fn swapped_dataset() -> GraphDataset {
    let x = State::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 1.0]);
    GraphDataset::new(
        x,
        vec![1, 0],
        GraphBuilder::new(2).build().unwrap(),
        NodeMask::from_indices([0]),
        NodeMask::from_indices([1]),
        NodeMask::from_indices([0]),
    )
    .unwrap()
}

fn identity_decoder() -> Decoder {
    Decoder::new(DMatrix::identity(2, 2), DVector::zeros(2)).unwrap()
}

#[test]
fn separable_dataset_scores_full_accuracy() {
    let data = Arc::new(separable_dataset());
    let mut probe = EvaluationProbe::new("Cora");
    probe.set_data(Arc::clone(&data));
    probe.set_decoder(identity_decoder());

    let accs = probe.evaluate(data.x(), 0.0, 1.0).unwrap();
    assert_eq!(accs.train, 1.0);
    assert_eq!(accs.val, 1.0);
    assert_eq!(accs.test, 1.0);
    assert_eq!(probe.evaluations(), 1);
}

#[test]
fn augmented_state_uses_leading_columns() {
    let data = Arc::new(separable_dataset());
    let mut probe = EvaluationProbe::new("Cora");
    probe.set_data(Arc::clone(&data));
    probe.set_decoder(identity_decoder());

    // Second half is noise pointing the wrong way; it must be ignored.
    let mut z = State::zeros(4, 4);
    z.columns_mut(0, 2).copy_from(data.x());
    z.columns_mut(2, 2).copy_from(&data.x().map(|v| -v));

    let accs = probe.evaluate(&z, 0.0, 1.0).unwrap();
    assert_eq!(accs.test, 1.0);
}

#[test]
fn benchmark_path_matches_generic_accuracy() {
    let data = Arc::new(separable_dataset());
    let mut generic = EvaluationProbe::new("Cora");
    let mut bench = EvaluationProbe::new("ogbn-arxiv");
    for probe in [&mut generic, &mut bench] {
        probe.set_data(Arc::clone(&data));
        probe.set_decoder(identity_decoder());
    }
    let a = generic.evaluate(data.x(), 0.0, 1.0).unwrap();
    let b = bench.evaluate(data.x(), 0.0, 1.0).unwrap();
    assert_eq!(a, b);
}

#[test]
fn set_data_first_write_wins() {
    let first = Arc::new(separable_dataset());
    let mut probe = EvaluationProbe::new("Cora");
    assert!(probe.set_data(Arc::clone(&first)));
    assert!(!probe.set_data(Arc::new(swapped_dataset())));

    let bound = probe.data().unwrap();
    assert!(Arc::ptr_eq(bound, &first));
    assert_eq!(bound.num_nodes(), 4);
}

#[test]
fn evaluation_requires_decoder_and_data() {
    let mut probe = EvaluationProbe::new("Cora");
    let err = probe.evaluate(&State::zeros(4, 2), 0.0, 1.0).unwrap_err();
    assert!(matches!(err, EvalError::NotConfigured { .. }));
    assert_eq!(probe.evaluations(), 0);
}

#[test]
fn masks_resolve_by_name() {
    let data = separable_dataset();
    assert_eq!(data.mask_by_name("val_mask").unwrap().indices(), &[1, 3]);
    assert_eq!(
        data.mask_by_name("test_mask").unwrap(),
        data.mask(MaskKind::Test)
    );
    assert!(matches!(
        data.mask_by_name("dev_mask"),
        Err(EvalError::UnknownMask { .. })
    ));
}

#[test]
fn monitor_keeps_best_snapshot() {
    let data = Arc::new(separable_dataset());
    let mut monitor = EarlyStopMonitor::new("Cora");
    monitor.set_data(Arc::clone(&data));
    monitor.set_decoder(identity_decoder());

    assert_eq!(monitor.best(), BestSnapshot::default());

    // Swapped feature columns: every prediction wrong.
    let x = data.x();
    let swapped = State::from_fn(x.nrows(), 2, |i, j| x[(i, 1 - j)]);
    monitor.observe(&swapped, 0.0, 0.5).unwrap();
    assert_eq!(monitor.best().val_acc, 0.0);

    monitor.observe(data.x(), 0.5, 1.0).unwrap();
    let best = monitor.best();
    assert_eq!(best.val_acc, 1.0);
    assert_eq!(best.time, 1.0);

    // Same validation score later does not move the time.
    monitor.observe(data.x(), 1.0, 2.0).unwrap();
    assert_eq!(monitor.best().time, 1.0);
    assert_eq!(monitor.tracker().updates(), 1);
    assert_eq!(monitor.probe().evaluations(), 3);
}
