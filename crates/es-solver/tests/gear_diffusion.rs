//! Implicit multistep solvers over the attention operator.

mod common;

use common::{integrator, options, ring, spread, two_class_dataset};
use es_attention::{AttentionOptions, GraphAttentionLayer};
use es_core::{Real, State};
use nalgebra::DMatrix;
use es_solver::{EarlyStopSolver, Method, SolverError, SolverOptions};

fn unused(_t: Real, _y: &State) -> State {
    unreachable!("implicit solvers do not call the dynamics")
}

#[test]
fn zero_alpha_keeps_state_constant() {
    let data = two_class_dataset(6);
    for method in [Method::Gear2, Method::Gear3] {
        let opts = SolverOptions {
            alpha_train: 0.0,
            no_alpha_sigmoid: true,
            step_size: Some(0.25),
            ..options(method)
        };
        let mut integ = integrator(opts, &data);
        let traj = integ
            .integrate(&mut unused, data.x(), &[0.0, 0.5, 1.0, 2.0])
            .unwrap();
        assert_eq!(traj.t_final, 2.0);
        for y in &traj.states {
            assert!((y - data.x()).amax() < 1e-12);
        }
    }
}

#[test]
fn diffusion_contracts_toward_consensus() {
    let data = two_class_dataset(6);
    for method in [Method::Gear2, Method::Gear3] {
        let opts = SolverOptions {
            step_size: Some(0.1),
            ..options(method)
        };
        let mut integ = integrator(opts, &data);
        let times: Vec<Real> = (0..=10).map(|i| i as Real).collect();
        let traj = integ.integrate(&mut unused, data.x(), &times).unwrap();

        for pair in traj.states.windows(2) {
            assert!(spread(&pair[1]) <= spread(&pair[0]) * (1.0 + 1e-9));
        }
        let first = spread(&traj.states[0]);
        let last = spread(traj.last().unwrap());
        assert!(last < 0.7 * first, "{method}: {first} -> {last}");
        assert_eq!(traj.nfe, 100);
    }
}

#[test]
fn attention_operator_rows_are_normalized() {
    let data = two_class_dataset(6);
    let mut integ = integrator(options(Method::Gear2), &data);
    integ.integrate(&mut unused, data.x(), &[0.0, 1.0]).unwrap();

    let Some(EarlyStopSolver::Gear(gear)) = integ.last_solver() else {
        panic!("expected a gear solver");
    };
    let op = gear.operator().unwrap();
    for row in op.matrix().row_iter() {
        assert!((row.sum() - 1.0).abs() < 1e-12);
    }
    assert_eq!(op.features().shape(), (6, 2));
}

#[test]
fn supplied_attention_layer_is_used() {
    let data = two_class_dataset(6);
    let opts = AttentionOptions {
        heads: 2,
        ..Default::default()
    };
    let layer = GraphAttentionLayer::xavier(2, &opts, 99).unwrap();
    let solver_opts = SolverOptions {
        attention: opts,
        ..options(Method::Gear3)
    };
    let mut integ = integrator(solver_opts, &data);
    integ.set_attention_layer(layer);
    integ.integrate(&mut unused, data.x(), &[0.0, 1.0]).unwrap();

    let Some(EarlyStopSolver::Gear(gear)) = integ.last_solver() else {
        panic!("expected a gear solver");
    };
    assert_eq!(gear.operator().unwrap().num_edges(), ring(6).num_edges());
}

#[test]
fn implicit_solves_count_against_nfe_budget() {
    let data = two_class_dataset(4);
    let opts = SolverOptions {
        max_nfe: 3,
        step_size: Some(0.1),
        ..options(Method::Gear2)
    };
    let mut integ = integrator(opts, &data);
    let err = integ
        .integrate(&mut unused, data.x(), &[0.0, 1.0])
        .unwrap_err();
    assert!(matches!(err, SolverError::MaxNfeExceeded { nfe: 4, limit: 3 }));
}

#[test]
fn self_loops_change_the_operator() {
    let data = two_class_dataset(6);
    let opts = SolverOptions {
        attention: AttentionOptions {
            self_loop_weight: 1.0,
            ..Default::default()
        },
        ..options(Method::Gear2)
    };
    let mut integ = integrator(opts, &data);
    integ.integrate(&mut unused, data.x(), &[0.0, 1.0]).unwrap();
    let Some(EarlyStopSolver::Gear(gear)) = integ.last_solver() else {
        panic!("expected a gear solver");
    };
    let op = gear.operator().unwrap();
    assert_eq!(op.num_edges(), ring(6).num_edges() + 6);
    assert!((0..6).all(|i| op.matrix()[(i, i)] > 0.0));
}

#[test]
fn output_projection_does_not_change_the_trajectory() {
    let data = two_class_dataset(6);
    let opts = AttentionOptions::default();
    let w = DMatrix::from_row_slice(2, 2, &[0.9, -0.2, 0.3, 1.1]);
    let a = DMatrix::from_column_slice(4, 1, &[0.5, -0.4, 0.2, 0.7]);
    let run = |w_out: DMatrix<Real>| {
        let layer = GraphAttentionLayer::from_parameters(w.clone(), w_out, a.clone(), &opts).unwrap();
        let mut integ = integrator(options(Method::Gear2), &data);
        integ.set_attention_layer(layer);
        let traj = integ.integrate(&mut unused, data.x(), &[0.0, 0.5, 1.0]).unwrap();
        let Some(EarlyStopSolver::Gear(gear)) = integ.last_solver() else {
            panic!("expected a gear solver");
        };
        (traj, gear.operator().unwrap().features().clone())
    };

    let (plain, plain_features) = run(DMatrix::identity(2, 2));
    let (scaled, scaled_features) = run(DMatrix::identity(2, 2) * 3.0);
    assert_eq!(plain.states, scaled.states);
    assert!((&scaled_features - &plain_features * 3.0).amax() < 1e-12);
    assert!(plain_features.amax() > 0.0);
}
