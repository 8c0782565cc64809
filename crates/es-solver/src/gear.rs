//! Implicit multistep (Gear / BDF) early-stop solvers.
//!
//! The coefficient operator `A` comes from a graph-attention collaborator
//! evaluated once per integration call. With `s = alpha * dt` each step
//! solves `((1 + beta s) I - beta s A) y_next = rhs`, where `beta` and `rhs`
//! are the backward-differentiation weights of the current order. Higher
//! orders are started with the lower ones.
//!
//! Only the head-averaged attention matrix enters the implicit system. The
//! layer's output projection feeds [`AttentionOperator::features`], which is
//! kept for inspection and never read by the integration.

use std::fmt;

use es_attention::{AttentionOperator, AttentionOptions, GraphAttentionLayer};
use es_core::{Real, State};
use es_eval::{BestSnapshot, EarlyStopMonitor};
use nalgebra::DMatrix;

use crate::error::{SolverError, SolverResult};
use crate::grid::{fixed_grid, linear_interp};
use crate::options::SolverOptions;
use crate::solution::Trajectory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GearOrder {
    Two,
    Three,
}

impl GearOrder {
    fn max_order(self) -> usize {
        match self {
            GearOrder::Two => 2,
            GearOrder::Three => 3,
        }
    }
}

impl fmt::Display for GearOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gear{}", self.max_order())
    }
}

const BDF1: [Real; 1] = [1.0];
const BDF2: [Real; 2] = [4.0 / 3.0, -1.0 / 3.0];
const BDF3: [Real; 3] = [18.0 / 11.0, -9.0 / 11.0, 2.0 / 11.0];

/// `beta` and history weights (newest first) of the order-`k` formula.
fn bdf_weights(order: usize) -> (Real, &'static [Real]) {
    match order {
        1 => (1.0, &BDF1[..]),
        2 => (2.0 / 3.0, &BDF2[..]),
        _ => (6.0 / 11.0, &BDF3[..]),
    }
}

#[derive(Debug)]
pub struct EarlyStopGear {
    order: GearOrder,
    alpha: Real,
    step_size: Option<Real>,
    max_nfe: usize,
    attention: AttentionOptions,
    seed: u64,
    layer: Option<GraphAttentionLayer>,
    fixed_operator: Option<AttentionOperator>,
    operator: Option<AttentionOperator>,
    monitor: EarlyStopMonitor,
}

impl EarlyStopGear {
    pub fn new(order: GearOrder, opts: &SolverOptions) -> Self {
        Self {
            order,
            alpha: opts.alpha(),
            step_size: opts.step_size,
            max_nfe: opts.max_nfe,
            attention: opts.attention.clone(),
            seed: opts.seed,
            layer: None,
            fixed_operator: None,
            operator: None,
            monitor: EarlyStopMonitor::new(&opts.dataset),
        }
    }

    pub fn order(&self) -> GearOrder {
        self.order
    }

    pub fn alpha(&self) -> Real {
        self.alpha
    }

    /// Use externally learned attention parameters.
    ///
    /// `W` and the score vector shape the operator; the output projection
    /// only affects the diagnostic features.
    pub fn set_attention_layer(&mut self, layer: GraphAttentionLayer) {
        self.layer = Some(layer);
    }

    /// Skip the attention pass and use a given operator.
    pub fn set_operator(&mut self, operator: AttentionOperator) {
        self.fixed_operator = Some(operator);
    }

    /// Operator used by the last integration call.
    pub fn operator(&self) -> Option<&AttentionOperator> {
        self.operator.as_ref()
    }

    pub fn monitor(&self) -> &EarlyStopMonitor {
        &self.monitor
    }

    pub fn monitor_mut(&mut self) -> &mut EarlyStopMonitor {
        &mut self.monitor
    }

    pub fn best(&self) -> BestSnapshot {
        self.monitor.best()
    }

    fn build_operator(&self) -> SolverResult<AttentionOperator> {
        if let Some(op) = &self.fixed_operator {
            return Ok(op.clone());
        }
        let data = self
            .monitor
            .data()
            .ok_or(SolverError::NotConfigured { what: "data" })?;
        let x = data.x();
        let op = match &self.layer {
            Some(layer) => AttentionOperator::compute(layer, x, data.graph(), &self.attention)?,
            None => {
                let layer = GraphAttentionLayer::xavier(x.ncols(), &self.attention, self.seed)?;
                AttentionOperator::compute(&layer, x, data.graph(), &self.attention)?
            }
        };
        Ok(op)
    }

    pub fn integrate(&mut self, y0: &State, t: &[Real]) -> SolverResult<Trajectory> {
        let grid = fixed_grid(t, self.step_size)?;
        self.monitor.ensure_configured()?;
        es_core::ensure_finite_state(y0, "initial state")?;

        let operator = self.build_operator()?;
        let n = y0.nrows();
        if operator.num_nodes() != n {
            return Err(SolverError::ShapeMismatch {
                what: "attention operator",
                expected: (n, n),
                actual: operator.matrix().shape(),
            });
        }

        let identity = DMatrix::<Real>::identity(n, n);
        let max_order = self.order.max_order();
        let mut nfe = 0;
        // Newest first.
        let mut history: Vec<State> = vec![y0.clone()];
        let mut states = Vec::with_capacity(t.len());
        states.push(y0.clone());
        let mut j = 1;

        for w in grid.windows(2) {
            let (t0, t1) = (w[0], w[1]);
            let order = history.len().min(max_order);
            let (beta, weights) = bdf_weights(order);

            let mut rhs = State::zeros(n, y0.ncols());
            for (c, y) in weights.iter().zip(&history) {
                rhs += y * *c;
            }

            let s = beta * self.alpha * (t1 - t0);
            let system = &identity * (1.0 + s) - operator.matrix() * s;

            nfe += 1;
            if nfe > self.max_nfe {
                return Err(SolverError::MaxNfeExceeded {
                    nfe,
                    limit: self.max_nfe,
                });
            }
            let y1 = system
                .lu()
                .solve(&rhs)
                .ok_or(SolverError::SingularSystem { t: t1 })?;
            if y1.iter().any(|v| !v.is_finite()) {
                return Err(SolverError::NonFinite { what: "state", t: t1 });
            }

            self.monitor.observe(&y1, t0, t1)?;

            while j < t.len() && t1 >= t[j] {
                states.push(linear_interp(t0, t1, &history[0], &y1, t[j]));
                j += 1;
            }

            history.insert(0, y1);
            history.truncate(max_order);
        }

        let t_final = grid[grid.len() - 1];
        tracing::info!(
            method = %self.order,
            alpha = self.alpha,
            t_final,
            steps = grid.len() - 1,
            nfe,
            "integration finished"
        );
        self.operator = Some(operator);

        Ok(Trajectory {
            t_final,
            states,
            clamped: false,
            nfe,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::toy_problem;

    fn swap_operator() -> AttentionOperator {
        AttentionOperator::from_matrix(DMatrix::from_row_slice(2, 2, &[0.0, 1.0, 1.0, 0.0]))
    }

    fn solver(order: GearOrder, opts: &SolverOptions) -> EarlyStopGear {
        let (decoder, data) = toy_problem(2);
        let mut s = EarlyStopGear::new(order, opts);
        s.monitor_mut().set_decoder(decoder);
        s.monitor_mut().set_data(data);
        s
    }

    #[test]
    fn weights_are_consistent() {
        for order in 1..=3 {
            let (_, w) = bdf_weights(order);
            assert!((w.iter().sum::<Real>() - 1.0).abs() < 1e-15);
        }
    }

    #[test]
    fn matches_exact_linear_solution() {
        let opts = SolverOptions {
            step_size: Some(0.01),
            ..Default::default()
        };
        let y0 = State::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 1.0]);
        for order in [GearOrder::Two, GearOrder::Three] {
            let mut s = solver(order, &opts);
            s.set_operator(swap_operator());
            let traj = s.integrate(&y0, &[0.0, 1.0]).unwrap();
            let decay = (-2.0 * s.alpha()).exp();
            let exact = 0.5 + 0.5 * decay;
            let y = traj.last().unwrap();
            assert!((y[(0, 0)] - exact).abs() < 1e-3, "{order}: {}", y[(0, 0)]);
            assert!((y[(1, 0)] - (1.0 - exact)).abs() < 1e-3);
            assert_eq!(traj.nfe, 100);
        }
    }

    #[test]
    fn singular_system_is_reported() {
        // A = 2I with s = 1 makes (1 + s) I - s A vanish on the first step.
        let opts = SolverOptions {
            alpha_train: 1.0,
            no_alpha_sigmoid: true,
            ..Default::default()
        };
        let mut s = solver(GearOrder::Two, &opts);
        s.set_operator(AttentionOperator::from_matrix(DMatrix::identity(2, 2) * 2.0));
        let err = s.integrate(&State::zeros(2, 2), &[0.0, 1.0]).unwrap_err();
        assert!(matches!(err, SolverError::SingularSystem { t } if t == 1.0));
    }
}
