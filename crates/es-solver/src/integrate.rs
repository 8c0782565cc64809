//! Integration dispatcher.
//!
//! Resolves the configured method, binds the decoder, data and attention
//! layer into a fresh solver for every call, and restores structured states
//! to their original shapes afterwards.

use std::fmt;
use std::sync::Arc;

use es_attention::GraphAttentionLayer;
use es_core::{Real, State};
use es_eval::{BestSnapshot, Decoder, EarlyStopMonitor, GraphDataset, ProbeObserver, ProbeReport};

use crate::adaptive::EarlyStopDopri5;
use crate::dynamics::{OdeFunc, StructuredOdeFunc};
use crate::error::{SolverError, SolverResult};
use crate::fixed::EarlyStopRk4;
use crate::gear::{EarlyStopGear, GearOrder};
use crate::options::{Method, SolverOptions};
use crate::shape::{FlatFunc, StateLayout};
use crate::solution::{StructuredTrajectory, Trajectory};

/// One early-stop solver of any supported method.
#[derive(Debug)]
pub enum EarlyStopSolver {
    Rk4(EarlyStopRk4),
    Dopri5(EarlyStopDopri5),
    Gear(EarlyStopGear),
}

impl EarlyStopSolver {
    pub fn new(opts: &SolverOptions) -> Self {
        match opts.method {
            Method::Rk4 => EarlyStopSolver::Rk4(EarlyStopRk4::new(opts)),
            Method::Dopri5 => EarlyStopSolver::Dopri5(EarlyStopDopri5::new(opts)),
            Method::Gear2 => EarlyStopSolver::Gear(EarlyStopGear::new(GearOrder::Two, opts)),
            Method::Gear3 => EarlyStopSolver::Gear(EarlyStopGear::new(GearOrder::Three, opts)),
        }
    }

    pub fn monitor(&self) -> &EarlyStopMonitor {
        match self {
            EarlyStopSolver::Rk4(s) => s.monitor(),
            EarlyStopSolver::Dopri5(s) => s.monitor(),
            EarlyStopSolver::Gear(s) => s.monitor(),
        }
    }

    pub fn monitor_mut(&mut self) -> &mut EarlyStopMonitor {
        match self {
            EarlyStopSolver::Rk4(s) => s.monitor_mut(),
            EarlyStopSolver::Dopri5(s) => s.monitor_mut(),
            EarlyStopSolver::Gear(s) => s.monitor_mut(),
        }
    }

    pub fn best(&self) -> BestSnapshot {
        self.monitor().best()
    }

    /// Run the solver. The Gear solvers take their dynamics from the
    /// attention operator and never call `func`.
    pub fn integrate<F: OdeFunc + ?Sized>(
        &mut self,
        func: &mut F,
        y0: &State,
        t: &[Real],
    ) -> SolverResult<Trajectory> {
        match self {
            EarlyStopSolver::Rk4(s) => s.integrate(func, y0, t),
            EarlyStopSolver::Dopri5(s) => s.integrate(func, y0, t),
            EarlyStopSolver::Gear(s) => s.integrate(y0, t),
        }
    }
}

/// Entry point used by the model: configure once, integrate many times.
pub struct EarlyStopIntegrator {
    opts: SolverOptions,
    decoder: Option<Decoder>,
    data: Option<Arc<GraphDataset>>,
    attention_layer: Option<GraphAttentionLayer>,
    observer: Option<ProbeObserver>,
    last: Option<EarlyStopSolver>,
}

impl fmt::Debug for EarlyStopIntegrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EarlyStopIntegrator")
            .field("opts", &self.opts)
            .field("decoder", &self.decoder)
            .field("data", &self.data.is_some())
            .field("attention_layer", &self.attention_layer.is_some())
            .field("observer", &self.observer.is_some())
            .field("last", &self.last)
            .finish()
    }
}

impl EarlyStopIntegrator {
    pub fn new(opts: SolverOptions) -> SolverResult<Self> {
        opts.validate()?;
        Ok(Self {
            opts,
            decoder: None,
            data: None,
            attention_layer: None,
            observer: None,
            last: None,
        })
    }

    /// Like [`new`](Self::new), resolving the method from its name first.
    pub fn with_method_name(method: &str, opts: SolverOptions) -> SolverResult<Self> {
        let method: Method = method.parse()?;
        Self::new(SolverOptions { method, ..opts })
    }

    pub fn options(&self) -> &SolverOptions {
        &self.opts
    }

    pub fn method(&self) -> Method {
        self.opts.method
    }

    /// Replace the readout used for evaluation.
    pub fn set_decoder(&mut self, decoder: Decoder) {
        self.decoder = Some(decoder);
    }

    /// Bind the dataset. Only the first call has an effect.
    pub fn set_data(&mut self, data: Arc<GraphDataset>) -> bool {
        if self.data.is_some() {
            return false;
        }
        self.data = Some(data);
        true
    }

    pub fn data(&self) -> Option<&Arc<GraphDataset>> {
        self.data.as_ref()
    }

    pub fn set_attention_layer(&mut self, layer: GraphAttentionLayer) {
        self.attention_layer = Some(layer);
    }

    /// Receive every evaluation report of later integration calls.
    ///
    /// The observer is lent to each call's solver and returned afterwards, so
    /// it survives across calls.
    pub fn set_observer(&mut self, observer: impl FnMut(&ProbeReport) + 'static) {
        self.observer = Some(Box::new(observer));
    }

    /// Output times `[0, earlystop_x_t * T]`.
    pub fn evaluation_times(&self, t_end: Real) -> SolverResult<[Real; 2]> {
        if !(t_end.is_finite() && t_end > 0.0) {
            return Err(SolverError::InvalidArg {
                what: "end time must be positive",
            });
        }
        Ok([0.0, self.opts.earlystop_x_t * t_end])
    }

    fn fresh_solver(&self) -> SolverResult<EarlyStopSolver> {
        let decoder = self
            .decoder
            .clone()
            .ok_or(SolverError::NotConfigured { what: "decoder" })?;
        let data = self
            .data
            .clone()
            .ok_or(SolverError::NotConfigured { what: "data" })?;

        let mut solver = EarlyStopSolver::new(&self.opts);
        solver.monitor_mut().set_decoder(decoder);
        solver.monitor_mut().set_data(data);
        if let (EarlyStopSolver::Gear(gear), Some(layer)) = (&mut solver, &self.attention_layer) {
            gear.set_attention_layer(layer.clone());
        }
        Ok(solver)
    }

    pub fn integrate<F: OdeFunc + ?Sized>(
        &mut self,
        func: &mut F,
        y0: &State,
        t: &[Real],
    ) -> SolverResult<Trajectory> {
        let mut solver = self.fresh_solver()?;
        if let Some(observer) = self.observer.take() {
            solver.monitor_mut().probe_mut().set_boxed_observer(observer);
        }
        tracing::debug!(
            method = %self.opts.method,
            implicit = self.opts.method.is_implicit(),
            shape = ?y0.shape(),
            "integrating"
        );
        let result = solver.integrate(func, y0, t);
        self.observer = solver.monitor_mut().probe_mut().take_observer();
        self.last = Some(solver);
        result
    }

    pub fn integrate_structured<F: StructuredOdeFunc + ?Sized>(
        &mut self,
        func: &mut F,
        parts: &[State],
        t: &[Real],
    ) -> SolverResult<StructuredTrajectory> {
        let layout = StateLayout::of(parts)?;
        let y0 = layout.flatten(parts)?;
        let mut flat = FlatFunc::new(func, &layout);
        let traj = self.integrate(&mut flat, &y0, t)?;

        let states = traj
            .states
            .iter()
            .map(|y| layout.unflatten(y))
            .collect::<SolverResult<Vec<_>>>()?;
        Ok(StructuredTrajectory {
            t_final: traj.t_final,
            states,
            clamped: traj.clamped,
            nfe: traj.nfe,
        })
    }

    /// Best snapshot of the most recent integration call.
    pub fn best(&self) -> BestSnapshot {
        self.last
            .as_ref()
            .map(EarlyStopSolver::best)
            .unwrap_or_default()
    }

    /// Solver used by the most recent integration call.
    pub fn last_solver(&self) -> Option<&EarlyStopSolver> {
        self.last.as_ref()
    }
}
