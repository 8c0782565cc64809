//! Per-step instrumentation shared by every early-stop solver.

use std::sync::Arc;

use es_core::{Real, State};

use crate::dataset::GraphDataset;
use crate::decoder::Decoder;
use crate::error::{EvalError, EvalResult};
use crate::probe::{Accuracies, EvaluationProbe};
use crate::tracker::{BestSnapshot, BestTracker};

/// Evaluation probe plus best-state tracker.
///
/// Solvers call [`observe`](Self::observe) once per completed step; the
/// tracker update for a step is applied before `observe` returns.
#[derive(Debug)]
pub struct EarlyStopMonitor {
    probe: EvaluationProbe,
    tracker: BestTracker,
}

impl EarlyStopMonitor {
    pub fn new(dataset: &str) -> Self {
        Self {
            probe: EvaluationProbe::new(dataset),
            tracker: BestTracker::new(),
        }
    }

    /// Evaluate the state reached at `t1` and offer it to the tracker.
    pub fn observe(&mut self, z: &State, t0: Real, t1: Real) -> EvalResult<Accuracies> {
        let accs = self.probe.evaluate(z, t0, t1)?;
        if self.tracker.consider(accs, t1) {
            tracing::trace!(t = t1, val = accs.val, "new best validation accuracy");
        }
        Ok(accs)
    }

    /// Fail early when the decoder or data has not been bound.
    pub fn ensure_configured(&self) -> EvalResult<()> {
        if self.probe.decoder().is_none() {
            return Err(EvalError::NotConfigured { what: "decoder" });
        }
        if self.probe.data().is_none() {
            return Err(EvalError::NotConfigured { what: "data" });
        }
        Ok(())
    }

    pub fn set_decoder(&mut self, decoder: Decoder) {
        self.probe.set_decoder(decoder);
    }

    pub fn set_data(&mut self, data: Arc<GraphDataset>) -> bool {
        self.probe.set_data(data)
    }

    pub fn data(&self) -> Option<&Arc<GraphDataset>> {
        self.probe.data()
    }

    pub fn probe(&self) -> &EvaluationProbe {
        &self.probe
    }

    pub fn probe_mut(&mut self) -> &mut EvaluationProbe {
        &mut self.probe
    }

    pub fn best(&self) -> BestSnapshot {
        self.tracker.best()
    }

    pub fn tracker(&self) -> &BestTracker {
        &self.tracker
    }
}
