//! Adaptive-step early-stop solver (Dormand-Prince 5(4)).
//!
//! Every accepted step is handed to the evaluation probe and the best-state
//! tracker before the next one is attempted. Each `advance` call may spend at
//! most `max_test_steps` attempts; once they are all spent the solver reports
//! the state at the end of its last accepted step instead of the requested
//! time, even when that last attempt carried the envelope past the target.

use es_core::{Real, State, Tolerances};
use es_eval::{BestSnapshot, EarlyStopMonitor};

use crate::dopri5::{
    RkState, error_ratio, interp_fit, optimal_step_size, runge_kutta_step, select_initial_step,
};
use crate::dynamics::{Counted, OdeFunc};
use crate::error::{SolverError, SolverResult};
use crate::grid::validate_times;
use crate::options::SolverOptions;
use crate::solution::Trajectory;

/// State returned by one `advance` call.
#[derive(Debug, Clone)]
pub struct Advance {
    /// Requested time, or the last accepted step's end when the attempt
    /// budget was spent.
    pub t: Real,
    pub y: State,
    pub clamped: bool,
}

#[derive(Debug)]
pub struct EarlyStopDopri5 {
    tol: Tolerances,
    max_test_steps: usize,
    max_num_steps: usize,
    max_nfe: usize,
    monitor: EarlyStopMonitor,
    state: Option<RkState>,
    nfe: usize,
    accepted: usize,
    rejected: usize,
}

impl EarlyStopDopri5 {
    pub fn new(opts: &SolverOptions) -> Self {
        Self {
            tol: opts.tolerances(),
            max_test_steps: opts.max_test_steps,
            max_num_steps: opts.max_num_steps,
            max_nfe: opts.max_nfe,
            monitor: EarlyStopMonitor::new(&opts.dataset),
            state: None,
            nfe: 0,
            accepted: 0,
            rejected: 0,
        }
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

    /// Envelope of the last accepted step, once integration has started.
    pub fn rk_state(&self) -> Option<&RkState> {
        self.state.as_ref()
    }

    /// Accepted and rejected step counts of the last integration.
    pub fn step_counts(&self) -> (usize, usize) {
        (self.accepted, self.rejected)
    }

    /// Evaluations spent since the last `start`.
    pub fn nfe(&self) -> usize {
        self.nfe
    }

    /// Reset the envelope to `[t0, t0]` at `y0` and pick the first step size.
    pub fn start<F: OdeFunc + ?Sized>(
        &mut self,
        func: &mut F,
        y0: &State,
        t0: Real,
    ) -> SolverResult<()> {
        self.monitor.ensure_configured()?;
        es_core::ensure_finite_state(y0, "initial state")?;
        if !t0.is_finite() {
            return Err(SolverError::InvalidArg {
                what: "start time must be finite",
            });
        }

        let mut func = Counted::new(func, self.max_nfe);
        let f0 = func.eval(t0, y0)?;
        let dt = select_initial_step(&mut func, t0, y0, &f0, self.tol)?;
        self.state = Some(RkState::initial(t0, y0, f0, dt));
        self.nfe = func.nfe();
        self.accepted = 0;
        self.rejected = 0;
        Ok(())
    }

    pub fn integrate<F: OdeFunc + ?Sized>(
        &mut self,
        func: &mut F,
        y0: &State,
        t: &[Real],
    ) -> SolverResult<Trajectory> {
        validate_times(t)?;
        self.start(func, y0, t[0])?;

        let mut states = Vec::with_capacity(t.len());
        states.push(y0.clone());
        let mut t_final = t[0];
        let mut clamped = false;
        for &next_t in &t[1..] {
            let adv = self.advance(func, next_t)?;
            t_final = adv.t;
            clamped |= adv.clamped;
            states.push(adv.y);
        }

        tracing::info!(
            method = "dopri5",
            t_final,
            accepted = self.accepted,
            rejected = self.rejected,
            nfe = self.nfe,
            clamped,
            "integration finished"
        );

        Ok(Trajectory {
            t_final,
            states,
            clamped,
            nfe: self.nfe,
        })
    }

    /// Step until the envelope covers `next_t` or the attempt budget runs out.
    ///
    /// Accepted steps are evaluated at their end time. When the target is
    /// covered with attempts to spare, the dense output at `next_t` is
    /// returned. A spent budget returns the state at the end of the last
    /// accepted step, flagged as clamped, whether or not it covers `next_t`.
    pub fn advance<F: OdeFunc + ?Sized>(
        &mut self,
        func: &mut F,
        next_t: Real,
    ) -> SolverResult<Advance> {
        let state = self.state.as_mut().ok_or(SolverError::NotConfigured {
            what: "integration state",
        })?;
        let mut func = Counted::resume(func, self.max_nfe, self.nfe);

        let mut attempts = 0;
        while next_t > state.t1 && attempts < self.max_test_steps {
            attempts += 1;
            let accepted = adaptive_step(&mut func, state, self.tol);
            self.nfe = func.nfe();
            if accepted? {
                self.accepted += 1;
                if self.accepted > self.max_num_steps {
                    return Err(SolverError::MaxStepsExceeded {
                        steps: self.accepted,
                        t: state.t1,
                    });
                }
                self.monitor.observe(&state.y1, state.t0, state.t1)?;
            } else {
                self.rejected += 1;
                tracing::trace!(t = state.t1, dt = state.dt, "step rejected");
            }
        }

        if attempts >= self.max_test_steps {
            tracing::warn!(
                requested = next_t,
                reached = state.t1,
                max_test_steps = self.max_test_steps,
                "step budget exhausted; returning last accepted state"
            );
            return Ok(Advance {
                t: state.t1,
                y: state.y1.clone(),
                clamped: true,
            });
        }

        Ok(Advance {
            t: next_t,
            y: state.interpolate(next_t),
            clamped: false,
        })
    }
}

/// Attempt one step from the end of the current envelope.
///
/// On acceptance the envelope moves forward; on rejection only the proposed
/// step size changes.
fn adaptive_step<F: OdeFunc + ?Sized>(
    func: &mut Counted<'_, F>,
    state: &mut RkState,
    tol: Tolerances,
) -> SolverResult<bool> {
    let t0 = state.t1;
    let dt = state.dt;
    if !(dt.is_finite() && dt > 0.0) || t0 + dt <= t0 {
        return Err(SolverError::StepUnderflow { t: t0, dt });
    }

    let step = runge_kutta_step(func, &state.y1, &state.f1, t0, dt)?;
    let ratio = error_ratio(&step.error, &state.y1, &step.y1, tol);
    if !ratio.is_finite() {
        return Err(SolverError::NonFinite {
            what: "error estimate",
            t: t0,
        });
    }

    let dt_next = optimal_step_size(dt, ratio);
    if ratio > 1.0 {
        state.dt = dt_next;
        return Ok(false);
    }

    let interp_coeff = interp_fit(&state.y1, &step.y1, &step.k, dt);
    *state = RkState {
        y1: step.y1,
        f1: step.f1,
        t0,
        t1: t0 + dt,
        dt: dt_next,
        interp_coeff,
    };
    Ok(true)
}
