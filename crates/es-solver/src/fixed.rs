//! Fixed-step early-stop solver (RK4, 3/8 rule).

use std::fmt;

use es_core::{Real, State};
use es_eval::{BestSnapshot, EarlyStopMonitor};

use crate::dynamics::{Counted, OdeFunc};
use crate::error::{SolverError, SolverResult};
use crate::grid::{GridConstructor, check_grid, fixed_grid, linear_interp, validate_times};
use crate::options::SolverOptions;
use crate::rk4::rk4_alt_step;
use crate::solution::Trajectory;

/// Integrates on a fixed grid, evaluating the state after every grid step.
///
/// The grid is the requested times by default, a uniform grid when
/// `step_size` is set, or whatever a custom constructor returns.
pub struct EarlyStopRk4 {
    eps: Real,
    step_size: Option<Real>,
    max_nfe: usize,
    grid_constructor: Option<GridConstructor>,
    monitor: EarlyStopMonitor,
}

impl fmt::Debug for EarlyStopRk4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EarlyStopRk4")
            .field("eps", &self.eps)
            .field("step_size", &self.step_size)
            .field("max_nfe", &self.max_nfe)
            .field("grid_constructor", &self.grid_constructor.is_some())
            .field("monitor", &self.monitor)
            .finish()
    }
}

impl EarlyStopRk4 {
    pub fn new(opts: &SolverOptions) -> Self {
        Self {
            eps: opts.eps,
            step_size: opts.step_size,
            max_nfe: opts.max_nfe,
            grid_constructor: None,
            monitor: EarlyStopMonitor::new(&opts.dataset),
        }
    }

    /// Use a custom grid. Cannot be combined with `step_size`.
    pub fn set_grid_constructor(
        &mut self,
        constructor: impl Fn(&[Real]) -> Vec<Real> + 'static,
    ) -> SolverResult<()> {
        if self.step_size.is_some() {
            return Err(SolverError::InvalidArg {
                what: "step_size and grid_constructor are mutually exclusive",
            });
        }
        self.grid_constructor = Some(Box::new(constructor));
        Ok(())
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

    /// Integration grid for the requested times.
    pub fn grid(&self, t: &[Real]) -> SolverResult<Vec<Real>> {
        let Some(constructor) = &self.grid_constructor else {
            return fixed_grid(t, self.step_size);
        };
        validate_times(t)?;
        let grid = constructor(t);
        check_grid(&grid, t)?;
        Ok(grid)
    }

    pub fn integrate<F: OdeFunc + ?Sized>(
        &mut self,
        func: &mut F,
        y0: &State,
        t: &[Real],
    ) -> SolverResult<Trajectory> {
        let grid = self.grid(t)?;
        self.monitor.ensure_configured()?;
        es_core::ensure_finite_state(y0, "initial state")?;

        let mut func = Counted::new(func, self.max_nfe);
        let mut states = Vec::with_capacity(t.len());
        states.push(y0.clone());
        let mut j = 1;
        let mut y = y0.clone();

        for w in grid.windows(2) {
            let (t0, t1) = (w[0], w[1]);
            let dy = rk4_alt_step(&mut func, t0 + self.eps, t1 - t0 - 2.0 * self.eps, t1, &y)?;
            let y1 = &y + dy;
            if y1.iter().any(|v| !v.is_finite()) {
                return Err(SolverError::NonFinite { what: "state", t: t1 });
            }
            self.monitor.observe(&y1, t0, t1)?;

            while j < t.len() && t1 >= t[j] {
                states.push(linear_interp(t0, t1, &y, &y1, t[j]));
                j += 1;
            }
            y = y1;
        }

        let t_final = grid[grid.len() - 1];
        tracing::info!(
            method = "rk4",
            t_final,
            steps = grid.len() - 1,
            nfe = func.nfe(),
            "integration finished"
        );

        Ok(Trajectory {
            t_final,
            states,
            clamped: false,
            nfe: func.nfe(),
        })
    }
}
