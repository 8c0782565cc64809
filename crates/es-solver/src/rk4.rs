//! Fourth-order Runge-Kutta increment (3/8 rule).

use es_core::{Real, State};

use crate::dynamics::{Counted, OdeFunc};
use crate::error::SolverResult;

/// Increment `dy` over one step of the 3/8-rule RK4 scheme.
///
/// Stages are placed at `t0`, `t0 + dt/3`, `t0 + 2dt/3` and `t1`; the caller
/// passes `t1` separately so a padded step can still finish on the grid.
pub(crate) fn rk4_alt_step<F: OdeFunc + ?Sized>(
    func: &mut Counted<'_, F>,
    t0: Real,
    dt: Real,
    t1: Real,
    y: &State,
) -> SolverResult<State> {
    let k1 = func.eval(t0, y)?;
    let k2 = func.eval(t0 + dt / 3.0, &(y + &k1 * (dt / 3.0)))?;
    let k3 = func.eval(t0 + 2.0 * dt / 3.0, &(y + (&k2 - &k1 / 3.0) * dt))?;
    let k4 = func.eval(t1, &(y + (&k1 - &k2 + &k3) * dt))?;
    Ok((k1 + (k2 + k3) * 3.0 + k4) * (dt * 0.125))
}
