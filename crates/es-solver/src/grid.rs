//! Time grids and linear interpolation for the fixed-step solvers.

use es_core::{Real, State};

use crate::error::{SolverError, SolverResult};

/// Builds an integration grid from the requested times.
pub type GridConstructor = Box<dyn Fn(&[Real]) -> Vec<Real>>;

/// Requested output times must be finite, non-empty and strictly increasing.
pub fn validate_times(t: &[Real]) -> SolverResult<()> {
    if t.is_empty() {
        return Err(SolverError::InvalidArg {
            what: "at least one output time is required",
        });
    }
    if t.iter().any(|v| !v.is_finite()) {
        return Err(SolverError::InvalidArg {
            what: "output times must be finite",
        });
    }
    if t.windows(2).any(|w| w[1] <= w[0]) {
        return Err(SolverError::InvalidArg {
            what: "output times must be strictly increasing",
        });
    }
    Ok(())
}

/// Uniform grid from `start` to `end` with spacing `h`.
///
/// The point count is `ceil((end - start) / h + 1)`; the last point is
/// always exactly `end`. Interior points that round onto `end` are dropped.
pub fn step_size_grid(start: Real, end: Real, h: Real) -> SolverResult<Vec<Real>> {
    if !(h.is_finite() && h > 0.0) {
        return Err(SolverError::InvalidArg {
            what: "step_size must be positive",
        });
    }
    let niters = ((end - start) / h + 1.0).ceil().max(1.0) as usize;
    let mut grid: Vec<Real> = (0..niters.saturating_sub(1))
        .map(|i| start + i as Real * h)
        .filter(|&v| v < end)
        .collect();
    grid.push(end);
    Ok(grid)
}

/// Grid for the fixed-step solvers: the requested times, or a uniform grid
/// when a step size is given.
pub fn fixed_grid(t: &[Real], step_size: Option<Real>) -> SolverResult<Vec<Real>> {
    validate_times(t)?;
    let grid = match step_size {
        Some(h) => step_size_grid(t[0], t[t.len() - 1], h)?,
        None => t.to_vec(),
    };
    check_grid(&grid, t)?;
    Ok(grid)
}

/// A grid must start and end exactly at the requested bounds and increase.
pub fn check_grid(grid: &[Real], t: &[Real]) -> SolverResult<()> {
    let (Some(&g0), Some(&gn), Some(&t0), Some(&tn)) = (grid.first(), grid.last(), t.first(), t.last())
    else {
        return Err(SolverError::InvalidGrid { what: "empty grid" });
    };
    if g0 != t0 || gn != tn {
        return Err(SolverError::InvalidGrid {
            what: "grid endpoints must equal the first and last requested times",
        });
    }
    if grid.windows(2).any(|w| w[1] <= w[0]) {
        return Err(SolverError::InvalidGrid {
            what: "grid must be strictly increasing",
        });
    }
    Ok(())
}

/// Linear interpolation between `(t0, y0)` and `(t1, y1)`.
///
/// Endpoints are returned exactly.
pub fn linear_interp(t0: Real, t1: Real, y0: &State, y1: &State, t: Real) -> State {
    if t == t0 {
        return y0.clone();
    }
    if t == t1 {
        return y1.clone();
    }
    let slope = (t - t0) / (t1 - t0);
    y0 + (y1 - y0) * slope
}
