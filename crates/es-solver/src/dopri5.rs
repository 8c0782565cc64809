//! Dormand-Prince 5(4) tableau, step, dense output and step-size control.

use es_core::{Real, State, Tolerances};

use crate::dynamics::{Counted, OdeFunc};
use crate::error::SolverResult;

const ALPHA: [Real; 6] = [1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0, 1.0];

const BETA: [[Real; 6]; 6] = [
    [1.0 / 5.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0, 0.0],
    [44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0, 0.0, 0.0, 0.0],
    [
        19372.0 / 6561.0,
        -25360.0 / 2187.0,
        64448.0 / 6561.0,
        -212.0 / 729.0,
        0.0,
        0.0,
    ],
    [
        9017.0 / 3168.0,
        -355.0 / 33.0,
        46732.0 / 5247.0,
        49.0 / 176.0,
        -5103.0 / 18656.0,
        0.0,
    ],
    [
        35.0 / 384.0,
        0.0,
        500.0 / 1113.0,
        125.0 / 192.0,
        -2187.0 / 6784.0,
        11.0 / 84.0,
    ],
];

const C_SOL: [Real; 7] = [
    35.0 / 384.0,
    0.0,
    500.0 / 1113.0,
    125.0 / 192.0,
    -2187.0 / 6784.0,
    11.0 / 84.0,
    0.0,
];

const C_ERROR: [Real; 7] = [
    35.0 / 384.0 - 1951.0 / 21600.0,
    0.0,
    500.0 / 1113.0 - 22642.0 / 50085.0,
    125.0 / 192.0 - 451.0 / 720.0,
    -2187.0 / 6784.0 + 12231.0 / 42400.0,
    11.0 / 84.0 - 649.0 / 6300.0,
    -1.0 / 60.0,
];

/// Weights giving the solution at the step midpoint.
const C_MID: [Real; 7] = [
    6025192743.0 / 30085553152.0 / 2.0,
    0.0,
    51252292925.0 / 65400821598.0 / 2.0,
    -2691868925.0 / 45128329728.0 / 2.0,
    187940372067.0 / 1594534317056.0 / 2.0,
    -1776094331.0 / 19743644256.0 / 2.0,
    11237099.0 / 235043384.0 / 2.0,
];

const SAFETY: Real = 0.9;
const IFACTOR: Real = 10.0;
const DFACTOR: Real = 0.2;
const ORDER: Real = 5.0;

/// Last accepted step of the adaptive solver.
///
/// `[t0, t1]` always describes an accepted step; `dt` is the size proposed
/// for the next attempt.
#[derive(Debug, Clone)]
pub struct RkState {
    pub y1: State,
    pub f1: State,
    pub t0: Real,
    pub t1: Real,
    pub dt: Real,
    /// Quartic dense-output coefficients, lowest power first.
    pub interp_coeff: [State; 5],
}

impl RkState {
    /// Degenerate envelope `[t0, t0]` that interpolates to `y0`.
    pub fn initial(t0: Real, y0: &State, f0: State, dt: Real) -> Self {
        let zero = State::zeros(y0.nrows(), y0.ncols());
        Self {
            y1: y0.clone(),
            f1: f0,
            t0,
            t1: t0,
            dt,
            interp_coeff: [
                y0.clone(),
                zero.clone(),
                zero.clone(),
                zero.clone(),
                zero,
            ],
        }
    }

    pub fn interpolate(&self, t: Real) -> State {
        interp_evaluate(&self.interp_coeff, self.t0, self.t1, t)
    }
}

/// Output of one Runge-Kutta step.
pub(crate) struct StepResult {
    pub y1: State,
    pub f1: State,
    pub error: State,
    pub k: Vec<State>,
}

/// `y0 + dt * Σ c_i k_i`, skipping zero weights.
fn combine(y0: &State, dt: Real, coeffs: &[Real], k: &[State]) -> State {
    let mut out = y0.clone();
    for (c, ki) in coeffs.iter().zip(k) {
        if *c != 0.0 {
            out += ki * (dt * c);
        }
    }
    out
}

pub(crate) fn runge_kutta_step<F: OdeFunc + ?Sized>(
    func: &mut Counted<'_, F>,
    y0: &State,
    f0: &State,
    t0: Real,
    dt: Real,
) -> SolverResult<StepResult> {
    let mut k = Vec::with_capacity(7);
    k.push(f0.clone());
    for (alpha, beta) in ALPHA.iter().zip(BETA.iter()) {
        let yi = combine(y0, dt, beta, &k);
        let ki = func.eval(t0 + alpha * dt, &yi)?;
        k.push(ki);
    }
    // The last stage is evaluated at the solution itself (FSAL).
    let y1 = combine(y0, dt, &C_SOL, &k);
    let error = combine(&State::zeros(y0.nrows(), y0.ncols()), dt, &C_ERROR, &k);
    let f1 = k[6].clone();
    Ok(StepResult { y1, f1, error, k })
}

/// Fit the quartic through the step endpoints, slopes and midpoint.
pub(crate) fn interp_fit(y0: &State, y1: &State, k: &[State], dt: Real) -> [State; 5] {
    let y_mid = combine(y0, dt, &C_MID, k);
    let f0 = &k[0];
    let f1 = &k[6];

    let a = (f1 - f0) * (2.0 * dt) - (y1 + y0) * 8.0 + &y_mid * 16.0;
    let b = (f0 * 5.0 - f1 * 3.0) * dt + y0 * 18.0 + y1 * 14.0 - &y_mid * 32.0;
    let c = (f1 - f0 * 4.0) * dt - y0 * 11.0 - y1 * 5.0 + &y_mid * 16.0;
    let d = f0 * dt;
    [y0.clone(), d, c, b, a]
}

/// Evaluate the dense-output polynomial at `t` in `[t0, t1]`.
pub fn interp_evaluate(coeffs: &[State; 5], t0: Real, t1: Real, t: Real) -> State {
    if t1 == t0 {
        return coeffs[0].clone();
    }
    let x = (t - t0) / (t1 - t0);
    let mut out = coeffs[4].clone();
    for c in coeffs[..4].iter().rev() {
        out *= x;
        out += c;
    }
    out
}

/// RMS of the error relative to `atol + rtol * max(|y0|, |y1|)`.
pub(crate) fn error_ratio(error: &State, y0: &State, y1: &State, tol: Tolerances) -> Real {
    let scale = es_core::error_scale(y0, y1, tol);
    es_core::rms_norm(&error.component_div(&scale))
}

/// Next step size from the current error ratio.
pub(crate) fn optimal_step_size(dt: Real, error_ratio: Real) -> Real {
    if error_ratio == 0.0 {
        return dt * IFACTOR;
    }
    let dfactor = if error_ratio < 1.0 { 1.0 } else { DFACTOR };
    let factor = (SAFETY / error_ratio.powf(1.0 / ORDER)).max(dfactor).min(IFACTOR);
    dt * factor
}

/// Starting step from the Hairer-Wanner heuristic for a fourth-order method.
pub(crate) fn select_initial_step<F: OdeFunc + ?Sized>(
    func: &mut Counted<'_, F>,
    t0: Real,
    y0: &State,
    f0: &State,
    tol: Tolerances,
) -> SolverResult<Real> {
    let scale = y0.map(|v| tol.abs + v.abs() * tol.rel);
    let d0 = es_core::rms_norm(&y0.component_div(&scale));
    let d1 = es_core::rms_norm(&f0.component_div(&scale));

    let h0 = if d0 < 1e-5 || d1 < 1e-5 {
        1e-6
    } else {
        0.01 * d0 / d1
    };

    let y_probe = y0 + f0 * h0;
    let f1 = func.eval(t0 + h0, &y_probe)?;
    let d2 = es_core::rms_norm(&(f1 - f0).component_div(&scale)) / h0;

    let h1 = if d1 <= 1e-15 && d2 <= 1e-15 {
        (h0 * 1e-3).max(1e-6)
    } else {
        (0.01 / d1.max(d2)).powf(1.0 / ORDER)
    };
    Ok((100.0 * h0).min(h1))
}
