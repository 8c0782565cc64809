use nalgebra::DMatrix;

use crate::EsError;

/// Floating point type used throughout the integrators.
pub type Real = f64;

/// Integrator state: one row per node, one column per feature.
pub type State = DMatrix<Real>;

/// Absolute/relative tolerance pair.
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-9,
            rel: 1e-7,
        }
    }
}

impl Tolerances {
    /// Multiply both tolerances by the same factor.
    pub fn scaled(self, factor: Real) -> Self {
        Self {
            abs: self.abs * factor,
            rel: self.rel * factor,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, EsError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(EsError::NonFinite { what, value: v })
    }
}

/// Check every entry of a state; reports the first offending value.
pub fn ensure_finite_state(y: &State, what: &'static str) -> Result<(), EsError> {
    match y.iter().find(|v| !v.is_finite()) {
        Some(&value) => Err(EsError::NonFinite { what, value }),
        None => Ok(()),
    }
}

/// Root-mean-square norm. An empty state has norm zero.
pub fn rms_norm(y: &State) -> Real {
    if y.is_empty() {
        return 0.0;
    }
    (y.iter().map(|v| v * v).sum::<Real>() / y.len() as Real).sqrt()
}

/// Mixed error scale `abs + rel * max(|a|, |b|)`, elementwise.
pub fn error_scale(a: &State, b: &State, tol: Tolerances) -> State {
    a.zip_map(b, |x, y| tol.abs + tol.rel * x.abs().max(y.abs()))
}

pub fn sigmoid(x: Real) -> Real {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn ensure_finite_state_reports_value() {
        let y = State::from_row_slice(1, 3, &[1.0, Real::INFINITY, 2.0]);
        match ensure_finite_state(&y, "y") {
            Err(EsError::NonFinite { value, .. }) => assert!(value.is_infinite()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rms_norm_matches_hand_value() {
        let y = State::from_row_slice(2, 1, &[3.0, 4.0]);
        assert!((rms_norm(&y) - (12.5_f64).sqrt()).abs() < 1e-12);
        assert_eq!(rms_norm(&State::zeros(0, 0)), 0.0);
    }

    #[test]
    fn error_scale_uses_larger_magnitude() {
        let a = State::from_row_slice(1, 2, &[1.0, -4.0]);
        let b = State::from_row_slice(1, 2, &[-2.0, 1.0]);
        let tol = Tolerances { abs: 0.5, rel: 0.1 };
        let s = error_scale(&a, &b, tol);
        assert!((s[(0, 0)] - 0.7).abs() < 1e-12);
        assert!((s[(0, 1)] - 0.9).abs() < 1e-12);
    }

    #[test]
    fn sigmoid_midpoint() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-15);
        assert!(sigmoid(20.0) > 0.999);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn rms_norm_is_absolutely_homogeneous(
            vals in prop::collection::vec(-1e3_f64..1e3_f64, 1..16),
            k in -10.0_f64..10.0_f64,
        ) {
            let y = State::from_column_slice(vals.len(), 1, &vals);
            let lhs = rms_norm(&(&y * k));
            let rhs = k.abs() * rms_norm(&y);
            let tol = Tolerances { abs: 1e-9, rel: 1e-9 };
            prop_assert!(nearly_equal(lhs, rhs, tol));
        }
    }
}
