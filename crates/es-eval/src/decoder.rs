//! Linear readout from integrator state to class logits.

use es_core::{Real, State};
use nalgebra::{DMatrix, DVector};

use crate::error::{EvalError, EvalResult};

/// Fixed affine projection `relu(z) · Wᵀ + b`.
///
/// `weight` is `classes × hidden`, `bias` has one entry per class.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoder {
    weight: DMatrix<Real>,
    bias: DVector<Real>,
}

impl Decoder {
    pub fn new(weight: DMatrix<Real>, bias: DVector<Real>) -> EvalResult<Self> {
        if bias.len() != weight.nrows() {
            return Err(EvalError::ShapeMismatch {
                what: "decoder bias",
                expected: (weight.nrows(), 1),
                actual: (bias.len(), 1),
            });
        }
        if weight.ncols() == 0 {
            return Err(EvalError::InvalidData {
                what: "decoder weight has no input columns".to_string(),
            });
        }
        es_core::ensure_finite_state(&weight, "decoder weight")?;
        if let Some(&value) = bias.iter().find(|v| !v.is_finite()) {
            return Err(es_core::EsError::NonFinite {
                what: "decoder bias",
                value,
            }
            .into());
        }
        Ok(Self { weight, bias })
    }

    /// Hidden width the decoder expects.
    pub fn input_dim(&self) -> usize {
        self.weight.ncols()
    }

    pub fn num_classes(&self) -> usize {
        self.weight.nrows()
    }

    pub fn weight(&self) -> &DMatrix<Real> {
        &self.weight
    }

    pub fn bias(&self) -> &DVector<Real> {
        &self.bias
    }

    /// Decode a state into logits, one row per node.
    ///
    /// A state wider than `input_dim` is an augmented state; only its first
    /// `input_dim` columns are decoded.
    pub fn logits(&self, z: &State) -> EvalResult<State> {
        let d = self.input_dim();
        if z.ncols() < d {
            return Err(EvalError::ShapeMismatch {
                what: "decoder input",
                expected: (z.nrows(), d),
                actual: (z.nrows(), z.ncols()),
            });
        }

        let hidden = z.columns(0, d).map(|v| v.max(0.0));
        let mut out = hidden * self.weight.transpose();
        for (j, &b) in self.bias.iter().enumerate() {
            out.column_mut(j).add_scalar_mut(b);
        }
        Ok(out)
    }
}
