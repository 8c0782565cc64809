//! Row-wise softmax losses and arg-max predictions.

use es_core::{Real, State};

use crate::dataset::NodeMask;
use crate::error::{EvalError, EvalResult};

/// Numerically stable row-wise log-softmax.
pub fn log_softmax(logits: &State) -> State {
    let mut out = logits.clone();
    for mut row in out.row_iter_mut() {
        let max = row.iter().copied().fold(Real::NEG_INFINITY, Real::max);
        let lse = max + row.iter().map(|v| (v - max).exp()).sum::<Real>().ln();
        row.add_scalar_mut(-lse);
    }
    out
}

/// Mean negative log-likelihood over masked rows of `log_probs`.
pub fn nll_loss(log_probs: &State, labels: &[usize], mask: &NodeMask) -> EvalResult<Real> {
    if mask.is_empty() {
        return Err(EvalError::EmptyMask { name: "loss mask" });
    }
    let classes = log_probs.ncols();
    let mut total = 0.0;
    for &i in mask.indices() {
        let label = labels[i];
        if label >= classes {
            return Err(EvalError::InvalidData {
                what: format!("label {} at node {} but only {} classes", label, i, classes),
            });
        }
        total -= log_probs[(i, label)];
    }
    Ok(total / mask.len() as Real)
}

/// Multi-class cross-entropy on raw logits.
pub fn cross_entropy(logits: &State, labels: &[usize], mask: &NodeMask) -> EvalResult<Real> {
    nll_loss(&log_softmax(logits), labels, mask)
}

/// Arg-max column per row. Ties resolve to the lowest column.
pub fn argmax_rows(logits: &State) -> Vec<usize> {
    logits
        .row_iter()
        .map(|row| {
            let mut best = 0;
            for (j, &v) in row.iter().enumerate() {
                if v > row[best] {
                    best = j;
                }
            }
            best
        })
        .collect()
}

/// Fraction of masked rows whose prediction equals the label.
pub fn masked_accuracy(pred: &[usize], labels: &[usize], mask: &NodeMask) -> EvalResult<Real> {
    if mask.is_empty() {
        return Err(EvalError::EmptyMask {
            name: "accuracy mask",
        });
    }
    let correct = mask
        .indices()
        .iter()
        .filter(|&&i| pred[i] == labels[i])
        .count();
    Ok(correct as Real / mask.len() as Real)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn accuracy_is_a_fraction(
            pairs in prop::collection::vec((0usize..3, 0usize..3), 1..32),
            pick in prop::collection::vec(any::<bool>(), 32),
        ) {
            let pred: Vec<usize> = pairs.iter().map(|p| p.0).collect();
            let labels: Vec<usize> = pairs.iter().map(|p| p.1).collect();
            let mut bits: Vec<bool> = pick[..pairs.len()].to_vec();
            bits[0] = true;
            let mask = NodeMask::from_bools(&bits);
            let acc = masked_accuracy(&pred, &labels, &mask).unwrap();
            prop_assert!((0.0..=1.0).contains(&acc));
            let scaled = acc * mask.len() as Real;
            prop_assert!((scaled - scaled.round()).abs() < 1e-9);
        }
    }
}
