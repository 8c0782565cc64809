//! Running best-validation snapshot.

use es_core::Real;
use serde::Serialize;

use crate::probe::Accuracies;

/// Accuracies and time of the best validation score seen so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BestSnapshot {
    pub train_acc: Real,
    pub val_acc: Real,
    pub test_acc: Real,
    pub time: Real,
}

/// Keeps the snapshot with the strictly highest validation accuracy.
///
/// Ties keep the earlier snapshot. Starts from all zeros, so a step scoring
/// zero validation accuracy never registers.
#[derive(Debug, Clone, Default)]
pub struct BestTracker {
    best: BestSnapshot,
    updates: usize,
}

impl BestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a step's accuracies; returns whether the snapshot changed.
    pub fn consider(&mut self, accs: Accuracies, time: Real) -> bool {
        if accs.val > self.best.val_acc {
            self.best = BestSnapshot {
                train_acc: accs.train,
                val_acc: accs.val,
                test_acc: accs.test,
                time,
            };
            self.updates += 1;
            true
        } else {
            false
        }
    }

    pub fn best(&self) -> BestSnapshot {
        self.best
    }

    /// How many times the snapshot has been replaced.
    pub fn updates(&self) -> usize {
        self.updates
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn best_val_is_monotone(vals in prop::collection::vec(0.0_f64..=1.0, 1..64)) {
            let mut t = BestTracker::new();
            let mut prev = t.best().val_acc;
            for (i, v) in vals.iter().enumerate() {
                t.consider(Accuracies { train: 0.0, val: *v, test: 0.0 }, i as Real);
                let now = t.best().val_acc;
                prop_assert!(now >= prev);
                prev = now;
            }
            let max = vals.iter().copied().fold(0.0, Real::max);
            prop_assert_eq!(t.best().val_acc, max);
        }
    }
}
