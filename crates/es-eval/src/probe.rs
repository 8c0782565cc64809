//! Evaluation probe: score an intermediate integrator state.

use std::fmt;
use std::sync::Arc;

use es_core::{Real, State};
use serde::Serialize;

use crate::dataset::{GraphDataset, MaskKind};
use crate::decoder::Decoder;
use crate::error::{EvalError, EvalResult};
use crate::evaluator::{DatasetKind, StandardEvaluator};
use crate::loss;

/// Train/validation/test accuracy for one state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Accuracies {
    pub train: Real,
    pub val: Real,
    pub test: Real,
}

/// Everything one evaluation produced, handed to the optional observer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeReport {
    pub t0: Real,
    pub t1: Real,
    /// Training-mask loss (NLL for the benchmark dataset, cross-entropy otherwise).
    pub loss: Real,
    pub accuracies: Accuracies,
}

pub type ProbeObserver = Box<dyn FnMut(&ProbeReport)>;

/// Decodes states and reports masked accuracies.
///
/// Decoder and data are bound after construction; evaluating before both are
/// present fails with [`EvalError::NotConfigured`]. The data binding is
/// first-write-wins.
pub struct EvaluationProbe {
    kind: DatasetKind,
    decoder: Option<Decoder>,
    data: Option<Arc<GraphDataset>>,
    evaluator: Option<StandardEvaluator>,
    observer: Option<ProbeObserver>,
    evaluations: usize,
}

impl fmt::Debug for EvaluationProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationProbe")
            .field("kind", &self.kind)
            .field("decoder", &self.decoder.is_some())
            .field("data", &self.data.is_some())
            .field("observer", &self.observer.is_some())
            .field("evaluations", &self.evaluations)
            .finish()
    }
}

impl EvaluationProbe {
    /// Create a probe for the named dataset.
    pub fn new(dataset: &str) -> Self {
        let kind = DatasetKind::from_name(dataset);
        let evaluator = match kind {
            DatasetKind::Benchmark => Some(StandardEvaluator::new(dataset)),
            DatasetKind::Generic => None,
        };
        Self {
            kind,
            decoder: None,
            data: None,
            evaluator,
            observer: None,
            evaluations: 0,
        }
    }

    pub fn kind(&self) -> DatasetKind {
        self.kind
    }

    /// Bind (or replace) the readout. The decoder changes with every
    /// training step, so rebinding is allowed.
    pub fn set_decoder(&mut self, decoder: Decoder) {
        self.decoder = Some(decoder);
    }

    pub fn decoder(&self) -> Option<&Decoder> {
        self.decoder.as_ref()
    }

    /// Bind the dataset if none is bound yet.
    ///
    /// Returns `true` when this call performed the binding; later calls are
    /// no-ops and return `false`.
    pub fn set_data(&mut self, data: Arc<GraphDataset>) -> bool {
        if self.data.is_some() {
            return false;
        }
        self.data = Some(data);
        true
    }

    pub fn data(&self) -> Option<&Arc<GraphDataset>> {
        self.data.as_ref()
    }

    pub fn set_observer(&mut self, observer: impl FnMut(&ProbeReport) + 'static) {
        self.observer = Some(Box::new(observer));
    }

    /// Install an already boxed observer, e.g. one handed over between probes.
    pub fn set_boxed_observer(&mut self, observer: ProbeObserver) {
        self.observer = Some(observer);
    }

    pub fn take_observer(&mut self) -> Option<ProbeObserver> {
        self.observer.take()
    }

    /// Number of evaluations performed so far.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Score `z`, the state at the end of the step `[t0, t1]`.
    pub fn evaluate(&mut self, z: &State, t0: Real, t1: Real) -> EvalResult<Accuracies> {
        let decoder = self
            .decoder
            .as_ref()
            .ok_or(EvalError::NotConfigured { what: "decoder" })?;
        let data = self
            .data
            .as_ref()
            .ok_or(EvalError::NotConfigured { what: "data" })?;

        if z.nrows() != data.num_nodes() {
            return Err(EvalError::ShapeMismatch {
                what: "state rows",
                expected: (data.num_nodes(), z.ncols()),
                actual: z.shape(),
            });
        }

        let logits = decoder.logits(z)?;
        let train_mask = data.mask(MaskKind::Train);

        let (loss, accuracies) = match (self.kind, &self.evaluator) {
            (DatasetKind::Benchmark, Some(evaluator)) => {
                let log_probs = loss::log_softmax(&logits);
                let loss = loss::nll_loss(&log_probs, data.y(), train_mask)?;
                let pred = loss::argmax_rows(&log_probs);
                (loss, evaluator.run(data, &pred)?)
            }
            _ => {
                let loss = loss::cross_entropy(&logits, data.y(), train_mask)?;
                let pred = loss::argmax_rows(&logits);
                let accs = Accuracies {
                    train: loss::masked_accuracy(&pred, data.y(), train_mask)?,
                    val: loss::masked_accuracy(&pred, data.y(), data.mask(MaskKind::Val))?,
                    test: loss::masked_accuracy(&pred, data.y(), data.mask(MaskKind::Test))?,
                };
                (loss, accs)
            }
        };

        self.evaluations += 1;
        tracing::debug!(
            "ODE eval t0 {:.3}, t1 {:.3} Loss: {:.4}, Train: {:.4}, Val: {:.4}, Test: {:.4}",
            t0,
            t1,
            loss,
            accuracies.train,
            accuracies.val,
            accuracies.test
        );

        if let Some(observer) = self.observer.as_mut() {
            observer(&ProbeReport {
                t0,
                t1,
                loss,
                accuracies,
            });
        }

        Ok(accuracies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::NodeMask;
    use es_graph::GraphBuilder;
    use nalgebra::{DMatrix, DVector};

    fn tiny_dataset() -> Arc<GraphDataset> {
        let mut builder = GraphBuilder::new(2);
        builder.add_undirected_edge(0, 1);
        Arc::new(
            GraphDataset::new(
                State::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 1.0]),
                vec![0, 1],
                builder.build().unwrap(),
                NodeMask::from_indices([0]),
                NodeMask::from_indices([1]),
                NodeMask::from_indices([0, 1]),
            )
            .unwrap(),
        )
    }

    fn identity_decoder() -> Decoder {
        Decoder::new(DMatrix::identity(2, 2), DVector::zeros(2)).unwrap()
    }

    #[test]
    fn missing_decoder_is_not_configured() {
        let mut probe = EvaluationProbe::new("Cora");
        probe.set_data(tiny_dataset());
        let err = probe.evaluate(&State::zeros(2, 2), 0.0, 1.0).unwrap_err();
        assert!(matches!(err, EvalError::NotConfigured { what: "decoder" }));
    }

    #[test]
    fn missing_data_is_not_configured() {
        let mut probe = EvaluationProbe::new("Cora");
        probe.set_decoder(identity_decoder());
        let err = probe.evaluate(&State::zeros(2, 2), 0.0, 1.0).unwrap_err();
        assert!(matches!(err, EvalError::NotConfigured { what: "data" }));
    }

    #[test]
    fn observer_sees_loss() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let mut probe = EvaluationProbe::new("Cora");
        probe.set_data(tiny_dataset());
        probe.set_decoder(identity_decoder());
        probe.set_observer(move |r| sink.borrow_mut().push(*r));

        let data = Arc::clone(probe.data().unwrap());
        probe.evaluate(data.x(), 0.0, 0.5).unwrap();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].t1, 0.5);
        assert!(seen[0].loss > 0.0);
        assert_eq!(seen[0].accuracies.test, 1.0);
    }

    #[test]
    fn rejects_row_mismatch() {
        let mut probe = EvaluationProbe::new("Cora");
        probe.set_data(tiny_dataset());
        probe.set_decoder(identity_decoder());
        let err = probe.evaluate(&State::zeros(3, 2), 0.0, 1.0).unwrap_err();
        assert!(matches!(err, EvalError::ShapeMismatch { what: "state rows", .. }));
    }
}
