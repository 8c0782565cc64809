//! Standardized benchmark evaluation.
//!
//! The large-scale benchmark (`ogbn-arxiv`) reports accuracy through a fixed
//! evaluator contract: integer predictions and mask-indexed ground truth in,
//! a metric map with an `"acc"` entry out.

use std::collections::BTreeMap;

use es_core::Real;
use serde::{Deserialize, Serialize};

use crate::dataset::{GraphDataset, MaskKind};
use crate::error::{EvalError, EvalResult};
use crate::probe::Accuracies;

/// Name of the dataset that routes through [`StandardEvaluator`].
pub const BENCHMARK_DATASET: &str = "ogbn-arxiv";

/// Which evaluation path a dataset uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatasetKind {
    /// Cross-entropy on logits, arg-max accuracy per mask.
    Generic,
    /// Log-softmax + NLL, accuracy via the standardized evaluator.
    Benchmark,
}

impl DatasetKind {
    pub fn from_name(name: &str) -> Self {
        if name == BENCHMARK_DATASET {
            DatasetKind::Benchmark
        } else {
            DatasetKind::Generic
        }
    }
}

/// Evaluator input: ground truth and predictions for one mask.
#[derive(Debug, Clone, Copy)]
pub struct EvaluatorInput<'a> {
    pub y_true: &'a [usize],
    pub y_pred: &'a [usize],
}

/// Metric name to value.
pub type EvaluatorOutput = BTreeMap<String, Real>;

#[derive(Debug, Clone)]
pub struct StandardEvaluator {
    name: String,
}

impl StandardEvaluator {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn eval(&self, input: EvaluatorInput<'_>) -> EvalResult<EvaluatorOutput> {
        if input.y_true.len() != input.y_pred.len() {
            return Err(EvalError::ShapeMismatch {
                what: "evaluator predictions",
                expected: (input.y_true.len(), 1),
                actual: (input.y_pred.len(), 1),
            });
        }
        if input.y_true.is_empty() {
            return Err(EvalError::EmptyMask {
                name: "evaluator input",
            });
        }
        let correct = input
            .y_true
            .iter()
            .zip(input.y_pred)
            .filter(|(t, p)| t == p)
            .count();
        let mut out = EvaluatorOutput::new();
        out.insert("acc".to_string(), correct as Real / input.y_true.len() as Real);
        Ok(out)
    }

    /// Evaluate whole-graph predictions on the train, val and test masks.
    pub fn run(&self, data: &GraphDataset, y_pred: &[usize]) -> EvalResult<Accuracies> {
        let mut accs = [0.0; 3];
        for (slot, kind) in accs.iter_mut().zip(MaskKind::ALL) {
            let mask = data.mask(kind);
            let y_true = data.masked_labels(kind);
            let pred: Vec<usize> = mask.indices().iter().map(|&i| y_pred[i]).collect();
            let metrics = self.eval(EvaluatorInput {
                y_true: &y_true,
                y_pred: &pred,
            })?;
            *slot = metrics
                .get("acc")
                .copied()
                .ok_or_else(|| EvalError::InvalidData {
                    what: format!("evaluator {} returned no 'acc'", self.name),
                })?;
        }
        Ok(Accuracies {
            train: accs[0],
            val: accs[1],
            test: accs[2],
        })
    }
}
