//! Evaluation instrumentation for early-stopping integrators.
//!
//! This crate turns an intermediate integrator state into accuracy figures
//! and keeps the best one seen so far:
//! - [`GraphDataset`]: features, labels, graph and train/val/test masks
//! - [`Decoder`]: the linear readout from state to class logits
//! - [`EvaluationProbe`]: decode, score loss and masked accuracies
//! - [`BestTracker`]: running best validation snapshot
//! - [`EarlyStopMonitor`]: probe and tracker glued together per step

pub mod dataset;
pub mod decoder;
pub mod error;
pub mod evaluator;
pub mod loss;
pub mod monitor;
pub mod probe;
pub mod tracker;

pub use dataset::{GraphDataset, MaskKind, NodeMask};
pub use decoder::Decoder;
pub use error::{EvalError, EvalResult};
pub use evaluator::{DatasetKind, EvaluatorInput, EvaluatorOutput, StandardEvaluator};
pub use monitor::EarlyStopMonitor;
pub use probe::{Accuracies, EvaluationProbe, ProbeObserver, ProbeReport};
pub use tracker::{BestSnapshot, BestTracker};
