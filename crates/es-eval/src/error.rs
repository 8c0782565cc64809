//! Error types for evaluation.

use es_core::EsError;
use es_graph::GraphError;
use thiserror::Error;

/// Errors raised while binding data or evaluating a state.
#[derive(Error, Debug)]
pub enum EvalError {
    #[error("Not configured: {what} must be set before evaluation")]
    NotConfigured { what: &'static str },

    #[error("Shape mismatch for {what}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Invalid data: {what}")]
    InvalidData { what: String },

    #[error("Mask '{name}' is empty")]
    EmptyMask { name: &'static str },

    #[error("Unknown mask name: {name}")]
    UnknownMask { name: String },

    #[error("Numeric error: {0}")]
    Core(#[from] EsError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),
}

pub type EvalResult<T> = Result<T, EvalError>;
