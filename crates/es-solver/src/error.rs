//! Error types for the early-stop integrators.

use es_attention::AttentionError;
use es_core::{EsError, Real};
use es_eval::EvalError;
use es_graph::GraphError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Unsupported integration method: {method:?} (expected dopri5, rk4, gear2 or gear3)")]
    UnsupportedMethod { method: String },

    #[error("Not configured: {what} must be set before integrating")]
    NotConfigured { what: &'static str },

    #[error("Max function evaluations exceeded: {nfe} > {limit}")]
    MaxNfeExceeded { nfe: usize, limit: usize },

    #[error("Singular implicit system at t={t}")]
    SingularSystem { t: Real },

    #[error("Invalid grid: {what}")]
    InvalidGrid { what: &'static str },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Step size underflow at t={t} (dt={dt})")]
    StepUnderflow { t: Real, dt: Real },

    #[error("Max adaptive steps exceeded: {steps} steps, reached t={t}")]
    MaxStepsExceeded { steps: usize, t: Real },

    #[error("Non-finite {what} at t={t}")]
    NonFinite { what: &'static str, t: Real },

    #[error("Shape mismatch for {what}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Evaluation error: {0}")]
    Eval(#[source] EvalError),

    #[error("Attention error: {0}")]
    Attention(#[from] AttentionError),

    #[error("Core error: {0}")]
    Core(#[from] EsError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),
}

pub type SolverResult<T> = Result<T, SolverError>;

impl From<EvalError> for SolverError {
    fn from(e: EvalError) -> Self {
        match e {
            EvalError::NotConfigured { what } => SolverError::NotConfigured { what },
            other => SolverError::Eval(other),
        }
    }
}

impl From<serde_yaml::Error> for SolverError {
    fn from(e: serde_yaml::Error) -> Self {
        SolverError::Config {
            message: e.to_string(),
        }
    }
}
