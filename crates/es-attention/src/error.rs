use es_core::EsError;
use es_graph::GraphError;
use thiserror::Error;

pub type AttentionResult<T> = Result<T, AttentionError>;

#[derive(Error, Debug)]
pub enum AttentionError {
    #[error("Invalid attention option: {what}")]
    InvalidOption { what: &'static str },

    #[error("Shape mismatch for {what}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Invalid attention parameter: {what}")]
    InvalidParameter { what: String },

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Core error: {0}")]
    Core(#[from] EsError),
}
