use es_eval::EvalError;
use es_graph::GraphError;
use es_solver::SolverError;
use thiserror::Error;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),

    #[error("Evaluation error: {0}")]
    Eval(#[from] EvalError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },
}
