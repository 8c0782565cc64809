//! es-attention: graph attention used as the coefficient operator of the
//! implicit multistep integrators.
//!
//! Contains:
//! - config (attention options, serde-loadable)
//! - layer (multi-head edge attention with learned projections)
//! - operator (dense node-space operator averaged over heads)
//! - error (attention errors)

pub mod config;
pub mod error;
pub mod layer;
pub mod operator;

pub use config::{AttentionOptions, NormIndex};
pub use error::{AttentionError, AttentionResult};
pub use layer::{AttentionOutput, GraphAttentionLayer};
pub use operator::AttentionOperator;
