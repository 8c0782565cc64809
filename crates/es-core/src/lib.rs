//! es-core: shared foundation for the early-stopping integrators.
//!
//! Contains:
//! - numeric (Real, State, tolerances, norms and float helpers)
//! - ids (compact node/edge identifiers)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;

// Re-exports: nice ergonomics for downstream crates
pub use error::{EsError, EsResult};
pub use ids::*;
pub use numeric::*;
