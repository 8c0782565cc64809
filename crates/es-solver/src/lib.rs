//! es-solver: early-stopping ODE integrators for graph diffusion.
//!
//! Every solver evaluates its intermediate states against the validation
//! split and remembers the best one, so the integration time can be chosen
//! after the fact.
//!
//! Contains:
//! - fixed (RK4 on a fixed grid)
//! - adaptive (Dormand-Prince 5(4) with a per-call step budget)
//! - gear (implicit BDF solvers over an attention operator)
//! - integrate (method dispatch and structured states)
//! - options (serde-loadable configuration)

pub mod adaptive;
pub mod dopri5;
pub mod dynamics;
pub mod error;
pub mod fixed;
pub mod gear;
pub mod grid;
pub mod integrate;
pub mod options;
pub mod shape;
pub mod solution;

mod rk4;

#[cfg(test)]
mod testing;

pub use adaptive::{Advance, EarlyStopDopri5};
pub use dopri5::RkState;
pub use dynamics::{Fallible, OdeFunc, StructuredOdeFunc};
pub use error::{SolverError, SolverResult};
pub use fixed::EarlyStopRk4;
pub use gear::{EarlyStopGear, GearOrder};
pub use grid::{GridConstructor, linear_interp, step_size_grid};
pub use integrate::{EarlyStopIntegrator, EarlyStopSolver};
pub use options::{Method, SolverOptions};
pub use shape::StateLayout;
pub use solution::{StructuredTrajectory, Trajectory};
