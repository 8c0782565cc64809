use es_core::{Real, State};

/// Result of one integration call.
#[derive(Debug, Clone)]
pub struct Trajectory {
    /// Time actually reached. Equals the last requested time unless the
    /// adaptive step budget ran out.
    pub t_final: Real,
    /// One state per requested time, the initial state first.
    pub states: Vec<State>,
    /// The adaptive step budget was spent while advancing to some requested time.
    pub clamped: bool,
    /// Dynamics evaluations (implicit solves for the Gear solvers).
    pub nfe: usize,
}

impl Trajectory {
    pub fn last(&self) -> Option<&State> {
        self.states.last()
    }
}

/// A trajectory split back into the caller's state parts.
#[derive(Debug, Clone)]
pub struct StructuredTrajectory {
    pub t_final: Real,
    /// Per requested time, one state per part in the original order.
    pub states: Vec<Vec<State>>,
    pub clamped: bool,
    pub nfe: usize,
}
