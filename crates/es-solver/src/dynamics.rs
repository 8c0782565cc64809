//! Dynamics functions and evaluation accounting.

use es_core::{Real, State};

use crate::error::{SolverError, SolverResult};

/// Right-hand side `dy/dt = f(t, y)` of a diffusion model.
///
/// Implemented for any `FnMut(Real, &State) -> State`; wrap fallible
/// closures in [`Fallible`].
pub trait OdeFunc {
    fn rhs(&mut self, t: Real, y: &State) -> SolverResult<State>;
}

impl<F> OdeFunc for F
where
    F: FnMut(Real, &State) -> State,
{
    fn rhs(&mut self, t: Real, y: &State) -> SolverResult<State> {
        Ok(self(t, y))
    }
}

/// Adapter for dynamics that can fail.
pub struct Fallible<F>(pub F);

impl<F> OdeFunc for Fallible<F>
where
    F: FnMut(Real, &State) -> SolverResult<State>,
{
    fn rhs(&mut self, t: Real, y: &State) -> SolverResult<State> {
        (self.0)(t, y)
    }
}

/// Dynamics over a tuple of state parts sharing the node dimension.
pub trait StructuredOdeFunc {
    fn rhs_parts(&mut self, t: Real, parts: &[State]) -> SolverResult<Vec<State>>;
}

impl<F> StructuredOdeFunc for F
where
    F: FnMut(Real, &[State]) -> Vec<State>,
{
    fn rhs_parts(&mut self, t: Real, parts: &[State]) -> SolverResult<Vec<State>> {
        Ok(self(t, parts))
    }
}

/// Counts dynamics calls against a budget and checks output shapes.
pub(crate) struct Counted<'a, F: ?Sized> {
    func: &'a mut F,
    nfe: usize,
    limit: usize,
}

impl<'a, F: OdeFunc + ?Sized> Counted<'a, F> {
    pub(crate) fn new(func: &'a mut F, limit: usize) -> Self {
        Self::resume(func, limit, 0)
    }

    /// Continue counting from `nfe` evaluations already spent.
    pub(crate) fn resume(func: &'a mut F, limit: usize, nfe: usize) -> Self {
        Self { func, nfe, limit }
    }

    pub(crate) fn nfe(&self) -> usize {
        self.nfe
    }

    pub(crate) fn eval(&mut self, t: Real, y: &State) -> SolverResult<State> {
        self.nfe += 1;
        if self.nfe > self.limit {
            return Err(SolverError::MaxNfeExceeded {
                nfe: self.nfe,
                limit: self.limit,
            });
        }
        let dy = self.func.rhs(t, y)?;
        if dy.shape() != y.shape() {
            return Err(SolverError::ShapeMismatch {
                what: "dynamics output",
                expected: y.shape(),
                actual: dy.shape(),
            });
        }
        Ok(dy)
    }
}
