//! Packing multi-part states into one matrix and back.

use es_core::{Real, State};

use crate::dynamics::{OdeFunc, StructuredOdeFunc};
use crate::error::{SolverError, SolverResult};

/// Column layout of a structured state: parts share the node rows and are
/// placed side by side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateLayout {
    rows: usize,
    widths: Vec<usize>,
}

impl StateLayout {
    pub fn of(parts: &[State]) -> SolverResult<Self> {
        let Some(first) = parts.first() else {
            return Err(SolverError::InvalidArg {
                what: "structured state needs at least one part",
            });
        };
        let rows = first.nrows();
        for p in parts {
            if p.nrows() != rows {
                return Err(SolverError::ShapeMismatch {
                    what: "state part rows",
                    expected: (rows, p.ncols()),
                    actual: p.shape(),
                });
            }
        }
        Ok(Self {
            rows,
            widths: parts.iter().map(|p| p.ncols()).collect(),
        })
    }

    pub fn num_parts(&self) -> usize {
        self.widths.len()
    }

    pub fn total_width(&self) -> usize {
        self.widths.iter().sum()
    }

    /// Shape of each part, in order.
    pub fn shapes(&self) -> Vec<(usize, usize)> {
        self.widths.iter().map(|&w| (self.rows, w)).collect()
    }

    pub fn flatten(&self, parts: &[State]) -> SolverResult<State> {
        if parts.len() != self.num_parts() {
            return Err(SolverError::InvalidArg {
                what: "part count does not match layout",
            });
        }
        let mut out = State::zeros(self.rows, self.total_width());
        let mut col = 0;
        for (p, &w) in parts.iter().zip(&self.widths) {
            if p.shape() != (self.rows, w) {
                return Err(SolverError::ShapeMismatch {
                    what: "state part",
                    expected: (self.rows, w),
                    actual: p.shape(),
                });
            }
            out.columns_mut(col, w).copy_from(p);
            col += w;
        }
        Ok(out)
    }

    pub fn unflatten(&self, y: &State) -> SolverResult<Vec<State>> {
        let expected = (self.rows, self.total_width());
        if y.shape() != expected {
            return Err(SolverError::ShapeMismatch {
                what: "flat state",
                expected,
                actual: y.shape(),
            });
        }
        let mut col = 0;
        Ok(self
            .widths
            .iter()
            .map(|&w| {
                let part = y.columns(col, w).into_owned();
                col += w;
                part
            })
            .collect())
    }
}

/// Presents structured dynamics as flat dynamics over the packed state.
pub(crate) struct FlatFunc<'a, F: ?Sized> {
    func: &'a mut F,
    layout: &'a StateLayout,
}

impl<'a, F: StructuredOdeFunc + ?Sized> FlatFunc<'a, F> {
    pub(crate) fn new(func: &'a mut F, layout: &'a StateLayout) -> Self {
        Self { func, layout }
    }
}

impl<F: StructuredOdeFunc + ?Sized> OdeFunc for FlatFunc<'_, F> {
    fn rhs(&mut self, t: Real, y: &State) -> SolverResult<State> {
        let parts = self.layout.unflatten(y)?;
        let dparts = self.func.rhs_parts(t, &parts)?;
        self.layout.flatten(&dparts)
    }
}
