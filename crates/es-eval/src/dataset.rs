//! Node-classification data bound to an evaluation probe.

use std::str::FromStr;

use es_core::State;
use es_graph::Graph;

use crate::error::{EvalError, EvalResult};

/// Which split a mask selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaskKind {
    Train,
    Val,
    Test,
}

impl MaskKind {
    pub const ALL: [MaskKind; 3] = [MaskKind::Train, MaskKind::Val, MaskKind::Test];

    /// Attribute-style name, e.g. `"val_mask"`.
    pub fn name(self) -> &'static str {
        match self {
            MaskKind::Train => "train_mask",
            MaskKind::Val => "val_mask",
            MaskKind::Test => "test_mask",
        }
    }
}

impl FromStr for MaskKind {
    type Err = EvalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MaskKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| EvalError::UnknownMask { name: s.to_string() })
    }
}

/// A set of node rows, stored as sorted unique indices.
///
/// Built from either a boolean mask or an index list; both forms select the
/// same rows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeMask {
    indices: Vec<usize>,
}

impl NodeMask {
    pub fn from_bools(bits: &[bool]) -> Self {
        Self {
            indices: bits
                .iter()
                .enumerate()
                .filter_map(|(i, &b)| b.then_some(i))
                .collect(),
        }
    }

    pub fn from_indices(indices: impl IntoIterator<Item = usize>) -> Self {
        let mut indices: Vec<usize> = indices.into_iter().collect();
        indices.sort_unstable();
        indices.dedup();
        Self { indices }
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn contains(&self, node: usize) -> bool {
        self.indices.binary_search(&node).is_ok()
    }

    /// Largest selected row, if any.
    pub fn max_index(&self) -> Option<usize> {
        self.indices.last().copied()
    }
}

/// Features, labels, connectivity and split masks for one graph.
///
/// Shared with solvers through `Arc`; nothing here is copied per step.
#[derive(Debug, Clone)]
pub struct GraphDataset {
    x: State,
    y: Vec<usize>,
    graph: Graph,
    train_mask: NodeMask,
    val_mask: NodeMask,
    test_mask: NodeMask,
}

impl GraphDataset {
    /// Validate and assemble a dataset.
    ///
    /// Feature rows, label count and graph size must agree, and every mask
    /// must be non-empty and in range.
    pub fn new(
        x: State,
        y: Vec<usize>,
        graph: Graph,
        train_mask: NodeMask,
        val_mask: NodeMask,
        test_mask: NodeMask,
    ) -> EvalResult<Self> {
        let n = x.nrows();
        if y.len() != n {
            return Err(EvalError::ShapeMismatch {
                what: "labels",
                expected: (n, 1),
                actual: (y.len(), 1),
            });
        }
        if graph.num_nodes() != n {
            return Err(EvalError::ShapeMismatch {
                what: "graph nodes",
                expected: (n, n),
                actual: (graph.num_nodes(), graph.num_nodes()),
            });
        }
        es_core::ensure_finite_state(&x, "node features")?;

        for (kind, mask) in [
            (MaskKind::Train, &train_mask),
            (MaskKind::Val, &val_mask),
            (MaskKind::Test, &test_mask),
        ] {
            if mask.is_empty() {
                return Err(EvalError::EmptyMask { name: kind.name() });
            }
            if let Some(max) = mask.max_index().filter(|&m| m >= n) {
                return Err(EvalError::InvalidData {
                    what: format!("{} selects node {} of {}", kind.name(), max, n),
                });
            }
        }

        Ok(Self {
            x,
            y,
            graph,
            train_mask,
            val_mask,
            test_mask,
        })
    }

    /// Node feature matrix.
    pub fn x(&self) -> &State {
        &self.x
    }

    /// Integer class label per node.
    pub fn y(&self) -> &[usize] {
        &self.y
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn num_nodes(&self) -> usize {
        self.x.nrows()
    }

    /// Number of classes implied by the labels.
    pub fn num_classes(&self) -> usize {
        self.y.iter().max().map_or(0, |m| m + 1)
    }

    pub fn mask(&self, kind: MaskKind) -> &NodeMask {
        match kind {
            MaskKind::Train => &self.train_mask,
            MaskKind::Val => &self.val_mask,
            MaskKind::Test => &self.test_mask,
        }
    }

    /// Look a mask up by its attribute name (`"train_mask"`, ...).
    pub fn mask_by_name(&self, name: &str) -> EvalResult<&NodeMask> {
        Ok(self.mask(name.parse()?))
    }

    /// Labels restricted to a mask, in mask order.
    pub fn masked_labels(&self, kind: MaskKind) -> Vec<usize> {
        self.mask(kind).indices().iter().map(|&i| self.y[i]).collect()
    }
}
