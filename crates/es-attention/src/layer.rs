//! Multi-head edge attention.
//!
//! Each head projects node features to `d_k` dimensions, scores every edge
//! with a learned vector over the concatenated endpoint projections, applies
//! LeakyReLU and normalizes the scores with a softmax grouped by source (or
//! target) node.

use es_core::{Real, State};
use es_graph::Graph;
use nalgebra::DMatrix;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::config::{AttentionOptions, NormIndex};
use crate::error::{AttentionError, AttentionResult};

/// Attention weights and projected features from one forward pass.
#[derive(Debug, Clone)]
pub struct AttentionOutput {
    /// One row per edge, one column per head.
    pub attention: DMatrix<Real>,
    /// Projected features, heads laid out as consecutive column blocks.
    pub wx: State,
}

#[derive(Debug, Clone)]
pub struct GraphAttentionLayer {
    in_features: usize,
    heads: usize,
    d_k: usize,
    leaky_relu_slope: Real,
    norm_index: NormIndex,
    /// in_features × (heads · d_k)
    w: DMatrix<Real>,
    /// d_k × in_features
    w_out: DMatrix<Real>,
    /// (2 · d_k) × heads
    a: DMatrix<Real>,
}

fn xavier_normal(
    fan_in: usize,
    fan_out: usize,
    gain: Real,
    rng: &mut StdRng,
) -> AttentionResult<DMatrix<Real>> {
    let std = gain * (2.0 / (fan_in + fan_out) as Real).sqrt();
    let normal = Normal::new(0.0, std).map_err(|e| AttentionError::InvalidParameter {
        what: format!("xavier std {std}: {e}"),
    })?;
    Ok(DMatrix::from_fn(fan_in, fan_out, |_, _| normal.sample(rng)))
}

impl GraphAttentionLayer {
    /// Seeded Xavier-normal initialization.
    pub fn xavier(in_features: usize, opts: &AttentionOptions, seed: u64) -> AttentionResult<Self> {
        let d_k = opts.head_dim(in_features)?;
        let mut rng = StdRng::seed_from_u64(seed);
        let w = xavier_normal(in_features, opts.heads * d_k, opts.init_gain, &mut rng)?;
        let w_out = xavier_normal(d_k, in_features, opts.init_gain, &mut rng)?;
        let a = xavier_normal(2 * d_k, opts.heads, opts.init_gain, &mut rng)?;
        Self::from_parameters(w, w_out, a, opts)
    }

    /// Build from externally learned parameters.
    pub fn from_parameters(
        w: DMatrix<Real>,
        w_out: DMatrix<Real>,
        a: DMatrix<Real>,
        opts: &AttentionOptions,
    ) -> AttentionResult<Self> {
        opts.validate()?;
        let in_features = w.nrows();
        let heads = opts.heads;
        if w.ncols() == 0 || w.ncols() % heads != 0 {
            return Err(AttentionError::InvalidParameter {
                what: format!("W has {} columns, not a multiple of {} heads", w.ncols(), heads),
            });
        }
        let d_k = w.ncols() / heads;
        if w_out.shape() != (d_k, in_features) {
            return Err(AttentionError::ShapeMismatch {
                what: "output projection",
                expected: (d_k, in_features),
                actual: w_out.shape(),
            });
        }
        if a.shape() != (2 * d_k, heads) {
            return Err(AttentionError::ShapeMismatch {
                what: "attention vector",
                expected: (2 * d_k, heads),
                actual: a.shape(),
            });
        }
        for m in [&w, &w_out, &a] {
            es_core::ensure_finite_state(m, "attention parameters")?;
        }
        Ok(Self {
            in_features,
            heads,
            d_k,
            leaky_relu_slope: opts.leaky_relu_slope,
            norm_index: opts.norm_index,
            w,
            w_out,
            a,
        })
    }

    pub fn in_features(&self) -> usize {
        self.in_features
    }

    pub fn heads(&self) -> usize {
        self.heads
    }

    pub fn head_dim(&self) -> usize {
        self.d_k
    }

    pub fn output_projection(&self) -> &DMatrix<Real> {
        &self.w_out
    }

    fn leaky_relu(&self, v: Real) -> Real {
        if v >= 0.0 { v } else { self.leaky_relu_slope * v }
    }

    pub fn forward(&self, x: &State, graph: &Graph) -> AttentionResult<AttentionOutput> {
        if x.ncols() != self.in_features {
            return Err(AttentionError::ShapeMismatch {
                what: "attention input",
                expected: (x.nrows(), self.in_features),
                actual: x.shape(),
            });
        }
        if graph.num_nodes() != x.nrows() {
            return Err(AttentionError::ShapeMismatch {
                what: "graph nodes",
                expected: (x.nrows(), x.nrows()),
                actual: (graph.num_nodes(), graph.num_nodes()),
            });
        }

        let wx = x * &self.w;
        let edges = graph.edges();
        let d_k = self.d_k;

        let mut attention = DMatrix::zeros(edges.len(), self.heads);
        for (e, edge) in edges.iter().enumerate() {
            let (src, dst) = (edge.src.index(), edge.dst.index());
            for h in 0..self.heads {
                let block = h * d_k;
                let mut score = 0.0;
                for k in 0..d_k {
                    score += self.a[(k, h)] * wx[(src, block + k)]
                        + self.a[(d_k + k, h)] * wx[(dst, block + k)];
                }
                attention[(e, h)] = self.leaky_relu(score);
            }
        }

        let groups: Vec<usize> = edges
            .iter()
            .map(|edge| match self.norm_index {
                NormIndex::Source => edge.src.index(),
                NormIndex::Target => edge.dst.index(),
            })
            .collect();
        grouped_softmax(&mut attention, &groups, x.nrows());

        Ok(AttentionOutput { attention, wx })
    }
}

/// Softmax of each column over the rows sharing a group.
fn grouped_softmax(scores: &mut DMatrix<Real>, groups: &[usize], num_groups: usize) {
    for mut col in scores.column_iter_mut() {
        let mut max = vec![Real::NEG_INFINITY; num_groups];
        for (v, &g) in col.iter().zip(groups) {
            max[g] = max[g].max(*v);
        }
        let mut sum = vec![0.0; num_groups];
        for (v, &g) in col.iter_mut().zip(groups) {
            *v = (*v - max[g]).exp();
            sum[g] += *v;
        }
        for (v, &g) in col.iter_mut().zip(groups) {
            *v /= sum[g];
        }
    }
}
