//! Attention options.

use es_core::Real;
use serde::{Deserialize, Serialize};

use crate::error::{AttentionError, AttentionResult};

/// Which endpoint of an edge the softmax normalizes over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormIndex {
    /// Weights leaving each source node sum to one (rows of the operator).
    #[default]
    Source,
    /// Weights entering each target node sum to one (columns).
    Target,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttentionOptions {
    pub heads: usize,
    pub leaky_relu_slope: Real,
    /// Fill weight for missing self-loops; zero leaves the graph untouched.
    pub self_loop_weight: Real,
    pub norm_index: NormIndex,
    /// Width of the attention projection. Defaults to the feature width.
    pub attention_dim: Option<usize>,
    /// Xavier gain for generated parameters.
    pub init_gain: Real,
}

impl Default for AttentionOptions {
    fn default() -> Self {
        Self {
            heads: 1,
            leaky_relu_slope: 0.2,
            self_loop_weight: 0.0,
            norm_index: NormIndex::Source,
            attention_dim: None,
            init_gain: 1.414,
        }
    }
}

impl AttentionOptions {
    pub fn validate(&self) -> AttentionResult<()> {
        if self.heads == 0 {
            return Err(AttentionError::InvalidOption {
                what: "heads must be at least 1",
            });
        }
        if !self.leaky_relu_slope.is_finite() {
            return Err(AttentionError::InvalidOption {
                what: "leaky_relu_slope must be finite",
            });
        }
        if !self.self_loop_weight.is_finite() || self.self_loop_weight < 0.0 {
            return Err(AttentionError::InvalidOption {
                what: "self_loop_weight must be finite and non-negative",
            });
        }
        if !self.init_gain.is_finite() || self.init_gain <= 0.0 {
            return Err(AttentionError::InvalidOption {
                what: "init_gain must be positive",
            });
        }
        if let Some(dim) = self.attention_dim {
            if dim == 0 || dim % self.heads != 0 {
                return Err(AttentionError::InvalidOption {
                    what: "attention_dim must be a positive multiple of heads",
                });
            }
        }
        Ok(())
    }

    /// Per-head key width for a given input width.
    pub fn head_dim(&self, in_features: usize) -> AttentionResult<usize> {
        self.validate()?;
        let dim = self.attention_dim.unwrap_or(in_features);
        if dim == 0 || dim % self.heads != 0 {
            return Err(AttentionError::InvalidOption {
                what: "feature width must be a positive multiple of heads",
            });
        }
        Ok(dim / self.heads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let opts = AttentionOptions::default();
        opts.validate().unwrap();
        assert_eq!(opts.head_dim(8).unwrap(), 8);
    }

    #[test]
    fn head_dim_splits_attention_width() {
        let opts = AttentionOptions {
            heads: 2,
            attention_dim: Some(6),
            ..Default::default()
        };
        assert_eq!(opts.head_dim(4).unwrap(), 3);
    }

    #[test]
    fn rejects_indivisible_width() {
        let opts = AttentionOptions {
            heads: 2,
            ..Default::default()
        };
        assert!(opts.head_dim(3).is_err());
        let bad = AttentionOptions {
            self_loop_weight: -1.0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
