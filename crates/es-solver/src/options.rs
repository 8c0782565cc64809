//! Solver configuration.

use std::fmt;
use std::str::FromStr;

use es_attention::AttentionOptions;
use es_core::{Real, Tolerances};
use serde::{Deserialize, Serialize};

use crate::error::{SolverError, SolverResult};

/// Integration method, resolved from its configuration name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Method {
    Dopri5,
    Rk4,
    Gear2,
    Gear3,
}

impl Method {
    pub const ALL: [Method; 4] = [Method::Dopri5, Method::Rk4, Method::Gear2, Method::Gear3];

    pub fn name(self) -> &'static str {
        match self {
            Method::Dopri5 => "dopri5",
            Method::Rk4 => "rk4",
            Method::Gear2 => "gear2",
            Method::Gear3 => "gear3",
        }
    }

    /// Whether the method needs the graph-attention collaborator.
    pub fn is_implicit(self) -> bool {
        matches!(self, Method::Gear2 | Method::Gear3)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Method {
    type Err = SolverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| SolverError::UnsupportedMethod {
                method: s.to_string(),
            })
    }
}

impl TryFrom<String> for Method {
    type Error = SolverError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Method> for String {
    fn from(m: Method) -> Self {
        m.name().to_string()
    }
}

/// Options for one early-stop integrator. Immutable once integration starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    /// Dataset name; selects the evaluation path.
    pub dataset: String,
    pub method: Method,
    /// Adaptive step attempts allowed per `advance` call.
    pub max_test_steps: usize,
    /// Function evaluations allowed per integration call.
    pub max_nfe: usize,
    /// Hard cap on accepted adaptive steps per integration call.
    pub max_num_steps: usize,
    pub rtol: Real,
    pub atol: Real,
    /// Multiplier applied to both tolerances.
    pub tol_scale: Real,
    /// Uniform grid spacing for the fixed-step solver.
    pub step_size: Option<Real>,
    /// Boundary padding for RK4 stage times.
    pub eps: Real,
    /// Evaluation horizon as a multiple of the nominal end time.
    pub earlystop_x_t: Real,
    pub alpha_train: Real,
    pub no_alpha_sigmoid: bool,
    pub attention: AttentionOptions,
    /// Seed for generated attention parameters.
    pub seed: u64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            dataset: "Cora".to_string(),
            method: Method::Dopri5,
            max_test_steps: 100,
            max_nfe: 1000,
            max_num_steps: i32::MAX as usize,
            rtol: 1e-7,
            atol: 1e-9,
            tol_scale: 1.0,
            step_size: None,
            eps: 0.0,
            earlystop_x_t: 3.0,
            alpha_train: 0.2,
            no_alpha_sigmoid: false,
            attention: AttentionOptions::default(),
            seed: 0,
        }
    }
}

impl SolverOptions {
    pub fn with_method(method: Method) -> Self {
        Self {
            method,
            ..Default::default()
        }
    }

    /// Parse and validate YAML options. Missing keys take their defaults.
    pub fn from_yaml_str(s: &str) -> SolverResult<Self> {
        let opts: SolverOptions = serde_yaml::from_str(s)?;
        opts.validate()?;
        Ok(opts)
    }

    pub fn to_yaml_string(&self) -> SolverResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> SolverResult<()> {
        let non_negative = |v: Real| v.is_finite() && v >= 0.0;
        if !non_negative(self.rtol) || !non_negative(self.atol) {
            return Err(SolverError::InvalidArg {
                what: "rtol and atol must be finite and non-negative",
            });
        }
        if !(self.tol_scale.is_finite() && self.tol_scale > 0.0) {
            return Err(SolverError::InvalidArg {
                what: "tol_scale must be positive",
            });
        }
        if let Some(h) = self.step_size {
            if !(h.is_finite() && h > 0.0) {
                return Err(SolverError::InvalidArg {
                    what: "step_size must be positive",
                });
            }
        }
        if !non_negative(self.eps) {
            return Err(SolverError::InvalidArg {
                what: "eps must be finite and non-negative",
            });
        }
        if !(self.earlystop_x_t.is_finite() && self.earlystop_x_t > 0.0) {
            return Err(SolverError::InvalidArg {
                what: "earlystop_x_t must be positive",
            });
        }
        if !self.alpha_train.is_finite() {
            return Err(SolverError::InvalidArg {
                what: "alpha_train must be finite",
            });
        }
        self.attention.validate()?;
        Ok(())
    }

    /// Tolerances after `tol_scale`.
    pub fn tolerances(&self) -> Tolerances {
        Tolerances {
            abs: self.atol,
            rel: self.rtol,
        }
        .scaled(self.tol_scale)
    }

    /// Mixing coefficient of the implicit solvers.
    pub fn alpha(&self) -> Real {
        if self.no_alpha_sigmoid {
            self.alpha_train
        } else {
            es_core::sigmoid(self.alpha_train)
        }
    }
}
