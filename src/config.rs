use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ReconError;

/// Regularization matrix construction method.
///
/// `Kotre` derives a diagonal matrix from `diag(J^T J)` raised to the power
/// `p` (Adler-Dai-Lionheart 2007: p near 0 pushes the noise towards the
/// boundary, p near 1 towards the interior). `Lm` is the Marquardt-Levenberg
/// choice, a plain identity.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RegMethod {
    Kotre,
    Lm,
}

impl FromStr for RegMethod {
    type Err = ReconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "kotre" => Ok(RegMethod::Kotre),
            "lm" => Ok(RegMethod::Lm),
            other => Err(ReconError::Config(format!(
                "unknown regularization method: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for RegMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RegMethod::Kotre => write!(f, "kotre"),
            RegMethod::Lm => write!(f, "lm"),
        }
    }
}

/// Parameters fixed at solver setup time.
///
/// These drive the cached pseudo-inverse for difference imaging and serve as
/// per-field defaults for the Gauss-Newton overrides.
#[derive(Deserialize, Serialize, Debug, Clone, Copy)]
pub struct SolverParams {
    /// Regularization exponent, >= 0.
    pub p: f64,
    /// Regularization weight, >= 0.
    pub lamb: f64,
    /// Regularization matrix method.
    pub method: RegMethod,
}

impl Default for SolverParams {
    fn default() -> Self {
        SolverParams {
            p: 0.20,
            lamb: 0.001,
            method: RegMethod::Kotre,
        }
    }
}

impl SolverParams {
    pub fn validate(&self) -> Result<(), ReconError> {
        if self.p < 0.0 {
            return Err(ReconError::Config(format!(
                "regularization exponent p must be >= 0, got {}",
                self.p
            )));
        }
        if self.lamb < 0.0 {
            return Err(ReconError::Config(format!(
                "regularization weight lamb must be >= 0, got {}",
                self.lamb
            )));
        }
        Ok(())
    }
}

/// Options for the iterative Gauss-Newton reconstruction.
///
/// `p`, `lamb` and `method` override the solver's configured [`SolverParams`]
/// when set; `None` falls back per field. The loop always runs exactly
/// `maxiter` iterations, there is no convergence-based early exit.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct GnOptions {
    /// Fixed iteration count, >= 1.
    pub maxiter: usize,
    pub p: Option<f64>,
    pub lamb: Option<f64>,
    /// Multiplied into lambda after each iteration, affecting only subsequent
    /// iterations.
    pub lamb_decay: f64,
    /// Decay stops once lambda is at or below this floor.
    pub lamb_min: f64,
    pub method: Option<RegMethod>,
}

impl Default for GnOptions {
    fn default() -> Self {
        GnOptions {
            maxiter: 1,
            p: None,
            lamb: None,
            lamb_decay: 1.0,
            lamb_min: 0.0,
            method: None,
        }
    }
}

impl GnOptions {
    pub fn validate(&self) -> Result<(), ReconError> {
        if self.maxiter == 0 {
            return Err(ReconError::Config(
                "maxiter must be >= 1, the loop has no early exit to skip".to_string(),
            ));
        }
        if let Some(p) = self.p {
            if p < 0.0 {
                return Err(ReconError::Config(format!(
                    "regularization exponent p must be >= 0, got {}",
                    p
                )));
            }
        }
        if let Some(lamb) = self.lamb {
            if lamb < 0.0 {
                return Err(ReconError::Config(format!(
                    "regularization weight lamb must be >= 0, got {}",
                    lamb
                )));
            }
        }
        if self.lamb_min < 0.0 {
            return Err(ReconError::Config(format!(
                "lamb_min must be >= 0, got {}",
                self.lamb_min
            )));
        }
        Ok(())
    }
}
