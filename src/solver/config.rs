//! Configuration options for the Levenberg-Marquardt solver.

use serde::{Deserialize, Serialize};

use crate::utils::finite_difference::DEFAULT_EPSILON;

/// Configuration options for the Levenberg-Marquardt algorithm.
///
/// Missing fields take their defaults when deserializing, so a JSON
/// configuration only needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LmConfig {
    /// Maximum number of trial steps. Default: 2000
    pub max_iterations: usize,

    /// Tolerance for the relative reduction of the cost. Default: 1e-10
    pub ftol: f64,

    /// Tolerance for the relative size of a step. Default: 1e-10
    pub xtol: f64,

    /// Tolerance for the scaled gradient. Default: 1e-10
    pub gtol: f64,

    /// Initial value for the damping parameter. Default: 1e-3
    pub initial_lambda: f64,

    /// Factor by which to increase lambda after a rejected step. Default: 10.0
    pub lambda_up_factor: f64,

    /// Factor by which to decrease lambda after an accepted step. Default: 0.1
    pub lambda_down_factor: f64,

    /// Minimum value for lambda. Default: 1e-12
    pub min_lambda: f64,

    /// Lambda above which the solver gives up. Default: 1e12
    pub max_lambda: f64,

    /// Relative step of the forward-difference Jacobian. Default: 1e-8
    pub diff_step: f64,
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            max_iterations: 2000,
            ftol: 1e-10,
            xtol: 1e-10,
            gtol: 1e-10,
            initial_lambda: 1e-3,
            lambda_up_factor: 10.0,
            lambda_down_factor: 0.1,
            min_lambda: 1e-12,
            max_lambda: 1e12,
            diff_step: DEFAULT_EPSILON,
        }
    }
}

impl LmConfig {
    /// Set the maximum number of trial steps.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the tolerance for the relative cost reduction.
    pub fn with_ftol(mut self, ftol: f64) -> Self {
        self.ftol = ftol;
        self
    }

    /// Set the tolerance for the relative step size.
    pub fn with_xtol(mut self, xtol: f64) -> Self {
        self.xtol = xtol;
        self
    }

    /// Set the tolerance for the scaled gradient.
    pub fn with_gtol(mut self, gtol: f64) -> Self {
        self.gtol = gtol;
        self
    }

    /// Set the initial value for the damping parameter.
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.initial_lambda = lambda;
        self
    }

    /// Set the factors by which lambda grows and shrinks.
    pub fn with_lambda_factors(mut self, up: f64, down: f64) -> Self {
        self.lambda_up_factor = up;
        self.lambda_down_factor = down;
        self
    }

    /// Set the range lambda may move in.
    pub fn with_lambda_range(mut self, min_lambda: f64, max_lambda: f64) -> Self {
        self.min_lambda = min_lambda;
        self.max_lambda = max_lambda;
        self
    }

    /// Set the relative step of the finite-difference Jacobian.
    pub fn with_diff_step(mut self, diff_step: f64) -> Self {
        self.diff_step = diff_step;
        self
    }
}
