//! The outcome of a fit.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::estimators::EstimatorMode;
use crate::model::{Abscissa, Dimensionality};
use crate::parameters::ParameterSet;

/// Fitted parameters, the fitted curve and solver diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub model: String,
    pub estimator: EstimatorMode,
    pub dimensionality: Dimensionality,

    /// Abscissa of the fitted curve: a dense resampling of a 1-D x range,
    /// or the input grid of a 2-D fit.
    pub fit_x: Abscissa,

    /// The model evaluated on `fit_x` with the fitted parameters.
    pub fit_y: Array1<f64>,

    /// Fitted values and standard errors.
    pub parameters: ParameterSet,

    pub success: bool,
    pub message: String,
    pub chi_square: f64,
    pub reduced_chi_square: f64,
    pub iterations: usize,

    /// Solver calls made, including the successful one.
    pub attempts: usize,
}

impl FitResult {
    /// Fitted value of a parameter.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.parameters.get(name).map(|p| p.value())
    }

    /// Standard error of a parameter, if the solver could estimate one.
    pub fn stderr(&self, name: &str) -> Option<f64> {
        self.parameters.get(name).and_then(|p| p.stderr)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
