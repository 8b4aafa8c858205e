//! Initial-value estimators.
//!
//! Nonlinear solvers are sensitive to their starting point, so every model
//! carries one or more heuristics that look at the raw data and seed the
//! parameter values and bounds. Heuristics are keyed by an
//! [`EstimatorMode`]; a model may support only some modes (an antibunching
//! curve only has a `dip` estimator, for instance).

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FitError, Result};
use crate::model::{Abscissa, Dimensionality, ModelSpec};
use crate::models::ModelKind;
use crate::parameters::ParameterSet;

/// An estimator function: raw data in, initial values written into `params`.
pub type EstimateFn = fn(x: &Abscissa, y: &Array1<f64>, params: &mut ParameterSet) -> Result<()>;

/// Flavour of initial-value heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimatorMode {
    /// Default heuristic of a model
    Generic,
    /// Curve features point downwards from the baseline
    Dip,
    /// Curve features point upwards from the baseline
    Peak,
}

impl EstimatorMode {
    pub fn as_str(self) -> &'static str {
        match self {
            EstimatorMode::Generic => "generic",
            EstimatorMode::Dip => "dip",
            EstimatorMode::Peak => "peak",
        }
    }
}

impl fmt::Display for EstimatorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EstimatorMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "generic" => Ok(EstimatorMode::Generic),
            "dip" => Ok(EstimatorMode::Dip),
            "peak" => Ok(EstimatorMode::Peak),
            other => Err(other.to_string()),
        }
    }
}

/// An estimator registered for one model.
#[derive(Debug, Clone, Copy)]
pub struct EstimatorSpec {
    pub model: &'static str,
    pub mode: EstimatorMode,
    pub function: EstimateFn,
}

impl EstimatorSpec {
    pub const fn new(model: &'static str, mode: EstimatorMode, function: EstimateFn) -> Self {
        Self {
            model,
            mode,
            function,
        }
    }

    /// Validate the data and seed `params` for `model`.
    ///
    /// On any error `params` is left exactly as it was: the heuristic works
    /// on a scratch copy that is committed only when every parameter of the
    /// model received a finite value.
    pub fn estimate(
        &self,
        model: &ModelSpec,
        x: &Abscissa,
        y: &Array1<f64>,
        params: &mut ParameterSet,
    ) -> Result<()> {
        validate_input(model, x, y)?;

        let mut scratch = params.clone();
        (self.function)(x, y, &mut scratch)?;

        let missing = scratch.missing();
        if !missing.is_empty() {
            return Err(FitError::IncompleteEstimate {
                model: model.name.to_string(),
                mode: self.mode.to_string(),
                missing,
            });
        }

        debug!(
            model = model.name,
            estimator = %self.mode,
            values = ?scratch.values().to_vec(),
            "initial parameters estimated"
        );
        *params = scratch;
        Ok(())
    }
}

/// Check that x and y describe the same non-empty set of sample points in
/// the layout the model expects.
pub fn validate_input(model: &ModelSpec, x: &Abscissa, y: &Array1<f64>) -> Result<()> {
    if y.is_empty() || x.is_empty() {
        return Err(FitError::shape(
            "non-empty x and y data",
            format!("{} and {} values", x.len(), y.len()),
        ));
    }
    if x.len() != y.len() {
        return Err(FitError::shape(
            format!("{} y values to match x", x.len()),
            format!("{} y values", y.len()),
        ));
    }
    match (model.dimensionality, x) {
        (Dimensionality::OneD, Abscissa::OneD(_)) => Ok(()),
        (Dimensionality::TwoD, Abscissa::TwoD(points)) if points.ncols() == 2 => Ok(()),
        (Dimensionality::OneD, _) => Err(FitError::shape(
            format!("1-D x values for '{}'", model.name),
            x.describe(),
        )),
        (Dimensionality::TwoD, _) => Err(FitError::shape(
            format!("Nx2 coordinate array for '{}'", model.name),
            x.describe(),
        )),
    }
}

/// All registered estimators, looked up by model name and mode.
#[derive(Debug, Clone, Default)]
pub struct EstimatorSet {
    estimators: Vec<EstimatorSpec>,
}

impl EstimatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in estimators of every [`ModelKind`].
    pub fn builtin() -> Self {
        let mut set = Self::new();
        for kind in ModelKind::ALL {
            for spec in kind.estimators() {
                set.register(spec);
            }
        }
        set
    }

    /// The process-wide estimator set. Read-only once initialized.
    pub fn global() -> &'static EstimatorSet {
        static ESTIMATORS: OnceLock<EstimatorSet> = OnceLock::new();
        ESTIMATORS.get_or_init(EstimatorSet::builtin)
    }

    /// Register an estimator, replacing an earlier one for the same model and mode.
    pub fn register(&mut self, spec: EstimatorSpec) {
        match self
            .estimators
            .iter_mut()
            .find(|e| e.model == spec.model && e.mode == spec.mode)
        {
            Some(existing) => *existing = spec,
            None => self.estimators.push(spec),
        }
    }

    /// Find the estimator for `model` under the mode named `mode`.
    pub fn lookup(&self, model: &str, mode: &str) -> Result<&EstimatorSpec> {
        let unknown = || FitError::UnknownEstimator {
            model: model.to_string(),
            mode: mode.to_string(),
        };
        let mode: EstimatorMode = mode.parse().map_err(|_| unknown())?;
        self.estimators
            .iter()
            .find(|e| e.model == model && e.mode == mode)
            .ok_or_else(unknown)
    }

    /// Modes available for `model`, in registration order.
    pub fn modes(&self, model: &str) -> Vec<EstimatorMode> {
        self.estimators
            .iter()
            .filter(|e| e.model == model)
            .map(|e| e.mode)
            .collect()
    }

    /// Seed `params` for `model` with the estimator registered under `mode`.
    pub fn estimate(
        &self,
        model: &ModelSpec,
        mode: &str,
        x: &Abscissa,
        y: &Array1<f64>,
        params: &mut ParameterSet,
    ) -> Result<()> {
        self.lookup(model.name, mode)?.estimate(model, x, y, params)
    }
}
