//! The fit-configuration container.
//!
//! A [`FitContainer`] binds one model, one estimator and a set of
//! per-parameter overrides into a [`FitJob`] and runs that job against a
//! [`Solver`]:
//!
//! 1. the estimator seeds every parameter from the data,
//! 2. the overrides are layered on top,
//! 3. the solver is called, retrying the identical job per the
//!    [`RetryPolicy`](crate::fit::RetryPolicy),
//! 4. the model is evaluated on a dense abscissa for the fitted curve.

use std::collections::BTreeMap;

use ndarray::Array1;
use tracing::{debug, warn};

use crate::error::{FitError, Result};
use crate::estimators::{EstimatorSet, EstimatorSpec};
use crate::fit::result::FitResult;
use crate::fit::settings::FitSettings;
use crate::fit::specification::FitSpecification;
use crate::model::{Abscissa, Dimensionality, ModelSpec};
use crate::models::ModelCatalog;
use crate::parameters::{Bounds, BoundsError, ParameterOverride, ParameterSet};
use crate::solver::{LevenbergMarquardt, Solver, SolverInput, SolverOutput};

/// A selected model and estimator together with the user's overrides.
#[derive(Debug, Clone)]
pub struct FitJob {
    model: ModelSpec,
    estimator: EstimatorSpec,
    use_settings: BTreeMap<String, ParameterOverride>,
    dimensionality: Dimensionality,
}

impl FitJob {
    /// Resolve a model and estimator by name.
    ///
    /// # Errors
    ///
    /// `UnknownModel`, `UnknownEstimator` or `DimensionMismatch`, checked in
    /// that order.
    pub fn new(model_name: &str, estimator: &str, dimensionality: Dimensionality) -> Result<Self> {
        let model = *ModelCatalog::global().lookup(model_name)?;
        let estimator = *EstimatorSet::global().lookup(model_name, estimator)?;
        if model.dimensionality != dimensionality {
            return Err(FitError::DimensionMismatch {
                model: model.name.to_string(),
                declared: model.dimensionality.to_string(),
                requested: dimensionality.to_string(),
            });
        }
        Ok(Self {
            model,
            estimator,
            use_settings: BTreeMap::new(),
            dimensionality,
        })
    }

    pub fn model(&self) -> &ModelSpec {
        &self.model
    }

    pub fn estimator(&self) -> &EstimatorSpec {
        &self.estimator
    }

    pub fn dimensionality(&self) -> Dimensionality {
        self.dimensionality
    }

    pub fn use_settings(&self) -> &BTreeMap<String, ParameterOverride> {
        &self.use_settings
    }

    /// Merge overrides into the job. Nothing is applied unless every entry
    /// names a parameter of the model and carries usable numbers.
    pub fn configure<I, K>(&mut self, overrides: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, ParameterOverride)>,
        K: Into<String>,
    {
        let mut accepted = Vec::new();
        for (name, setting) in overrides {
            let name = name.into();
            if !self.model.param_names.contains(&name.as_str()) {
                return Err(FitError::UnknownParameter {
                    model: self.model.name.to_string(),
                    name,
                });
            }
            validate_override(&setting)?;
            accepted.push((name, setting));
        }
        self.use_settings.extend(accepted);
        Ok(())
    }

    /// The parameter set the solver starts from: estimate, then overrides.
    pub fn initial_parameters(&self, x: &Abscissa, y: &Array1<f64>) -> Result<ParameterSet> {
        let mut params = self.model.parameters();
        self.estimator.estimate(&self.model, x, y, &mut params)?;
        for (name, setting) in &self.use_settings {
            params.apply_override(name, setting)?;
        }
        Ok(params)
    }
}

fn validate_override(setting: &ParameterOverride) -> Result<()> {
    if setting.value.is_some_and(|v| !v.is_finite()) {
        return Err(BoundsError::NonFiniteValue.into());
    }
    Bounds::new(
        setting.min.unwrap_or(f64::NEG_INFINITY),
        setting.max.unwrap_or(f64::INFINITY),
    )?;
    Ok(())
}

/// Binds a fit job to a solver and runs it.
///
/// One container holds at most one job; `run` takes `&mut self`, so a
/// container cannot be run from two threads at once. Use one container per
/// concurrent fit.
///
/// ```
/// use pulsefit::{Dimensionality, FitContainer, ParameterOverride};
///
/// let x: Vec<f64> = (0..50).map(|i| i as f64 * 0.2).collect();
/// let y: Vec<f64> = x.iter().map(|t| 0.5 * t + 1.0).collect();
///
/// let mut container = FitContainer::new();
/// container.select("linear", "generic", Dimensionality::OneD).unwrap();
/// container
///     .configure_parameters([("offset", ParameterOverride::fixed_at(1.0))])
///     .unwrap();
///
/// let result = container.run(x, y).unwrap();
/// assert!(result.success);
/// assert!((result.value("slope").unwrap() - 0.5).abs() < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct FitContainer<S: Solver = LevenbergMarquardt> {
    solver: S,
    settings: FitSettings,
    job: Option<FitJob>,
    last_result: Option<FitResult>,
}

impl FitContainer<LevenbergMarquardt> {
    /// A container using the built-in Levenberg-Marquardt solver.
    pub fn new() -> Self {
        Self::with_solver(LevenbergMarquardt::default())
    }

    /// A container configured from a fit specification.
    pub fn from_specification(specification: &FitSpecification) -> Result<Self> {
        let mut container = Self::new();
        container.apply_specification(specification)?;
        Ok(container)
    }
}

impl Default for FitContainer<LevenbergMarquardt> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Solver> FitContainer<S> {
    pub fn with_solver(solver: S) -> Self {
        Self {
            solver,
            settings: FitSettings::default(),
            job: None,
            last_result: None,
        }
    }

    pub fn with_settings(mut self, settings: FitSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &FitSettings {
        &self.settings
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    pub fn job(&self) -> Option<&FitJob> {
        self.job.as_ref()
    }

    /// The result of the last successful `run`.
    pub fn last_result(&self) -> Option<&FitResult> {
        self.last_result.as_ref()
    }

    /// Select the model and estimator for the next fit.
    ///
    /// Replaces any previous job, including its overrides. On error the
    /// previous job stays in place.
    pub fn select(
        &mut self,
        model_name: &str,
        estimator: &str,
        dimensionality: Dimensionality,
    ) -> Result<&FitJob> {
        let job = FitJob::new(model_name, estimator, dimensionality)?;
        debug!(
            model = job.model.name,
            estimator = %job.estimator.mode,
            dimensionality = %dimensionality,
            "fit model selected"
        );
        let job: &FitJob = self.job.insert(job);
        Ok(job)
    }

    /// Merge per-parameter overrides into the selected job.
    ///
    /// # Errors
    ///
    /// `NotSelected` without a job, `UnknownParameter` for names the model
    /// does not declare, `Bounds` for unusable numbers. On error no override
    /// is applied.
    pub fn configure_parameters<I, K>(&mut self, overrides: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, ParameterOverride)>,
        K: Into<String>,
    {
        self.job
            .as_mut()
            .ok_or(FitError::NotSelected)?
            .configure(overrides)
    }

    /// Drop all overrides of the selected job.
    pub fn clear_parameters(&mut self) {
        if let Some(job) = self.job.as_mut() {
            job.use_settings.clear();
        }
    }

    /// Select and configure from a specification in one step. Either the
    /// whole specification is applied or the container is left unchanged.
    pub fn apply_specification(&mut self, specification: &FitSpecification) -> Result<()> {
        let mut job = FitJob::new(
            &specification.fit_function,
            &specification.estimator,
            specification.dimensionality,
        )?;
        job.configure(
            specification
                .parameters
                .iter()
                .map(|(name, setting)| (name.clone(), setting.clone())),
        )?;
        self.job = Some(job);
        Ok(())
    }

    /// Run the selected job on the data.
    ///
    /// # Arguments
    ///
    /// * `x` - 1-D sample positions, or an Nx2 coordinate array for 2-D models
    /// * `y` - The measured values, one per sample
    ///
    /// # Returns
    ///
    /// * `Result<FitResult>` - The fit, or `FitDidNotConverge` once every
    ///   attempt allowed by the retry policy failed
    pub fn run(
        &mut self,
        x: impl Into<Abscissa>,
        y: impl Into<Array1<f64>>,
    ) -> Result<FitResult> {
        let result = self.execute(&x.into(), &y.into())?;
        self.last_result = Some(result.clone());
        Ok(result)
    }

    fn execute(&self, x: &Abscissa, y: &Array1<f64>) -> Result<FitResult> {
        let job = self.job.as_ref().ok_or(FitError::NotSelected)?;
        let params = job.initial_parameters(x, y)?;

        let attempts = self.settings.retry.attempts();
        let mut message = String::new();
        for attempt in 1..=attempts {
            let input = SolverInput {
                model: &job.model,
                x,
                y,
                parameters: params.clone(),
            };
            match self.solver.solve(input) {
                Ok(output) if output.converged => {
                    return self.finish(job, x, output, attempt);
                }
                Ok(output) => message = output.message,
                Err(err) => message = err.to_string(),
            }
            if attempt < attempts {
                warn!(
                    model = job.model.name,
                    attempt,
                    %message,
                    "fit attempt failed, retrying"
                );
            }
        }

        Err(FitError::FitDidNotConverge {
            model: job.model.name.to_string(),
            attempts,
            message,
        })
    }

    fn finish(
        &self,
        job: &FitJob,
        x: &Abscissa,
        output: SolverOutput,
        attempts: usize,
    ) -> Result<FitResult> {
        let fit_x = dense_abscissa(x, self.settings.granularity);
        let fit_y = job.model.eval_with(&fit_x, &output.parameters)?;

        debug!(
            model = job.model.name,
            attempts,
            iterations = output.iterations,
            reduced_chi_square = output.reduced_chi_square,
            "fit finished"
        );

        Ok(FitResult {
            model: job.model.name.to_string(),
            estimator: job.estimator.mode,
            dimensionality: job.dimensionality,
            fit_x,
            fit_y,
            parameters: output.parameters,
            success: output.converged,
            message: output.message,
            chi_square: output.chi_square,
            reduced_chi_square: output.reduced_chi_square,
            iterations: output.iterations,
            attempts,
        })
    }
}

/// Abscissa of the fitted curve.
///
/// 1-D: `granularity * len(x)` evenly spaced points from the first to the
/// last x value, in input order. 2-D: the input grid itself.
pub fn dense_abscissa(x: &Abscissa, granularity: usize) -> Abscissa {
    match x {
        Abscissa::OneD(values) => {
            let (Some(&first), Some(&last)) = (values.first(), values.last()) else {
                return x.clone();
            };
            let n = values.len() * granularity.max(1);
            Abscissa::OneD(Array1::linspace(first, last, n))
        }
        Abscissa::TwoD(_) => x.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_select_errors_in_order() {
        let mut container = FitContainer::new();
        assert!(matches!(
            container.select("cubic", "valley", Dimensionality::TwoD),
            Err(FitError::UnknownModel { .. })
        ));
        assert!(matches!(
            container.select("gaussian", "valley", Dimensionality::TwoD),
            Err(FitError::UnknownEstimator { .. })
        ));
        assert!(matches!(
            container.select("gaussian", "dip", Dimensionality::TwoD),
            Err(FitError::DimensionMismatch { .. })
        ));
        assert!(container.job().is_none());
    }

    #[test]
    fn test_failed_select_keeps_previous_job() {
        let mut container = FitContainer::new();
        container.select("linear", "generic", Dimensionality::OneD).unwrap();
        assert!(container.select("linear", "dip", Dimensionality::OneD).is_err());
        assert_eq!(container.job().unwrap().model().name, "linear");
    }

    #[test]
    fn test_configure_requires_selection() {
        let mut container = FitContainer::new();
        let result = container.configure_parameters([("slope", ParameterOverride::fixed_at(1.0))]);
        assert!(matches!(result, Err(FitError::NotSelected)));
        assert!(matches!(
            container.run(vec![1.0, 2.0], vec![1.0, 2.0]),
            Err(FitError::NotSelected)
        ));
    }

    #[test]
    fn test_configure_is_atomic() {
        let mut container = FitContainer::new();
        container.select("linear", "generic", Dimensionality::OneD).unwrap();
        let result = container.configure_parameters([
            ("slope", ParameterOverride::fixed_at(1.0)),
            ("curvature", ParameterOverride::fixed_at(0.0)),
        ]);
        assert!(matches!(result, Err(FitError::UnknownParameter { .. })));
        assert!(container.job().unwrap().use_settings().is_empty());

        let result = container
            .configure_parameters([("slope", ParameterOverride::default().with_bounds(2.0, 1.0))]);
        assert!(matches!(result, Err(FitError::Bounds(_))));
    }

    #[test]
    fn test_dense_abscissa() {
        let x = Abscissa::from(vec![0.0, 1.0, 3.0]);
        let dense = dense_abscissa(&x, 10);
        let dense = dense.as_1d().unwrap();
        assert_eq!(dense.len(), 30);
        assert_eq!(dense[0], 0.0);
        assert_relative_eq!(dense[29], 3.0);

        let descending = dense_abscissa(&Abscissa::from(vec![5.0, 4.0]), 2);
        let descending = descending.as_1d().unwrap();
        for (value, expected) in descending.iter().zip([5.0, 14.0 / 3.0, 13.0 / 3.0, 4.0]) {
            assert_relative_eq!(*value, expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_run_stores_last_result() {
        let mut container = FitContainer::new();
        container.select("linear", "generic", Dimensionality::OneD).unwrap();
        let x = array![0.0, 1.0, 2.0, 3.0];
        let y = x.mapv(|v| 2.0 * v - 1.0);
        let result = container.run(x, y).unwrap();

        assert_eq!(container.last_result(), Some(&result));
        assert_eq!(result.attempts, 1);
        assert_relative_eq!(result.value("slope").unwrap(), 2.0, epsilon = 1e-9);
        assert_eq!(result.fit_x.len(), 40);
    }
}
