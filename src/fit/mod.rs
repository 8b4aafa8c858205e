//! Running fits: the fit container and the one-call entry points.
//!
//! [`perform_fit`] covers the common case of fitting one data set with a
//! model picked by name. [`FitContainer`] keeps a configured job around for
//! repeated fits, custom solvers or overrides.

use ndarray::Array1;

use crate::error::Result;
use crate::model::{Abscissa, Dimensionality};
use crate::models::ModelCatalog;
use crate::solver::{LevenbergMarquardt, Solver};

pub mod container;
pub mod result;
pub mod settings;
pub mod specification;

pub use container::{dense_abscissa, FitContainer, FitJob};
pub use result::FitResult;
pub use settings::{FitSettings, RetryPolicy};
pub use specification::FitSpecification;

/// Fit `model_name` to the data with the built-in solver and default settings.
///
/// # Arguments
///
/// * `x` - Sample positions; an Nx2 coordinate array for 2-D models
/// * `y` - Measured values
/// * `model_name` - A name from [`list_models`]
/// * `estimator` - Estimator mode, usually `"generic"`
/// * `dimensionality` - Must match the model's
///
/// # Returns
///
/// * `Result<FitResult>` - Fitted parameters and the fitted curve
///
/// ```
/// use pulsefit::{perform_fit, Dimensionality};
///
/// let x: Vec<f64> = (0..100).map(|i| i as f64 * 0.1).collect();
/// let y: Vec<f64> = x.iter().map(|t| 2.0 * (-t / 3.0).exp() + 0.5).collect();
///
/// let result = perform_fit(x, y, "decayexponential", "generic", Dimensionality::OneD).unwrap();
/// assert!((result.value("lifetime").unwrap() - 3.0).abs() < 1e-4);
/// assert_eq!(result.fit_y.len(), 1000);
/// ```
pub fn perform_fit(
    x: impl Into<Abscissa>,
    y: impl Into<Array1<f64>>,
    model_name: &str,
    estimator: &str,
    dimensionality: Dimensionality,
) -> Result<FitResult> {
    perform_fit_with(
        x,
        y,
        model_name,
        estimator,
        dimensionality,
        &LevenbergMarquardt::default(),
        &FitSettings::default(),
    )
}

/// [`perform_fit`] with a caller-supplied solver and settings.
pub fn perform_fit_with(
    x: impl Into<Abscissa>,
    y: impl Into<Array1<f64>>,
    model_name: &str,
    estimator: &str,
    dimensionality: Dimensionality,
    solver: &dyn Solver,
    settings: &FitSettings,
) -> Result<FitResult> {
    let mut container = FitContainer::with_solver(solver).with_settings(settings.clone());
    container.select(model_name, estimator, dimensionality)?;
    container.run(x, y)
}

/// Names of the registered models of one dimensionality, in catalog order.
pub fn list_models(dimensionality: Dimensionality) -> Vec<&'static str> {
    ModelCatalog::global().names_for(dimensionality)
}

/// Log every registered model name at info level.
pub fn log_available_models() {
    ModelCatalog::global().log_available_models();
}
