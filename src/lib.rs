//! # pulsefit
//!
//! Curve fitting and pulse statistics for pulsed optical measurements.
//!
//! The library provides:
//! - A catalog of named fit models (decays, peaks, damped oscillations,
//!   saturation, antibunching, a rotated 2D Gaussian)
//! - Initial-parameter estimators for every model, selected by mode
//!   (`generic`, `dip`, `peak`)
//! - A [`FitContainer`] that holds a model selection and per-parameter
//!   overrides and runs a bounded Levenberg-Marquardt fit
//! - Windowed signal statistics of pulsed photon-count traces
//!
//! ## Basic Usage
//!
//! ```
//! use ndarray::Array1;
//! use pulsefit::{perform_fit, Dimensionality};
//!
//! let x: Array1<f64> = Array1::linspace(0.0, 10.0, 60);
//! let y = x.mapv(|t| 2.0 * (-t / 1.5).exp() + 0.1);
//!
//! let result = perform_fit(x, y, "decayexponential", "generic", Dimensionality::OneD).unwrap();
//! assert!(result.success);
//! assert!((result.value("lifetime").unwrap() - 1.5).abs() < 1e-6);
//! ```
//!
//! ## Pulse analysis
//!
//! ```
//! use ndarray::array;
//! use pulsefit::pulsed::analyse_mean;
//!
//! let traces = array![[0.0, 0.0, 0.0, 5.0, 5.0, 5.0, 0.0, 0.0]];
//! let out = analyse_mean(&traces, 3.0, 6.0, 1.0);
//! assert_eq!(out.signal[0], 5.0);
//! ```

pub mod error;
pub mod estimators;
pub mod fit;
pub mod model;
pub mod models;
pub mod parameters;
pub mod pulsed;
pub mod solver;
pub mod utils;

// Re-exports for convenience
pub use error::{FitError, Result};
pub use estimators::{EstimatorMode, EstimatorSet, EstimatorSpec};
pub use fit::{
    list_models, log_available_models, perform_fit, perform_fit_with, FitContainer, FitJob,
    FitResult, FitSettings, FitSpecification, RetryPolicy,
};
pub use model::{Abscissa, Dimensionality, ModelSpec};
pub use models::{ModelCatalog, ModelKind};
pub use parameters::{Bounds, ParameterOverride, ParameterSet, ParameterState};
pub use pulsed::{AnalysisWindows, PulseAnalysisMethod, WindowedSignal};
pub use solver::{LevenbergMarquardt, LmConfig, Solver, SolverInput, SolverOutput};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
