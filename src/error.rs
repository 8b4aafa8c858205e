use thiserror::Error;

use crate::parameters::BoundsError;

/// Error types for the pulsefit library.
#[derive(Error, Debug)]
pub enum FitError {
    /// The requested model name is not registered in the catalog.
    #[error("Unknown fit model '{name}'")]
    UnknownModel { name: String },

    /// The model has no estimator registered under the requested mode.
    #[error("Unknown estimator '{mode}' for model '{model}'")]
    UnknownEstimator { model: String, mode: String },

    /// The model's declared dimensionality disagrees with the requested one.
    #[error("Model '{model}' is {declared}, but a {requested} fit was requested")]
    DimensionMismatch {
        model: String,
        declared: String,
        requested: String,
    },

    /// A parameter override names a parameter the model does not declare.
    #[error("Model '{model}' has no parameter named '{name}'")]
    UnknownParameter { model: String, name: String },

    /// The x/y data do not have the shape the model requires.
    #[error("Invalid input shape: expected {expected}, got {actual}")]
    InvalidInputShape { expected: String, actual: String },

    /// An estimator left some of the model's parameters uninitialized.
    #[error("Estimator '{mode}' for model '{model}' did not initialize: {}", missing.join(", "))]
    IncompleteEstimate {
        model: String,
        mode: String,
        missing: Vec<String>,
    },

    /// The solver failed on every attempt allowed by the retry policy.
    #[error("Fit of model '{model}' did not converge after {attempts} attempt(s): {message}")]
    FitDidNotConverge {
        model: String,
        attempts: usize,
        message: String,
    },

    /// `run` was called before a model and estimator were selected.
    #[error("No fit model selected")]
    NotSelected,

    /// Error for boundary constraint violations.
    #[error("Bounds error: {0}")]
    Bounds(#[from] BoundsError),

    /// A model evaluation or linear solve produced non-finite numbers.
    #[error("Numerical fault: {0}")]
    NumericalFault(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FitError {
    /// Shorthand for an [`FitError::InvalidInputShape`] built from two descriptions.
    pub fn shape(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        FitError::InvalidInputShape {
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

/// Result type alias for pulsefit operations.
pub type Result<T> = std::result::Result<T, FitError>;
