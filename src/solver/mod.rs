//! The nonlinear least-squares solver behind a fit.
//!
//! A fit job hands the solver a model, the data and a [`ParameterSet`]
//! holding start values, bounds and fixed flags. The solver varies the free
//! parameters inside their bounds and hands back a new set with the fitted
//! values and their standard errors.
//!
//! [`LevenbergMarquardt`] is the built-in implementation; any type
//! implementing [`Solver`] can be used in its place.

use ndarray::Array1;

use crate::error::Result;
use crate::model::{Abscissa, ModelSpec};
use crate::parameters::ParameterSet;

pub mod config;
pub mod levenberg_marquardt;

pub use config::LmConfig;
pub use levenberg_marquardt::LevenbergMarquardt;

/// Everything a solver needs for one fit attempt.
///
/// The parameter set is moved in; the caller keeps its own copy if it
/// wants to try again.
#[derive(Debug, Clone)]
pub struct SolverInput<'a> {
    pub model: &'a ModelSpec,
    pub x: &'a Abscissa,
    pub y: &'a Array1<f64>,
    pub parameters: ParameterSet,
}

/// Outcome of one solver call.
#[derive(Debug, Clone)]
pub struct SolverOutput {
    /// Fitted values and standard errors, in the model's parameter order.
    pub parameters: ParameterSet,
    pub converged: bool,
    pub message: String,
    /// Sum of squared residuals at the returned parameters.
    pub chi_square: f64,
    /// `chi_square` per degree of freedom.
    pub reduced_chi_square: f64,
    pub iterations: usize,
}

/// A nonlinear least-squares backend.
///
/// An `Err` and an output with `converged == false` are both treated as a
/// failed attempt by the fit container.
pub trait Solver: Send + Sync {
    fn solve(&self, input: SolverInput<'_>) -> Result<SolverOutput>;
}

impl<S: Solver + ?Sized> Solver for &S {
    fn solve(&self, input: SolverInput<'_>) -> Result<SolverOutput> {
        (**self).solve(input)
    }
}

impl<S: Solver + ?Sized> Solver for Box<S> {
    fn solve(&self, input: SolverInput<'_>) -> Result<SolverOutput> {
        (**self).solve(input)
    }
}
