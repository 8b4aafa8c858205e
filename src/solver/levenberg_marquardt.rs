//! Implementation of the Levenberg-Marquardt algorithm.
//!
//! Only the free parameters are varied. Each one is mapped through its
//! [`BoundsTransform`] so the search runs in an unconstrained space while the
//! model only ever sees values inside the bounds. The step solves the
//! damped normal equations
//!
//! ```text
//! (JᵀJ + λ diag(JᵀJ)) δ = -Jᵀr
//! ```
//!
//! with a forward-difference Jacobian. Standard errors come from the inverse
//! of `JᵀJ` at the solution, scaled by the reduced chi-square and carried
//! back through the bounds transform.

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};
use tracing::debug;

use crate::error::{FitError, Result};
use crate::model::{Abscissa, ModelSpec};
use crate::parameters::BoundsTransform;
use crate::solver::config::LmConfig;
use crate::solver::{Solver, SolverInput, SolverOutput};
use crate::utils::finite_difference;
use crate::utils::matrix_convert::{nalgebra_vec_to_ndarray, ndarray_to_nalgebra, ndarray_vec_to_nalgebra};

/// Smallest diagonal entry used for damping, so parameters without
/// influence on the residuals still get a regular system.
const MIN_DIAGONAL: f64 = 1e-12;

/// Damping above which a short step no longer bounds the distance to the
/// minimum, so the xtol test is skipped.
const MAX_XTOL_LAMBDA: f64 = 1.0;

/// Residuals per point below this many ulps of the data scale cannot be
/// reduced further.
const ROUNDING_ULPS: f64 = 64.0;

/// The Levenberg-Marquardt optimizer.
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt {
    config: LmConfig,
}

impl LevenbergMarquardt {
    /// Create a new Levenberg-Marquardt optimizer with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new Levenberg-Marquardt optimizer with the given configuration.
    pub fn with_config(config: LmConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LmConfig {
        &self.config
    }
}

/// The residual function of one fit, in internal coordinates of the free
/// parameters.
struct Problem<'a> {
    model: &'a ModelSpec,
    x: &'a Abscissa,
    y: &'a Array1<f64>,
    values: Vec<f64>,
    free: Vec<usize>,
    transforms: Vec<BoundsTransform>,
}

impl<'a> Problem<'a> {
    fn new(input: &SolverInput<'a>) -> Self {
        let free = input.parameters.free_indices();
        let transforms = free
            .iter()
            .map(|&i| BoundsTransform::new(input.parameters.by_index(i).bounds()))
            .collect();
        Self {
            model: input.model,
            x: input.x,
            y: input.y,
            values: input.parameters.values().to_vec(),
            free,
            transforms,
        }
    }

    fn initial_internal(&self) -> Result<Array1<f64>> {
        self.free
            .iter()
            .zip(&self.transforms)
            .map(|(&i, t)| t.to_internal(self.values[i]).map_err(FitError::from))
            .collect()
    }

    /// Full parameter vector in declared order.
    fn external(&self, internal: &Array1<f64>) -> Vec<f64> {
        let mut values = self.values.clone();
        for ((&i, t), &p) in self.free.iter().zip(&self.transforms).zip(internal) {
            values[i] = t.to_external(p);
        }
        values
    }

    fn residuals(&self, internal: &Array1<f64>) -> Result<Array1<f64>> {
        let predicted = self.model.eval(self.x, &self.external(internal))?;
        Ok(predicted - self.y)
    }
}

fn sum_of_squares(r: &Array1<f64>) -> f64 {
    r.dot(r)
}

/// Solve the damped normal equations; `None` if the system is singular.
fn damped_step(jtj: &DMatrix<f64>, gradient: &DVector<f64>, lambda: f64) -> Option<DVector<f64>> {
    let mut a = jtj.clone();
    for i in 0..a.nrows() {
        a[(i, i)] += lambda * jtj[(i, i)].max(MIN_DIAGONAL);
    }
    let rhs = -gradient.clone();

    let step = match a.clone().cholesky() {
        Some(chol) => chol.solve(&rhs),
        None => a.lu().solve(&rhs)?,
    };
    step.iter().all(|v| v.is_finite()).then_some(step)
}

/// Largest cosine between the residual vector and a Jacobian column.
fn scaled_gradient(jtj: &DMatrix<f64>, gradient: &DVector<f64>, cost: f64) -> f64 {
    let residual_norm = cost.sqrt();
    gradient
        .iter()
        .enumerate()
        .map(|(i, g)| {
            let column_norm = jtj[(i, i)].sqrt();
            if column_norm > 0.0 {
                g.abs() / (column_norm * residual_norm)
            } else {
                0.0
            }
        })
        .fold(0.0, f64::max)
}

/// Covariance of the internal coordinates, `None` if `JᵀJ` cannot be inverted.
fn covariance(jacobian: &Array2<f64>, reduced_chi_square: f64) -> Option<DMatrix<f64>> {
    let j = ndarray_to_nalgebra(jacobian);
    let jtj = j.transpose() * &j;
    let inverse = jtj
        .clone()
        .try_inverse()
        .or_else(|| jtj.pseudo_inverse(MIN_DIAGONAL).ok())?;
    Some(inverse * reduced_chi_square)
}

impl Solver for LevenbergMarquardt {
    fn solve(&self, input: SolverInput<'_>) -> Result<SolverOutput> {
        let config = &self.config;
        let problem = Problem::new(&input);
        let n_data = input.y.len();
        let n_free = problem.free.len();

        if n_data < n_free {
            return Err(FitError::shape(
                format!("at least {} data points for {} free parameters", n_free, n_free),
                format!("{} data points", n_data),
            ));
        }

        let mut internal = problem.initial_internal()?;
        let mut residuals = problem.residuals(&internal)?;
        if residuals.iter().any(|r| !r.is_finite()) {
            return Err(FitError::NumericalFault(format!(
                "model '{}' is not finite at the initial parameters",
                input.model.name
            )));
        }
        let mut cost = sum_of_squares(&residuals);
        let data_scale = input.y.iter().fold(0.0, |m: f64, v| m.max(v.abs()));
        let rounding_floor = n_data as f64 * (ROUNDING_ULPS * f64::EPSILON * data_scale).powi(2);
        let mut lambda = config.initial_lambda;
        let mut iterations = 0;

        let residual_fn = |p: &Array1<f64>| problem.residuals(p);

        let (converged, message) = if n_free == 0 {
            (true, "All parameters fixed".to_string())
        } else {
            let mut jacobian =
                finite_difference::jacobian(residual_fn, &internal, &residuals, config.diff_step)?;

            loop {
                if cost == 0.0 {
                    break (true, "Residuals vanish".to_string());
                }
                if iterations >= config.max_iterations {
                    break (
                        false,
                        format!("Maximum iterations ({}) reached", config.max_iterations),
                    );
                }

                let j = ndarray_to_nalgebra(&jacobian);
                let jtj = j.transpose() * &j;
                let gradient = j.transpose() * ndarray_vec_to_nalgebra(&residuals);

                let gnorm = scaled_gradient(&jtj, &gradient, cost);
                if gnorm <= config.gtol {
                    break (
                        true,
                        format!(
                            "Gradient convergence: {:.2e} <= {:.2e}",
                            gnorm, config.gtol
                        ),
                    );
                }

                let Some(step) = damped_step(&jtj, &gradient, lambda) else {
                    lambda *= config.lambda_up_factor;
                    if lambda > config.max_lambda {
                        break (
                            false,
                            "Singular normal equations, and lambda reached maximum".to_string(),
                        );
                    }
                    continue;
                };
                iterations += 1;

                let step = nalgebra_vec_to_ndarray(&step);
                let step_small = lambda <= MAX_XTOL_LAMBDA
                    && step.dot(&step).sqrt()
                        <= config.xtol * (config.xtol + internal.dot(&internal).sqrt());
                let trial = &internal + &step;
                let trial_residuals = problem.residuals(&trial)?;
                let trial_cost = sum_of_squares(&trial_residuals);

                if trial_cost.is_finite() && trial_cost < cost {
                    let reduction = (cost - trial_cost) / cost;
                    internal = trial;
                    residuals = trial_residuals;
                    cost = trial_cost;
                    lambda = (lambda * config.lambda_down_factor).max(config.min_lambda);

                    if reduction <= config.ftol {
                        break (
                            true,
                            format!(
                                "Cost convergence: relative reduction {:.2e} <= {:.2e}",
                                reduction, config.ftol
                            ),
                        );
                    }
                    if step_small {
                        break (true, "Parameter convergence: step below xtol".to_string());
                    }
                    jacobian = finite_difference::jacobian(
                        residual_fn,
                        &internal,
                        &residuals,
                        config.diff_step,
                    )?;
                } else {
                    if step_small {
                        break (true, "Parameter convergence: step below xtol".to_string());
                    }
                    if cost <= rounding_floor {
                        break (true, "Residuals at rounding level".to_string());
                    }
                    lambda *= config.lambda_up_factor;
                    if lambda > config.max_lambda {
                        break (
                            false,
                            "Failed to decrease cost, and lambda reached maximum".to_string(),
                        );
                    }
                }
            }
        };

        let dof = n_data.saturating_sub(n_free).max(1);
        let reduced_chi_square = cost / dof as f64;

        let covar = if n_free > 0 {
            finite_difference::jacobian(residual_fn, &internal, &residuals, config.diff_step)
                .ok()
                .and_then(|jac| covariance(&jac, reduced_chi_square))
        } else {
            None
        };

        let fitted = problem.external(&internal);
        let mut parameters = input.parameters;
        for (k, (&i, transform)) in problem.free.iter().zip(&problem.transforms).enumerate() {
            let stderr = covar
                .as_ref()
                .map(|c| c[(k, k)].sqrt() * transform.derivative(internal[k]).abs())
                .filter(|s| s.is_finite());
            parameters.by_index_mut(i).set_fitted(fitted[i], stderr);
        }
        for state in parameters.iter_mut().filter(|p| p.fixed) {
            state.stderr = None;
        }

        debug!(
            model = input.model.name,
            converged,
            iterations,
            chi_square = cost,
            %message,
            "Levenberg-Marquardt finished"
        );

        Ok(SolverOutput {
            parameters,
            converged,
            message,
            chi_square: cost,
            reduced_chi_square,
            iterations,
        })
    }
}
