//! Finite difference methods for numerical differentiation.

use crate::error::{FitError, Result};
use ndarray::{Array1, Array2};

/// Default relative step size for finite differences.
pub const DEFAULT_EPSILON: f64 = 1e-8;

/// Compute the Jacobian matrix using forward finite differences.
///
/// The Jacobian is the matrix of partial derivatives of the residuals with
/// respect to the parameters: J[i,j] = ∂residual[i]/∂param[j].
///
/// # Arguments
///
/// * `residuals` - The residual function
/// * `params` - The parameter values at which to evaluate the Jacobian
/// * `base` - The residuals already evaluated at `params`
/// * `epsilon` - The relative step size
///
/// # Returns
///
/// * `Result<Array2<f64>>` - The Jacobian matrix
pub fn jacobian<F>(
    residuals: F,
    params: &Array1<f64>,
    base: &Array1<f64>,
    epsilon: f64,
) -> Result<Array2<f64>>
where
    F: Fn(&Array1<f64>) -> Result<Array1<f64>>,
{
    let n_params = params.len();
    let n_residuals = base.len();
    let mut jac = Array2::zeros((n_residuals, n_params));

    for j in 0..n_params {
        let mut perturbed = params.clone();

        // Adapt the step to the parameter scale
        let step = if params[j].abs() > epsilon {
            params[j].abs() * epsilon
        } else {
            epsilon
        };
        perturbed[j] += step;

        let shifted = residuals(&perturbed)?;
        if shifted.len() != n_residuals {
            return Err(FitError::shape(
                format!("{} residuals", n_residuals),
                format!("{} residuals", shifted.len()),
            ));
        }

        for i in 0..n_residuals {
            jac[[i, j]] = (shifted[i] - base[i]) / step;
        }
    }

    if jac.iter().any(|v| !v.is_finite()) {
        return Err(FitError::NumericalFault(
            "Jacobian contains non-finite entries".to_string(),
        ));
    }

    Ok(jac)
}
