//! Polynomial models.

use ndarray::Array1;

use crate::error::Result;
use crate::model::{Abscissa, Dimensionality, ModelSpec};
use crate::models::sorted_samples;
use crate::parameters::ParameterSet;
use crate::utils::stats;

/// `slope * x + offset`
pub const LINEAR: ModelSpec = ModelSpec::new(
    "linear",
    Dimensionality::OneD,
    &["slope", "offset"],
    linear,
);

fn linear(point: &[f64], params: &[f64]) -> f64 {
    let &[slope, offset] = params else {
        return f64::NAN;
    };
    slope * point[0] + offset
}

/// Least-squares line; a flat line through the mean if x has no spread.
pub fn estimate_linear(x: &Abscissa, y: &Array1<f64>, params: &mut ParameterSet) -> Result<()> {
    let (x, y) = sorted_samples(x, y)?;
    let (slope, offset) = stats::linear_regression(&x, &y).unwrap_or((0.0, stats::mean(&y)));

    params.init("slope", slope)?;
    params.init("offset", offset)?;
    Ok(())
}
