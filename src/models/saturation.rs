//! Saturation curves.
//!
//! `hyperbolicsaturation` describes the fluorescence of a single emitter
//! versus excitation power `x`, with a linear background:
//!
//! `I_sat * x / (x + P_sat) + slope * x + offset`

use ndarray::Array1;

use crate::error::{FitError, Result};
use crate::model::{Abscissa, Dimensionality, ModelSpec};
use crate::models::sorted_samples;
use crate::parameters::{Bounds, ParameterSet};
use crate::utils::stats;

pub const HYPERBOLIC_SATURATION: ModelSpec = ModelSpec::new(
    "hyperbolicsaturation",
    Dimensionality::OneD,
    &["I_sat", "P_sat", "slope", "offset"],
    hyperbolic_saturation,
);

fn hyperbolic_saturation(point: &[f64], params: &[f64]) -> f64 {
    let &[i_sat, p_sat, slope, offset] = params else {
        return f64::NAN;
    };
    let x = point[0];
    i_sat * x / (x + p_sat) + slope * x + offset
}

/// The upper half of the curve is taken as saturated, so its slope is the
/// linear background. With that removed, the lowest point gives the offset,
/// the rise above it gives `I_sat`, and the power at half of that rise gives
/// `P_sat`.
pub fn estimate(x: &Abscissa, y: &Array1<f64>, params: &mut ParameterSet) -> Result<()> {
    let (x, y) = sorted_samples(x, y)?;
    let half = x.len() / 2;
    let slope = stats::linear_regression(&x[half..], &y[half..])
        .map_or(0.0, |(slope, _)| slope);

    let flattened: Vec<f64> = x.iter().zip(&y).map(|(xi, yi)| yi - slope * xi).collect();
    let offset = flattened
        .first()
        .copied()
        .ok_or_else(|| FitError::shape("non-empty data", "0 points"))?;
    let (_, top) = stats::min_max(&flattened);
    let i_sat = top - offset;
    let p_sat = stats::first_crossing_above(&x, &flattened, offset + 0.5 * i_sat)
        .filter(|p| *p > 0.0)
        .unwrap_or_else(|| stats::median(&x).abs().max(f64::EPSILON));

    params.init("I_sat", i_sat)?;
    params
        .init("P_sat", p_sat)?
        .set_bounds(Bounds::min_only(0.0));
    params.init("slope", slope)?;
    params.init("offset", offset)?;
    Ok(())
}
