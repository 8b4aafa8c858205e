//! Rotated two-dimensional Gaussian, for confocal scan images.
//!
//! With `(u, v)` the sample coordinates, `theta` rotates the `sigma_x` axis
//! counter-clockwise from `u`:
//!
//! ```text
//! a = cos²θ / (2σx²) + sin²θ / (2σy²)
//! b = -sin2θ / (4σx²) + sin2θ / (4σy²)
//! c = sin²θ / (2σx²) + cos²θ / (2σy²)
//! f = amplitude * exp(-(a du² + 2 b du dv + c dv²)) + offset
//! ```

use ndarray::{Array1, Axis};

use crate::error::{FitError, Result};
use crate::model::{Abscissa, Dimensionality, ModelSpec};
use crate::parameters::{Bounds, ParameterSet};
use crate::utils::stats;

pub const TWO_D_GAUSSIAN: ModelSpec = ModelSpec::new(
    "twoDgaussian",
    Dimensionality::TwoD,
    &[
        "amplitude",
        "center_x",
        "center_y",
        "sigma_x",
        "sigma_y",
        "theta",
        "offset",
    ],
    two_d_gaussian,
);

fn two_d_gaussian(point: &[f64], params: &[f64]) -> f64 {
    let &[amplitude, center_x, center_y, sigma_x, sigma_y, theta, offset] = params else {
        return f64::NAN;
    };
    let (du, dv) = (point[0] - center_x, point[1] - center_y);
    let (sin, cos) = theta.sin_cos();
    let sin2 = (2.0 * theta).sin();
    let (sx2, sy2) = (sigma_x * sigma_x, sigma_y * sigma_y);

    let a = cos * cos / (2.0 * sx2) + sin * sin / (2.0 * sy2);
    let b = -sin2 / (4.0 * sx2) + sin2 / (4.0 * sy2);
    let c = sin * sin / (2.0 * sx2) + cos * cos / (2.0 * sy2);
    amplitude * (-(a * du * du + 2.0 * b * du * dv + c * dv * dv)).exp() + offset
}

/// Median as background, brightest pixel as center, and widths from the
/// second moments of the background-subtracted image. `theta` starts at 0.
pub fn estimate(x: &Abscissa, y: &Array1<f64>, params: &mut ParameterSet) -> Result<()> {
    let points = x.as_2d()?;
    let z = y.to_vec();
    let u: Vec<f64> = points.index_axis(Axis(1), 0).to_vec();
    let v: Vec<f64> = points.index_axis(Axis(1), 1).to_vec();
    if z.is_empty() || z.len() != u.len() {
        return Err(FitError::shape(
            "non-empty image with one value per point",
            format!("points: {}, values: {}", u.len(), z.len()),
        ));
    }

    let offset = stats::median(&z);
    let brightest = stats::argmax(&z);
    let (center_x, center_y) = (u[brightest], v[brightest]);
    let amplitude = z[brightest] - offset;

    let (u_lo, u_hi) = stats::min_max(&u);
    let (v_lo, v_hi) = stats::min_max(&v);
    let u_span = (u_hi - u_lo).max(f64::EPSILON);
    let v_span = (v_hi - v_lo).max(f64::EPSILON);

    let weights: Vec<f64> = z.iter().map(|zi| (zi - offset).max(0.0)).collect();
    let total: f64 = weights.iter().sum();
    let second_moment = |coords: &[f64], center: f64| -> Option<f64> {
        if total <= 0.0 {
            return None;
        }
        let m = coords
            .iter()
            .zip(&weights)
            .map(|(c, w)| w * (c - center).powi(2))
            .sum::<f64>()
            / total;
        (m > 0.0).then(|| m.sqrt())
    };
    let sigma_x = second_moment(&u, center_x).unwrap_or(u_span / 4.0);
    let sigma_y = second_moment(&v, center_y).unwrap_or(v_span / 4.0);

    params.init("amplitude", amplitude)?;
    params
        .init("center_x", center_x)?
        .set_bounds(Bounds::new(u_lo - u_span, u_hi + u_span)?);
    params
        .init("center_y", center_y)?
        .set_bounds(Bounds::new(v_lo - v_span, v_hi + v_span)?);
    params
        .init("sigma_x", sigma_x)?
        .set_bounds(Bounds::min_only(0.0));
    params
        .init("sigma_y", sigma_y)?
        .set_bounds(Bounds::min_only(0.0));
    params.init("theta", 0.0)?;
    params.init("offset", offset)?;
    Ok(())
}
