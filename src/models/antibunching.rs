//! Second-order photon correlation (g2) of a few-emitter source.
//!
//! `a * ((1 - (1 + b) exp(-|x - tau0| / tau1) + b exp(-|x - tau0| / tau2)) / n + 1 - 1/n)`
//!
//! `n` is the number of emitters, `a` the normalization, `tau1` the
//! antibunching time and `b`, `tau2` the amplitude and time of the bunching
//! shoulder. `tau0` is the zero-delay position.

use ndarray::Array1;

use crate::error::Result;
use crate::model::{Abscissa, Dimensionality, ModelSpec};
use crate::models::sorted_samples;
use crate::parameters::ParameterSet;
use crate::utils::stats;

pub const ANTIBUNCHING: ModelSpec = ModelSpec::new(
    "antibunching",
    Dimensionality::OneD,
    &["n", "a", "b", "tau0", "tau1", "tau2"],
    antibunching,
);

fn antibunching(point: &[f64], params: &[f64]) -> f64 {
    let &[n, a, b, tau0, tau1, tau2] = params else {
        return f64::NAN;
    };
    let delay = (point[0] - tau0).abs();
    let g2 = 1.0 - (1.0 + b) * (-delay / tau1).exp() + b * (-delay / tau2).exp();
    a * (g2 / n + 1.0 - 1.0 / n)
}

/// Single emitter, unit normalization, zero delay at 0 and the bunching
/// amplitude taken from the data's range. The times are typical values in
/// nanoseconds.
pub fn estimate_dip(x: &Abscissa, y: &Array1<f64>, params: &mut ParameterSet) -> Result<()> {
    let (_, y) = sorted_samples(x, y)?;
    let (lo, hi) = stats::min_max(&y);

    params.init("n", 1.0)?;
    params.init("a", 1.0)?;
    params.init("b", hi - lo)?;
    params.init("tau0", 0.0)?;
    params.init("tau1", 20.0)?;
    params.init("tau2", 30.0)?;
    Ok(())
}
