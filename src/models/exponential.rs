//! Exponential decay models.
//!
//! - `decayexponential`: `amplitude * exp(-x / lifetime) + offset`
//! - `biexponential`: two decays with their own amplitude and lifetime
//! - `decayexponentialstretched`: `amplitude * exp(-(x / lifetime)^beta) + offset`

use ndarray::Array1;

use crate::error::Result;
use crate::model::{Abscissa, Dimensionality, ModelSpec};
use crate::models::{sorted_samples, span};
use crate::parameters::{Bounds, ParameterSet};
use crate::utils::stats;

pub const DECAY_EXPONENTIAL: ModelSpec = ModelSpec::new(
    "decayexponential",
    Dimensionality::OneD,
    &["amplitude", "lifetime", "offset"],
    decay_exponential,
);

pub const BI_EXPONENTIAL: ModelSpec = ModelSpec::new(
    "biexponential",
    Dimensionality::OneD,
    &[
        "e0_amplitude",
        "e0_lifetime",
        "e1_amplitude",
        "e1_lifetime",
        "offset",
    ],
    bi_exponential,
);

pub const DECAY_EXPONENTIAL_STRETCHED: ModelSpec = ModelSpec::new(
    "decayexponentialstretched",
    Dimensionality::OneD,
    &["amplitude", "lifetime", "beta", "offset"],
    decay_exponential_stretched,
);

/// Upper limit of the stretching exponent.
const MAX_BETA: f64 = 10.0;

/// `exp(-x / lifetime)`
pub fn decay(x: f64, lifetime: f64) -> f64 {
    (-x / lifetime).exp()
}

/// `exp(-(|x| / lifetime)^beta)`
pub fn stretched_decay(x: f64, lifetime: f64, beta: f64) -> f64 {
    (-(x / lifetime).abs().powf(beta)).exp()
}

fn decay_exponential(point: &[f64], params: &[f64]) -> f64 {
    let &[amplitude, lifetime, offset] = params else {
        return f64::NAN;
    };
    amplitude * decay(point[0], lifetime) + offset
}

fn bi_exponential(point: &[f64], params: &[f64]) -> f64 {
    let &[a0, tau0, a1, tau1, offset] = params else {
        return f64::NAN;
    };
    let x = point[0];
    a0 * decay(x, tau0) + a1 * decay(x, tau1) + offset
}

fn decay_exponential_stretched(point: &[f64], params: &[f64]) -> f64 {
    let &[amplitude, lifetime, beta, offset] = params else {
        return f64::NAN;
    };
    amplitude * stretched_decay(point[0], lifetime, beta) + offset
}

/// Rough shape of a single decay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct DecayGuess {
    pub amplitude: f64,
    pub lifetime: f64,
    pub offset: f64,
}

/// Guess a single decay from x-sorted samples.
///
/// The offset is the mean of the last tenth of the curve and the lifetime is
/// where the curve has relaxed to `1/e` of its initial excursion. The
/// amplitude is referred back to `x = 0`.
pub(crate) fn guess_decay(x: &[f64], y: &[f64]) -> DecayGuess {
    let offset = stats::tail_mean(y, 0.1);
    let (x0, y0) = (x[0], y[0]);
    let excursion = y0 - offset;
    let level = offset + excursion / std::f64::consts::E;

    let crossing = if excursion >= 0.0 {
        stats::first_crossing_below(x, y, level)
    } else {
        stats::first_crossing_above(x, y, level)
    };
    let lifetime = crossing
        .map(|t| t - x0)
        .filter(|t| *t > 0.0)
        .unwrap_or_else(|| span(x) / 3.0);

    let referred = excursion * (x0 / lifetime).exp();
    let amplitude = if referred.is_finite() {
        referred
    } else {
        excursion
    };

    DecayGuess {
        amplitude,
        lifetime,
        offset,
    }
}

pub fn estimate_decay(x: &Abscissa, y: &Array1<f64>, params: &mut ParameterSet) -> Result<()> {
    let (x, y) = sorted_samples(x, y)?;
    let guess = guess_decay(&x, &y);

    params.init("amplitude", guess.amplitude)?;
    params
        .init("lifetime", guess.lifetime)?
        .set_bounds(Bounds::min_only(0.0));
    params.init("offset", guess.offset)?;
    Ok(())
}

/// Split the single-decay guess into a fast and a slow component.
pub fn estimate_biexponential(
    x: &Abscissa,
    y: &Array1<f64>,
    params: &mut ParameterSet,
) -> Result<()> {
    let (x, y) = sorted_samples(x, y)?;
    let guess = guess_decay(&x, &y);

    params.init("e0_amplitude", 0.5 * guess.amplitude)?;
    params
        .init("e0_lifetime", 0.5 * guess.lifetime)?
        .set_bounds(Bounds::min_only(0.0));
    params.init("e1_amplitude", 0.5 * guess.amplitude)?;
    params
        .init("e1_lifetime", 2.0 * guess.lifetime)?
        .set_bounds(Bounds::min_only(0.0));
    params.init("offset", guess.offset)?;
    Ok(())
}

pub fn estimate_stretched(
    x: &Abscissa,
    y: &Array1<f64>,
    params: &mut ParameterSet,
) -> Result<()> {
    let (x, y) = sorted_samples(x, y)?;
    let guess = guess_decay(&x, &y);

    params.init("amplitude", guess.amplitude)?;
    params
        .init("lifetime", guess.lifetime)?
        .set_bounds(Bounds::min_only(0.0));
    params
        .init("beta", 1.0)?
        .set_bounds(Bounds::new(0.0, MAX_BETA)?);
    params.init("offset", guess.offset)?;
    Ok(())
}
