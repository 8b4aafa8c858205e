//! Oscillation models: sums of sines, optionally exponentially damped.
//!
//! Every sine term is `amplitude * sin(2π frequency x + phase)`. Damping
//! either multiplies the whole sum (`...withexpdecay`) or each term on its
//! own (`...withtwoexpdecay`, `...withthreeexpdecay`).

use std::f64::consts::PI;

use ndarray::Array1;

use crate::error::Result;
use crate::model::{Abscissa, Dimensionality, ModelSpec};
use crate::models::exponential::{decay, stretched_decay};
use crate::models::{sorted_samples, span};
use crate::parameters::{Bounds, ParameterSet};
use crate::utils::spectrum::{dominant_components, Component};
use crate::utils::stats;

pub const SINE: ModelSpec = ModelSpec::new(
    "sine",
    Dimensionality::OneD,
    &["amplitude", "frequency", "phase", "offset"],
    sine,
);

pub const SINE_EXPONENTIAL_DECAY: ModelSpec = ModelSpec::new(
    "sineexponentialdecay",
    Dimensionality::OneD,
    &["amplitude", "frequency", "phase", "lifetime", "offset"],
    sine_exponential_decay,
);

pub const SINE_STRETCHED_EXPONENTIAL_DECAY: ModelSpec = ModelSpec::new(
    "sinestretchedexponentialdecay",
    Dimensionality::OneD,
    &["amplitude", "frequency", "phase", "lifetime", "beta", "offset"],
    sine_stretched_exponential_decay,
);

pub const SINE_DOUBLE: ModelSpec = ModelSpec::new(
    "sinedouble",
    Dimensionality::OneD,
    &[
        "s0_amplitude",
        "s0_frequency",
        "s0_phase",
        "s1_amplitude",
        "s1_frequency",
        "s1_phase",
        "offset",
    ],
    sine_sum,
);

pub const SINE_DOUBLE_WITH_EXP_DECAY: ModelSpec = ModelSpec::new(
    "sinedoublewithexpdecay",
    Dimensionality::OneD,
    &[
        "s0_amplitude",
        "s0_frequency",
        "s0_phase",
        "s1_amplitude",
        "s1_frequency",
        "s1_phase",
        "lifetime",
        "offset",
    ],
    damped_sine_sum,
);

pub const SINE_DOUBLE_WITH_TWO_EXP_DECAY: ModelSpec = ModelSpec::new(
    "sinedoublewithtwoexpdecay",
    Dimensionality::OneD,
    &[
        "s0_amplitude",
        "s0_frequency",
        "s0_phase",
        "s0_lifetime",
        "s1_amplitude",
        "s1_frequency",
        "s1_phase",
        "s1_lifetime",
        "offset",
    ],
    individually_damped_sine_sum,
);

pub const SINE_TRIPLE: ModelSpec = ModelSpec::new(
    "sinetriple",
    Dimensionality::OneD,
    &[
        "s0_amplitude",
        "s0_frequency",
        "s0_phase",
        "s1_amplitude",
        "s1_frequency",
        "s1_phase",
        "s2_amplitude",
        "s2_frequency",
        "s2_phase",
        "offset",
    ],
    sine_sum,
);

pub const SINE_TRIPLE_WITH_EXP_DECAY: ModelSpec = ModelSpec::new(
    "sinetriplewithexpdecay",
    Dimensionality::OneD,
    &[
        "s0_amplitude",
        "s0_frequency",
        "s0_phase",
        "s1_amplitude",
        "s1_frequency",
        "s1_phase",
        "s2_amplitude",
        "s2_frequency",
        "s2_phase",
        "lifetime",
        "offset",
    ],
    damped_sine_sum,
);

pub const SINE_TRIPLE_WITH_THREE_EXP_DECAY: ModelSpec = ModelSpec::new(
    "sinetriplewiththreeexpdecay",
    Dimensionality::OneD,
    &[
        "s0_amplitude",
        "s0_frequency",
        "s0_phase",
        "s0_lifetime",
        "s1_amplitude",
        "s1_frequency",
        "s1_phase",
        "s1_lifetime",
        "s2_amplitude",
        "s2_frequency",
        "s2_phase",
        "s2_lifetime",
        "offset",
    ],
    individually_damped_sine_sum,
);

/// Upper limit of the stretching exponent.
const MAX_BETA: f64 = 10.0;

/// `amplitude * sin(2π frequency x + phase)`
pub fn sine_term(x: f64, amplitude: f64, frequency: f64, phase: f64) -> f64 {
    amplitude * (2.0 * PI * frequency * x + phase).sin()
}

fn sine(point: &[f64], params: &[f64]) -> f64 {
    let &[amplitude, frequency, phase, offset] = params else {
        return f64::NAN;
    };
    sine_term(point[0], amplitude, frequency, phase) + offset
}

fn sine_exponential_decay(point: &[f64], params: &[f64]) -> f64 {
    let &[amplitude, frequency, phase, lifetime, offset] = params else {
        return f64::NAN;
    };
    let x = point[0];
    sine_term(x, amplitude, frequency, phase) * decay(x, lifetime) + offset
}

fn sine_stretched_exponential_decay(point: &[f64], params: &[f64]) -> f64 {
    let &[amplitude, frequency, phase, lifetime, beta, offset] = params else {
        return f64::NAN;
    };
    let x = point[0];
    sine_term(x, amplitude, frequency, phase) * stretched_decay(x, lifetime, beta) + offset
}

fn sines(x: f64, terms: &[f64]) -> f64 {
    terms
        .chunks_exact(3)
        .map(|t| sine_term(x, t[0], t[1], t[2]))
        .sum()
}

/// Sine triples, then `offset`.
fn sine_sum(point: &[f64], params: &[f64]) -> f64 {
    let Some((offset, terms)) = params.split_last() else {
        return f64::NAN;
    };
    sines(point[0], terms) + offset
}

/// Sine triples, then a shared `lifetime` and `offset`.
fn damped_sine_sum(point: &[f64], params: &[f64]) -> f64 {
    let [terms @ .., lifetime, offset] = params else {
        return f64::NAN;
    };
    let x = point[0];
    sines(x, terms) * decay(x, *lifetime) + offset
}

/// `(amplitude, frequency, phase, lifetime)` groups, then `offset`.
fn individually_damped_sine_sum(point: &[f64], params: &[f64]) -> f64 {
    let Some((offset, terms)) = params.split_last() else {
        return f64::NAN;
    };
    let x = point[0];
    terms
        .chunks_exact(4)
        .map(|t| sine_term(x, t[0], t[1], t[2]) * decay(x, t[3]))
        .sum::<f64>()
        + offset
}

/// Initial guesses shared by the whole family.
struct OscillationGuess {
    components: Vec<Component>,
    lifetime: f64,
    offset: f64,
}

/// Find `count` components of x-sorted samples around their mean.
///
/// When the spectrum has fewer distinct maxima than requested, the missing
/// components are seeded at harmonics of the lowest resolvable frequency
/// with a tenth of the data's amplitude.
fn guess_oscillation(x: &[f64], y: &[f64], count: usize, damped: bool) -> OscillationGuess {
    let offset = stats::mean(y);
    let centered: Vec<f64> = y.iter().map(|v| v - offset).collect();
    let span = span(x);

    let lifetime = if damped {
        stats::envelope_lifetime(x, y, offset).unwrap_or(2.0 * span)
    } else {
        f64::INFINITY
    };

    let mut components = dominant_components(x, &centered, count);
    let (lo, hi) = stats::min_max(y);
    let filler = 0.1 * (hi - lo).max(0.0) / 2.0;
    while components.len() < count {
        components.push(Component {
            frequency: (components.len() + 1) as f64 / span,
            amplitude: filler,
            phase: 0.0,
        });
    }

    if damped {
        // Spectral amplitudes average over the decay; refer them back to x = 0.
        let x0 = x.first().copied().unwrap_or(0.0);
        let mean_decay =
            (-x0 / lifetime).exp() * lifetime / span * (1.0 - (-span / lifetime).exp());
        if mean_decay.is_finite() && mean_decay > 0.0 {
            for c in &mut components {
                c.amplitude /= mean_decay;
            }
        }
    }

    OscillationGuess {
        components,
        lifetime,
        offset,
    }
}

fn init_component(params: &mut ParameterSet, prefix: &str, component: &Component) -> Result<()> {
    params.init(&format!("{prefix}amplitude"), component.amplitude)?;
    params
        .init(&format!("{prefix}frequency"), component.frequency)?
        .set_bounds(Bounds::min_only(0.0));
    params.init(&format!("{prefix}phase"), component.phase)?;
    Ok(())
}

fn init_lifetime(params: &mut ParameterSet, name: &str, lifetime: f64) -> Result<()> {
    params
        .init(name, lifetime)?
        .set_bounds(Bounds::min_only(0.0));
    Ok(())
}

/// How a family member attaches lifetimes to its sine terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Damping {
    None,
    Shared,
    PerTerm,
}

fn estimate_oscillation(
    x: &Abscissa,
    y: &Array1<f64>,
    params: &mut ParameterSet,
    prefixes: &[&str],
    damping: Damping,
) -> Result<()> {
    let (x, y) = sorted_samples(x, y)?;
    let guess = guess_oscillation(&x, &y, prefixes.len(), damping != Damping::None);

    for (prefix, component) in prefixes.iter().zip(&guess.components) {
        init_component(params, prefix, component)?;
        if damping == Damping::PerTerm {
            init_lifetime(params, &format!("{prefix}lifetime"), guess.lifetime)?;
        }
    }
    if damping == Damping::Shared {
        init_lifetime(params, "lifetime", guess.lifetime)?;
    }
    params.init("offset", guess.offset)?;
    Ok(())
}

pub fn estimate_sine(x: &Abscissa, y: &Array1<f64>, params: &mut ParameterSet) -> Result<()> {
    estimate_oscillation(x, y, params, &[""], Damping::None)
}

pub fn estimate_sine_exponential_decay(
    x: &Abscissa,
    y: &Array1<f64>,
    params: &mut ParameterSet,
) -> Result<()> {
    estimate_oscillation(x, y, params, &[""], Damping::Shared)
}

pub fn estimate_sine_stretched_exponential_decay(
    x: &Abscissa,
    y: &Array1<f64>,
    params: &mut ParameterSet,
) -> Result<()> {
    estimate_oscillation(x, y, params, &[""], Damping::Shared)?;
    params
        .init("beta", 1.0)?
        .set_bounds(Bounds::new(0.0, MAX_BETA)?);
    Ok(())
}

pub fn estimate_sine_double(
    x: &Abscissa,
    y: &Array1<f64>,
    params: &mut ParameterSet,
) -> Result<()> {
    estimate_oscillation(x, y, params, &["s0_", "s1_"], Damping::None)
}

pub fn estimate_sine_double_with_exp_decay(
    x: &Abscissa,
    y: &Array1<f64>,
    params: &mut ParameterSet,
) -> Result<()> {
    estimate_oscillation(x, y, params, &["s0_", "s1_"], Damping::Shared)
}

pub fn estimate_sine_double_with_two_exp_decay(
    x: &Abscissa,
    y: &Array1<f64>,
    params: &mut ParameterSet,
) -> Result<()> {
    estimate_oscillation(x, y, params, &["s0_", "s1_"], Damping::PerTerm)
}

pub fn estimate_sine_triple(
    x: &Abscissa,
    y: &Array1<f64>,
    params: &mut ParameterSet,
) -> Result<()> {
    estimate_oscillation(x, y, params, &["s0_", "s1_", "s2_"], Damping::None)
}

pub fn estimate_sine_triple_with_exp_decay(
    x: &Abscissa,
    y: &Array1<f64>,
    params: &mut ParameterSet,
) -> Result<()> {
    estimate_oscillation(x, y, params, &["s0_", "s1_", "s2_"], Damping::Shared)
}

pub fn estimate_sine_triple_with_three_exp_decay(
    x: &Abscissa,
    y: &Array1<f64>,
    params: &mut ParameterSet,
) -> Result<()> {
    estimate_oscillation(x, y, params, &["s0_", "s1_", "s2_"], Damping::PerTerm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn times(n: usize, step: f64) -> Array1<f64> {
        Array1::from_iter((0..n).map(|i| i as f64 * step))
    }

    #[test]
    fn test_sine_values() {
        let x = Abscissa::from(vec![0.0, 0.25, 0.5]);
        let y = SINE.eval(&x, &[2.0, 1.0, 0.0, 1.0]).unwrap();
        assert_relative_eq!(y[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(y[1], 3.0, epsilon = 1e-12);
        assert_relative_eq!(y[2], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_per_term_damping_with_equal_lifetimes_matches_shared() {
        let x = Abscissa::from(times(40, 0.3));
        let shared = SINE_DOUBLE_WITH_EXP_DECAY
            .eval(&x, &[1.0, 0.2, 0.1, 0.5, 0.7, 1.0, 3.0, 0.2])
            .unwrap();
        let per_term = SINE_DOUBLE_WITH_TWO_EXP_DECAY
            .eval(&x, &[1.0, 0.2, 0.1, 3.0, 0.5, 0.7, 1.0, 3.0, 0.2])
            .unwrap();
        for (a, b) in shared.iter().zip(per_term.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_sine_estimate_finds_frequency() {
        let x = times(200, 0.5);
        let y = x.mapv(|t| 1.5 * (2.0 * PI * 0.05 * t + 0.4).sin() + 2.0);
        let mut params = SINE.parameters();
        estimate_sine(&Abscissa::from(&x), &y, &mut params).unwrap();

        assert_relative_eq!(params.value("frequency"), 0.05, max_relative = 0.05);
        assert_relative_eq!(params.value("offset"), 2.0, epsilon = 0.05);
        assert_relative_eq!(params.value("amplitude"), 1.5, max_relative = 0.2);
    }

    #[test]
    fn test_damped_estimate_sets_lifetime() {
        let x = times(300, 0.1);
        let y = x.mapv(|t| (2.0 * PI * 0.5 * t).sin() * (-t / 10.0).exp());
        let mut params = SINE_EXPONENTIAL_DECAY.parameters();
        estimate_sine_exponential_decay(&Abscissa::from(&x), &y, &mut params).unwrap();

        let lifetime = params.value("lifetime");
        assert!(lifetime > 0.0 && lifetime.is_finite());
        assert_relative_eq!(params.value("frequency"), 0.5, max_relative = 0.1);
    }

    #[test]
    fn test_triple_estimate_fills_every_parameter() {
        let x = times(400, 0.25);
        let y = x.mapv(|t| {
            (2.0 * PI * 0.1 * t).sin() + 0.6 * (2.0 * PI * 0.4 * t).sin() + 0.3 * (2.0 * PI * 1.1 * t).sin()
        });
        let mut params = SINE_TRIPLE_WITH_THREE_EXP_DECAY.parameters();
        estimate_sine_triple_with_three_exp_decay(&Abscissa::from(&x), &y, &mut params).unwrap();
        assert!(params.missing().is_empty());

        let mut frequencies = vec![
            params.value("s0_frequency"),
            params.value("s1_frequency"),
            params.value("s2_frequency"),
        ];
        frequencies.sort_by(f64::total_cmp);
        assert_relative_eq!(frequencies[0], 0.1, epsilon = 0.01);
        assert_relative_eq!(frequencies[1], 0.4, epsilon = 0.01);
        assert_relative_eq!(frequencies[2], 1.1, epsilon = 0.01);
    }

    #[test]
    fn test_flat_data_still_initializes() {
        let x = times(10, 1.0);
        let y = Array1::from_elem(10, 3.0);
        let mut params = SINE_DOUBLE.parameters();
        estimate_sine_double(&Abscissa::from(&x), &y, &mut params).unwrap();
        assert!(params.missing().is_empty());
    }
}
