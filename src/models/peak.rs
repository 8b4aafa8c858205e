//! Peak models for fitting spectra and resonance scans.
//!
//! Both profiles are height-normalized: `amplitude` is the excursion from
//! `offset` at `center`.
//!
//! - Gaussian: `amplitude * exp(-(x - center)² / (2 sigma²)) + offset`,
//!   FWHM = 2 sqrt(2 ln 2) sigma ≈ 2.3548 sigma
//! - Lorentzian: `amplitude * sigma² / ((x - center)² + sigma²) + offset`,
//!   FWHM = 2 sigma
//!
//! Multi-peak variants share one `offset`; the peaks carry `g0_`, `g1_`
//! (Gaussian) or `l0_`, `l1_`, `l2_` (Lorentzian) prefixes.

use std::f64::consts::LN_2;

use ndarray::Array1;

use crate::error::Result;
use crate::model::{Abscissa, Dimensionality, ModelSpec};
use crate::models::{sorted_samples, span};
use crate::parameters::{Bounds, ParameterSet};
use crate::utils::stats;

pub const GAUSSIAN: ModelSpec = ModelSpec::new(
    "gaussian",
    Dimensionality::OneD,
    &["amplitude", "center", "sigma", "offset"],
    gaussian,
);

pub const GAUSSIAN_DOUBLE: ModelSpec = ModelSpec::new(
    "gaussiandouble",
    Dimensionality::OneD,
    &[
        "g0_amplitude",
        "g0_center",
        "g0_sigma",
        "g1_amplitude",
        "g1_center",
        "g1_sigma",
        "offset",
    ],
    gaussian_sum,
);

pub const GAUSSIAN_LINEAR_OFFSET: ModelSpec = ModelSpec::new(
    "gaussianlinearoffset",
    Dimensionality::OneD,
    &["amplitude", "center", "sigma", "slope", "offset"],
    gaussian_linear_offset,
);

pub const LORENTZIAN: ModelSpec = ModelSpec::new(
    "lorentzian",
    Dimensionality::OneD,
    &["amplitude", "center", "sigma", "offset"],
    lorentzian,
);

pub const LORENTZIAN_DOUBLE: ModelSpec = ModelSpec::new(
    "lorentziandouble",
    Dimensionality::OneD,
    &[
        "l0_amplitude",
        "l0_center",
        "l0_sigma",
        "l1_amplitude",
        "l1_center",
        "l1_sigma",
        "offset",
    ],
    lorentzian_sum,
);

pub const LORENTZIAN_TRIPLE: ModelSpec = ModelSpec::new(
    "lorentziantriple",
    Dimensionality::OneD,
    &[
        "l0_amplitude",
        "l0_center",
        "l0_sigma",
        "l1_amplitude",
        "l1_center",
        "l1_sigma",
        "l2_amplitude",
        "l2_center",
        "l2_sigma",
        "offset",
    ],
    lorentzian_sum,
);

/// Unit-height Gaussian profile.
pub fn gaussian_profile(x: f64, center: f64, sigma: f64) -> f64 {
    let z = (x - center) / sigma;
    (-0.5 * z * z).exp()
}

/// Unit-height Lorentzian profile; `sigma` is the half width at half maximum.
pub fn lorentzian_profile(x: f64, center: f64, sigma: f64) -> f64 {
    let s2 = sigma * sigma;
    s2 / ((x - center).powi(2) + s2)
}

fn gaussian(point: &[f64], params: &[f64]) -> f64 {
    let &[amplitude, center, sigma, offset] = params else {
        return f64::NAN;
    };
    amplitude * gaussian_profile(point[0], center, sigma) + offset
}

fn gaussian_linear_offset(point: &[f64], params: &[f64]) -> f64 {
    let &[amplitude, center, sigma, slope, offset] = params else {
        return f64::NAN;
    };
    let x = point[0];
    amplitude * gaussian_profile(x, center, sigma) + slope * x + offset
}

fn lorentzian(point: &[f64], params: &[f64]) -> f64 {
    let &[amplitude, center, sigma, offset] = params else {
        return f64::NAN;
    };
    amplitude * lorentzian_profile(point[0], center, sigma) + offset
}

/// `(amplitude, center, sigma)` triples followed by a shared offset.
fn sum_of_peaks(x: f64, params: &[f64], profile: fn(f64, f64, f64) -> f64) -> f64 {
    let Some((offset, peaks)) = params.split_last() else {
        return f64::NAN;
    };
    peaks
        .chunks_exact(3)
        .map(|p| p[0] * profile(x, p[1], p[2]))
        .sum::<f64>()
        + offset
}

fn gaussian_sum(point: &[f64], params: &[f64]) -> f64 {
    sum_of_peaks(point[0], params, gaussian_profile)
}

fn lorentzian_sum(point: &[f64], params: &[f64]) -> f64 {
    sum_of_peaks(point[0], params, lorentzian_profile)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Gaussian,
    Lorentzian,
}

impl Shape {
    fn profile(self, x: f64, center: f64, sigma: f64) -> f64 {
        match self {
            Shape::Gaussian => gaussian_profile(x, center, sigma),
            Shape::Lorentzian => lorentzian_profile(x, center, sigma),
        }
    }

    fn sigma_from_fwhm(self, fwhm: f64) -> f64 {
        match self {
            Shape::Gaussian => fwhm / (2.0 * (2.0 * LN_2).sqrt()),
            Shape::Lorentzian => fwhm / 2.0,
        }
    }
}

/// Which way the peaks point relative to the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    /// Decide from the data
    Auto,
    Peak,
    Dip,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PeakGuess {
    amplitude: f64,
    center: f64,
    sigma: f64,
}

/// Locate `count` peaks in x-sorted samples around a known baseline.
///
/// Peaks are peeled off one at a time: the strongest excursion is taken as
/// a peak, its width read at half height, and the corresponding profile
/// subtracted before looking for the next one. Guesses come back sorted by
/// center.
fn guess_peaks(
    x: &[f64],
    y: &[f64],
    offset: f64,
    count: usize,
    shape: Shape,
    direction: Direction,
) -> Vec<PeakGuess> {
    let sign = match direction {
        Direction::Peak => 1.0,
        Direction::Dip => -1.0,
        Direction::Auto => {
            let (lo, hi) = stats::min_max(y);
            if hi - offset >= offset - lo {
                1.0
            } else {
                -1.0
            }
        }
    };

    let span = span(x);
    let spacing = span / (x.len().max(2) - 1) as f64;
    let mut residual: Vec<f64> = y.iter().map(|v| sign * (v - offset)).collect();
    let mut guesses = Vec::with_capacity(count);

    for _ in 0..count {
        let peak = stats::argmax(&residual);
        let height = residual[peak];
        let fwhm = stats::width_at_level(x, &residual, peak, 0.5 * height)
            .unwrap_or(span / (4.0 * count as f64));
        let sigma = shape.sigma_from_fwhm(fwhm).max(spacing);
        let center = x[peak];

        for (r, &xi) in residual.iter_mut().zip(x) {
            *r -= height * shape.profile(xi, center, sigma);
        }
        guesses.push(PeakGuess {
            amplitude: sign * height,
            center,
            sigma,
        });
    }

    guesses.sort_by(|a, b| a.center.total_cmp(&b.center));
    guesses
}

fn init_peak(
    params: &mut ParameterSet,
    prefix: &str,
    guess: &PeakGuess,
    x: &[f64],
    direction: Direction,
) -> Result<()> {
    let span = span(x);
    let (first, last) = (x[0], x[x.len() - 1]);

    let amplitude = params.init(&format!("{prefix}amplitude"), guess.amplitude)?;
    match direction {
        Direction::Peak => {
            amplitude.set_min(0.0);
        }
        Direction::Dip => {
            amplitude.set_max(0.0);
        }
        Direction::Auto => {}
    }
    params
        .init(&format!("{prefix}center"), guess.center)?
        .set_bounds(Bounds::new(first - span, last + span)?);
    params
        .init(&format!("{prefix}sigma"), guess.sigma)?
        .set_bounds(Bounds::min_only(0.0));
    Ok(())
}

fn estimate_peaks(
    x: &Abscissa,
    y: &Array1<f64>,
    params: &mut ParameterSet,
    prefixes: &[&str],
    shape: Shape,
    direction: Direction,
) -> Result<()> {
    let (x, y) = sorted_samples(x, y)?;
    let offset = stats::edge_mean(&y, 0.1);

    let guesses = guess_peaks(&x, &y, offset, prefixes.len(), shape, direction);
    for (prefix, guess) in prefixes.iter().zip(&guesses) {
        init_peak(params, prefix, guess, &x, direction)?;
    }
    params.init("offset", offset)?;
    Ok(())
}

/// A Gaussian on a sloped baseline. The line is fitted through the outer
/// fifth of the data on each side and removed before the peak search.
fn estimate_linear_offset(
    x: &Abscissa,
    y: &Array1<f64>,
    params: &mut ParameterSet,
    direction: Direction,
) -> Result<()> {
    let (x, y) = sorted_samples(x, y)?;
    let n = x.len();
    let k = ((n as f64 * 0.2).ceil() as usize).clamp(1, n);

    let (edge_x, edge_y): (Vec<f64>, Vec<f64>) = x[..k]
        .iter()
        .zip(&y[..k])
        .chain(x[n - k..].iter().zip(&y[n - k..]))
        .map(|(&xi, &yi)| (xi, yi))
        .unzip();
    let (slope, intercept) =
        stats::linear_regression(&edge_x, &edge_y).unwrap_or((0.0, stats::mean(&y)));

    let flattened: Vec<f64> = x
        .iter()
        .zip(&y)
        .map(|(xi, yi)| yi - slope * xi - intercept)
        .collect();
    let guesses = guess_peaks(&x, &flattened, 0.0, 1, Shape::Gaussian, direction);
    if let Some(guess) = guesses.first() {
        init_peak(params, "", guess, &x, direction)?;
    }
    params.init("slope", slope)?;
    params.init("offset", intercept)?;
    Ok(())
}

macro_rules! peak_estimators {
    ($($name:ident => ($prefixes:expr, $shape:expr, $direction:expr);)*) => {
        $(
            pub fn $name(x: &Abscissa, y: &Array1<f64>, params: &mut ParameterSet) -> Result<()> {
                estimate_peaks(x, y, params, $prefixes, $shape, $direction)
            }
        )*
    };
}

peak_estimators! {
    estimate_gaussian => (&[""], Shape::Gaussian, Direction::Auto);
    estimate_gaussian_peak => (&[""], Shape::Gaussian, Direction::Peak);
    estimate_gaussian_dip => (&[""], Shape::Gaussian, Direction::Dip);
    estimate_gaussian_double => (&["g0_", "g1_"], Shape::Gaussian, Direction::Auto);
    estimate_gaussian_double_peak => (&["g0_", "g1_"], Shape::Gaussian, Direction::Peak);
    estimate_gaussian_double_dip => (&["g0_", "g1_"], Shape::Gaussian, Direction::Dip);
    estimate_lorentzian => (&[""], Shape::Lorentzian, Direction::Auto);
    estimate_lorentzian_peak => (&[""], Shape::Lorentzian, Direction::Peak);
    estimate_lorentzian_dip => (&[""], Shape::Lorentzian, Direction::Dip);
    estimate_lorentzian_double => (&["l0_", "l1_"], Shape::Lorentzian, Direction::Auto);
    estimate_lorentzian_double_peak => (&["l0_", "l1_"], Shape::Lorentzian, Direction::Peak);
    estimate_lorentzian_double_dip => (&["l0_", "l1_"], Shape::Lorentzian, Direction::Dip);
    estimate_lorentzian_triple => (&["l0_", "l1_", "l2_"], Shape::Lorentzian, Direction::Auto);
    estimate_lorentzian_triple_peak => (&["l0_", "l1_", "l2_"], Shape::Lorentzian, Direction::Peak);
    estimate_lorentzian_triple_dip => (&["l0_", "l1_", "l2_"], Shape::Lorentzian, Direction::Dip);
}

pub fn estimate_gaussian_linear_offset(
    x: &Abscissa,
    y: &Array1<f64>,
    params: &mut ParameterSet,
) -> Result<()> {
    estimate_linear_offset(x, y, params, Direction::Auto)
}

pub fn estimate_gaussian_linear_offset_peak(
    x: &Abscissa,
    y: &Array1<f64>,
    params: &mut ParameterSet,
) -> Result<()> {
    estimate_linear_offset(x, y, params, Direction::Peak)
}

pub fn estimate_gaussian_linear_offset_dip(
    x: &Abscissa,
    y: &Array1<f64>,
    params: &mut ParameterSet,
) -> Result<()> {
    estimate_linear_offset(x, y, params, Direction::Dip)
}
