//! Dominant-frequency search for oscillating data.
//!
//! A direct Fourier sum over an oversampled frequency grid. The data sets the
//! estimators see are a few thousand points at most, so the quadratic cost is
//! not a concern and non-uniform sampling works without resampling.

use std::f64::consts::PI;

/// Oversampling of the frequency grid relative to the natural resolution `1/T`.
const OVERSAMPLING: usize = 4;

/// One spectral component: `amplitude * sin(2π frequency x + phase)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Component {
    pub frequency: f64,
    pub amplitude: f64,
    pub phase: f64,
}

/// Project zero-mean data onto a sine/cosine pair at `frequency`.
fn project(x: &[f64], y: &[f64], frequency: f64) -> (f64, f64) {
    let omega = 2.0 * PI * frequency;
    x.iter().zip(y.iter()).fold((0.0, 0.0), |(s, c), (&xi, &yi)| {
        let (sin, cos) = (omega * xi).sin_cos();
        (s + yi * sin, c + yi * cos)
    })
}

/// Find up to `count` strongest components of an x-sorted, zero-mean curve.
///
/// Picked components are separated by at least the natural resolution
/// `1/T`. Fewer than `count` components are returned only when the grid has
/// fewer distinct local maxima.
pub fn dominant_components(x: &[f64], y: &[f64], count: usize) -> Vec<Component> {
    let n = x.len().min(y.len());
    if n < 3 || count == 0 {
        return Vec::new();
    }
    let span = x[n - 1] - x[0];
    if span <= 0.0 {
        return Vec::new();
    }

    // Sampling interval as if the points were evenly spaced.
    let dx = span / (n - 1) as f64;
    let resolution = 1.0 / (n as f64 * dx);
    let nyquist = 0.5 / dx;
    let step = resolution / OVERSAMPLING as f64;
    let grid: Vec<f64> = (1..)
        .map(|k| k as f64 * step)
        .take_while(|&f| f <= nyquist)
        .collect();

    let power: Vec<(f64, f64, f64)> = grid
        .iter()
        .map(|&f| {
            let (s, c) = project(&x[..n], &y[..n], f);
            (f, s, c)
        })
        .collect();
    let magnitude = |i: usize| power[i].1.hypot(power[i].2);

    let mut peaks: Vec<usize> = (0..power.len())
        .filter(|&i| {
            let m = magnitude(i);
            (i == 0 || m >= magnitude(i - 1)) && (i + 1 == power.len() || m >= magnitude(i + 1))
        })
        .collect();
    peaks.sort_by(|&a, &b| magnitude(b).total_cmp(&magnitude(a)));

    let mut picked: Vec<Component> = Vec::with_capacity(count);
    for i in peaks {
        let (frequency, s, c) = power[i];
        if picked
            .iter()
            .any(|p| (p.frequency - frequency).abs() < resolution)
        {
            continue;
        }
        picked.push(Component {
            frequency,
            amplitude: 2.0 * s.hypot(c) / n as f64,
            phase: c.atan2(s),
        });
        if picked.len() == count {
            break;
        }
    }
    picked
}
