//! Small descriptive statistics used by the estimators.

use ndarray::Array1;

/// Sort paired samples by x so estimators can walk the curve left to right.
pub fn sorted_by_x(x: &Array1<f64>, y: &Array1<f64>) -> (Vec<f64>, Vec<f64>) {
    let mut pairs: Vec<(f64, f64)> = x.iter().copied().zip(y.iter().copied()).collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
    pairs.into_iter().unzip()
}

pub fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

pub fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map_or(0, |(i, _)| i)
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn median(values: &[f64]) -> f64 {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return 0.0;
    }
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        0.5 * (sorted[mid - 1] + sorted[mid])
    } else {
        sorted[mid]
    }
}

/// Mean of the outer `fraction` of samples on both ends.
pub fn edge_mean(values: &[f64], fraction: f64) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    let k = ((n as f64 * fraction).ceil() as usize).clamp(1, n);
    let head = &values[..k];
    let tail = &values[n - k..];
    0.5 * (mean(head) + mean(tail))
}

/// Mean of the last `fraction` of samples.
pub fn tail_mean(values: &[f64], fraction: f64) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    let k = ((n as f64 * fraction).ceil() as usize).clamp(1, n);
    mean(&values[n - k..])
}

/// Ordinary least squares line through the points, as `(slope, intercept)`.
///
/// Returns `None` when x has no spread.
pub fn linear_regression(x: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    let n = x.len().min(y.len());
    if n < 2 {
        return None;
    }
    let mx = mean(&x[..n]);
    let my = mean(&y[..n]);
    let (sxy, sxx) = x
        .iter()
        .zip(y.iter())
        .fold((0.0, 0.0), |(sxy, sxx), (&xi, &yi)| {
            (sxy + (xi - mx) * (yi - my), sxx + (xi - mx) * (xi - mx))
        });
    if sxx.abs() < f64::EPSILON * n as f64 * mx.abs().max(1.0) {
        return None;
    }
    let slope = sxy / sxx;
    Some((slope, my - slope * mx))
}

/// Full width at `level` around the sample `peak` of an x-sorted curve.
///
/// Walks outwards until the curve drops below `level` on each side and
/// interpolates linearly between the straddling samples. `None` if either
/// side never crosses.
pub fn width_at_level(x: &[f64], y: &[f64], peak: usize, level: f64) -> Option<f64> {
    let left = (0..peak).rev().find(|&i| y[i] < level).map(|i| {
        interpolate_crossing(x[i], y[i], x[i + 1], y[i + 1], level)
    })?;
    let right = (peak + 1..y.len()).find(|&i| y[i] < level).map(|i| {
        interpolate_crossing(x[i - 1], y[i - 1], x[i], y[i], level)
    })?;
    let width = right - left;
    (width > 0.0).then_some(width)
}

fn interpolate_crossing(x0: f64, y0: f64, x1: f64, y1: f64, level: f64) -> f64 {
    if (y1 - y0).abs() < f64::MIN_POSITIVE {
        return 0.5 * (x0 + x1);
    }
    x0 + (level - y0) * (x1 - x0) / (y1 - y0)
}

/// First x (after the start) where the curve falls to `level`, scanning from the left.
pub fn first_crossing_below(x: &[f64], y: &[f64], level: f64) -> Option<f64> {
    (1..y.len())
        .find(|&i| y[i] <= level && y[i - 1] > level)
        .map(|i| interpolate_crossing(x[i - 1], y[i - 1], x[i], y[i], level))
}

/// First x where the curve rises to `level`, scanning from the left.
pub fn first_crossing_above(x: &[f64], y: &[f64], level: f64) -> Option<f64> {
    (1..y.len())
        .find(|&i| y[i] >= level && y[i - 1] < level)
        .map(|i| interpolate_crossing(x[i - 1], y[i - 1], x[i], y[i], level))
}

/// Decay time of the oscillation envelope, from the RMS deviation of the
/// first and second half of an x-sorted curve around `offset`.
pub fn envelope_lifetime(x: &[f64], y: &[f64], offset: f64) -> Option<f64> {
    let n = y.len();
    if n < 4 {
        return None;
    }
    let half = n / 2;
    let rms = |ys: &[f64]| (ys.iter().map(|v| (v - offset).powi(2)).sum::<f64>() / ys.len() as f64).sqrt();
    let (rms_early, rms_late) = (rms(&y[..half]), rms(&y[half..]));
    let (t_early, t_late) = (mean(&x[..half]), mean(&x[half..]));
    if rms_late > 0.0 && rms_early > rms_late && t_late > t_early {
        Some((t_late - t_early) / (rms_early / rms_late).ln())
    } else {
        None
    }
}
