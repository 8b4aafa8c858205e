//! Per-row window statistics of pulsed laser traces.
//!
//! Each row of the input is one pulse trace (photon counts per time bin).
//! Rows are independent and are processed in parallel; output order always
//! follows input row order.

use std::fmt;
use std::str::FromStr;

use ndarray::{Array1, ArrayView1, ArrayView2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::window::{bin_range, is_valid_bin_width, AnalysisWindows};

/// Signal and error per trace row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowedSignal {
    pub signal: Array1<f64>,
    pub error: Array1<f64>,
}

impl WindowedSignal {
    pub fn zeros(rows: usize) -> Self {
        Self {
            signal: Array1::zeros(rows),
            error: Array1::zeros(rows),
        }
    }

    pub fn len(&self) -> usize {
        self.signal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signal.is_empty()
    }

    fn from_pairs(pairs: Vec<(f64, f64)>) -> Self {
        let (signal, error): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
        Self {
            signal: Array1::from(signal),
            error: Array1::from(error),
        }
    }
}

/// Which statistic to extract from each trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PulseAnalysisMethod {
    #[default]
    Mean,
    MeanReference,
    MeanNorm,
}

impl PulseAnalysisMethod {
    pub const ALL: [PulseAnalysisMethod; 3] = [Self::Mean, Self::MeanReference, Self::MeanNorm];

    pub fn name(self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::MeanReference => "mean_reference",
            Self::MeanNorm => "mean_norm",
        }
    }

    /// Run this method with the given windows.
    pub fn analyse<'a>(
        self,
        data: impl Into<ArrayView2<'a, f64>>,
        windows: &AnalysisWindows,
    ) -> WindowedSignal {
        let w = windows;
        match self {
            Self::Mean => analyse_mean(data, w.signal_start, w.signal_end, w.bin_width),
            Self::MeanReference => analyse_mean_reference(
                data,
                w.signal_start,
                w.signal_end,
                w.norm_start,
                w.norm_end,
                w.bin_width,
            ),
            Self::MeanNorm => analyse_mean_norm(
                data,
                w.signal_start,
                w.signal_end,
                w.norm_start,
                w.norm_end,
                w.bin_width,
            ),
        }
    }
}

impl fmt::Display for PulseAnalysisMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PulseAnalysisMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| format!("unknown pulse analysis method '{s}'"))
    }
}

/// Sum and mean of a bin slice. The mean of an empty slice is NaN.
fn window_stats(row: ArrayView1<'_, f64>, bins: std::ops::Range<usize>) -> (f64, f64) {
    let width = bins.len();
    let sum: f64 = row.slice(ndarray::s![bins]).sum();
    (sum, sum / width as f64)
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn per_row<'a, F>(data: ArrayView2<'a, f64>, row_fn: F) -> WindowedSignal
where
    F: Fn(ArrayView1<'_, f64>) -> (f64, f64) + Sync,
{
    let pairs: Vec<(f64, f64)> = (0..data.nrows())
        .into_par_iter()
        .map(|i| row_fn(data.row(i)))
        .collect();
    WindowedSignal::from_pairs(pairs)
}

/// Mean counts inside the signal window, with Poisson error
/// `sqrt(sum) / width`.
///
/// Rows whose window is empty, or whose mean is negative or NaN, give
/// `(0, 0)`. A bin width that is not finite and positive gives all zeros.
///
/// # Arguments
///
/// * `data` - Traces, one per row
/// * `signal_start`, `signal_end` - Signal window in seconds
/// * `bin_width` - Width of one bin in seconds
pub fn analyse_mean<'a>(
    data: impl Into<ArrayView2<'a, f64>>,
    signal_start: f64,
    signal_end: f64,
    bin_width: f64,
) -> WindowedSignal {
    let data = data.into();
    if !is_valid_bin_width(bin_width) {
        debug!(bin_width, "invalid bin width, returning zeros");
        return WindowedSignal::zeros(data.nrows());
    }
    let bins = bin_range(signal_start, signal_end, bin_width, data.ncols());

    per_row(data, |row| {
        let width = bins.len();
        let (sum, mean) = window_stats(row, bins.clone());
        if mean.is_nan() || mean < 0.0 {
            return (0.0, 0.0);
        }
        (mean, finite_or_zero(sum.sqrt() / width as f64))
    })
}

/// Signal mean minus reference mean.
///
/// The error propagates Poisson statistics of both windows:
/// `signal * sqrt(1/|sum_signal| + 1/|sum_reference|)`, so the error carries
/// the sign of the signal. Empty windows have a mean of 0, and any non-finite
/// signal or error becomes 0.
pub fn analyse_mean_reference<'a>(
    data: impl Into<ArrayView2<'a, f64>>,
    signal_start: f64,
    signal_end: f64,
    norm_start: f64,
    norm_end: f64,
    bin_width: f64,
) -> WindowedSignal {
    let data = data.into();
    if !is_valid_bin_width(bin_width) {
        debug!(bin_width, "invalid bin width, returning zeros");
        return WindowedSignal::zeros(data.nrows());
    }
    let signal_bins = bin_range(signal_start, signal_end, bin_width, data.ncols());
    let norm_bins = bin_range(norm_start, norm_end, bin_width, data.ncols());

    per_row(data, |row| {
        let (signal_sum, signal_mean) = window_stats(row, signal_bins.clone());
        let (norm_sum, norm_mean) = window_stats(row, norm_bins.clone());
        let signal_mean = if signal_bins.is_empty() { 0.0 } else { signal_mean };
        let norm_mean = if norm_bins.is_empty() { 0.0 } else { norm_mean };

        let signal = finite_or_zero(signal_mean - norm_mean);
        let error = signal * (1.0 / signal_sum.abs() + 1.0 / norm_sum.abs()).sqrt();
        (signal, finite_or_zero(error))
    })
}

/// Signal mean divided by reference mean.
///
/// The ratio is only taken when the reference mean is positive and the
/// signal mean non-negative; otherwise the row gives `(0, 0)`. The error
/// `signal * sqrt(1/sum_signal + 1/sum_reference)` additionally needs both
/// window sums to be positive, and is 0 otherwise.
pub fn analyse_mean_norm<'a>(
    data: impl Into<ArrayView2<'a, f64>>,
    signal_start: f64,
    signal_end: f64,
    norm_start: f64,
    norm_end: f64,
    bin_width: f64,
) -> WindowedSignal {
    let data = data.into();
    if !is_valid_bin_width(bin_width) {
        debug!(bin_width, "invalid bin width, returning zeros");
        return WindowedSignal::zeros(data.nrows());
    }
    let signal_bins = bin_range(signal_start, signal_end, bin_width, data.ncols());
    let norm_bins = bin_range(norm_start, norm_end, bin_width, data.ncols());

    per_row(data, |row| {
        let (signal_sum, signal_mean) = window_stats(row, signal_bins.clone());
        let (norm_sum, norm_mean) = window_stats(row, norm_bins.clone());

        // NaN means fail both comparisons.
        let signal = if norm_mean > 0.0 && signal_mean >= 0.0 {
            finite_or_zero(signal_mean / norm_mean)
        } else {
            0.0
        };
        let error = if norm_sum > 0.0 && signal_sum > 0.0 {
            signal * (1.0 / signal_sum + 1.0 / norm_sum).sqrt()
        } else {
            0.0
        };
        (signal, finite_or_zero(error))
    })
}
