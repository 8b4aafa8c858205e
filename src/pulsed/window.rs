//! Time windows and their conversion to bin ranges.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Signal and normalization windows of a pulsed measurement, in seconds.
///
/// The defaults match a typical laser readout: signal over the first 200 ns
/// of the pulse, reference from 300 ns to 500 ns, 1 ns bins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisWindows {
    pub signal_start: f64,
    pub signal_end: f64,
    pub norm_start: f64,
    pub norm_end: f64,
    pub bin_width: f64,
}

impl Default for AnalysisWindows {
    fn default() -> Self {
        Self {
            signal_start: 0.0,
            signal_end: 200e-9,
            norm_start: 300e-9,
            norm_end: 500e-9,
            bin_width: 1e-9,
        }
    }
}

impl AnalysisWindows {
    pub fn with_signal(mut self, start: f64, end: f64) -> Self {
        self.signal_start = start;
        self.signal_end = end;
        self
    }

    pub fn with_norm(mut self, start: f64, end: f64) -> Self {
        self.norm_start = start;
        self.norm_end = end;
        self
    }

    pub fn with_bin_width(mut self, bin_width: f64) -> Self {
        self.bin_width = bin_width;
        self
    }
}

/// True when `bin_width` can convert times to bins.
pub fn is_valid_bin_width(bin_width: f64) -> bool {
    bin_width.is_finite() && bin_width > 0.0
}

/// Bin index of `time`: `time / bin_width` rounded half to even, clipped to
/// `[0, len]`.
pub fn time_to_bin(time: f64, bin_width: f64, len: usize) -> usize {
    let bin = (time / bin_width).round_ties_even();
    if bin.is_nan() || bin <= 0.0 {
        0
    } else {
        // Saturates for huge values before clipping.
        (bin as usize).min(len)
    }
}

/// Half-open bin range `[start, end)` of a time window within a trace of
/// `len` bins. A window ending before it starts is empty.
pub fn bin_range(start: f64, end: f64, bin_width: f64, len: usize) -> Range<usize> {
    let start = time_to_bin(start, bin_width, len);
    let end = time_to_bin(end, bin_width, len).max(start);
    start..end
}
