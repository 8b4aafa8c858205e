//! Windowed statistics of pulsed measurement traces.
//!
//! A pulsed measurement records, for every sweep point, a histogram of
//! photon arrival times after a laser pulse. The functions here reduce each
//! trace to one value and its error using a signal window and, optionally,
//! a reference window later in the pulse.

mod analysis;
mod window;

pub use analysis::{
    analyse_mean, analyse_mean_norm, analyse_mean_reference, PulseAnalysisMethod,
    WindowedSignal,
};
pub use window::{bin_range, is_valid_bin_width, time_to_bin, AnalysisWindows};
