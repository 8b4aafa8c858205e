//! Windowed statistics on pulse traces.

use approx::assert_relative_eq;
use ndarray::{array, Array2};
use pulsefit::pulsed::{analyse_mean, analyse_mean_norm, analyse_mean_reference};
use pulsefit::{AnalysisWindows, PulseAnalysisMethod, WindowedSignal};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Poisson};

/// Photon counts of `rows` laser pulses: a bright plateau over the first
/// 200 ns that relaxes to a dimmer steady level, 1 ns bins.
fn laser_traces(rows: usize, seed: u64) -> Array2<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    Array2::from_shape_fn((rows, 600), |(row, bin)| {
        let contrast = 1.0 - 0.02 * (row % 10) as f64;
        let rate = if bin < 200 { 40.0 * contrast } else { 30.0 };
        let counts: f64 = Poisson::new(rate).unwrap().sample(&mut rng);
        counts
    })
}

#[test]
fn test_raw_mean_of_step_trace() {
    let trace = array![[0.0, 0.0, 0.0, 5.0, 5.0, 5.0, 0.0, 0.0, 0.0, 0.0]];
    let out = analyse_mean(&trace, 3.0, 6.0, 1.0);
    assert_eq!(out.signal[0], 5.0);
    assert_relative_eq!(out.error[0], 15f64.sqrt() / 3.0);
}

#[test]
fn test_reference_subtraction() {
    let trace = array![[5.0, 5.0, 5.0, 5.0, 2.0, 2.0, 2.0, 2.0]];
    let out = analyse_mean_reference(&trace, 0.0, 4.0, 4.0, 8.0, 1.0);
    assert_relative_eq!(out.signal[0], 3.0);
    assert!(out.error[0].is_finite() && out.error[0] > 0.0);
}

#[test]
fn test_normalization_needs_positive_reference() {
    let traces = array![
        [9.0, 9.0, 0.0, 0.0],
        [9.0, 9.0, -3.0, -3.0],
        [0.0, 0.0, 2.0, 2.0],
    ];
    let out = analyse_mean_norm(&traces, 0.0, 2.0, 2.0, 4.0, 1.0);
    assert_eq!(out.signal.to_vec(), vec![0.0, 0.0, 0.0]);
    assert_eq!(out.error.to_vec(), vec![0.0, 0.0, 0.0]);
}

#[test]
fn test_unusable_bin_width_gives_zero_rows() {
    let traces = laser_traces(7, 1);
    for bin_width in [f64::NAN, 0.0, -1e-9] {
        let windows = AnalysisWindows::default().with_bin_width(bin_width);
        for method in PulseAnalysisMethod::ALL {
            let out = method.analyse(&traces, &windows);
            assert_eq!(out, WindowedSignal::zeros(7), "{method} at {bin_width}");
        }
    }
}

#[test]
fn test_identical_inputs_give_identical_outputs() {
    let traces = laser_traces(64, 3);
    let windows = AnalysisWindows::default();
    for method in PulseAnalysisMethod::ALL {
        let first = method.analyse(&traces, &windows);
        let second = method.analyse(&traces.view(), &windows);
        assert_eq!(first, second, "{method}");
        let bits = |s: &WindowedSignal| s.signal.iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&first), bits(&second));
    }
}

#[test]
fn test_default_windows_on_laser_traces() {
    let traces = laser_traces(40, 5);
    let windows = AnalysisWindows::default();

    let norm = PulseAnalysisMethod::MeanNorm.analyse(&traces, &windows);
    let reference = PulseAnalysisMethod::MeanReference.analyse(&traces, &windows);
    assert_eq!(norm.len(), 40);

    for row in 0..40 {
        let contrast = 1.0 - 0.02 * (row % 10) as f64;
        assert_relative_eq!(norm.signal[row], 40.0 * contrast / 30.0, max_relative = 0.1);
        assert_relative_eq!(reference.signal[row], 40.0 * contrast - 30.0, epsilon = 3.0);
        assert!(norm.error[row] > 0.0 && norm.error[row] < 0.1);
    }
}

#[test]
fn test_windows_outside_the_trace() {
    let traces = Array2::from_elem((3, 100), 4.0);
    let windows = AnalysisWindows::default()
        .with_signal(150e-9, 200e-9)
        .with_norm(0.0, 100e-9);

    let mean = PulseAnalysisMethod::Mean.analyse(&traces, &windows);
    assert_eq!(mean, WindowedSignal::zeros(3));

    let reference = PulseAnalysisMethod::MeanReference.analyse(&traces, &windows);
    assert_eq!(reference.signal.to_vec(), vec![-4.0; 3]);
}
