//! Fits of synthetic data through the one-call entry point.

use approx::assert_relative_eq;
use ndarray::Array1;
use pulsefit::{
    perform_fit, perform_fit_with, Abscissa, Dimensionality, FitError, FitSettings,
    LevenbergMarquardt, LmConfig, ModelKind, RetryPolicy,
};

use crate::test_helpers::{nominal, synthetic, with_noise};

fn assert_recovers(kind: ModelKind, estimator: &str) {
    let (x, y) = synthetic(kind);
    let spec = kind.spec();
    let result = perform_fit(x, y, spec.name, estimator, spec.dimensionality)
        .unwrap_or_else(|e| panic!("{kind}: {e}"));

    assert!(result.success, "{kind}: {}", result.message);
    for (name, truth) in spec.param_names.iter().zip(nominal(kind)) {
        let fitted = result.value(name).unwrap();
        assert_relative_eq!(fitted, truth, epsilon = 1e-5, max_relative = 1e-5);
    }
}

#[test]
fn test_zero_noise_decay() {
    assert_recovers(ModelKind::DecayExponential, "generic");
}

#[test]
fn test_zero_noise_gaussian() {
    assert_recovers(ModelKind::Gaussian, "generic");
    assert_recovers(ModelKind::Gaussian, "peak");
}

#[test]
fn test_zero_noise_lorentzian_dip() {
    assert_recovers(ModelKind::Lorentzian, "dip");
}

#[test]
fn test_zero_noise_gaussian_with_slope() {
    assert_recovers(ModelKind::GaussianLinearOffset, "generic");
}

#[test]
fn test_zero_noise_linear_and_saturation() {
    assert_recovers(ModelKind::Linear, "generic");
    assert_recovers(ModelKind::HyperbolicSaturation, "generic");
}

#[test]
fn test_zero_noise_two_d_gaussian() {
    let (x, y) = synthetic(ModelKind::TwoDGaussian);
    let result = perform_fit(x, y, "twoDgaussian", "generic", Dimensionality::TwoD).unwrap();
    let value = |name: &str| result.value(name).unwrap();

    assert!(result.success, "{}", result.message);
    assert_relative_eq!(value("center_x"), 1.5, epsilon = 1e-5);
    assert_relative_eq!(value("center_y"), 2.0, epsilon = 1e-5);
    assert_relative_eq!(value("amplitude"), 5.0, epsilon = 1e-5);
    assert_relative_eq!(value("offset"), 1.0, epsilon = 1e-5);
    // The ellipse is unchanged by half turns.
    assert_relative_eq!((2.0 * value("theta")).sin(), 0.0, epsilon = 1e-5);
    assert_relative_eq!(value("sigma_x").abs(), 1.2, epsilon = 1e-5);
    assert_relative_eq!(value("sigma_y").abs(), 0.8, epsilon = 1e-5);
}

#[test]
fn test_zero_noise_sine() {
    // Phase and amplitude sign are only defined up to a half turn, so the
    // check is on the curve itself.
    let kind = ModelKind::Sine;
    let (x, y) = synthetic(kind);
    let result = perform_fit(x.clone(), y.clone(), "sine", "generic", Dimensionality::OneD).unwrap();

    assert!(result.success, "{}", result.message);
    assert_relative_eq!(result.value("frequency").unwrap(), 0.8, epsilon = 1e-6);
    assert_relative_eq!(result.value("amplitude").unwrap().abs(), 1.0, epsilon = 1e-6);
    assert_relative_eq!(result.value("offset").unwrap(), 0.5, epsilon = 1e-6);

    let refit = kind.spec().eval_with(&x, &result.parameters).unwrap();
    for (a, b) in refit.iter().zip(y.iter()) {
        assert_relative_eq!(a, b, epsilon = 1e-6);
    }
}

#[test]
fn test_zero_noise_every_model() {
    // Multi-component and oscillating models are only defined up to a swap of
    // components or a half turn of phase, so every model is checked on its curve.
    let single_component = [
        ModelKind::DecayExponential,
        ModelKind::DecayExponentialStretched,
        ModelKind::Gaussian,
        ModelKind::GaussianLinearOffset,
        ModelKind::HyperbolicSaturation,
        ModelKind::Linear,
        ModelKind::Lorentzian,
    ];
    for kind in ModelKind::ALL {
        let estimator = match kind {
            ModelKind::Antibunching => "dip",
            _ => "generic",
        };
        let spec = kind.spec();
        let (x, y) = synthetic(kind);
        let result = perform_fit(x.clone(), y.clone(), spec.name, estimator, spec.dimensionality)
            .unwrap_or_else(|e| panic!("{kind}: {e}"));
        assert!(result.success, "{kind}: {}", result.message);

        let scale = y.iter().fold(0.0, |m: f64, v| m.max(v.abs()));
        let refit = spec.eval_with(&x, &result.parameters).unwrap();
        for (a, b) in refit.iter().zip(y.iter()) {
            assert!((a - b).abs() <= 1e-5 * scale, "{kind}: {a} vs {b}");
        }

        if single_component.contains(&kind) {
            for (name, truth) in spec.param_names.iter().zip(nominal(kind)) {
                let fitted = result.value(name).unwrap();
                assert_relative_eq!(fitted, truth, epsilon = 1e-5, max_relative = 1e-5);
            }
        }
    }
}

#[test]
fn test_zero_noise_antibunching_dip() {
    let kind = ModelKind::Antibunching;
    let (x, y) = synthetic(kind);
    let result = perform_fit(x, y, "antibunching", "dip", Dimensionality::OneD).unwrap();

    assert!(result.success, "{}", result.message);
    assert_relative_eq!(result.value("n").unwrap(), 1.0, epsilon = 1e-4);
    assert_relative_eq!(result.value("a").unwrap(), 1.0, epsilon = 1e-4);
    assert_relative_eq!(result.value("tau0").unwrap(), 0.0, epsilon = 1e-4);
}

#[test]
fn test_fitted_curve_covers_the_data_range() {
    let (x, y) = synthetic(ModelKind::DecayExponential);
    let result = perform_fit(x, y, "decayexponential", "generic", Dimensionality::OneD).unwrap();

    let fit_x = result.fit_x.as_1d().unwrap();
    assert_eq!(fit_x.len(), 201 * 10);
    assert_eq!(result.fit_y.len(), fit_x.len());
    assert_relative_eq!(fit_x[0], 0.0);
    assert_relative_eq!(fit_x[fit_x.len() - 1], 10.0, epsilon = 1e-12);
    assert_relative_eq!(result.fit_y[0], 2.1, epsilon = 1e-5);
}

#[test]
fn test_two_d_fit_reuses_the_grid() {
    let (x, y) = synthetic(ModelKind::TwoDGaussian);
    let result = perform_fit(x.clone(), y, "twoDgaussian", "generic", Dimensionality::TwoD).unwrap();
    assert_eq!(result.fit_x, x);
    assert_eq!(result.fit_y.len(), x.len());
}

#[test]
fn test_noisy_decay_has_error_bars() {
    let (x, y) = synthetic(ModelKind::DecayExponential);
    let noisy = with_noise(&y, 0.01, 7);
    let result = perform_fit(x, noisy, "decayexponential", "generic", Dimensionality::OneD).unwrap();

    assert!(result.success);
    assert_relative_eq!(result.value("lifetime").unwrap(), 1.5, max_relative = 0.05);
    let stderr = result.stderr("lifetime").unwrap();
    assert!(stderr > 0.0 && stderr < 0.1, "stderr {stderr}");
    assert!(result.reduced_chi_square > 0.0);
}

#[test]
fn test_noisy_gaussian_center() {
    let (x, y) = synthetic(ModelKind::Gaussian);
    let noisy = with_noise(&y, 0.05, 11);
    let result = perform_fit(x, noisy, "gaussian", "peak", Dimensionality::OneD).unwrap();

    assert_relative_eq!(result.value("center").unwrap(), 5.0, epsilon = 0.05);
    assert_relative_eq!(result.value("sigma").unwrap(), 0.8, max_relative = 0.05);
}

#[test]
fn test_dimension_and_name_errors() {
    let x = Array1::linspace(0.0, 1.0, 10);
    let y = x.clone();
    assert!(matches!(
        perform_fit(x.clone(), y.clone(), "gaussian", "generic", Dimensionality::TwoD),
        Err(FitError::DimensionMismatch { .. })
    ));
    assert!(matches!(
        perform_fit(x.clone(), y.clone(), "voigt", "generic", Dimensionality::OneD),
        Err(FitError::UnknownModel { .. })
    ));
    assert!(matches!(
        perform_fit(x, y, "gaussian", "hill", Dimensionality::OneD),
        Err(FitError::UnknownEstimator { .. })
    ));
}

#[test]
fn test_mismatched_lengths_are_rejected() {
    let result = perform_fit(
        vec![0.0, 1.0, 2.0],
        vec![1.0, 2.0],
        "linear",
        "generic",
        Dimensionality::OneD,
    );
    assert!(matches!(result, Err(FitError::InvalidInputShape { .. })));
}

#[test]
fn test_iteration_limit_reports_failure() {
    let (x, y) = synthetic(ModelKind::DecayExponential);
    let solver = LevenbergMarquardt::with_config(LmConfig::default().with_max_iterations(1));
    let settings = FitSettings::default().with_retry(RetryPolicy::no_retry());

    let result = perform_fit_with(
        x,
        y,
        "decayexponential",
        "generic",
        Dimensionality::OneD,
        &solver,
        &settings,
    );
    match result {
        Err(FitError::FitDidNotConverge { attempts, .. }) => assert_eq!(attempts, 1),
        // A good enough estimate can converge on the first step.
        Ok(result) => assert!(result.success),
        Err(other) => panic!("unexpected error {other}"),
    }
}

#[test]
fn test_abscissa_from_slices() {
    let x: Vec<f64> = (0..20).map(|i| i as f64).collect();
    let y: Vec<f64> = x.iter().map(|v| 3.0 - 0.25 * v).collect();
    let result = perform_fit(
        Abscissa::from(x.as_slice()),
        y,
        "linear",
        "generic",
        Dimensionality::OneD,
    )
    .unwrap();
    assert_relative_eq!(result.value("slope").unwrap(), -0.25, epsilon = 1e-9);
    assert_relative_eq!(result.value("offset").unwrap(), 3.0, epsilon = 1e-9);
}
