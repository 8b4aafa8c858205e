//! Fit container behaviour: bounded retries, overrides and specifications.

use std::sync::atomic::{AtomicUsize, Ordering};

use approx::assert_relative_eq;
use pulsefit::{
    Dimensionality, FitContainer, FitError, FitSettings, FitSpecification, ModelKind,
    ParameterOverride, Result, RetryPolicy, Solver, SolverInput, SolverOutput,
};

use crate::test_helpers::synthetic;

/// Solver that counts its calls and succeeds from call `succeed_on` onwards.
struct CountingSolver {
    calls: AtomicUsize,
    succeed_on: Option<usize>,
    error: bool,
}

impl CountingSolver {
    fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            succeed_on: None,
            error: false,
        }
    }

    fn raising() -> Self {
        Self {
            error: true,
            ..Self::failing()
        }
    }

    fn succeeding_on(call: usize) -> Self {
        Self {
            succeed_on: Some(call),
            ..Self::failing()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Solver for CountingSolver {
    fn solve(&self, input: SolverInput<'_>) -> Result<SolverOutput> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let converged = self.succeed_on.is_some_and(|n| call >= n);
        if !converged && self.error {
            return Err(FitError::NumericalFault("singular matrix".to_string()));
        }
        Ok(SolverOutput {
            parameters: input.parameters,
            converged,
            message: format!("call {call}"),
            chi_square: 0.0,
            reduced_chi_square: 0.0,
            iterations: 1,
        })
    }
}

fn decay_container<S: Solver>(solver: S) -> FitContainer<S> {
    let mut container = FitContainer::with_solver(solver);
    container
        .select("decayexponential", "generic", Dimensionality::OneD)
        .unwrap();
    container
}

#[test]
fn test_persistent_failure_stops_after_two_calls() {
    let solver = CountingSolver::failing();
    let mut container = decay_container(&solver);
    let (x, y) = synthetic(ModelKind::DecayExponential);

    match container.run(x, y) {
        Err(FitError::FitDidNotConverge { attempts, message, .. }) => {
            assert_eq!(attempts, 2);
            assert_eq!(message, "call 2");
        }
        other => panic!("expected FitDidNotConverge, got {other:?}"),
    }
    assert_eq!(solver.calls(), 2);
    assert!(container.last_result().is_none());
}

#[test]
fn test_solver_errors_are_retried_too() {
    let solver = CountingSolver::raising();
    let mut container = decay_container(&solver);
    let (x, y) = synthetic(ModelKind::DecayExponential);

    let err = container.run(x, y).unwrap_err();
    assert!(err.to_string().contains("singular matrix"), "{err}");
    assert_eq!(solver.calls(), 2);
}

#[test]
fn test_success_calls_solver_once() {
    let solver = CountingSolver::succeeding_on(1);
    let mut container = decay_container(&solver);
    let (x, y) = synthetic(ModelKind::DecayExponential);

    let result = container.run(x, y).unwrap();
    assert_eq!(solver.calls(), 1);
    assert_eq!(result.attempts, 1);
}

#[test]
fn test_second_attempt_can_succeed() {
    let solver = CountingSolver::succeeding_on(2);
    let mut container = decay_container(&solver);
    let (x, y) = synthetic(ModelKind::DecayExponential);

    let result = container.run(x, y).unwrap();
    assert_eq!(solver.calls(), 2);
    assert_eq!(result.attempts, 2);
    assert_eq!(result.message, "call 2");
}

#[test]
fn test_retry_policy_bounds_calls() {
    let solver = CountingSolver::failing();
    let mut container = decay_container(&solver)
        .with_settings(FitSettings::default().with_retry(RetryPolicy::new(5)));
    let (x, y) = synthetic(ModelKind::DecayExponential);

    assert!(container.run(x.clone(), y.clone()).is_err());
    assert_eq!(solver.calls(), 5);

    let solver = CountingSolver::failing();
    let mut container = decay_container(&solver)
        .with_settings(FitSettings::default().with_retry(RetryPolicy::no_retry()));
    assert!(container.run(x, y).is_err());
    assert_eq!(solver.calls(), 1);
}

#[test]
fn test_fixed_override_survives_the_fit() {
    let (x, y) = synthetic(ModelKind::DecayExponential);
    let mut container = FitContainer::new();
    container
        .select("decayexponential", "generic", Dimensionality::OneD)
        .unwrap();
    container
        .configure_parameters([("offset", ParameterOverride::fixed_at(0.1))])
        .unwrap();

    let result = container.run(x, y).unwrap();
    assert_eq!(result.value("offset"), Some(0.1));
    assert!(result.stderr("offset").is_none());
    assert_relative_eq!(result.value("lifetime").unwrap(), 1.5, epsilon = 1e-5);
}

#[test]
fn test_overrides_reach_the_solver_input() {
    let solver = CountingSolver::succeeding_on(1);
    let mut container = decay_container(&solver);
    container
        .configure_parameters([
            ("lifetime", ParameterOverride::starting_at(4.0).with_bounds(1.0, 9.0)),
            ("amplitude", ParameterOverride::fixed_at(2.5)),
        ])
        .unwrap();
    let (x, y) = synthetic(ModelKind::DecayExponential);

    // The counting solver hands its input back unchanged.
    let result = container.run(x, y).unwrap();
    let lifetime = result.parameters.get("lifetime").unwrap();
    assert_eq!(lifetime.value(), 4.0);
    assert!(!lifetime.fixed);
    assert_eq!(lifetime.bounds().min, 1.0);
    assert_eq!(lifetime.bounds().max, 9.0);
    assert!(result.parameters.get("amplitude").unwrap().fixed);
}

#[test]
fn test_reselect_drops_overrides() {
    let mut container = FitContainer::new();
    container
        .select("gaussian", "dip", Dimensionality::OneD)
        .unwrap();
    container
        .configure_parameters([("sigma", ParameterOverride::default().with_min(0.1))])
        .unwrap();
    assert_eq!(container.job().unwrap().use_settings().len(), 1);

    container.select("gaussian", "peak", Dimensionality::OneD).unwrap();
    assert!(container.job().unwrap().use_settings().is_empty());
}

#[test]
fn test_container_from_json_specification() {
    let json = r#"{
        "fit_function": "decayexponential",
        "parameters": { "offset": { "value": 0.1, "fixed": true } }
    }"#;
    let specification = FitSpecification::from_json(json).unwrap();
    let mut container = FitContainer::from_specification(&specification).unwrap();

    let (x, y) = synthetic(ModelKind::DecayExponential);
    let result = container.run(x, y).unwrap();
    assert_eq!(result.value("offset"), Some(0.1));
    assert_relative_eq!(result.value("amplitude").unwrap(), 2.0, epsilon = 1e-5);
}

#[test]
fn test_bad_specification_leaves_container_unchanged() {
    let mut container = FitContainer::new();
    container.select("linear", "generic", Dimensionality::OneD).unwrap();

    let specification = FitSpecification::new("gaussian")
        .with_parameter("width", ParameterOverride::fixed_at(1.0));
    assert!(matches!(
        container.apply_specification(&specification),
        Err(FitError::UnknownParameter { .. })
    ));
    assert_eq!(container.job().unwrap().model().name, "linear");
}

#[test]
fn test_result_serializes() {
    let (x, y) = synthetic(ModelKind::Linear);
    let mut container = FitContainer::new();
    container.select("linear", "generic", Dimensionality::OneD).unwrap();
    let result = container.run(x, y).unwrap();

    let json = result.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["model"], "linear");
    assert_eq!(value["estimator"], "generic");
    assert_eq!(value["dimensionality"], "1d");
}
