//! Every registered model and estimator agree on their parameters.

use std::collections::BTreeSet;

use pulsefit::{
    list_models, Dimensionality, EstimatorMode, EstimatorSet, FitError, ModelCatalog, ModelKind,
};

use crate::test_helpers::synthetic;

#[test]
fn test_catalog_matches_model_kinds() {
    let catalog = ModelCatalog::global();
    assert_eq!(catalog.len(), ModelKind::ALL.len());
    for kind in ModelKind::ALL {
        let spec = catalog.lookup(kind.name()).unwrap();
        assert_eq!(spec.param_names, kind.spec().param_names);
        assert_eq!(spec.dimensionality, kind.spec().dimensionality);

        let unique: BTreeSet<_> = spec.param_names.iter().collect();
        assert_eq!(unique.len(), spec.param_names.len(), "{kind}");
    }
}

#[test]
fn test_every_estimator_sets_exactly_the_model_parameters() {
    let estimators = EstimatorSet::global();
    for kind in ModelKind::ALL {
        let spec = kind.spec();
        let (x, y) = synthetic(kind);
        let modes = estimators.modes(spec.name);
        assert!(!modes.is_empty(), "{kind} has no estimator");

        for mode in modes {
            let mut params = spec.parameters();
            estimators
                .estimate(&spec, mode.as_str(), &x, &y, &mut params)
                .unwrap_or_else(|e| panic!("{kind}/{mode}: {e}"));

            let expected: BTreeSet<&str> = spec.param_names.iter().copied().collect();
            let seeded: BTreeSet<&str> = params
                .iter()
                .filter(|p| p.is_initialized())
                .map(|p| p.name())
                .collect();
            assert_eq!(seeded, expected, "{kind}/{mode}");
            assert!(params.values().iter().all(|v| v.is_finite()), "{kind}/{mode}");
        }
    }
}

#[test]
fn test_antibunching_only_has_a_dip_estimator() {
    let modes = EstimatorSet::global().modes("antibunching");
    assert_eq!(modes, vec![EstimatorMode::Dip]);
    assert!(matches!(
        EstimatorSet::global().lookup("antibunching", "generic"),
        Err(FitError::UnknownEstimator { .. })
    ));
}

#[test]
fn test_listing_by_dimensionality() {
    let one_d = list_models(Dimensionality::OneD);
    let two_d = list_models(Dimensionality::TwoD);
    assert_eq!(two_d, vec!["twoDgaussian"]);
    assert_eq!(one_d.len() + two_d.len(), ModelKind::ALL.len());
    assert!(one_d.contains(&"decayexponential"));
    assert!(!one_d.contains(&"twoDgaussian"));
}

#[test]
fn test_names_parse_back_to_kinds() {
    for kind in ModelKind::ALL {
        assert_eq!(kind.name().parse::<ModelKind>().unwrap(), kind);
    }
    assert!(matches!(
        "parabola".parse::<ModelKind>(),
        Err(FitError::UnknownModel { .. })
    ));
}
