//! Serializable description of a fit.
//!
//! ```json
//! {
//!   "fit_function": "gaussian",
//!   "estimator": "dip",
//!   "dimensionality": "1d",
//!   "parameters": {
//!     "offset": { "value": 1.0, "fixed": true },
//!     "sigma": { "min": 0.1, "max": 5.0 }
//!   }
//! }
//! ```
//!
//! Only `fit_function` is required; the estimator defaults to `generic` and
//! the dimensionality to `1d`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::Dimensionality;
use crate::parameters::ParameterOverride;

fn default_estimator() -> String {
    "generic".to_string()
}

/// Model, estimator and overrides of a fit, as loaded from configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FitSpecification {
    pub fit_function: String,
    #[serde(default = "default_estimator")]
    pub estimator: String,
    #[serde(default)]
    pub dimensionality: Dimensionality,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterOverride>,
}

impl FitSpecification {
    pub fn new(fit_function: &str) -> Self {
        Self {
            fit_function: fit_function.to_string(),
            estimator: default_estimator(),
            dimensionality: Dimensionality::default(),
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_estimator(mut self, estimator: &str) -> Self {
        self.estimator = estimator.to_string();
        self
    }

    pub fn with_dimensionality(mut self, dimensionality: Dimensionality) -> Self {
        self.dimensionality = dimensionality;
        self
    }

    pub fn with_parameter(mut self, name: &str, setting: ParameterOverride) -> Self {
        self.parameters.insert(name.to_string(), setting);
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FitError;
    use crate::fit::FitContainer;

    #[test]
    fn test_minimal_specification() {
        let spec = FitSpecification::from_json(r#"{"fit_function": "sine"}"#).unwrap();
        assert_eq!(spec, FitSpecification::new("sine"));
        assert_eq!(spec.estimator, "generic");
        assert_eq!(spec.dimensionality, Dimensionality::OneD);
    }

    #[test]
    fn test_full_specification() {
        let json = r#"{
            "fit_function": "twoDgaussian",
            "dimensionality": "2d",
            "parameters": {"theta": {"value": 0.0, "fixed": true}}
        }"#;
        let spec = FitSpecification::from_json(json).unwrap();
        assert_eq!(spec.dimensionality, Dimensionality::TwoD);
        assert_eq!(spec.parameters["theta"], ParameterOverride::fixed_at(0.0));

        let container = FitContainer::from_specification(&spec).unwrap();
        let job = container.job().unwrap();
        assert_eq!(job.model().name, "twoDgaussian");
        assert_eq!(job.use_settings().len(), 1);
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        assert!(matches!(
            FitSpecification::from_json(r#"{"fit_function": "sine", "method": "lm"}"#),
            Err(FitError::Json(_))
        ));
        assert!(FitSpecification::from_json(
            r#"{"fit_function": "sine", "parameters": {"phase": {"vary": false}}}"#
        )
        .is_err());
    }

    #[test]
    fn test_failed_specification_leaves_container_unchanged() {
        let mut container = FitContainer::new();
        container
            .apply_specification(&FitSpecification::new("linear"))
            .unwrap();

        let bad = FitSpecification::new("sine").with_parameter("slope", ParameterOverride::fixed_at(1.0));
        assert!(matches!(
            container.apply_specification(&bad),
            Err(FitError::UnknownParameter { .. })
        ));
        assert_eq!(container.job().unwrap().model().name, "linear");
    }

    #[test]
    fn test_json_round_trip() {
        let spec = FitSpecification::new("lorentzian")
            .with_estimator("dip")
            .with_parameter("sigma", ParameterOverride::default().with_min(0.5));
        let back = FitSpecification::from_json(&spec.to_json().unwrap()).unwrap();
        assert_eq!(back, spec);
    }
}
