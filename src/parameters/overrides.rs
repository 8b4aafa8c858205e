//! User-supplied per-parameter settings (`use_settings`).

use serde::{Deserialize, Serialize};

/// Overrides applied on top of the estimator's initial values.
///
/// Every field is optional; `None` keeps whatever the estimator produced.
///
/// ```
/// use pulsefit::parameters::ParameterOverride;
///
/// let setting: ParameterOverride = serde_json::from_str(r#"{"fixed": true, "value": 0.5}"#).unwrap();
/// assert_eq!(setting, ParameterOverride::fixed_at(0.5));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParameterOverride {
    pub value: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub fixed: Option<bool>,
}

impl ParameterOverride {
    /// Hold the parameter constant at `value`.
    pub fn fixed_at(value: f64) -> Self {
        Self {
            value: Some(value),
            fixed: Some(true),
            ..Self::default()
        }
    }

    /// Free the parameter, starting the search from `value`.
    pub fn starting_at(value: f64) -> Self {
        Self {
            value: Some(value),
            fixed: Some(false),
            ..Self::default()
        }
    }

    pub fn with_bounds(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn with_min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn with_max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// True when the override changes nothing.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
