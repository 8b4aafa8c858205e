//! Per-parameter fit state and the ordered set handed to the solver.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::{FitError, Result};
use crate::parameters::bounds::{Bounds, BoundsError};
use crate::parameters::overrides::ParameterOverride;

/// The state of one model parameter during a fit.
///
/// A freshly created state is *uninitialized*: its value is NaN until an
/// estimator or an override writes a finite value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterState {
    name: String,
    value: f64,
    bounds: Bounds,
    /// Fixed parameters are passed to the solver as constants.
    pub fixed: bool,
    /// Standard error of the fitted value, set by the solver.
    pub stderr: Option<f64>,
}

impl ParameterState {
    /// Create a free, unbounded parameter with the given value.
    pub fn new(name: &str, value: f64) -> Self {
        Self {
            name: name.to_string(),
            value,
            bounds: Bounds::unbounded(),
            fixed: false,
            stderr: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn is_initialized(&self) -> bool {
        self.value.is_finite()
    }

    /// Set the value of the parameter.
    ///
    /// # Errors
    ///
    /// Fails if the value is not finite or lies outside the current bounds.
    pub fn set_value(&mut self, value: f64) -> std::result::Result<(), BoundsError> {
        if !value.is_finite() {
            return Err(BoundsError::NonFiniteValue);
        }
        if !self.bounds.contains(value) {
            return Err(BoundsError::ValueOutsideBounds {
                value,
                min: self.bounds.min,
                max: self.bounds.max,
            });
        }
        self.value = value;
        Ok(())
    }

    /// Replace the bounds, pulling an initialized value inside them.
    pub fn set_bounds(&mut self, bounds: Bounds) -> &mut Self {
        self.bounds = bounds;
        if self.is_initialized() {
            self.value = bounds.clamp(self.value);
        }
        self
    }

    pub fn set_min(&mut self, min: f64) -> &mut Self {
        let max = self.bounds.max.max(min);
        self.set_bounds(Bounds { min, max })
    }

    pub fn set_max(&mut self, max: f64) -> &mut Self {
        let min = self.bounds.min.min(max);
        self.set_bounds(Bounds { min, max })
    }

    /// Value written by the solver; bypasses the bounds check because the
    /// solver's transform already guarantees it.
    pub(crate) fn set_fitted(&mut self, value: f64, stderr: Option<f64>) {
        self.value = value;
        self.stderr = stderr;
    }
}

/// Ordered parameters of one model, in the model's declared order.
///
/// This is the value object a fit job moves into the solver call; the solver
/// hands back a new set carrying the fitted values and uncertainties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    model: String,
    params: Vec<ParameterState>,
}

impl ParameterSet {
    /// A set of uninitialized parameters for `model`.
    pub fn uninitialized(model: &str, names: &[&str]) -> Self {
        Self {
            model: model.to_string(),
            params: names
                .iter()
                .map(|name| ParameterState::new(name, f64::NAN))
                .collect(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParameterState> {
        self.params.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ParameterState> {
        self.params.iter_mut()
    }

    pub fn names(&self) -> Vec<&str> {
        self.params.iter().map(|p| p.name()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&ParameterState> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ParameterState> {
        self.params.iter_mut().find(|p| p.name == name)
    }

    /// Value of a parameter, or NaN if absent.
    pub fn value(&self, name: &str) -> f64 {
        self.get(name).map_or(f64::NAN, |p| p.value)
    }

    /// Current values in declared order.
    pub fn values(&self) -> Array1<f64> {
        self.params.iter().map(|p| p.value).collect()
    }

    /// Initialize a parameter to `value` and return it for further setup.
    ///
    /// Any bounds set earlier stay in effect and clamp the value.
    pub fn init(&mut self, name: &str, value: f64) -> Result<&mut ParameterState> {
        let model = self.model.clone();
        let state = self
            .get_mut(name)
            .ok_or_else(|| FitError::UnknownParameter {
                model,
                name: name.to_string(),
            })?;
        if !value.is_finite() {
            return Err(FitError::NumericalFault(format!(
                "non-finite initial value {} for '{}'",
                value, name
            )));
        }
        state.value = state.bounds.clamp(value);
        Ok(state)
    }

    /// Names of the parameters that still have no finite value.
    pub fn missing(&self) -> Vec<String> {
        self.params
            .iter()
            .filter(|p| !p.is_initialized())
            .map(|p| p.name.clone())
            .collect()
    }

    /// Indices of the parameters the solver may vary.
    pub fn free_indices(&self) -> Vec<usize> {
        self.params
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.fixed)
            .map(|(i, _)| i)
            .collect()
    }

    pub(crate) fn by_index_mut(&mut self, index: usize) -> &mut ParameterState {
        &mut self.params[index]
    }

    pub(crate) fn by_index(&self, index: usize) -> &ParameterState {
        &self.params[index]
    }

    /// Apply a user override on top of the current (estimated) state.
    ///
    /// Bounds are applied first, then the value, then the fixed flag.
    pub fn apply_override(&mut self, name: &str, setting: &ParameterOverride) -> Result<()> {
        let model = self.model.clone();
        let state = self
            .get_mut(name)
            .ok_or_else(|| FitError::UnknownParameter {
                model,
                name: name.to_string(),
            })?;

        if setting.min.is_some() || setting.max.is_some() {
            let bounds = Bounds::new(
                setting.min.unwrap_or(state.bounds.min),
                setting.max.unwrap_or(state.bounds.max),
            )?;
            state.set_bounds(bounds);
        }
        if let Some(value) = setting.value {
            state.set_value(value)?;
        }
        if let Some(fixed) = setting.fixed {
            state.fixed = fixed;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ParameterSet {
    type Item = &'a ParameterState;
    type IntoIter = std::slice::Iter<'a, ParameterState>;

    fn into_iter(self) -> Self::IntoIter {
        self.params.iter()
    }
}
