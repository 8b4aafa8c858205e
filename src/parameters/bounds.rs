//! Parameter bounds and the bounded-to-unbounded search space mapping.
//!
//! Bounds are hard constraints: the solver never sees a bounded parameter
//! directly. Instead it searches an unconstrained internal coordinate that
//! [`BoundsTransform`] maps back into `[min, max]` (the Minuit/lmfit scheme).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when working with parameter bounds
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoundsError {
    #[error("Invalid bounds: min ({min}) must not exceed max ({max})")]
    InvalidBounds { min: f64, max: f64 },

    #[error("Parameter value {value} is outside bounds: [{min}, {max}]")]
    ValueOutsideBounds { value: f64, min: f64, max: f64 },

    #[error("Non-finite parameter value is not allowed")]
    NonFiniteValue,
}

/// Lower and upper limit of a parameter. Absent limits are infinite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

// Infinite limits travel as `null` so that JSON stays valid.
#[derive(Serialize, Deserialize)]
struct BoundsRepr {
    #[serde(default)]
    min: Option<f64>,
    #[serde(default)]
    max: Option<f64>,
}

impl Serialize for Bounds {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        BoundsRepr {
            min: self.has_lower_bound().then_some(self.min),
            max: self.has_upper_bound().then_some(self.max),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Bounds {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let repr = BoundsRepr::deserialize(deserializer)?;
        Bounds::new(
            repr.min.unwrap_or(f64::NEG_INFINITY),
            repr.max.unwrap_or(f64::INFINITY),
        )
        .map_err(serde::de::Error::custom)
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl Bounds {
    /// Create bounds from a min and max value.
    ///
    /// # Examples
    ///
    /// ```
    /// use pulsefit::parameters::Bounds;
    ///
    /// let bounds = Bounds::new(0.0, 10.0).unwrap();
    /// assert!(bounds.contains(5.0));
    /// assert!(Bounds::new(10.0, 0.0).is_err());
    /// ```
    pub fn new(min: f64, max: f64) -> Result<Self, BoundsError> {
        if min.is_nan() || max.is_nan() || min > max {
            return Err(BoundsError::InvalidBounds { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn unbounded() -> Self {
        Self {
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        }
    }

    pub fn min_only(min: f64) -> Self {
        Self {
            min,
            max: f64::INFINITY,
        }
    }

    pub fn max_only(max: f64) -> Self {
        Self {
            min: f64::NEG_INFINITY,
            max,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn has_lower_bound(&self) -> bool {
        self.min.is_finite()
    }

    pub fn has_upper_bound(&self) -> bool {
        self.max.is_finite()
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

/// Maps between the external (bounded) value of a parameter and the
/// internal (unbounded) coordinate the solver varies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundsTransform {
    bounds: Bounds,
}

impl BoundsTransform {
    pub fn new(bounds: Bounds) -> Self {
        Self { bounds }
    }

    /// Internal coordinate -> bounded value.
    pub fn to_external(&self, internal: f64) -> f64 {
        let b = &self.bounds;
        match (b.has_lower_bound(), b.has_upper_bound()) {
            (false, false) => internal,
            (true, false) => b.min - 1.0 + (internal * internal + 1.0).sqrt(),
            (false, true) => b.max + 1.0 - (internal * internal + 1.0).sqrt(),
            (true, true) => b.min + (internal.sin() + 1.0) * (b.max - b.min) / 2.0,
        }
    }

    /// Bounded value -> internal coordinate.
    ///
    /// # Errors
    ///
    /// The value must be finite and inside the bounds.
    pub fn to_internal(&self, external: f64) -> Result<f64, BoundsError> {
        let b = &self.bounds;
        if !external.is_finite() {
            return Err(BoundsError::NonFiniteValue);
        }
        if !b.contains(external) {
            return Err(BoundsError::ValueOutsideBounds {
                value: external,
                min: b.min,
                max: b.max,
            });
        }

        let internal = match (b.has_lower_bound(), b.has_upper_bound()) {
            (false, false) => external,
            (true, false) => ((external - b.min + 1.0).powi(2) - 1.0).sqrt(),
            (false, true) => ((b.max - external + 1.0).powi(2) - 1.0).sqrt(),
            (true, true) if b.max == b.min => 0.0,
            (true, true) => {
                let scaled = 2.0 * (external - b.min) / (b.max - b.min) - 1.0;
                scaled.clamp(-1.0, 1.0).asin()
            }
        };
        Ok(internal)
    }

    /// d(external)/d(internal), used to carry uncertainties back out of the
    /// internal coordinate.
    pub fn derivative(&self, internal: f64) -> f64 {
        let b = &self.bounds;
        match (b.has_lower_bound(), b.has_upper_bound()) {
            (false, false) => 1.0,
            (true, false) => internal / (internal * internal + 1.0).sqrt(),
            (false, true) => -internal / (internal * internal + 1.0).sqrt(),
            (true, true) => internal.cos() * (b.max - b.min) / 2.0,
        }
    }
}
