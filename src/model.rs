//! Model specifications and the sample coordinates they are evaluated on.
//!
//! A [`ModelSpec`] binds a name, a dimensionality and an ordered list of
//! parameter names to a pure function. Parameters reach the function as a
//! slice in the declared order, so the declared names and the function's
//! parameter slots cannot drift apart.

use std::fmt;
use std::str::FromStr;

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{FitError, Result};
use crate::parameters::ParameterSet;

/// A model function: one sample point's coordinates and the parameter
/// values in declared order to the predicted value.
pub type ModelFn = fn(point: &[f64], params: &[f64]) -> f64;

/// Whether a model maps a scalar or a 2-D coordinate to a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Dimensionality {
    #[default]
    #[serde(rename = "1d")]
    OneD,
    #[serde(rename = "2d")]
    TwoD,
}

impl Dimensionality {
    pub fn as_str(self) -> &'static str {
        match self {
            Dimensionality::OneD => "1d",
            Dimensionality::TwoD => "2d",
        }
    }

    /// Number of coordinates of one sample point.
    pub fn coordinates(self) -> usize {
        match self {
            Dimensionality::OneD => 1,
            Dimensionality::TwoD => 2,
        }
    }
}

impl fmt::Display for Dimensionality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimensionality {
    type Err = FitError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "1d" => Ok(Dimensionality::OneD),
            "2d" => Ok(Dimensionality::TwoD),
            other => Err(FitError::shape("dimensionality '1d' or '2d'", other)),
        }
    }
}

/// The independent variable of a fit.
///
/// 1-D fits take a plain sequence of x values. 2-D fits take one row per
/// sample point with the two coordinates in the columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Abscissa {
    OneD(Array1<f64>),
    TwoD(Array2<f64>),
}

impl Abscissa {
    /// Sample points of a row-major image: every `v` row is swept over `u`.
    ///
    /// ```
    /// use pulsefit::Abscissa;
    ///
    /// let grid = Abscissa::meshgrid(&[0.0, 1.0, 2.0], &[10.0, 20.0]);
    /// assert_eq!(grid.len(), 6);
    /// ```
    pub fn meshgrid(u: &[f64], v: &[f64]) -> Self {
        let mut points = Array2::zeros((u.len() * v.len(), 2));
        for (row, (&vj, &ui)) in v
            .iter()
            .flat_map(|vj| u.iter().map(move |ui| (vj, ui)))
            .enumerate()
        {
            points[[row, 0]] = ui;
            points[[row, 1]] = vj;
        }
        Abscissa::TwoD(points)
    }

    pub fn len(&self) -> usize {
        match self {
            Abscissa::OneD(x) => x.len(),
            Abscissa::TwoD(points) => points.nrows(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dimensionality(&self) -> Dimensionality {
        match self {
            Abscissa::OneD(_) => Dimensionality::OneD,
            Abscissa::TwoD(_) => Dimensionality::TwoD,
        }
    }

    /// Human readable shape, used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Abscissa::OneD(x) => format!("1-D array of {} values", x.len()),
            Abscissa::TwoD(points) => {
                format!("{}x{} coordinate array", points.nrows(), points.ncols())
            }
        }
    }

    /// The x values of a 1-D abscissa.
    pub fn as_1d(&self) -> Result<&Array1<f64>> {
        match self {
            Abscissa::OneD(x) => Ok(x),
            Abscissa::TwoD(_) => Err(FitError::shape("1-D x values", self.describe())),
        }
    }

    /// The coordinate rows of a 2-D abscissa.
    pub fn as_2d(&self) -> Result<&Array2<f64>> {
        match self {
            Abscissa::TwoD(points) => Ok(points),
            Abscissa::OneD(_) => Err(FitError::shape("Nx2 coordinate array", self.describe())),
        }
    }

    /// Evaluate `function` at every sample point.
    pub fn map_points(&self, function: ModelFn, params: &[f64]) -> Array1<f64> {
        match self {
            Abscissa::OneD(x) => x.mapv(|xi| function(&[xi], params)),
            Abscissa::TwoD(points) => points
                .axis_iter(Axis(0))
                .map(|row| function(&row.to_vec(), params))
                .collect(),
        }
    }
}

impl From<Array1<f64>> for Abscissa {
    fn from(x: Array1<f64>) -> Self {
        Abscissa::OneD(x)
    }
}

impl From<&Array1<f64>> for Abscissa {
    fn from(x: &Array1<f64>) -> Self {
        Abscissa::OneD(x.clone())
    }
}

impl From<Vec<f64>> for Abscissa {
    fn from(x: Vec<f64>) -> Self {
        Abscissa::OneD(Array1::from(x))
    }
}

impl From<&[f64]> for Abscissa {
    fn from(x: &[f64]) -> Self {
        Abscissa::OneD(Array1::from(x.to_vec()))
    }
}

impl From<Array2<f64>> for Abscissa {
    fn from(points: Array2<f64>) -> Self {
        Abscissa::TwoD(points)
    }
}

/// A registered fit model.
#[derive(Debug, Clone, Copy)]
pub struct ModelSpec {
    pub name: &'static str,
    pub dimensionality: Dimensionality,
    pub param_names: &'static [&'static str],
    pub function: ModelFn,
}

impl ModelSpec {
    pub const fn new(
        name: &'static str,
        dimensionality: Dimensionality,
        param_names: &'static [&'static str],
        function: ModelFn,
    ) -> Self {
        Self {
            name,
            dimensionality,
            param_names,
            function,
        }
    }

    /// A fresh, uninitialized parameter set for this model.
    pub fn parameters(&self) -> ParameterSet {
        ParameterSet::uninitialized(self.name, self.param_names)
    }

    /// Evaluate the model with parameter values in declared order.
    ///
    /// # Errors
    ///
    /// Fails when the number of values or the abscissa's dimensionality
    /// does not match the model.
    pub fn eval(&self, x: &Abscissa, params: &[f64]) -> Result<Array1<f64>> {
        if params.len() != self.param_names.len() {
            return Err(FitError::shape(
                format!("{} parameter values for '{}'", self.param_names.len(), self.name),
                format!("{}", params.len()),
            ));
        }
        if x.dimensionality() != self.dimensionality {
            return Err(FitError::shape(
                format!("{} abscissa for '{}'", self.dimensionality, self.name),
                x.describe(),
            ));
        }
        if let Abscissa::TwoD(points) = x {
            if points.ncols() != self.dimensionality.coordinates() {
                return Err(FitError::shape("Nx2 coordinate array", x.describe()));
            }
        }
        Ok(x.map_points(self.function, params))
    }

    /// Evaluate the model with the values held in a parameter set.
    pub fn eval_with(&self, x: &Abscissa, params: &ParameterSet) -> Result<Array1<f64>> {
        let values = params.values().to_vec();
        self.eval(x, &values)
    }
}
