//! Built-in fit models.
//!
//! This module provides the closed set of parametric families that can be
//! fitted by name:
//!
//! - Exponential decays (single, double, stretched)
//! - Peaks (Gaussian and Lorentzian, single to triple, with linear offset)
//! - Oscillations (sums of sines, optionally exponentially damped)
//! - Linear and hyperbolic-saturation curves
//! - Photon antibunching (g2 dip)
//! - A rotated two-dimensional Gaussian
//!
//! Each family also provides its initial-value heuristics, which
//! [`ModelKind::estimators`] hands to the estimator registry.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use ndarray::Array1;
use tracing::info;

use crate::error::{FitError, Result};
use crate::estimators::{EstimatorMode, EstimatorSpec};
use crate::model::{Abscissa, Dimensionality, ModelSpec};
use crate::utils::stats;

pub mod antibunching;
pub mod exponential;
pub mod gaussian2d;
pub mod oscillation;
pub mod peak;
pub mod polynomial;
pub mod saturation;

/// Every model the crate ships, in catalog order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    DecayExponential,
    BiExponential,
    DecayExponentialStretched,
    Gaussian,
    GaussianDouble,
    GaussianLinearOffset,
    HyperbolicSaturation,
    Linear,
    Lorentzian,
    LorentzianDouble,
    LorentzianTriple,
    Sine,
    SineDouble,
    SineDoubleWithExpDecay,
    SineDoubleWithTwoExpDecay,
    SineExponentialDecay,
    SineStretchedExponentialDecay,
    SineTriple,
    SineTripleWithExpDecay,
    SineTripleWithThreeExpDecay,
    Antibunching,
    TwoDGaussian,
}

impl ModelKind {
    pub const ALL: [ModelKind; 22] = [
        ModelKind::DecayExponential,
        ModelKind::BiExponential,
        ModelKind::DecayExponentialStretched,
        ModelKind::Gaussian,
        ModelKind::GaussianDouble,
        ModelKind::GaussianLinearOffset,
        ModelKind::HyperbolicSaturation,
        ModelKind::Linear,
        ModelKind::Lorentzian,
        ModelKind::LorentzianDouble,
        ModelKind::LorentzianTriple,
        ModelKind::Sine,
        ModelKind::SineDouble,
        ModelKind::SineDoubleWithExpDecay,
        ModelKind::SineDoubleWithTwoExpDecay,
        ModelKind::SineExponentialDecay,
        ModelKind::SineStretchedExponentialDecay,
        ModelKind::SineTriple,
        ModelKind::SineTripleWithExpDecay,
        ModelKind::SineTripleWithThreeExpDecay,
        ModelKind::Antibunching,
        ModelKind::TwoDGaussian,
    ];

    /// The model's definition: name, dimensionality, parameters and function.
    pub fn spec(self) -> ModelSpec {
        match self {
            ModelKind::DecayExponential => exponential::DECAY_EXPONENTIAL,
            ModelKind::BiExponential => exponential::BI_EXPONENTIAL,
            ModelKind::DecayExponentialStretched => exponential::DECAY_EXPONENTIAL_STRETCHED,
            ModelKind::Gaussian => peak::GAUSSIAN,
            ModelKind::GaussianDouble => peak::GAUSSIAN_DOUBLE,
            ModelKind::GaussianLinearOffset => peak::GAUSSIAN_LINEAR_OFFSET,
            ModelKind::HyperbolicSaturation => saturation::HYPERBOLIC_SATURATION,
            ModelKind::Linear => polynomial::LINEAR,
            ModelKind::Lorentzian => peak::LORENTZIAN,
            ModelKind::LorentzianDouble => peak::LORENTZIAN_DOUBLE,
            ModelKind::LorentzianTriple => peak::LORENTZIAN_TRIPLE,
            ModelKind::Sine => oscillation::SINE,
            ModelKind::SineDouble => oscillation::SINE_DOUBLE,
            ModelKind::SineDoubleWithExpDecay => oscillation::SINE_DOUBLE_WITH_EXP_DECAY,
            ModelKind::SineDoubleWithTwoExpDecay => oscillation::SINE_DOUBLE_WITH_TWO_EXP_DECAY,
            ModelKind::SineExponentialDecay => oscillation::SINE_EXPONENTIAL_DECAY,
            ModelKind::SineStretchedExponentialDecay => {
                oscillation::SINE_STRETCHED_EXPONENTIAL_DECAY
            }
            ModelKind::SineTriple => oscillation::SINE_TRIPLE,
            ModelKind::SineTripleWithExpDecay => oscillation::SINE_TRIPLE_WITH_EXP_DECAY,
            ModelKind::SineTripleWithThreeExpDecay => {
                oscillation::SINE_TRIPLE_WITH_THREE_EXP_DECAY
            }
            ModelKind::Antibunching => antibunching::ANTIBUNCHING,
            ModelKind::TwoDGaussian => gaussian2d::TWO_D_GAUSSIAN,
        }
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    /// The initial-value heuristics available for this model.
    pub fn estimators(self) -> Vec<EstimatorSpec> {
        use EstimatorMode::{Dip, Generic, Peak};

        let name = self.name();
        let entries: Vec<(EstimatorMode, crate::estimators::EstimateFn)> = match self {
            ModelKind::DecayExponential => vec![(Generic, exponential::estimate_decay)],
            ModelKind::BiExponential => vec![(Generic, exponential::estimate_biexponential)],
            ModelKind::DecayExponentialStretched => {
                vec![(Generic, exponential::estimate_stretched)]
            }
            ModelKind::Gaussian => vec![
                (Generic, peak::estimate_gaussian),
                (Dip, peak::estimate_gaussian_dip),
                (Peak, peak::estimate_gaussian_peak),
            ],
            ModelKind::GaussianDouble => vec![
                (Generic, peak::estimate_gaussian_double),
                (Dip, peak::estimate_gaussian_double_dip),
                (Peak, peak::estimate_gaussian_double_peak),
            ],
            ModelKind::GaussianLinearOffset => vec![
                (Generic, peak::estimate_gaussian_linear_offset),
                (Dip, peak::estimate_gaussian_linear_offset_dip),
                (Peak, peak::estimate_gaussian_linear_offset_peak),
            ],
            ModelKind::HyperbolicSaturation => vec![(Generic, saturation::estimate)],
            ModelKind::Linear => vec![(Generic, polynomial::estimate_linear)],
            ModelKind::Lorentzian => vec![
                (Generic, peak::estimate_lorentzian),
                (Dip, peak::estimate_lorentzian_dip),
                (Peak, peak::estimate_lorentzian_peak),
            ],
            ModelKind::LorentzianDouble => vec![
                (Generic, peak::estimate_lorentzian_double),
                (Dip, peak::estimate_lorentzian_double_dip),
                (Peak, peak::estimate_lorentzian_double_peak),
            ],
            ModelKind::LorentzianTriple => vec![
                (Generic, peak::estimate_lorentzian_triple),
                (Dip, peak::estimate_lorentzian_triple_dip),
                (Peak, peak::estimate_lorentzian_triple_peak),
            ],
            ModelKind::Sine => vec![(Generic, oscillation::estimate_sine)],
            ModelKind::SineDouble => vec![(Generic, oscillation::estimate_sine_double)],
            ModelKind::SineDoubleWithExpDecay => {
                vec![(Generic, oscillation::estimate_sine_double_with_exp_decay)]
            }
            ModelKind::SineDoubleWithTwoExpDecay => {
                vec![(Generic, oscillation::estimate_sine_double_with_two_exp_decay)]
            }
            ModelKind::SineExponentialDecay => {
                vec![(Generic, oscillation::estimate_sine_exponential_decay)]
            }
            ModelKind::SineStretchedExponentialDecay => {
                vec![(Generic, oscillation::estimate_sine_stretched_exponential_decay)]
            }
            ModelKind::SineTriple => vec![(Generic, oscillation::estimate_sine_triple)],
            ModelKind::SineTripleWithExpDecay => {
                vec![(Generic, oscillation::estimate_sine_triple_with_exp_decay)]
            }
            ModelKind::SineTripleWithThreeExpDecay => {
                vec![(Generic, oscillation::estimate_sine_triple_with_three_exp_decay)]
            }
            ModelKind::Antibunching => vec![(Dip, antibunching::estimate_dip)],
            ModelKind::TwoDGaussian => vec![(Generic, gaussian2d::estimate)],
        };

        entries
            .into_iter()
            .map(|(mode, function)| EstimatorSpec::new(name, mode, function))
            .collect()
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = FitError;

    fn from_str(s: &str) -> Result<Self> {
        ModelKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| FitError::UnknownModel {
                name: s.to_string(),
            })
    }
}

/// A registry of models looked up by name.
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    models: Vec<ModelSpec>,
}

impl ModelCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog holding every [`ModelKind`].
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for kind in ModelKind::ALL {
            catalog.register(kind.spec());
        }
        catalog
    }

    /// The process-wide catalog. Read-only once initialized.
    pub fn global() -> &'static ModelCatalog {
        static CATALOG: OnceLock<ModelCatalog> = OnceLock::new();
        CATALOG.get_or_init(ModelCatalog::builtin)
    }

    /// Register a model, replacing an earlier one of the same name in place.
    pub fn register(&mut self, spec: ModelSpec) {
        match self.models.iter_mut().find(|m| m.name == spec.name) {
            Some(existing) => *existing = spec,
            None => self.models.push(spec),
        }
    }

    pub fn lookup(&self, name: &str) -> Result<&ModelSpec> {
        self.models
            .iter()
            .find(|m| m.name == name)
            .ok_or_else(|| FitError::UnknownModel {
                name: name.to_string(),
            })
    }

    /// All model names in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.models.iter().map(|m| m.name).collect()
    }

    /// Names of the models of one dimensionality, in registration order.
    pub fn names_for(&self, dimensionality: Dimensionality) -> Vec<&'static str> {
        self.models
            .iter()
            .filter(|m| m.dimensionality == dimensionality)
            .map(|m| m.name)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelSpec> {
        self.models.iter()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Emit the registered model names, grouped by dimensionality, at info level.
    pub fn log_available_models(&self) {
        for dimensionality in [Dimensionality::OneD, Dimensionality::TwoD] {
            let names = self.names_for(dimensionality);
            info!(
                dimensionality = %dimensionality,
                count = names.len(),
                models = %names.join(", "),
                "available fit models"
            );
        }
    }
}

/// x-sorted samples of a 1-D data set, for estimators that walk the curve.
pub(crate) fn sorted_samples(x: &Abscissa, y: &Array1<f64>) -> Result<(Vec<f64>, Vec<f64>)> {
    let x = x.as_1d()?;
    if x.is_empty() || x.len() != y.len() {
        return Err(FitError::shape(
            "non-empty x and y of equal length",
            format!("x: {}, y: {}", x.len(), y.len()),
        ));
    }
    Ok(stats::sorted_by_x(x, y))
}

/// Extent of x-sorted samples, never zero.
pub(crate) fn span(x: &[f64]) -> f64 {
    let span = match (x.first(), x.last()) {
        (Some(first), Some(last)) => last - first,
        _ => 0.0,
    };
    if span > 0.0 {
        span
    } else {
        1.0
    }
}
