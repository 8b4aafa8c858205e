//! Utility functions and helpers for the pulsefit library.

pub mod finite_difference;
pub mod matrix_convert;
pub mod spectrum;
pub mod stats;

pub use finite_difference::jacobian;
pub use spectrum::{dominant_components, Component};
