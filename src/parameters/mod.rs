//! # Parameter System
//!
//! Named model parameters with hard bounds and a fixed/free flag.
//!
//! ## Core Components
//!
//! - [`ParameterState`]: one parameter's value, bounds, fixed flag and fitted error
//! - [`ParameterSet`]: the ordered parameters of one model, moved into the solver
//! - [`ParameterOverride`]: a user setting layered on top of the estimate
//! - [`Bounds`] and [`BoundsTransform`]: hard limits and the unbounded search space
//!
//! ## Example Usage
//!
//! ```rust
//! use pulsefit::parameters::{ParameterOverride, ParameterSet};
//!
//! let mut params = ParameterSet::uninitialized("linear", &["slope", "offset"]);
//! params.init("slope", 2.0).unwrap();
//! params.init("offset", 0.1).unwrap().set_min(0.0);
//!
//! params.apply_override("offset", &ParameterOverride::fixed_at(0.0)).unwrap();
//! assert!(params.get("offset").unwrap().fixed);
//! assert!(params.missing().is_empty());
//! ```

pub mod bounds;
pub mod overrides;
pub mod parameter;

pub use bounds::{Bounds, BoundsError, BoundsTransform};
pub use overrides::ParameterOverride;
pub use parameter::{ParameterSet, ParameterState};
