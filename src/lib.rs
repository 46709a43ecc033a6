//! # holofit
//!
//! `holofit` fits physical scattering models to measured holographic image
//! data by bounded nonlinear least squares.
//!
//! The library provides:
//! - A parameter system mapping named, bounded physical quantities into
//!   optimizer units and back
//! - An indicator-based scatterer geometry layer that classifies points
//!   into optical domains and rasterizes shapes into refractive-index
//!   fields
//! - A model layer binding parameters, a scattering theory, and a
//!   scatterer-construction function into a residual function
//! - A box-constrained Levenberg-Marquardt solver driving the fit
//!
//! The scattering theory itself (Mie, multisphere, ...) is a collaborator
//! supplied by the caller through the [`ScatteringTheory`] trait.
//!
//! ## Basic Usage
//!
//! Build a [`Model`] from [`Parameter`]s, a theory, and a
//! [`ScattererBuilder`], then call [`fit`] with a [`Hologram`]:
//!
//! ```no_run
//! use holofit::{fit, Hologram, Model, Optics, Parameter, ScattererBuilder, Sphere, TheorySpec};
//! use num_complex::Complex64;
//!
//! # fn theory() -> std::sync::Arc<dyn holofit::ScatteringTheory<holofit::Sphere>> { unimplemented!() }
//! # fn measured() -> ndarray::Array2<f64> { unimplemented!() }
//! let data = Hologram::new(measured(), Optics::new(0.66e-6, 1.33, (0.1e-6, 0.1e-6)));
//! let model = Model::new(
//!     vec![
//!         Parameter::with_guess("r", 0.5e-6),
//!         Parameter::with_guess("alpha", 1.0),
//!     ],
//!     TheorySpec::instance(theory()),
//!     ScattererBuilder::new(["r"], |args| {
//!         Sphere::new(Complex64::new(1.59, 0.0), args["r"], [0.0, 0.0, 0.0])
//!     }),
//! )?;
//! let result = fit(&model, &data)?;
//! assert!(result.converged);
//! # Ok::<(), holofit::HoloFitError>(())
//! ```

// Public modules
pub mod data;
pub mod diagnostics;
pub mod error;
pub mod fit;
pub mod lm;
pub mod minimizer;
pub mod model;
pub mod parameters;
pub mod scatterer;
pub mod theory;

// Re-exports for convenience
pub use data::{Hologram, Optics};
pub use diagnostics::Diagnostics;
pub use error::{HoloFitError, Result};
pub use fit::{fit, fit_with, FitResult};
pub use lm::{BoundedLeastSquares, SolverConfig, SolverReport};
pub use minimizer::{Minimizer, MinimizerOutcome};
pub use model::{compare, Model, ScattererBuilder};
pub use parameters::Parameter;
pub use scatterer::{
    CenteredScatterer, Indicators, ParamMap, ParamTree, ParamValue, Scatterer, Sphere, Spheres,
};
pub use theory::{ScatteringTheory, TheorySpec};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
