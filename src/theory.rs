//! Scattering theory collaborator contract
//!
//! The numerical kernels that compute holograms from scatterers (Mie,
//! multisphere superposition, discrete dipole, ...) live outside this
//! crate. The fitting core only needs the contract: given a scatterer and
//! an optional scaling factor, produce a hologram shaped like the data,
//! deterministically.

use std::fmt;
use std::sync::Arc;

use ndarray::Array2;

use crate::data::{Hologram, Optics};
use crate::error::Result;

/// A scattering theory: computes the hologram a scatterer would produce.
///
/// Implementations must be deterministic and side-effect-free so the
/// optimizer may evaluate them concurrently: identical scatterer, alpha,
/// and selection always give an identical hologram.
pub trait ScatteringTheory<S>: Send + Sync {
    /// Compute the hologram of `scatterer`.
    ///
    /// # Arguments
    ///
    /// * `scatterer` - The object to scatter off
    /// * `alpha` - Optional scaling of the scattered field
    /// * `selection` - Optional pixel mask; theories may skip unselected
    ///   pixels, whose values are ignored by the residual
    fn calc_holo(
        &self,
        scatterer: &S,
        alpha: Option<f64>,
        selection: Option<&Array2<bool>>,
    ) -> Result<Array2<f64>>;
}

/// A scattering theory, either ready to use or built per-dataset.
///
/// Some theories need the acquisition metadata and detector shape before
/// they can compute anything; those are given as factories and
/// instantiated once per fit from the data. A theory given as an instance
/// is reused as-is.
pub enum TheorySpec<S> {
    /// An existing theory instance.
    Instance(Arc<dyn ScatteringTheory<S>>),
    /// A constructor invoked with the data's optics and shape.
    #[allow(clippy::type_complexity)]
    Factory(Arc<dyn Fn(&Optics, (usize, usize)) -> Arc<dyn ScatteringTheory<S>> + Send + Sync>),
}

impl<S> TheorySpec<S> {
    /// Wrap a theory instance.
    pub fn instance(theory: Arc<dyn ScatteringTheory<S>>) -> Self {
        TheorySpec::Instance(theory)
    }

    /// Wrap a theory constructor.
    pub fn factory<F>(make: F) -> Self
    where
        F: Fn(&Optics, (usize, usize)) -> Arc<dyn ScatteringTheory<S>> + Send + Sync + 'static,
    {
        TheorySpec::Factory(Arc::new(make))
    }

    /// Resolve to a concrete theory for the given data.
    pub fn resolve(&self, data: &Hologram) -> Arc<dyn ScatteringTheory<S>> {
        match self {
            TheorySpec::Instance(theory) => Arc::clone(theory),
            TheorySpec::Factory(make) => make(data.optics(), data.shape()),
        }
    }
}

impl<S> Clone for TheorySpec<S> {
    fn clone(&self) -> Self {
        match self {
            TheorySpec::Instance(theory) => TheorySpec::Instance(Arc::clone(theory)),
            TheorySpec::Factory(make) => TheorySpec::Factory(Arc::clone(make)),
        }
    }
}

impl<S> fmt::Debug for TheorySpec<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TheorySpec::Instance(_) => f.write_str("TheorySpec::Instance"),
            TheorySpec::Factory(_) => f.write_str("TheorySpec::Factory"),
        }
    }
}
