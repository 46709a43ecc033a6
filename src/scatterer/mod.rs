//! Scatterer geometry
//!
//! Scatterers are geometric objects built from indicator functions: ordered
//! domain-membership tests over 3-D points, each domain carrying a
//! refractive index. The [`Scatterer`] type classifies points into domains
//! and rasterizes shapes into refractive-index fields; [`Sphere`] and
//! [`Spheres`] are concrete primitives that project themselves into that
//! representation and expose their defining values as structured parameter
//! trees for fitting.

pub mod indicators;
pub mod parametrization;
#[allow(clippy::module_inception)]
pub mod scatterer;
pub mod sphere;
pub mod spheres;

pub use indicators::{bound_union, find_bounds, Bound, IndicatorFn, Indicators};
pub use parametrization::{CenteredScatterer, ParamMap, ParamTree, ParamValue};
pub use scatterer::Scatterer;
pub use sphere::Sphere;
pub use spheres::Spheres;
