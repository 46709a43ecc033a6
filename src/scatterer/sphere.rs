//! Sphere, a scattering primitive

use std::sync::Arc;

use nalgebra::Vector3;
use ndarray::ArrayView2;
use num_complex::Complex64;

use crate::error::{HoloFitError, Result};
use crate::scatterer::indicators::{Bound, IndicatorFn, Indicators};
use crate::scatterer::parametrization::{require, CenteredScatterer, ParamMap, ParamTree};
use crate::scatterer::scatterer::Scatterer;

/// Optical and geometrical properties of a sphere.
///
/// # Examples
///
/// ```
/// use holofit::Sphere;
/// use num_complex::Complex64;
///
/// let sphere = Sphere::new(Complex64::new(1.59, 0.0), 0.5e-6, [0.0, 0.0, 0.0]).unwrap();
/// assert_eq!(sphere.r(), 0.5e-6);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Sphere {
    n: Complex64,
    r: f64,
    center: Vector3<f64>,
}

impl Sphere {
    /// Create a sphere from its refractive index, radius, and center.
    pub fn new(n: Complex64, r: f64, center: [f64; 3]) -> Result<Self> {
        if !(r.is_finite() && r > 0.0) {
            return Err(HoloFitError::ScattererDefinition(format!(
                "sphere radius must be positive and finite, got {}",
                r
            )));
        }
        Ok(Self {
            n,
            r,
            center: Vector3::new(center[0], center[1], center[2]),
        })
    }

    /// Index of refraction of the sphere.
    pub fn n(&self) -> Complex64 {
        self.n
    }

    /// Radius of the sphere.
    pub fn r(&self) -> f64 {
        self.r
    }

    /// Center of the sphere.
    pub fn center(&self) -> Vector3<f64> {
        self.center
    }

    /// x-component of the center.
    pub fn x(&self) -> f64 {
        self.center.x
    }

    /// y-component of the center.
    pub fn y(&self) -> f64 {
        self.center.y
    }

    /// z-component of the center.
    pub fn z(&self) -> f64 {
        self.center.z
    }

    /// A copy of this sphere translated by `(x, y, z)`.
    pub fn translated(&self, x: f64, y: f64, z: f64) -> Self {
        self.translated_by(&Vector3::new(x, y, z))
    }

    /// A copy of this sphere translated by a vector offset.
    pub fn translated_by(&self, offset: &Vector3<f64>) -> Self {
        Self {
            n: self.n,
            r: self.r,
            center: self.center + offset,
        }
    }

    /// Membership test for a ball of radius `r` centered at the local
    /// origin, with its exact bound.
    pub(crate) fn local_indicator(r: f64) -> (IndicatorFn, Bound) {
        let r2 = r * r;
        let indicator: IndicatorFn = Arc::new(move |points: &ArrayView2<f64>| {
            points
                .rows()
                .into_iter()
                .map(|p| p[0] * p[0] + p[1] * p[1] + p[2] * p[2] < r2)
                .collect()
        });
        (indicator, [[-r, r], [-r, r], [-r, r]])
    }
}

impl Default for Sphere {
    /// A polystyrene-like sphere: n = 1.59, r = 0.5 um, centered at the
    /// origin.
    fn default() -> Self {
        Self {
            n: Complex64::new(1.59, 0.0),
            r: 0.5e-6,
            center: Vector3::zeros(),
        }
    }
}

impl CenteredScatterer for Sphere {
    fn parameters(&self) -> ParamMap {
        let mut params = ParamMap::new();
        params.insert("n".to_string(), ParamTree::complex(self.n));
        params.insert("r".to_string(), ParamTree::scalar(self.r));
        params.insert("center".to_string(), ParamTree::vector3(&self.center));
        params
    }

    fn from_parameters(params: &ParamMap) -> Result<Self> {
        let n = require(params, "n")?.as_complex()?;
        let r = require(params, "r")?.as_scalar()?;
        let center = require(params, "center")?.as_vector3()?;
        Sphere::new(n, r, [center.x, center.y, center.z])
    }

    fn geometry(&self) -> Scatterer {
        let (indicator, bound) = Sphere::local_indicator(self.r);
        let indicators = Indicators::with_bound(vec![indicator], bound);
        Scatterer::new(indicators, vec![self.n], self.center)
            .expect("one indicator, one index")
    }
}
