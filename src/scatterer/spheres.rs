//! Rigid clusters of spheres

use nalgebra::{Rotation3, Vector3};
use ndarray::ArrayView2;

use crate::diagnostics::Diagnostics;
use crate::error::{HoloFitError, Result};
use crate::scatterer::indicators::{bound_union, Bound, IndicatorFn, Indicators};
use crate::scatterer::parametrization::{CenteredScatterer, ParamMap, ParamTree};
use crate::scatterer::scatterer::Scatterer;
use crate::scatterer::sphere::Sphere;

/// A cluster of spheres, each its own optical domain.
///
/// Domains are numbered in sphere order, so when two spheres overlap the
/// earlier sphere in the list claims the shared region.
#[derive(Debug, Clone, PartialEq)]
pub struct Spheres {
    spheres: Vec<Sphere>,
}

impl Spheres {
    /// Create a cluster from its member spheres.
    pub fn new(spheres: Vec<Sphere>) -> Result<Self> {
        if spheres.is_empty() {
            return Err(HoloFitError::ScattererDefinition(
                "a sphere cluster needs at least one sphere".to_string(),
            ));
        }
        Ok(Self { spheres })
    }

    /// The member spheres, in domain order.
    pub fn spheres(&self) -> &[Sphere] {
        &self.spheres
    }

    /// Centroid of the sphere centers.
    pub fn centroid(&self) -> Vector3<f64> {
        let sum: Vector3<f64> = self.spheres.iter().map(|s| s.center()).sum();
        sum / self.spheres.len() as f64
    }

    /// Pairs of spheres whose center distance is less than the sum of
    /// their radii, reported to the caller's diagnostics sink.
    pub fn check_overlaps(&self, diagnostics: &mut Diagnostics) -> Vec<(usize, usize)> {
        let mut overlaps = Vec::new();
        for i in 0..self.spheres.len() {
            for j in (i + 1)..self.spheres.len() {
                let a = &self.spheres[i];
                let b = &self.spheres[j];
                if (a.center() - b.center()).norm() < a.r() + b.r() {
                    diagnostics.warn(format!("spheres {} and {} overlap", i, j));
                    overlaps.push((i, j));
                }
            }
        }
        overlaps
    }

    /// A copy of this cluster translated by `(x, y, z)`.
    pub fn translated(&self, x: f64, y: f64, z: f64) -> Self {
        self.translated_by(&Vector3::new(x, y, z))
    }

    /// A copy of this cluster translated by a vector offset.
    pub fn translated_by(&self, offset: &Vector3<f64>) -> Self {
        Self {
            spheres: self.spheres.iter().map(|s| s.translated_by(offset)).collect(),
        }
    }

    /// A copy of this cluster rigidly rotated about its centroid by z-y-z
    /// Euler angles `(alpha, beta, gamma)`.
    pub fn rotated(&self, alpha: f64, beta: f64, gamma: f64) -> Self {
        let rotation = Rotation3::from_axis_angle(&Vector3::z_axis(), alpha)
            * Rotation3::from_axis_angle(&Vector3::y_axis(), beta)
            * Rotation3::from_axis_angle(&Vector3::z_axis(), gamma);
        let centroid = self.centroid();
        Self {
            spheres: self
                .spheres
                .iter()
                .map(|s| {
                    let local = s.center() - centroid;
                    let moved = centroid + rotation * local;
                    s.translated_by(&(moved - s.center()))
                })
                .collect(),
        }
    }
}

impl CenteredScatterer for Spheres {
    fn parameters(&self) -> ParamMap {
        let mut params = ParamMap::new();
        params.insert(
            "spheres".to_string(),
            ParamTree::Sequence(
                self.spheres
                    .iter()
                    .map(|s| ParamTree::Mapping(s.parameters()))
                    .collect(),
            ),
        );
        params
    }

    fn from_parameters(params: &ParamMap) -> Result<Self> {
        let spheres = match crate::scatterer::parametrization::require(params, "spheres")? {
            ParamTree::Sequence(items) => items
                .iter()
                .map(|item| match item {
                    ParamTree::Mapping(map) => Sphere::from_parameters(map),
                    other => Err(HoloFitError::InvalidScatterer(format!(
                        "expected a sphere parameter mapping, got {:?}",
                        other
                    ))),
                })
                .collect::<Result<Vec<_>>>()?,
            other => {
                return Err(HoloFitError::InvalidScatterer(format!(
                    "expected a sequence of spheres, got {:?}",
                    other
                )))
            }
        };
        Spheres::new(spheres)
    }

    fn geometry(&self) -> Scatterer {
        let centroid = self.centroid();
        let mut functions: Vec<IndicatorFn> = Vec::with_capacity(self.spheres.len());
        let mut bound: Option<Bound> = None;
        for sphere in &self.spheres {
            let offset = sphere.center() - centroid;
            let (ball, local_bound) = Sphere::local_indicator(sphere.r());
            let shifted: IndicatorFn = std::sync::Arc::new(move |points: &ArrayView2<f64>| {
                let mut local = points.to_owned();
                for mut row in local.rows_mut() {
                    row[0] -= offset.x;
                    row[1] -= offset.y;
                    row[2] -= offset.z;
                }
                ball(&local.view())
            });
            functions.push(shifted);

            let mut shifted_bound = local_bound;
            for (axis, b) in shifted_bound.iter_mut().enumerate() {
                b[0] += offset[axis];
                b[1] += offset[axis];
            }
            bound = Some(match bound {
                Some(existing) => bound_union(&existing, &shifted_bound),
                None => shifted_bound,
            });
        }

        let n = self.spheres.iter().map(|s| s.n()).collect();
        let indicators = Indicators::with_bound(functions, bound.expect("at least one sphere"));
        Scatterer::new(indicators, n, centroid).expect("one index per indicator")
    }
}
