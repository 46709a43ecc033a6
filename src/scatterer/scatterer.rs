//! The general indicator-based scatterer
//!
//! A [`Scatterer`] is a geometric object composed of indicator functions
//! (one per optical domain), a refractive index per domain, and a center.
//! It classifies points into domains, maps them to refractive indices, and
//! rasterizes itself onto a voxel grid for scattering methods that need a
//! discretized index field.

use std::fmt;

use nalgebra::Vector3;
use ndarray::{Array1, Array2, Array3};
use num_complex::Complex64;

use crate::error::{HoloFitError, Result};
use crate::scatterer::indicators::{Bound, Indicators};

/// A scatterer described by indicator functions.
///
/// Domain 0 is reserved for "outside the scatterer"; indicator i in the
/// list corresponds to domain i+1. When indicators overlap, the earlier
/// indicator in the list takes priority.
#[derive(Clone)]
pub struct Scatterer {
    indicators: Indicators,
    n: Vec<Complex64>,
    center: Vector3<f64>,
}

impl Scatterer {
    /// Create a scatterer from indicators, per-domain refractive indices,
    /// and a center.
    ///
    /// # Arguments
    ///
    /// * `indicators` - Domain-membership functions, one per domain
    /// * `n` - Refractive index of each domain, in indicator order
    /// * `center` - Center of mass of the scatterer
    pub fn new(indicators: Indicators, n: Vec<Complex64>, center: Vector3<f64>) -> Result<Self> {
        if indicators.len() != n.len() {
            return Err(HoloFitError::InvalidScatterer(format!(
                "got {} indicator functions but {} refractive indices",
                indicators.len(),
                n.len()
            )));
        }
        Ok(Self {
            indicators,
            n,
            center,
        })
    }

    /// The indicator functions describing this scatterer's geometry.
    pub fn indicators(&self) -> &Indicators {
        &self.indicators
    }

    /// Refractive index of each domain.
    pub fn n(&self) -> &[Complex64] {
        &self.n
    }

    /// Center of mass.
    pub fn center(&self) -> Vector3<f64> {
        self.center
    }

    /// Number of optical domains.
    pub fn num_domains(&self) -> usize {
        self.indicators.len()
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

    /// Make a copy of this scatterer translated by `(x, y, z)`.
    ///
    /// Indicator functions are shared structurally with the original; only
    /// the center moves.
    pub fn translated(&self, x: f64, y: f64, z: f64) -> Self {
        self.translated_by(&Vector3::new(x, y, z))
    }

    /// Make a copy of this scatterer translated by a vector offset.
    pub fn translated_by(&self, offset: &Vector3<f64>) -> Self {
        Self {
            indicators: self.indicators.clone(),
            n: self.n.clone(),
            center: self.center + offset,
        }
    }

    /// Tell which domain of the scatterer each point is in.
    ///
    /// # Arguments
    ///
    /// * `points` - Nx3 array of points to evaluate
    ///
    /// # Returns
    ///
    /// The domain of each point; domain 0 means outside the scatterer.
    pub fn in_domain(&self, points: &Array2<f64>) -> Result<Array1<usize>> {
        let points = check_points(points)?;
        let shifted = translate_to_local(points, &self.center);
        let membership = self.indicators.evaluate(&shifted.view());

        let mut domains = Array1::<usize>::zeros(points.nrows());
        // Indicators earlier in the list have priority: iterate in reverse
        // so the first indicator's assignment lands last.
        for (i, inside) in membership.iter().enumerate().rev() {
            for (k, &is_in) in inside.iter().enumerate() {
                if is_in {
                    domains[k] = i + 1;
                }
            }
        }
        Ok(domains)
    }

    /// True for each point inside any domain.
    pub fn contains(&self, points: &Array2<f64>) -> Result<Array1<bool>> {
        Ok(self.in_domain(points)?.mapv(|d| d > 0))
    }

    /// Refractive index at each point: `n[i]` inside domain i+1,
    /// `background` outside all domains.
    pub fn index_at(&self, points: &Array2<f64>, background: Complex64) -> Result<Array1<Complex64>> {
        let domains = self.in_domain(points)?;
        let mut index = Array1::from_elem(domains.len(), background);
        for (i, &n) in self.n.iter().enumerate() {
            for (k, &d) in domains.iter().enumerate() {
                if d == i + 1 {
                    index[k] = n;
                }
            }
        }
        Ok(index)
    }

    /// Axis-aligned box containing the scatterer, in absolute coordinates.
    pub fn bounds(&self) -> Bound {
        let mut bounds = self.indicators.bound;
        for (axis, bound) in bounds.iter_mut().enumerate() {
            bound[0] += self.center[axis];
            bound[1] += self.center[axis];
        }
        bounds
    }

    /// Represent the scatterer by discretizing into voxels.
    ///
    /// Builds a regular grid over the scatterer's bounding box (scalar
    /// spacing broadcast to all three axes) and evaluates the refractive
    /// index at every grid point.
    ///
    /// # Arguments
    ///
    /// * `spacing` - The spacing between voxels in the returned voxelation
    /// * `medium_index` - Background index to fill in where the scatterer
    ///   is not present
    pub fn voxelate(&self, spacing: f64, medium_index: Complex64) -> Result<Array3<Complex64>> {
        let (points, dims) = self.voxel_coords(spacing)?;
        let index = self.index_at(&points, medium_index)?;
        Array3::from_shape_vec(dims, index.to_vec())
            .map_err(|e| HoloFitError::DimensionMismatch(e.to_string()))
    }

    /// Discretize the scatterer into a grid of integer domain numbers.
    pub fn voxelate_domains(&self, spacing: f64) -> Result<Array3<usize>> {
        let (points, dims) = self.voxel_coords(spacing)?;
        let domains = self.in_domain(&points)?;
        Array3::from_shape_vec(dims, domains.to_vec())
            .map_err(|e| HoloFitError::DimensionMismatch(e.to_string()))
    }

    /// Grid points covering the bounding box, row-major over (x, y, z).
    fn voxel_coords(&self, spacing: f64) -> Result<(Array2<f64>, (usize, usize, usize))> {
        if !(spacing.is_finite() && spacing > 0.0) {
            return Err(HoloFitError::InvalidScatterer(format!(
                "voxel spacing must be positive and finite, got {}",
                spacing
            )));
        }
        let bounds = self.bounds();
        let axes: Vec<Vec<f64>> = bounds
            .iter()
            .map(|&[low, high]| {
                let mut coords = Vec::new();
                let mut c = low;
                while c < high {
                    coords.push(c);
                    c += spacing;
                }
                coords
            })
            .collect();

        let dims = (axes[0].len(), axes[1].len(), axes[2].len());
        let mut flat = Vec::with_capacity(dims.0 * dims.1 * dims.2 * 3);
        for &x in &axes[0] {
            for &y in &axes[1] {
                for &z in &axes[2] {
                    flat.extend_from_slice(&[x, y, z]);
                }
            }
        }
        let points = Array2::from_shape_vec((dims.0 * dims.1 * dims.2, 3), flat)
            .map_err(|e| HoloFitError::DimensionMismatch(e.to_string()))?;
        Ok((points, dims))
    }
}

impl fmt::Debug for Scatterer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scatterer")
            .field("num_domains", &self.num_domains())
            .field("n", &self.n)
            .field("center", &self.center)
            .finish()
    }
}

/// Validate that a point array is Nx3.
pub(crate) fn check_points(points: &Array2<f64>) -> Result<&Array2<f64>> {
    if points.ncols() != 3 {
        return Err(HoloFitError::InvalidScatterer(format!(
            "points must be an Nx3 array, got Nx{}",
            points.ncols()
        )));
    }
    Ok(points)
}

/// Shift points into the scatterer's local frame.
fn translate_to_local(points: &Array2<f64>, center: &Vector3<f64>) -> Array2<f64> {
    let mut shifted = points.clone();
    for mut row in shifted.rows_mut() {
        row[0] -= center.x;
        row[1] -= center.y;
        row[2] -= center.z;
    }
    shifted
}
