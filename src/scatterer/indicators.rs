//! Indicator functions describing scatterer geometry
//!
//! An indicator function answers "is this point inside the domain?" for an
//! arbitrary region of space. A scatterer is described by an ordered list of
//! indicator functions, one per optical domain, together with an axis-aligned
//! bounding box used when rasterizing the scatterer onto a voxel grid.

use std::fmt;
use std::sync::Arc;

use ndarray::{Array2, ArrayView2};

/// Axis-aligned bounding box: `[[xmin, xmax], [ymin, ymax], [zmin, zmax]]`.
pub type Bound = [[f64; 2]; 3];

/// A domain-membership test over 3-D points.
///
/// Takes an Nx3 array of points and returns one boolean per point. Indicator
/// functions are treated as immutable pure functions, so clones of a
/// scatterer share them structurally.
pub type IndicatorFn = Arc<dyn Fn(&ArrayView2<f64>) -> Vec<bool> + Send + Sync>;

/// Elementwise union of two bounding boxes: min of lower bounds, max of
/// upper bounds, per axis.
pub fn bound_union(a: &Bound, b: &Bound) -> Bound {
    let mut new = [[0.0; 2]; 3];
    for i in 0..3 {
        new[i][0] = a[i][0].min(b[i][0]);
        new[i][1] = a[i][1].max(b[i][1]);
    }
    new
}

/// Finds the bounds needed to contain an indicator function.
///
/// For each axis and direction, searches outward from a tiny seed (±1e-9),
/// doubling the offset while the indicator remains true at the probed axis
/// value (the other axes held at 0), then contracting by halving (up to 10
/// iterations) once past the boundary, then re-expanding by 10% steps until
/// the indicator goes false again.
///
/// # Notes
///
/// Will probably determine incorrect bounds for functions which are not
/// convex or which do not contain the origin.
pub fn find_bounds(indicator: &IndicatorFn) -> Bound {
    // we don't know what units the caller might be using, so start by
    // assuming something really small and stepping up from there
    let mut bounds: Bound = [[-1e-9, 1e-9], [-1e-9, 1e-9], [-1e-9, 1e-9]];
    for i in 0..3 {
        for j in 0..2 {
            let probe = |coord: f64| {
                let mut point = [0.0; 3];
                point[i] = coord;
                let points =
                    Array2::from_shape_vec((1, 3), point.to_vec()).expect("1x3 probe point");
                indicator(&points.view())[0]
            };

            let mut coord = bounds[i][j];
            while probe(coord) {
                coord *= 2.0;
            }
            let mut iter = 0;
            while !probe(coord) && iter < 10 {
                coord /= 2.0;
                iter += 1;
            }
            while probe(coord) {
                coord *= 1.1;
            }
            bounds[i][j] = coord;
        }
    }
    bounds
}

/// Ordered list of indicator functions describing a scatterer.
///
/// One or more functions (one per domain) that take Nx3 arrays of points and
/// return per-point membership in each domain. More than one indicator is
/// allowed to return true for a given point; in that case the point belongs
/// to the first domain in the list with a true value.
#[derive(Clone)]
pub struct Indicators {
    functions: Vec<IndicatorFn>,
    /// Axis-aligned box containing every domain.
    pub bound: Bound,
}

impl Indicators {
    /// Build from indicator functions, computing the bound as the union of
    /// [`find_bounds`] over each function.
    pub fn new(functions: Vec<IndicatorFn>) -> Self {
        let mut bound: Bound = [[0.0; 2]; 3];
        for function in &functions {
            bound = bound_union(&bound, &find_bounds(function));
        }
        Self { functions, bound }
    }

    /// Build from indicator functions and a known bound, skipping the
    /// bound search.
    pub fn with_bound(functions: Vec<IndicatorFn>, bound: Bound) -> Self {
        Self { functions, bound }
    }

    /// Build from a single indicator function.
    pub fn single(function: IndicatorFn) -> Self {
        Self::new(vec![function])
    }

    /// Evaluate every indicator over `points`, returning one membership
    /// vector per function. Points must already be translated relative to
    /// the scatterer center by the caller.
    pub fn evaluate(&self, points: &ArrayView2<f64>) -> Vec<Vec<bool>> {
        self.functions.iter().map(|test| test(points)).collect()
    }

    /// Number of domains.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// True when there are no indicator functions.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl fmt::Debug for Indicators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Indicators")
            .field("functions", &self.functions.len())
            .field("bound", &self.bound)
            .finish()
    }
}
