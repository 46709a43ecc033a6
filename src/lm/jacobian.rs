//! Finite-difference Jacobian for the solver.

use ndarray::{Array1, Array2};
use rayon::prelude::*;

use crate::error::{HoloFitError, Result};

/// Per-parameter box bounds: optional lower, optional upper.
pub type Bounds = (Option<f64>, Option<f64>);

/// Compute the Jacobian matrix using forward finite differences.
///
/// The Jacobian is the matrix of partial derivatives of the residuals with
/// respect to the parameters: `J[i, j] = d residual[i] / d param[j]`.
/// Columns are evaluated in parallel; the residual function must therefore
/// be callable concurrently.
///
/// The perturbation for a parameter at its upper bound is flipped to a
/// backward difference so probe points stay feasible.
///
/// # Arguments
///
/// * `residual` - The residual function
/// * `params` - The point at which to evaluate the Jacobian
/// * `residuals` - Residuals already evaluated at `params`
/// * `bounds` - Per-parameter box bounds
/// * `epsilon` - Relative step size for the finite differences
pub fn jacobian<F>(
    residual: &F,
    params: &Array1<f64>,
    residuals: &Array1<f64>,
    bounds: &[Bounds],
    epsilon: f64,
) -> Result<Array2<f64>>
where
    F: Fn(&Array1<f64>) -> Result<Array1<f64>> + Sync,
{
    let n_params = params.len();
    let n_residuals = residuals.len();

    let columns: Result<Vec<Vec<f64>>> = (0..n_params)
        .into_par_iter()
        .map(|j| {
            let param_j = params[j];
            let mut eps_j = if param_j.abs() > epsilon {
                param_j.abs() * epsilon
            } else {
                epsilon
            };

            // keep the probe point inside the feasible box
            let (low, high) = bounds[j];
            if let Some(high) = high {
                if param_j + eps_j > high {
                    eps_j = -eps_j;
                }
            }
            if let Some(low) = low {
                if param_j + eps_j < low {
                    eps_j = -eps_j;
                }
            }

            let mut perturbed = params.clone();
            perturbed[j] += eps_j;

            let residuals_perturbed = residual(&perturbed)?;
            if residuals_perturbed.len() != n_residuals {
                return Err(HoloFitError::DimensionMismatch(format!(
                    "residual length changed from {} to {} during Jacobian evaluation",
                    n_residuals,
                    residuals_perturbed.len()
                )));
            }

            Ok((0..n_residuals)
                .map(|i| (residuals_perturbed[i] - residuals[i]) / eps_j)
                .collect())
        })
        .collect();
    let columns = columns?;

    let mut jac = Array2::zeros((n_residuals, n_params));
    for (j, column) in columns.iter().enumerate() {
        for (i, &value) in column.iter().enumerate() {
            jac[[i, j]] = value;
        }
    }
    Ok(jac)
}
