//! Implementation of the bounded Levenberg-Marquardt iteration.

use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{HoloFitError, Result};
use crate::lm::config::SolverConfig;
use crate::lm::jacobian::{jacobian, Bounds};

/// Converged: relative reduction of the cost fell below `ftol`.
pub const STATUS_FTOL: i32 = 1;
/// Converged: relative parameter change fell below `xtol`.
pub const STATUS_XTOL: i32 = 2;
/// Converged: both the `ftol` and `xtol` conditions hold.
pub const STATUS_FTOL_AND_XTOL: i32 = 3;
/// Terminated: gradient norm fell below `gtol` without the cost or
/// parameters settling.
pub const STATUS_GTOL: i32 = 4;
/// Terminated: maximum iterations reached.
pub const STATUS_MAX_ITERATIONS: i32 = 5;
/// Terminated: damping grew past its maximum without finding a better
/// point.
pub const STATUS_STALLED: i32 = 6;

/// Diagnostic record of a solver run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverReport {
    /// Best-fit parameter vector, in solver (scaled) units.
    pub params: Vec<f64>,

    /// Termination status code; 1-3 indicate convergence.
    pub status: i32,

    /// Human-readable description of the termination condition.
    pub message: String,

    /// Sum of squared residuals at the solution.
    pub cost: f64,

    /// Number of iterations performed.
    pub iterations: usize,

    /// Number of residual evaluations.
    pub func_evals: usize,
}

/// A box-constrained Levenberg-Marquardt solver.
///
/// Minimizes the sum of squared residuals by a damped Gauss-Newton
/// iteration on the normal equations, projecting every trial point into
/// the feasible box.
#[derive(Debug, Clone, Default)]
pub struct BoundedLeastSquares {
    config: SolverConfig,
}

impl BoundedLeastSquares {
    /// Create a solver with default configuration.
    pub fn new() -> Self {
        Self {
            config: SolverConfig::default(),
        }
    }

    /// Create a solver with the given configuration.
    pub fn with_config(config: SolverConfig) -> Self {
        Self { config }
    }

    /// The solver's configuration.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Minimize the sum of squared residuals of `residual`, starting from
    /// `start`, keeping every parameter inside its bounds.
    ///
    /// # Arguments
    ///
    /// * `residual` - The residual function
    /// * `start` - Initial parameter vector
    /// * `bounds` - Per-parameter `(lower, upper)` bounds; `None` leaves a
    ///   side unconstrained
    ///
    /// # Returns
    ///
    /// A [`SolverReport`]; failure to converge is reported through the
    /// status code, not an error. Errors from the residual function
    /// propagate.
    pub fn solve<F>(
        &self,
        residual: &F,
        start: Array1<f64>,
        bounds: &[Bounds],
    ) -> Result<SolverReport>
    where
        F: Fn(&Array1<f64>) -> Result<Array1<f64>> + Sync,
    {
        let n = start.len();
        if bounds.len() != n {
            return Err(HoloFitError::DimensionMismatch(format!(
                "{} parameters but {} bounds",
                n,
                bounds.len()
            )));
        }

        let mut params = project(&start, bounds);
        let mut residuals = residual(&params)?;
        let mut cost = sum_of_squares(&residuals);
        let mut func_evals = 1;
        if !cost.is_finite() {
            return Err(HoloFitError::FunctionEvaluation(
                "residuals are not finite at the starting point".to_string(),
            ));
        }

        let mut lambda = self.config.initial_lambda;
        let mut status = 0;
        let mut message = String::new();
        let mut iterations = 0;

        for iteration in 1..=self.config.max_iterations {
            iterations = iteration;

            let jac = jacobian(residual, &params, &residuals, bounds, self.config.epsilon)?;
            func_evals += n;
            let jtj = jac.t().dot(&jac);
            let jtr = jac.t().dot(&residuals);
            let gnorm = jtr.iter().fold(0.0_f64, |acc, g| acc.max(g.abs()));

            // damping loop: grow lambda until a step improves the cost
            let mut outcome = None;
            while outcome.is_none() {
                let step = match solve_damped(&jtj, &jtr, lambda) {
                    Ok(step) => step,
                    // singular normal equations: fall back to a scaled
                    // gradient-descent step
                    Err(HoloFitError::SingularMatrix) => jtr.mapv(|g| -g / (lambda + 1.0)),
                    Err(other) => return Err(other),
                };
                let trial = project(&(&params + &step), bounds);
                let actual_step = &trial - &params;
                let trial_residuals = residual(&trial)?;
                func_evals += 1;
                let trial_cost = sum_of_squares(&trial_residuals);

                if trial_cost.is_finite() && trial_cost <= cost {
                    let f_converged = (cost - trial_cost) <= self.config.ftol * cost;
                    let x_converged = norm(&actual_step)
                        <= self.config.xtol * (norm(&params) + self.config.xtol);
                    params = trial;
                    residuals = trial_residuals;
                    cost = trial_cost;
                    lambda = (lambda * self.config.lambda_down_factor).max(self.config.min_lambda);
                    outcome = Some((f_converged, x_converged));
                } else {
                    lambda *= self.config.lambda_up_factor;
                    if lambda > self.config.max_lambda {
                        break;
                    }
                }
            }

            let (f_converged, x_converged) = match outcome {
                Some(flags) => flags,
                None => {
                    status = STATUS_STALLED;
                    message =
                        "damping exceeded its maximum without finding a better point".to_string();
                    break;
                }
            };

            status = match (f_converged, x_converged) {
                (true, true) => STATUS_FTOL_AND_XTOL,
                (true, false) => STATUS_FTOL,
                (false, true) => STATUS_XTOL,
                (false, false) if gnorm <= self.config.gtol => STATUS_GTOL,
                _ => 0,
            };
            if status != 0 {
                message = match status {
                    STATUS_FTOL => "relative cost reduction below ftol".to_string(),
                    STATUS_XTOL => "relative parameter change below xtol".to_string(),
                    STATUS_FTOL_AND_XTOL => {
                        "cost reduction and parameter change below tolerance".to_string()
                    }
                    _ => "gradient norm below gtol".to_string(),
                };
                break;
            }
        }

        if status == 0 {
            status = STATUS_MAX_ITERATIONS;
            message = "maximum iterations reached".to_string();
        }

        Ok(SolverReport {
            params: params.to_vec(),
            status,
            message,
            cost,
            iterations,
            func_evals,
        })
    }
}

/// Solve `(JtJ + lambda * diag(JtJ)) * step = -Jtr` by Cholesky
/// decomposition.
fn solve_damped(jtj: &Array2<f64>, jtr: &Array1<f64>, lambda: f64) -> Result<Array1<f64>> {
    let n = jtj.nrows();
    let mut a = DMatrix::from_fn(n, n, |i, j| jtj[[i, j]]);
    for i in 0..n {
        let diagonal = a[(i, i)];
        a[(i, i)] = diagonal + lambda * diagonal.max(1e-10);
    }
    let b = DVector::from_fn(n, |i, _| -jtr[i]);
    match a.cholesky() {
        Some(cholesky) => {
            let x = cholesky.solve(&b);
            Ok(x.iter().cloned().collect())
        }
        None => Err(HoloFitError::SingularMatrix),
    }
}

/// Clamp every parameter into its box.
fn project(params: &Array1<f64>, bounds: &[Bounds]) -> Array1<f64> {
    Array1::from_iter(params.iter().zip(bounds.iter()).map(|(&p, &(low, high))| {
        let mut p = p;
        if let Some(low) = low {
            p = p.max(low);
        }
        if let Some(high) = high {
            p = p.min(high);
        }
        p
    }))
}

fn sum_of_squares(residuals: &Array1<f64>) -> f64 {
    residuals.iter().map(|r| r * r).sum()
}

fn norm(v: &Array1<f64>) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    /// Residuals of a line fit: a * x + b - y over five points of y = 2x.
    fn line_residual(p: &Array1<f64>) -> Result<Array1<f64>> {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        Ok(x.iter().map(|&x| p[0] * x + p[1] - 2.0 * x).collect())
    }

    #[test]
    fn test_converges_to_exact_line() {
        let solver = BoundedLeastSquares::new();
        let report = solver
            .solve(&line_residual, array![0.5, 0.5], &[(None, None), (None, None)])
            .unwrap();
        assert!((1..=3).contains(&report.status), "status {}", report.status);
        assert_relative_eq!(report.params[0], 2.0, epsilon = 1e-6);
        assert_relative_eq!(report.params[1], 0.0, epsilon = 1e-6);
        assert!(report.cost < 1e-10);
    }

    #[test]
    fn test_start_at_minimum_converges_immediately() {
        let solver = BoundedLeastSquares::new();
        let report = solver
            .solve(&line_residual, array![2.0, 0.0], &[(None, None), (None, None)])
            .unwrap();
        assert!((1..=3).contains(&report.status));
        assert!(report.iterations <= 2);
    }

    #[test]
    fn test_bound_pins_solution_to_box_face() {
        // unconstrained minimum of (p - 2)^2 is at 2; upper bound 1
        let residual = |p: &Array1<f64>| -> Result<Array1<f64>> { Ok(array![p[0] - 2.0]) };
        let solver = BoundedLeastSquares::new();
        let report = solver
            .solve(&residual, array![0.0], &[(Some(-1.0), Some(1.0))])
            .unwrap();
        assert!((1..=3).contains(&report.status), "status {}", report.status);
        assert_relative_eq!(report.params[0], 1.0, epsilon = 1e-8);
    }

    #[test]
    fn test_exhausted_iterations_reported_not_converged() {
        let solver =
            BoundedLeastSquares::with_config(SolverConfig::default().with_max_iterations(0));
        let report = solver
            .solve(&line_residual, array![0.5, 0.5], &[(None, None), (None, None)])
            .unwrap();
        assert_eq!(report.status, STATUS_MAX_ITERATIONS);
    }

    #[test]
    fn test_nonlinear_gaussian_amplitude_and_width() {
        // r_i = a * exp(-x_i^2 / (2 w^2)) - y_i with truth a = 2, w = 1.5
        let xs: Vec<f64> = (-10..=10).map(|i| i as f64 * 0.3).collect();
        let truth: Vec<f64> = xs
            .iter()
            .map(|x| 2.0 * (-x * x / (2.0 * 1.5 * 1.5)).exp())
            .collect();
        let residual = move |p: &Array1<f64>| -> Result<Array1<f64>> {
            Ok(xs
                .iter()
                .zip(truth.iter())
                .map(|(&x, &y)| p[0] * (-x * x / (2.0 * p[1] * p[1])).exp() - y)
                .collect())
        };
        let solver = BoundedLeastSquares::new();
        let report = solver
            .solve(
                &residual,
                array![1.0, 1.0],
                &[(Some(0.0), None), (Some(0.1), Some(10.0))],
            )
            .unwrap();
        assert!((1..=3).contains(&report.status), "status {}", report.status);
        assert_relative_eq!(report.params[0], 2.0, epsilon = 1e-5);
        assert_relative_eq!(report.params[1], 1.5, epsilon = 1e-5);
    }
}
