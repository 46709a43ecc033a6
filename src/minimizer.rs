//! Driving the bounded least-squares solver from a parameter list
//!
//! The [`Minimizer`] converts [`Parameter`] guesses and limits into solver
//! configuration (scaled initial values, per-side bound flags), runs the
//! solver, and converts the solver's status code into a converged boolean.

use ndarray::Array1;

use crate::error::{HoloFitError, Result};
use crate::lm::jacobian::Bounds;
use crate::lm::{BoundedLeastSquares, SolverConfig, SolverReport};
use crate::parameters::Parameter;

/// Outcome of a minimization.
#[derive(Debug, Clone)]
pub struct MinimizerOutcome {
    /// Best-fit parameter vector, in scaled (optimizer) units.
    pub params: Array1<f64>,

    /// Whether the solver converged.
    pub converged: bool,

    /// The solver's diagnostic record.
    pub report: SolverReport,
}

/// Wraps the bounded least-squares solver for use with [`Parameter`]
/// lists.
#[derive(Debug, Clone, Default)]
pub struct Minimizer {
    config: SolverConfig,
}

impl Minimizer {
    /// A minimizer with default solver configuration.
    pub fn new() -> Self {
        Self {
            config: SolverConfig::default(),
        }
    }

    /// A minimizer with the given solver configuration.
    pub fn with_config(config: SolverConfig) -> Self {
        Self { config }
    }

    /// The solver configuration.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Minimize `cost_func` over the given parameters.
    ///
    /// Each parameter contributes its scaled guess as the initial value
    /// and its scaled limits as box bounds (a side left `None` is
    /// unconstrained). The solver requires an initial guess for every
    /// parameter, even when bounds are given.
    ///
    /// A solver status code of 1-3 counts as converged; 4 and above does
    /// not.
    ///
    /// # Arguments
    ///
    /// * `parameters` - The parameters being varied, in optimizer order
    /// * `cost_func` - Maps a scaled parameter vector to a residual vector
    pub fn minimize<F>(&self, parameters: &[Parameter], cost_func: F) -> Result<MinimizerOutcome>
    where
        F: Fn(&Array1<f64>) -> Result<Array1<f64>> + Sync,
    {
        let mut start = Vec::with_capacity(parameters.len());
        let mut bounds: Vec<Bounds> = Vec::with_capacity(parameters.len());

        for par in parameters {
            let guess = par.guess().ok_or_else(|| {
                HoloFitError::InvalidParameterSpecification(format!(
                    "the solver requires an initial guess for every parameter, \
                     but '{}' has none",
                    par.name()
                ))
            })?;
            start.push(par.scale(guess));

            bounds.push(match par.limit() {
                Some((low, high)) => {
                    let mut low = par.scale(low);
                    let mut high = par.scale(high);
                    // a negative scale factor flips the interval
                    if low > high {
                        std::mem::swap(&mut low, &mut high);
                    }
                    (Some(low), Some(high))
                }
                None => (None, None),
            });
        }

        let solver = BoundedLeastSquares::with_config(self.config.clone());
        let report = solver.solve(&cost_func, Array1::from_vec(start), &bounds)?;
        let converged = (1..=3).contains(&report.status);
        Ok(MinimizerOutcome {
            params: Array1::from_vec(report.params.clone()),
            converged,
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parameter_without_guess_is_rejected() {
        let parameters = vec![Parameter::with_limit("r", 0.1e-6, 1.0e-6).unwrap()];
        let minimizer = Minimizer::new();
        let result = minimizer.minimize(&parameters, |p: &Array1<f64>| Ok(p.clone()));
        assert!(matches!(
            result,
            Err(HoloFitError::InvalidParameterSpecification(_))
        ));
    }

    #[test]
    fn test_minimize_scales_and_unscales_around_guess() {
        // truth is 2.0; guess 1.0 makes the scaled start exactly 1.0
        let parameters = vec![Parameter::with_guess("a", 1.0)];
        let minimizer = Minimizer::new();
        let outcome = minimizer
            .minimize(&parameters, |p: &Array1<f64>| {
                Ok(ndarray::array![p[0] - 2.0])
            })
            .unwrap();
        assert!(outcome.converged);
        assert_relative_eq!(outcome.params[0], 2.0, epsilon = 1e-8);
    }

    #[test]
    fn test_limits_are_scaled_into_solver_units() {
        // guess 2.0 scales the limits (1, 4) to (0.5, 2); truth 8 is
        // outside, so the fit pins at the scaled upper bound
        let parameters = vec![Parameter::with_guess_and_limit("a", 2.0, 1.0, 4.0).unwrap()];
        let minimizer = Minimizer::new();
        let outcome = minimizer
            .minimize(&parameters, |p: &Array1<f64>| {
                // residual in physical units of a = 2 * p
                Ok(ndarray::array![2.0 * p[0] - 8.0])
            })
            .unwrap();
        assert!(outcome.converged);
        assert_relative_eq!(outcome.params[0], 2.0, epsilon = 1e-8);
    }

    #[test]
    fn test_negative_guess_keeps_bounds_ordered() {
        // scale factor -1 flips the scaled limits; minimize (p + 3)^2 in
        // physical units with limits (-4, -1)
        let parameters = vec![Parameter::with_guess_and_limit("a", -1.0, -4.0, -1.0).unwrap()];
        let minimizer = Minimizer::new();
        let outcome = minimizer
            .minimize(&parameters, |p: &Array1<f64>| {
                let physical = -p[0]; // unscale by the factor -1
                Ok(ndarray::array![physical + 3.0])
            })
            .unwrap();
        assert!(outcome.converged);
        // physical optimum -3 corresponds to scaled value 3
        assert_relative_eq!(outcome.params[0], 3.0, epsilon = 1e-8);
    }
}
