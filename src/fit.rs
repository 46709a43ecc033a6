//! Fitting a hologram to an exact scattering solution
//!
//! [`fit`] wires the pieces together: it minimizes the model's cost
//! function over its parameters, rebuilds the fitted scatterer and alpha
//! from the best-fit vector, computes goodness-of-fit statistics against
//! the data, and wraps everything into an immutable [`FitResult`].

use std::fmt;
use std::time::{Duration, Instant};

use crate::data::Hologram;
use crate::error::Result;
use crate::lm::SolverReport;
use crate::minimizer::Minimizer;
use crate::model::Model;

/// Everything produced by one call to [`fit`].
pub struct FitResult<S> {
    /// The fitted scatterer, built from the best-fit parameter values.
    pub scatterer: S,

    /// The fitted scaling parameter, when the model has one named `alpha`.
    pub alpha: Option<f64>,

    /// Reduced chi-square: sum of squared residuals per pixel.
    pub chisq: f64,

    /// Coefficient of determination against the data.
    pub rsq: f64,

    /// Whether the minimizer converged. Non-convergence is reported here,
    /// never as an error.
    pub converged: bool,

    /// Wall-clock time spent fitting.
    pub elapsed: Duration,

    /// The model that was fit.
    pub model: Model<S>,

    /// The minimizer that drove the fit.
    pub minimizer: Minimizer,

    /// The solver's diagnostic record.
    pub report: SolverReport,
}

impl<S: fmt::Debug> fmt::Debug for FitResult<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FitResult")
            .field("scatterer", &self.scatterer)
            .field("alpha", &self.alpha)
            .field("chisq", &self.chisq)
            .field("rsq", &self.rsq)
            .field("converged", &self.converged)
            .field("elapsed", &self.elapsed)
            .field("report", &self.report)
            .finish()
    }
}

/// Fit `model` to `data` with a default [`Minimizer`].
pub fn fit<S: 'static>(model: &Model<S>, data: &Hologram) -> Result<FitResult<S>> {
    fit_with(model, data, &Minimizer::new())
}

/// Fit `model` to `data` with the given minimizer.
///
/// Either returns a complete [`FitResult`] or raises the first failure
/// encountered (invalid parameters, an unrealizable scatterer, a theory
/// error); it never returns a partially populated result.
pub fn fit_with<S: 'static>(
    model: &Model<S>,
    data: &Hologram,
    minimizer: &Minimizer,
) -> Result<FitResult<S>> {
    let started = Instant::now();

    let cost_func = model.cost_func(data)?;
    let outcome = minimizer.minimize(model.parameters(), cost_func)?;

    let scatterer = model.make_scatterer_from_par_values(&outcome.params)?;
    let alpha = model.alpha(&outcome.params);
    let theory = model.resolve_theory(data);
    let fitted_holo = theory.calc_holo(&scatterer, alpha, None)?;

    let n = fitted_holo.len() as f64;
    let chisq = (&fitted_holo - data.values()).mapv(|r| r * r).sum() / n;
    let mean = data.mean();
    let ss_residual = (data.values() - &fitted_holo).mapv(|r| r * r).sum();
    let ss_total = data.values().mapv(|v| (v - mean) * (v - mean)).sum();
    let rsq = 1.0 - ss_residual / ss_total;

    Ok(FitResult {
        scatterer,
        alpha,
        chisq,
        rsq,
        converged: outcome.converged,
        elapsed: started.elapsed(),
        model: model.clone(),
        minimizer: minimizer.clone(),
        report: outcome.report,
    })
}
