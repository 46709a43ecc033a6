//! End-to-end fitting tests against a synthetic scattering theory.

use std::sync::Arc;

use approx::assert_relative_eq;
use ndarray::{Array1, Array2};
use num_complex::Complex64;

use holofit::{
    fit, fit_with, HoloFitError, Hologram, Minimizer, Model, Optics, Parameter, Result,
    ScattererBuilder, ScatteringTheory, Sphere, SolverConfig, TheorySpec,
};

/// A stand-in scattering theory: a unit background plus a Gaussian spot
/// whose width is the sphere radius and whose amplitude is alpha.
///
/// Smooth in every parameter, deterministic, and cheap, which is all the
/// fitting core requires of the real Mie machinery.
struct GaussianSpotTheory {
    pixel_scale: (f64, f64),
    shape: (usize, usize),
}

impl GaussianSpotTheory {
    fn for_data(data: &Hologram) -> Self {
        Self {
            pixel_scale: data.optics().pixel_scale,
            shape: data.shape(),
        }
    }
}

impl ScatteringTheory<Sphere> for GaussianSpotTheory {
    fn calc_holo(
        &self,
        scatterer: &Sphere,
        alpha: Option<f64>,
        _selection: Option<&Array2<bool>>,
    ) -> Result<Array2<f64>> {
        let alpha = alpha.unwrap_or(1.0);
        let (rows, cols) = self.shape;
        let center = scatterer.center();
        let two_r2 = 2.0 * scatterer.r() * scatterer.r();
        let mut holo = Array2::zeros(self.shape);
        for i in 0..rows {
            for j in 0..cols {
                let x = (i as f64 - (rows as f64 - 1.0) / 2.0) * self.pixel_scale.0 - center.x;
                let y = (j as f64 - (cols as f64 - 1.0) / 2.0) * self.pixel_scale.1 - center.y;
                holo[[i, j]] = 1.0 + alpha * (-(x * x + y * y) / two_r2).exp();
            }
        }
        Ok(holo)
    }
}

fn optics() -> Optics {
    Optics::new(0.66e-6, 1.33, (0.1e-6, 0.1e-6))
}

fn sphere_builder() -> ScattererBuilder<Sphere> {
    ScattererBuilder::new(["r"], |args| {
        Sphere::new(Complex64::new(1.59, 0.0), args["r"], [0.0, 0.0, 0.0])
    })
}

/// Synthetic data from the true parameters r = 0.5 um, alpha = 1.
fn synthetic_data() -> Hologram {
    let optics = optics();
    let truth = Sphere::new(Complex64::new(1.59, 0.0), 0.5e-6, [0.0, 0.0, 0.0]).unwrap();
    let theory = GaussianSpotTheory {
        pixel_scale: optics.pixel_scale,
        shape: (16, 16),
    };
    let values = theory.calc_holo(&truth, Some(1.0), None).unwrap();
    Hologram::new(values, optics)
}

fn theory_factory() -> TheorySpec<Sphere> {
    TheorySpec::factory(|optics: &Optics, shape| -> Arc<dyn ScatteringTheory<Sphere>> {
        Arc::new(GaussianSpotTheory {
            pixel_scale: optics.pixel_scale,
            shape,
        })
    })
}

#[test]
fn fit_recovers_sphere_radius_from_exact_guess() {
    let data = synthetic_data();
    let model = Model::new(
        vec![
            Parameter::with_guess("r", 0.5e-6),
            Parameter::with_guess("alpha", 1.0),
        ],
        theory_factory(),
        sphere_builder(),
    )
    .unwrap();

    let result = fit(&model, &data).unwrap();
    assert!(result.converged);
    assert_relative_eq!(result.scatterer.r(), 0.5e-6, max_relative = 0.01);
    assert_relative_eq!(result.alpha.unwrap(), 1.0, max_relative = 0.01);
    assert!(result.chisq < 1e-12);
    assert!(result.rsq > 0.999);
}

#[test]
fn fit_recovers_sphere_radius_from_perturbed_guess() {
    let data = synthetic_data();
    let model = Model::new(
        vec![
            Parameter::with_guess_and_limit("r", 0.55e-6, 0.1e-6, 1.0e-6).unwrap(),
            Parameter::with_guess("alpha", 0.9),
        ],
        theory_factory(),
        sphere_builder(),
    )
    .unwrap();

    let result = fit(&model, &data).unwrap();
    assert!(result.converged, "report: {:?}", result.report);
    assert_relative_eq!(result.scatterer.r(), 0.5e-6, max_relative = 0.01);
    assert_relative_eq!(result.alpha.unwrap(), 1.0, max_relative = 0.01);
    assert!(result.rsq > 0.999);
}

#[test]
fn fit_works_with_a_theory_instance_too() {
    let data = synthetic_data();
    let theory = Arc::new(GaussianSpotTheory::for_data(&data));
    let model = Model::new(
        vec![
            Parameter::with_guess("r", 0.45e-6),
            Parameter::with_guess("alpha", 1.1),
        ],
        TheorySpec::instance(theory),
        sphere_builder(),
    )
    .unwrap();

    let result = fit(&model, &data).unwrap();
    assert!(result.converged);
    assert_relative_eq!(result.scatterer.r(), 0.5e-6, max_relative = 0.01);
}

#[test]
fn minimize_rejects_limit_only_parameter() {
    let parameters = vec![Parameter::with_limit("r", 0.1e-6, 1.0e-6).unwrap()];
    let minimizer = Minimizer::new();
    let result = minimizer.minimize(&parameters, |p: &Array1<f64>| Ok(p.clone()));
    assert!(matches!(
        result,
        Err(HoloFitError::InvalidParameterSpecification(_))
    ));
}

#[test]
fn exhausted_minimizer_reports_not_converged_instead_of_erroring() {
    let data = synthetic_data();
    let model = Model::new(
        vec![
            Parameter::with_guess("r", 0.8e-6),
            Parameter::with_guess("alpha", 0.5),
        ],
        theory_factory(),
        sphere_builder(),
    )
    .unwrap();

    let minimizer = Minimizer::with_config(SolverConfig::default().with_max_iterations(0));
    let result = fit_with(&model, &data, &minimizer).unwrap();
    assert!(!result.converged);
    // the result is still fully populated
    assert_relative_eq!(result.scatterer.r(), 0.8e-6, max_relative = 1e-12);
}

#[test]
fn selection_mask_restricts_the_residual() {
    let data = synthetic_data();
    // mask off everything outside the central quarter
    let (rows, cols) = data.shape();
    let selection = Array2::from_shape_fn((rows, cols), |(i, j)| {
        (4..12).contains(&i) && (4..12).contains(&j)
    });
    let model = Model::new(
        vec![
            Parameter::with_guess("r", 0.55e-6),
            Parameter::with_guess("alpha", 0.9),
        ],
        theory_factory(),
        sphere_builder(),
    )
    .unwrap()
    .with_selection(selection);

    let result = fit(&model, &data).unwrap();
    assert!(result.converged);
    assert_relative_eq!(result.scatterer.r(), 0.5e-6, max_relative = 0.01);
}

#[test]
fn fit_result_carries_timing_and_diagnostics() {
    let data = synthetic_data();
    let model = Model::new(
        vec![
            Parameter::with_guess("r", 0.5e-6),
            Parameter::with_guess("alpha", 1.0),
        ],
        theory_factory(),
        sphere_builder(),
    )
    .unwrap();

    let result = fit(&model, &data).unwrap();
    assert!(result.report.func_evals >= 1);
    assert!((1..=3).contains(&result.report.status));
    // serializable diagnostics
    let json = serde_json::to_string(&result.report).unwrap();
    assert!(json.contains("\"status\""));
}
