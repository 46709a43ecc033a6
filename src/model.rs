//! Binding parameters, theory, and scatterer construction into a
//! residual function
//!
//! A [`Model`] is the declarative description of a fit: which parameters
//! vary, which scattering theory computes holograms, and how parameter
//! values become a scatterer. From these it produces a cost function
//! closing over fixed data, suitable for a least-squares optimizer.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use ndarray::{Array1, Array2, Zip};

use crate::data::Hologram;
use crate::error::{HoloFitError, Result};
use crate::parameters::Parameter;
use crate::theory::{ScatteringTheory, TheorySpec};

/// Builds a scatterer from named physical parameter values.
///
/// The expected argument names are declared up front, so a model can check
/// at construction time that every argument has a matching parameter
/// instead of failing at the first cost evaluation.
pub struct ScattererBuilder<S> {
    args: Vec<String>,
    #[allow(clippy::type_complexity)]
    build: Arc<dyn Fn(&HashMap<String, f64>) -> Result<S> + Send + Sync>,
}

impl<S> ScattererBuilder<S> {
    /// Declare a builder from its expected argument names and construction
    /// function.
    ///
    /// # Examples
    ///
    /// ```
    /// use holofit::{ScattererBuilder, Sphere};
    /// use num_complex::Complex64;
    ///
    /// let builder = ScattererBuilder::new(["r"], |args| {
    ///     Sphere::new(Complex64::new(1.59, 0.0), args["r"], [0.0, 0.0, 0.0])
    /// });
    /// assert_eq!(builder.args(), ["r"]);
    /// ```
    pub fn new<I, T, F>(args: I, build: F) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
        F: Fn(&HashMap<String, f64>) -> Result<S> + Send + Sync + 'static,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            build: Arc::new(build),
        }
    }

    /// The declared argument names, in order.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Invoke the construction function.
    pub fn build(&self, args: &HashMap<String, f64>) -> Result<S> {
        (self.build)(args)
    }
}

impl<S> Clone for ScattererBuilder<S> {
    fn clone(&self) -> Self {
        Self {
            args: self.args.clone(),
            build: Arc::clone(&self.build),
        }
    }
}

impl<S> fmt::Debug for ScattererBuilder<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScattererBuilder")
            .field("args", &self.args)
            .finish()
    }
}

/// A model to fit to data.
///
/// Any parameterization can be expressed by the scatterer builder, which
/// turns named physical values into a scatterer. A parameter literally
/// named `alpha` is treated as the scattered-field scaling factor rather
/// than a builder argument.
pub struct Model<S> {
    parameters: Vec<Parameter>,
    theory: TheorySpec<S>,
    builder: ScattererBuilder<S>,
    selection: Option<Array2<bool>>,
}

impl<S> Model<S> {
    /// Bind parameters, a theory, and a scatterer builder into a model.
    ///
    /// Fails fast when parameter names collide, or when a declared builder
    /// argument has no parameter to supply it.
    pub fn new(
        parameters: Vec<Parameter>,
        theory: TheorySpec<S>,
        builder: ScattererBuilder<S>,
    ) -> Result<Self> {
        let mut seen = std::collections::HashSet::new();
        for par in &parameters {
            if !seen.insert(par.name()) {
                return Err(HoloFitError::InvalidParameterSpecification(format!(
                    "duplicate parameter name '{}'",
                    par.name()
                )));
            }
        }
        for arg in builder.args() {
            if !parameters.iter().any(|p| p.name() == arg) {
                return Err(HoloFitError::MissingParameter(arg.clone()));
            }
        }
        Ok(Self {
            parameters,
            theory,
            builder,
            selection: None,
        })
    }

    /// Restrict the fit to the pixels where `selection` is true.
    pub fn with_selection(mut self, selection: Array2<bool>) -> Self {
        self.selection = Some(selection);
        self
    }

    /// The model's parameters, in optimizer order.
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// The pixel mask, if one was set.
    pub fn selection(&self) -> Option<&Array2<bool>> {
        self.selection.as_ref()
    }

    /// Build a scatterer from optimizer-space parameter values.
    ///
    /// Each value is unscaled through its parameter, the resulting named
    /// physical values are filtered to the builder's declared arguments,
    /// and the builder is invoked.
    pub fn make_scatterer_from_par_values(&self, par_values: &Array1<f64>) -> Result<S> {
        let all_pars = self.unscale_all(par_values)?;
        let mut for_scatterer = HashMap::new();
        for arg in self.builder.args() {
            let value = all_pars
                .get(arg)
                .ok_or_else(|| HoloFitError::MissingParameter(arg.clone()))?;
            for_scatterer.insert(arg.clone(), *value);
        }
        self.builder.build(&for_scatterer)
    }

    /// The unscaled value of the parameter named `alpha`, if the model has
    /// one.
    pub fn alpha(&self, par_values: &Array1<f64>) -> Option<f64> {
        self.parameters
            .iter()
            .zip(par_values.iter())
            .find(|(par, _)| par.name() == "alpha")
            .map(|(par, &value)| par.unscale(value))
    }

    /// Resolve the scattering theory for the given data.
    pub fn resolve_theory(&self, data: &Hologram) -> Arc<dyn ScatteringTheory<S>> {
        self.theory.resolve(data)
    }

    /// Produce the cost function the optimizer will drive.
    ///
    /// The returned closure maps optimizer-space parameter values to the
    /// flattened residual between the computed and measured holograms. It
    /// owns everything it needs (theory, parameters, data, selection), so
    /// it may be called concurrently from parallel gradient estimation.
    pub fn cost_func(
        &self,
        data: &Hologram,
    ) -> Result<impl Fn(&Array1<f64>) -> Result<Array1<f64>> + Send + Sync>
    where
        S: 'static,
    {
        if let Some(selection) = &self.selection {
            if selection.dim() != data.shape() {
                return Err(HoloFitError::DimensionMismatch(format!(
                    "selection shape {:?} does not match data shape {:?}",
                    selection.dim(),
                    data.shape()
                )));
            }
        }
        let theory = self.resolve_theory(data);
        let model = self.clone();
        let data_values = data.values().clone();
        let selection = self.selection.clone();

        Ok(move |par_values: &Array1<f64>| {
            let scatterer = model.make_scatterer_from_par_values(par_values)?;
            let alpha = model.alpha(par_values);
            let calc = theory.calc_holo(&scatterer, alpha, selection.as_ref())?;
            compare(&calc, &data_values, selection.as_ref())
        })
    }

    fn unscale_all(&self, par_values: &Array1<f64>) -> Result<HashMap<String, f64>> {
        if par_values.len() != self.parameters.len() {
            return Err(HoloFitError::DimensionMismatch(format!(
                "expected {} parameter values, got {}",
                self.parameters.len(),
                par_values.len()
            )));
        }
        Ok(self
            .parameters
            .iter()
            .zip(par_values.iter())
            .map(|(par, &value)| (par.name().to_string(), par.unscale(value)))
            .collect())
    }
}

impl<S> Clone for Model<S> {
    fn clone(&self) -> Self {
        Self {
            parameters: self.parameters.clone(),
            theory: self.theory.clone(),
            builder: self.builder.clone(),
            selection: self.selection.clone(),
        }
    }
}

impl<S> fmt::Debug for Model<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("parameters", &self.parameters)
            .field("theory", &self.theory)
            .field("builder", &self.builder)
            .field("selection", &self.selection.is_some())
            .finish()
    }
}

/// Elementwise residual between a computed and a measured hologram,
/// flattened to a vector in row-major order.
///
/// With a selection mask, unselected pixels contribute a zero residual.
pub fn compare(
    calc: &Array2<f64>,
    data: &Array2<f64>,
    selection: Option<&Array2<bool>>,
) -> Result<Array1<f64>> {
    if calc.dim() != data.dim() {
        return Err(HoloFitError::DimensionMismatch(format!(
            "computed hologram shape {:?} does not match data shape {:?}",
            calc.dim(),
            data.dim()
        )));
    }
    let residual = match selection {
        Some(selection) => {
            if selection.dim() != data.dim() {
                return Err(HoloFitError::DimensionMismatch(format!(
                    "selection shape {:?} does not match data shape {:?}",
                    selection.dim(),
                    data.dim()
                )));
            }
            let mut out = Array2::<f64>::zeros(data.raw_dim());
            Zip::from(&mut out)
                .and(calc)
                .and(data)
                .and(selection)
                .for_each(|out, &calc, &data, &selected| {
                    *out = if selected { calc - data } else { 0.0 };
                });
            out
        }
        None => calc - data,
    };
    Ok(residual.iter().cloned().collect())
}
