//! Parameter definition and implementation
//!
//! A [`Parameter`] is the fundamental building block of a fitting model: a
//! named physical quantity with an initial guess, optional limits, and a
//! scale factor chosen so the optimizer sees values of order unity.

use serde::{Deserialize, Serialize};

use crate::error::{HoloFitError, Result};

/// A named physical quantity to be varied during a fit
///
/// Optimizers behave best when every parameter is of comparable magnitude,
/// so each parameter carries a `scale_factor` used to convert between
/// physical units and optimizer units. The scale factor is the guess when
/// one is given, otherwise the geometric mean of the limits.
///
/// Parameters are immutable after construction.
///
/// # Examples
///
/// ```
/// use holofit::Parameter;
///
/// let par = Parameter::with_guess("r", 0.5e-6);
/// let scaled = par.scale(0.5e-6);
/// assert!((scaled - 1.0).abs() < 1e-12);
/// assert!((par.unscale(scaled) - 0.5e-6).abs() < 1e-18);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Name of the parameter
    name: String,

    /// Initial guess in physical units
    guess: Option<f64>,

    /// Lower and upper limits in physical units
    limit: Option<(f64, f64)>,

    /// Factor mapping physical values to optimizer values of order unity
    scale_factor: f64,

    /// Free-form annotation carried through the fit, uninterpreted
    misc: Option<String>,
}

impl Parameter {
    /// Create a new parameter from an optional guess and optional limits.
    ///
    /// At least one of `guess` and `limit` must be given; the parameter is
    /// otherwise unconstrained and cannot be scaled or started anywhere.
    ///
    /// # Arguments
    ///
    /// * `name` - Name of the parameter
    /// * `guess` - Initial value in physical units, if known
    /// * `limit` - `(low, high)` limits in physical units, if known
    ///
    /// # Returns
    ///
    /// The parameter, or `HoloFitError::InvalidParameterSpecification` when
    /// both `guess` and `limit` are absent, when the limits are not ordered
    /// `low < high`, or when no guess is given and the limits straddle zero
    /// (their geometric mean is then undefined).
    pub fn new(name: &str, guess: Option<f64>, limit: Option<(f64, f64)>) -> Result<Self> {
        if let Some((low, high)) = limit {
            if !(low < high) {
                return Err(HoloFitError::InvalidParameterSpecification(format!(
                    "limits for '{}' must satisfy low < high, got ({}, {})",
                    name, low, high
                )));
            }
        }

        let scale_factor = match (guess, limit) {
            (Some(guess), _) => guess,
            (None, Some((low, high))) => {
                if low * high <= 0.0 {
                    return Err(HoloFitError::InvalidParameterSpecification(format!(
                        "cannot infer a scale factor for '{}' from limits ({}, {}); \
                         give a guess or limits of one sign",
                        name, low, high
                    )));
                }
                (low * high).sqrt()
            }
            (None, None) => {
                return Err(HoloFitError::InvalidParameterSpecification(format!(
                    "to specify parameter '{}' you must provide at least an \
                     initial guess or limit",
                    name
                )));
            }
        };

        Ok(Self {
            name: name.to_string(),
            guess,
            limit,
            scale_factor,
            misc: None,
        })
    }

    /// Create a parameter with only an initial guess.
    pub fn with_guess(name: &str, guess: f64) -> Self {
        Self {
            name: name.to_string(),
            guess: Some(guess),
            limit: None,
            scale_factor: guess,
            misc: None,
        }
    }

    /// Create a parameter with a guess and limits.
    pub fn with_guess_and_limit(name: &str, guess: f64, low: f64, high: f64) -> Result<Self> {
        Self::new(name, Some(guess), Some((low, high)))
    }

    /// Create a parameter with only limits. The scale factor is the
    /// geometric mean of the limits.
    pub fn with_limit(name: &str, low: f64, high: f64) -> Result<Self> {
        Self::new(name, None, Some((low, high)))
    }

    /// Attach a free-form annotation to the parameter.
    pub fn misc(mut self, note: &str) -> Self {
        self.misc = Some(note.to_string());
        self
    }

    /// Get the name of the parameter.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the initial guess in physical units, if one was given.
    pub fn guess(&self) -> Option<f64> {
        self.guess
    }

    /// Get the `(low, high)` limits in physical units, if given.
    pub fn limit(&self) -> Option<(f64, f64)> {
        self.limit
    }

    /// Get the scale factor mapping physical values to optimizer values.
    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Get the annotation attached with [`Parameter::misc`], if any.
    pub fn note(&self) -> Option<&str> {
        self.misc.as_deref()
    }

    /// Scale a physical value to optimizer units (approximately unity).
    pub fn scale(&self, physical: f64) -> f64 {
        physical / self.scale_factor
    }

    /// Invert [`Parameter::scale`]'s transformation.
    pub fn unscale(&self, scaled: f64) -> f64 {
        scaled * self.scale_factor
    }
}
