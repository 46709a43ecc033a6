//! Structured scatterer parametrization
//!
//! Parametrized scatterers expose their defining values as a tree of named
//! slots, where each leaf is either a concrete number or a fittable
//! [`Parameter`]. The tree is an explicit recursive variant type, so a
//! scatterer can be deconstructed into parameters and reconstructed from
//! them without any string-encoded nesting conventions: the round trip
//! `S::from_parameters(&s.parameters())` rebuilds an equivalent scatterer.

use std::collections::BTreeMap;

use nalgebra::Vector3;
use num_complex::Complex64;

use crate::error::{HoloFitError, Result};
use crate::parameters::Parameter;
use crate::scatterer::scatterer::Scatterer;

/// A single parameter slot: either a concrete value or a fittable
/// parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// A known, fixed value.
    Fixed(f64),
    /// A value to be determined by fitting, carrying its specification.
    Fitted(Parameter),
}

impl ParamValue {
    /// Resolve the slot to a number: the value itself when fixed, the
    /// parameter's guess when fittable.
    pub fn guess(&self) -> Result<f64> {
        match self {
            ParamValue::Fixed(value) => Ok(*value),
            ParamValue::Fitted(par) => par.guess().ok_or_else(|| {
                HoloFitError::InvalidParameterSpecification(format!(
                    "parameter '{}' has no guess to resolve its slot with",
                    par.name()
                ))
            }),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Fixed(value)
    }
}

impl From<Parameter> for ParamValue {
    fn from(par: Parameter) -> Self {
        ParamValue::Fitted(par)
    }
}

/// A structured tree of parameter slots.
///
/// Complex numbers, coordinate sequences, and nested mappings each have
/// their own variant, so every slot of a scatterer maps back to exactly one
/// place in its structure.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamTree {
    /// A scalar slot.
    Value(ParamValue),
    /// A complex-valued slot with separately addressable parts.
    Complex {
        real: Box<ParamTree>,
        imag: Box<ParamTree>,
    },
    /// An ordered sequence of slots, e.g. center coordinates.
    Sequence(Vec<ParamTree>),
    /// Named substructure.
    Mapping(BTreeMap<String, ParamTree>),
}

/// The parameters of a scatterer, by slot name.
pub type ParamMap = BTreeMap<String, ParamTree>;

impl ParamTree {
    /// A fixed scalar leaf.
    pub fn scalar(value: f64) -> Self {
        ParamTree::Value(ParamValue::Fixed(value))
    }

    /// A fixed complex leaf.
    pub fn complex(value: Complex64) -> Self {
        ParamTree::Complex {
            real: Box::new(ParamTree::scalar(value.re)),
            imag: Box::new(ParamTree::scalar(value.im)),
        }
    }

    /// A fixed 3-vector leaf.
    pub fn vector3(value: &Vector3<f64>) -> Self {
        ParamTree::Sequence(vec![
            ParamTree::scalar(value.x),
            ParamTree::scalar(value.y),
            ParamTree::scalar(value.z),
        ])
    }

    /// Resolve a scalar slot, taking guesses for fittable leaves.
    pub fn as_scalar(&self) -> Result<f64> {
        match self {
            ParamTree::Value(value) => value.guess(),
            other => Err(invalid_shape("a scalar", other)),
        }
    }

    /// Resolve a complex slot.
    pub fn as_complex(&self) -> Result<Complex64> {
        match self {
            ParamTree::Complex { real, imag } => {
                Ok(Complex64::new(real.as_scalar()?, imag.as_scalar()?))
            }
            // a bare scalar is a real index
            ParamTree::Value(value) => Ok(Complex64::new(value.guess()?, 0.0)),
            other => Err(invalid_shape("a complex number", other)),
        }
    }

    /// Resolve a 3-vector slot.
    pub fn as_vector3(&self) -> Result<Vector3<f64>> {
        match self {
            ParamTree::Sequence(items) if items.len() == 3 => Ok(Vector3::new(
                items[0].as_scalar()?,
                items[1].as_scalar()?,
                items[2].as_scalar()?,
            )),
            other => Err(invalid_shape("a 3-vector", other)),
        }
    }

    /// Copy of the tree with every fittable leaf replaced by its guess.
    pub fn guessed(&self) -> Result<ParamTree> {
        match self {
            ParamTree::Value(value) => Ok(ParamTree::scalar(value.guess()?)),
            ParamTree::Complex { real, imag } => Ok(ParamTree::Complex {
                real: Box::new(real.guessed()?),
                imag: Box::new(imag.guessed()?),
            }),
            ParamTree::Sequence(items) => Ok(ParamTree::Sequence(
                items.iter().map(|t| t.guessed()).collect::<Result<_>>()?,
            )),
            ParamTree::Mapping(map) => Ok(ParamTree::Mapping(
                map.iter()
                    .map(|(k, v)| Ok((k.clone(), v.guessed()?)))
                    .collect::<Result<_>>()?,
            )),
        }
    }
}

fn invalid_shape(expected: &str, got: &ParamTree) -> HoloFitError {
    let kind = match got {
        ParamTree::Value(_) => "a scalar",
        ParamTree::Complex { .. } => "a complex number",
        ParamTree::Sequence(items) => return HoloFitError::InvalidScatterer(format!(
            "expected {}, got a sequence of length {}",
            expected,
            items.len()
        )),
        ParamTree::Mapping(_) => "a mapping",
    };
    HoloFitError::InvalidScatterer(format!("expected {}, got {}", expected, kind))
}

/// Look up a required slot in a parameter map.
pub fn require<'a>(params: &'a ParamMap, key: &str) -> Result<&'a ParamTree> {
    params.get(key).ok_or_else(|| {
        HoloFitError::InvalidScatterer(format!("cannot interpret parameters: no slot '{}'", key))
    })
}

/// A scatterer defined by a center and a structured set of parameters.
///
/// Implementors can be flattened to a [`ParamMap`] and rebuilt from one;
/// the pair is an exact round trip. `geometry` projects the shape into the
/// indicator representation used for domain tests and voxelation.
pub trait CenteredScatterer: Sized {
    /// The scatterer's parameters, by slot name.
    fn parameters(&self) -> ParamMap;

    /// Rebuild a scatterer from a parameter map. Fittable leaves are
    /// resolved to their guesses; a map whose shape does not match the
    /// scatterer's structure fails with `InvalidScatterer`.
    fn from_parameters(params: &ParamMap) -> Result<Self>;

    /// The indicator-based geometric representation of this scatterer.
    fn geometry(&self) -> Scatterer;

    /// A concrete scatterer with every fittable slot replaced by its
    /// guess. For a scatterer built from concrete values this is a copy of
    /// the scatterer itself.
    fn guess(&self) -> Result<Self> {
        let guessed = self
            .parameters()
            .iter()
            .map(|(k, v)| Ok((k.clone(), v.guessed()?)))
            .collect::<Result<ParamMap>>()?;
        Self::from_parameters(&guessed)
    }
}
