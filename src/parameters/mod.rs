//! Parameter system for hologram fitting
//!
//! This module provides the [`Parameter`] struct, which describes a single
//! named physical quantity to be varied during a fit: an initial guess,
//! optional box limits, and the scale factor used to map between physical
//! units and the near-unity values the optimizer works in.

pub mod parameter;

pub use parameter::Parameter;
