//! Holographic image data and acquisition metadata

use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Optical metadata of a hologram acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Optics {
    /// Vacuum wavelength of the illumination, in meters.
    pub wavelen: f64,
    /// Refractive index of the medium.
    pub index: f64,
    /// Physical size of a pixel, in meters, per image axis.
    pub pixel_scale: (f64, f64),
}

impl Optics {
    /// Create optics metadata.
    pub fn new(wavelen: f64, index: f64, pixel_scale: (f64, f64)) -> Self {
        Self {
            wavelen,
            index,
            pixel_scale,
        }
    }

    /// Wavevector magnitude in the medium, `2 pi * index / wavelen`.
    pub fn wavevec(&self) -> f64 {
        2.0 * std::f64::consts::PI * self.index / self.wavelen
    }
}

/// A measured (or synthetic) hologram: a dense image with attached
/// acquisition metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Hologram {
    values: Array2<f64>,
    optics: Optics,
}

impl Hologram {
    /// Create a hologram from pixel values and optics metadata.
    pub fn new(values: Array2<f64>, optics: Optics) -> Self {
        Self { values, optics }
    }

    /// The pixel values.
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// The acquisition metadata.
    pub fn optics(&self) -> &Optics {
        &self.optics
    }

    /// Image shape as (rows, columns).
    pub fn shape(&self) -> (usize, usize) {
        self.values.dim()
    }

    /// Number of pixels.
    pub fn size(&self) -> usize {
        self.values.len()
    }

    /// Mean pixel value.
    pub fn mean(&self) -> f64 {
        self.values.sum() / self.values.len() as f64
    }
}
