//! Optical materials.
//!
//! Only the behavior the tracer consumes lives here; dispersion formulas and
//! glass catalogs belong to richer implementations of [`Material`].
//! Wavelengths are in nanometres, thicknesses in millimetres.

use std::fmt;

/// Optical properties of a medium, as seen by the tracer.
pub trait Material: fmt::Debug {
    /// Real part of the refractive index.
    fn get_refractive_index(&self, wavelen: f64) -> f64;

    /// Imaginary part of the refractive index. Non-zero for absorbing media such as metals.
    fn get_extinction_coefficient(&self, _wavelen: f64) -> f64 {
        0.0
    }

    /// Fraction of intensity surviving propagation over `thickness` inside the medium.
    fn get_internal_transmittance(&self, wavelen: f64, thickness: f64) -> f64;

    fn is_opaque(&self) -> bool {
        false
    }

    fn is_reflecting(&self) -> bool {
        false
    }
}

/// Index 1, perfectly transparent.
#[derive(Debug, Clone, Copy, Default)]
pub struct Vacuum;

impl Material for Vacuum {
    fn get_refractive_index(&self, _wavelen: f64) -> f64 {
        1.0
    }

    fn get_internal_transmittance(&self, _wavelen: f64, _thickness: f64) -> f64 {
        1.0
    }
}

/// A transparent medium with a wavelength independent index.
#[derive(Debug, Clone, PartialEq)]
pub struct Solid {
    name: Option<String>,
    index: f64,
    extinction: f64,
    // Absorption coefficient in 1/mm
    absorption: f64,
}

impl Solid {
    pub fn new(index: f64) -> Self {
        Self {
            name: None,
            index,
            extinction: 0.0,
            absorption: 0.0,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the bulk absorption coefficient, in 1/mm.
    pub fn with_absorption(mut self, absorption: f64) -> Self {
        self.absorption = absorption;
        self
    }

    pub fn with_extinction(mut self, extinction: f64) -> Self {
        self.extinction = extinction;
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl Material for Solid {
    fn get_refractive_index(&self, _wavelen: f64) -> f64 {
        self.index
    }

    fn get_extinction_coefficient(&self, _wavelen: f64) -> f64 {
        self.extinction
    }

    fn get_internal_transmittance(&self, _wavelen: f64, thickness: f64) -> f64 {
        (-self.absorption * thickness.abs()).exp()
    }
}

/// A reflecting coating.
///
/// With a zero extinction coefficient the mirror is perfect; otherwise the
/// reflectance follows from the complex index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mirror {
    index: f64,
    extinction: f64,
}

impl Mirror {
    /// A lossless mirror.
    pub fn new() -> Self {
        Self {
            index: 1.0,
            extinction: 0.0,
        }
    }

    /// A metal coating with complex index `index + i·extinction`.
    pub fn metal(index: f64, extinction: f64) -> Self {
        Self { index, extinction }
    }
}

impl Default for Mirror {
    fn default() -> Self {
        Self::new()
    }
}

impl Material for Mirror {
    fn get_refractive_index(&self, _wavelen: f64) -> f64 {
        self.index
    }

    fn get_extinction_coefficient(&self, _wavelen: f64) -> f64 {
        self.extinction
    }

    fn get_internal_transmittance(&self, _wavelen: f64, _thickness: f64) -> f64 {
        0.0
    }

    fn is_opaque(&self) -> bool {
        true
    }

    fn is_reflecting(&self) -> bool {
        true
    }
}

/// Blackened material: swallows every ray reaching it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Absorber;

impl Material for Absorber {
    fn get_refractive_index(&self, _wavelen: f64) -> f64 {
        1.0
    }

    fn get_internal_transmittance(&self, _wavelen: f64, _thickness: f64) -> f64 {
        0.0
    }

    fn is_opaque(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_absorption() {
        let glass = Solid::new(1.5).with_absorption(0.01);
        assert_eq!(glass.get_refractive_index(550.0), 1.5);
        assert!((glass.get_internal_transmittance(550.0, 100.0) - (-1.0f64).exp()).abs() < 1e-12);
        assert_eq!(Solid::new(1.5).get_internal_transmittance(550.0, 1e3), 1.0);
    }

    #[test]
    fn test_mirror_flags() {
        let mirror = Mirror::new();
        assert!(mirror.is_reflecting());
        assert!(mirror.is_opaque());
        assert!(!Absorber.is_reflecting());
        assert!(Absorber.is_opaque());
        assert!(!Vacuum.is_opaque());
    }
}
