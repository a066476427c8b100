//! Intensity bookkeeping strategies, selected once per trace.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::interface::Interface;
use crate::material::Material;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IntensityMode {
    /// Geometry only; intensities are never modified.
    Simple,
    /// Scalar intensity with Fresnel losses and bulk absorption.
    #[default]
    Intensity,
    /// Reserved for polarization tracking. Currently computes unpolarized intensities.
    Polarized,
}

impl IntensityMode {
    pub fn model(self) -> &'static dyn IntensityModel {
        match self {
            IntensityMode::Simple => &SimpleModel,
            IntensityMode::Intensity => &FresnelModel,
            IntensityMode::Polarized => &PolarizedModel,
        }
    }
}

/// How ray intensity evolves along a path and across interfaces.
pub trait IntensityModel: fmt::Debug + Sync {
    fn mode(&self) -> IntensityMode;

    /// Intensity left after travelling `distance` through `medium`.
    fn propagate(&self, intensity: f64, medium: &dyn Material, wavelen: f64, distance: f64) -> f64;

    /// Intensity carried by the refracted ray.
    fn transmitted(&self, intensity: f64, interface: &Interface) -> f64;

    /// Intensity carried by a ray reflected off a mirror or by total internal reflection.
    fn reflected(&self, intensity: f64, interface: &Interface) -> f64;
}

#[derive(Debug)]
pub struct SimpleModel;

impl IntensityModel for SimpleModel {
    fn mode(&self) -> IntensityMode {
        IntensityMode::Simple
    }

    fn propagate(&self, intensity: f64, _medium: &dyn Material, _wavelen: f64, _distance: f64) -> f64 {
        intensity
    }

    fn transmitted(&self, intensity: f64, _interface: &Interface) -> f64 {
        intensity
    }

    fn reflected(&self, intensity: f64, _interface: &Interface) -> f64 {
        intensity
    }
}

#[derive(Debug)]
pub struct FresnelModel;

impl IntensityModel for FresnelModel {
    fn mode(&self) -> IntensityMode {
        IntensityMode::Intensity
    }

    fn propagate(&self, intensity: f64, medium: &dyn Material, wavelen: f64, distance: f64) -> f64 {
        intensity * medium.get_internal_transmittance(wavelen, distance)
    }

    fn transmitted(&self, intensity: f64, interface: &Interface) -> f64 {
        intensity * interface.transmittance()
    }

    fn reflected(&self, intensity: f64, interface: &Interface) -> f64 {
        // Lossless dielectric boundary (TIR) or ideal mirror
        if interface.outgoing.k == 0.0 {
            intensity
        } else {
            intensity * interface.reflectance()
        }
    }
}

/// Polarization slot. Polarization state is not tracked, so this behaves as
/// [`FresnelModel`] on unpolarized light.
#[derive(Debug)]
pub struct PolarizedModel;

impl IntensityModel for PolarizedModel {
    fn mode(&self) -> IntensityMode {
        IntensityMode::Polarized
    }

    fn propagate(&self, intensity: f64, medium: &dyn Material, wavelen: f64, distance: f64) -> f64 {
        FresnelModel.propagate(intensity, medium, wavelen, distance)
    }

    fn transmitted(&self, intensity: f64, interface: &Interface) -> f64 {
        FresnelModel.transmitted(intensity, interface)
    }

    fn reflected(&self, intensity: f64, interface: &Interface) -> f64 {
        FresnelModel.reflected(intensity, interface)
    }
}
