use std::rc::Rc;

use cgmath::{EuclideanSpace, InnerSpace, Point3, Vector3};
use optrace_common::{Plane, Ray, EPSILON};

use crate::element::ElementId;
use crate::error::TraceError;
use crate::material::Material;
use crate::params::Params;
use crate::ray::{RayId, TraceRay};
use crate::result::TraceResult;
use crate::System;

/// Helium d line, in nanometres.
pub const DEFAULT_WAVELEN: f64 = 587.5618;

/// A monochromatic component of a source spectrum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralLine {
    /// Wavelength in nanometres.
    pub wavelen: f64,
    pub intensity: f64,
}

impl SpectralLine {
    pub fn new(wavelen: f64, intensity: f64) -> Self {
        Self { wavelen, intensity }
    }
}

impl Default for SpectralLine {
    fn default() -> Self {
        Self::new(DEFAULT_WAVELEN, 1.0)
    }
}

/// Where the light of a source comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceMode {
    /// Parallel rays travelling along `direction`, in the source's local frame.
    Infinity { direction: Vector3<f64> },
    /// Rays diverging from the source position.
    Finite,
}

/// A light source.
///
/// Rays are aimed at the sample points of target surfaces. Without explicit
/// targets the system's entrance pupil is used.
#[derive(Debug, Clone)]
pub struct Source {
    mode: SourceMode,
    lines: Vec<SpectralLine>,
    targets: Vec<ElementId>,
    material: Option<Rc<dyn Material>>,
}

impl Source {
    /// A source at infinity emitting along `direction`.
    pub fn infinity(direction: Vector3<f64>) -> Result<Self, TraceError> {
        let length = direction.magnitude();
        if length.is_nan() || length <= EPSILON {
            return Err(TraceError::geometry("source direction has no length"));
        }
        Ok(Self::new(SourceMode::Infinity {
            direction: direction / length,
        }))
    }

    /// A point source located at the element position.
    pub fn point() -> Self {
        Self::new(SourceMode::Finite)
    }

    fn new(mode: SourceMode) -> Self {
        Self {
            mode,
            lines: vec![SpectralLine::default()],
            targets: Vec::new(),
            material: None,
        }
    }

    /// Replaces the spectrum by `lines`, in the given order.
    pub fn with_spectral_lines(mut self, lines: impl IntoIterator<Item = SpectralLine>) -> Self {
        self.lines = lines.into_iter().collect();
        self
    }

    /// Aims the source at `surface` in addition to existing targets.
    pub fn with_target(mut self, surface: ElementId) -> Self {
        self.targets.push(surface);
        self
    }

    /// Medium the generated rays start in, the environment when unset.
    pub fn with_material(mut self, material: Rc<dyn Material>) -> Self {
        self.material = Some(material);
        self
    }

    pub fn mode(&self) -> SourceMode {
        self.mode
    }

    pub fn spectral_lines(&self) -> &[SpectralLine] {
        &self.lines
    }

    pub fn add_spectral_line(&mut self, line: SpectralLine) {
        self.lines.push(line);
    }

    pub fn targets(&self) -> &[ElementId] {
        &self.targets
    }

    pub fn add_target(&mut self, surface: ElementId) {
        self.targets.push(surface);
    }

    pub fn clear_targets(&mut self) {
        self.targets.clear();
    }

    pub fn material(&self) -> Option<&Rc<dyn Material>> {
        self.material.as_ref()
    }

    /// Generates one ray per (spectral line, target sample point) pair into `result`.
    ///
    /// Lines are the outer loop, so the pattern order repeats for every line.
    pub(crate) fn generate_rays(
        &self,
        id: ElementId,
        system: &System,
        params: &Params,
        targets: &[ElementId],
        result: &mut TraceResult,
    ) -> Result<Vec<RayId>, TraceError> {
        let medium = self
            .material
            .clone()
            .unwrap_or_else(|| system.environment().clone());

        let mut points = Vec::new();
        for &target in targets {
            let surface = system
                .element(target)?
                .as_surface()
                .ok_or_else(|| TraceError::configuration(format!("source target {target} is not a surface")))?;
            let distribution = params.get_distribution(target);
            distribution.validate()?;

            let to_source = system.get_transform(target, id)?;
            let curve = surface.curve();
            surface
                .shape()
                .get_pattern(distribution, params.unobstructed, &mut |p| {
                    let local = Point3::new(p.x, p.y, curve.sagitta_xy(p.x, p.y));
                    points.push(to_source.apply_point(local));
                });
        }

        if self.lines.is_empty() {
            log::warn!("Source {} has no spectral line, nothing generated", id);
        }

        let mut generated = Vec::with_capacity(self.lines.len() * points.len());
        for line in &self.lines {
            for &point in &points {
                let Some(ray) = self.ray_towards(point) else {
                    continue;
                };
                let ray = TraceRay::new(ray, line.wavelen, line.intensity, id, medium.clone());
                let ray_id = result.push_ray(ray, None);
                result.record_generated(id, ray_id);
                generated.push(ray_id);
            }
        }
        log::debug!("Source {} generated {} rays", id, generated.len());
        Ok(generated)
    }

    fn ray_towards(&self, target: Point3<f64>) -> Option<Ray> {
        match self.mode {
            SourceMode::Finite => {
                let direction = target.to_vec();
                (direction.magnitude() > EPSILON).then(|| Ray::new(Point3::origin(), direction))
            }
            SourceMode::Infinity { direction } => {
                // Start on the plane through the source origin, perpendicular to the beam
                let plane = Plane::new(direction, Point3::origin());
                let origin = target - plane.normal * plane.signed_distance(target);
                Some(Ray::new(origin, direction))
            }
        }
    }
}
