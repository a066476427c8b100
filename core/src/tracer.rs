//! Ray propagation through a [`System`].
//!
//! Two strategies share the per-hit physics implemented here:
//! - non-sequential: every ray searches the nearest surface it hits,
//! - sequential: ray batches visit the elements of a [`crate::Sequence`] in order.

mod non_sequential;
mod sequential;

use cgmath::{InnerSpace, Point3};
use optrace_common::Ray;

use crate::element::ElementId;
use crate::error::TraceError;
use crate::intensity::{IntensityMode, IntensityModel};
use crate::params::{Params, PropagationMode};
use crate::ray::{Intercept, RayId, TraceRay};
use crate::result::TraceResult;
use crate::sequence::Sequence;
use crate::source::Source;
use crate::surface::Surface;
use crate::System;

/// Runs traces over a system with its own copy of the trace parameters.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use cgmath::{Point3, Vector3};
/// use optrace::{Disk, Element, Flat, Source, Surface, System, TraceResult, Tracer};
///
/// let mut system = System::new();
/// let source = Source::infinity(Vector3::unit_z()).unwrap();
/// system.add(Element::source(source));
/// let image = system.add(
///     Element::surface(Surface::image(Rc::new(Flat), Rc::new(Disk::new(10.0))))
///         .with_position(Point3::new(0.0, 0.0, 50.0)),
/// );
/// system.set_entrance_pupil(image).unwrap();
///
/// let mut result = TraceResult::new();
/// result.set_intercepted_save_state(image, true);
/// Tracer::new(&system).trace(&mut result).unwrap();
/// assert_eq!(result.get_intercepted(image).unwrap().len(), 91);
/// ```
#[derive(Debug)]
pub struct Tracer<'a> {
    system: &'a System,
    params: Params,
}

impl<'a> Tracer<'a> {
    /// Creates a tracer starting from the system's default parameters.
    pub fn new(system: &'a System) -> Self {
        Self::with_params(system, system.default_params().clone())
    }

    pub fn with_params(system: &'a System, params: Params) -> Self {
        Self { system, params }
    }

    pub fn system(&self) -> &System {
        self.system
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }

    /// Traces every enabled source of the system into `result`.
    ///
    /// The result is cleared first; its bin registrations are kept. On error
    /// the content of `result` is unspecified.
    pub fn trace(&self, result: &mut TraceResult) -> Result<(), TraceError> {
        self.params.validate()?;
        result.clear();

        let model = self.params.intensity_mode.model();
        if self.params.intensity_mode == IntensityMode::Polarized {
            log::warn!("Polarization is not tracked, tracing unpolarized intensities");
        }

        let mut propagation = Propagation {
            system: self.system,
            params: &self.params,
            model,
            result: &mut *result,
        };
        match self.params.propagation_mode {
            PropagationMode::Sequential => sequential::trace(&mut propagation),
            PropagationMode::NonSequential => non_sequential::trace(&mut propagation),
        }?;

        log::debug!(
            "Traced {} rays from {} source(s)",
            result.len(),
            result.get_source_list().len()
        );
        Ok(())
    }
}

/// State shared by both propagation strategies during one trace.
struct Propagation<'a> {
    system: &'a System,
    params: &'a Params,
    model: &'static dyn IntensityModel,
    result: &'a mut TraceResult,
}

impl Propagation<'_> {
    /// Generates the rays of a source. `sequence` carries the sequence and
    /// the source's position in it when tracing sequentially.
    fn emit_source(
        &mut self,
        id: ElementId,
        source: &Source,
        sequence: Option<(&Sequence, usize)>,
    ) -> Result<Vec<RayId>, TraceError> {
        let targets = self.resolve_targets(id, source, sequence)?;
        self.result.add_source(id);
        source.generate_rays(id, self.system, self.params, &targets, self.result)
    }

    fn resolve_targets(
        &self,
        id: ElementId,
        source: &Source,
        sequence: Option<(&Sequence, usize)>,
    ) -> Result<Vec<ElementId>, TraceError> {
        if !source.targets().is_empty() {
            return Ok(source.targets().to_vec());
        }
        if let Some(pupil) = self.system.entrance_pupil() {
            return Ok(vec![pupil]);
        }
        if let Some((sequence, index)) = sequence {
            let next_surface = sequence.entries()[index + 1..].iter().find(|entry| {
                self.system
                    .get_element(entry.element)
                    .is_some_and(|e| e.as_surface().is_some())
            });
            if let Some(entry) = next_surface {
                return Ok(vec![entry.element]);
            }
        }
        Err(TraceError::configuration(format!(
            "source {id} has no target and no entrance pupil is defined"
        )))
    }

    /// The geometry of a pooled ray expressed in the local frame of `element`.
    fn ray_in(&self, ray: RayId, element: ElementId) -> Result<Ray, TraceError> {
        self.result.rays()[ray].ray_in(self.system, element)
    }

    fn mark_lost(&mut self, ray: RayId) {
        log::trace!("Ray {} lost", ray);
        self.result.ray_mut(ray).lost = true;
    }

    /// Records a ray hitting `surface` at `point` and spawns the ray leaving it.
    ///
    /// `local` is the incoming ray in the surface frame. Returns the child ray
    /// if any survives the surface's discard threshold.
    fn process_hit(
        &mut self,
        ray_id: RayId,
        surface_id: ElementId,
        surface: &Surface,
        local: &Ray,
        point: Point3<f64>,
    ) -> Option<RayId> {
        let ray = &self.result.rays()[ray_id];
        let wavelen = ray.wavelen;
        let medium = ray.medium.clone();
        let distance = (point - local.origin).magnitude();
        let intensity = self
            .model
            .propagate(ray.intensity, &*medium, wavelen, distance);

        let threshold = surface.discard_intensity();
        if intensity < threshold {
            log::trace!("Ray {} dropped before surface {} ({} < {})", ray_id, surface_id, intensity, threshold);
            self.mark_lost(ray_id);
            return None;
        }

        self.result.ray_mut(ray_id).intercept = Some(Intercept {
            element: surface_id,
            point,
            intensity,
        });
        self.result.record_intercepted(surface_id, ray_id);

        let emission = surface.interact(
            self.system.environment(),
            self.model,
            &medium,
            wavelen,
            intensity,
            point,
            local.direction,
        )?;
        if emission.intensity < threshold {
            log::trace!("Ray leaving surface {} discarded ({})", surface_id, emission.intensity);
            return None;
        }

        let child = TraceRay::new(
            Ray::new(point, emission.direction),
            wavelen,
            emission.intensity,
            surface_id,
            emission.medium,
        );
        Some(self.result.push_ray(child, Some(ray_id)))
    }
}

#[cfg(test)]
#[path = "trace_tests.rs"]
mod tests;
