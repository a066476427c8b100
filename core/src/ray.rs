use std::rc::Rc;

use cgmath::{Point3, Vector3};
use optrace_common::Ray;

use crate::element::ElementId;
use crate::error::TraceError;
use crate::material::Material;
use crate::System;

/// Index of a ray in its [`crate::TraceResult`] pool.
pub type RayId = usize;

/// Where a ray ended on a surface, in that surface's local frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intercept {
    pub element: ElementId,
    pub point: Point3<f64>,
    /// Intensity on arrival, after the losses along the way.
    pub intensity: f64,
}

/// A traced light path segment.
///
/// Geometry is expressed in the local frame of the element that created the
/// ray: the source for generated rays, the surface for their descendants.
#[derive(Debug, Clone)]
pub struct TraceRay {
    pub(crate) ray: Ray,
    pub(crate) wavelen: f64,
    pub(crate) intensity: f64,
    pub(crate) creator: ElementId,
    pub(crate) medium: Rc<dyn Material>,

    pub(crate) parent: Option<RayId>,
    pub(crate) children: Vec<RayId>,
    pub(crate) intercept: Option<Intercept>,
    pub(crate) lost: bool,
}

impl TraceRay {
    pub(crate) fn new(
        ray: Ray,
        wavelen: f64,
        intensity: f64,
        creator: ElementId,
        medium: Rc<dyn Material>,
    ) -> Self {
        Self {
            ray,
            wavelen,
            intensity,
            creator,
            medium,
            parent: None,
            children: Vec::new(),
            intercept: None,
            lost: false,
        }
    }

    /// Origin and direction in the creator's local frame.
    pub fn ray(&self) -> &Ray {
        &self.ray
    }

    pub fn origin(&self) -> Point3<f64> {
        self.ray.origin
    }

    pub fn direction(&self) -> Vector3<f64> {
        self.ray.direction
    }

    /// Wavelength in nanometres.
    pub fn wavelen(&self) -> f64 {
        self.wavelen
    }

    /// Intensity at the ray origin.
    pub fn intensity(&self) -> f64 {
        self.intensity
    }

    /// Element whose frame the ray geometry is expressed in.
    pub fn creator(&self) -> ElementId {
        self.creator
    }

    /// Medium the ray travels through.
    pub fn medium(&self) -> &Rc<dyn Material> {
        &self.medium
    }

    pub fn parent(&self) -> Option<RayId> {
        self.parent
    }

    pub fn children(&self) -> &[RayId] {
        &self.children
    }

    pub fn intercept(&self) -> Option<&Intercept> {
        self.intercept.as_ref()
    }

    pub fn is_lost(&self) -> bool {
        self.lost
    }

    /// The ray expressed in the local frame of `element`.
    pub fn ray_in(&self, system: &System, element: ElementId) -> Result<Ray, TraceError> {
        Ok(system.get_transform(self.creator, element)?.apply_ray(&self.ray))
    }

    /// The ray expressed in system coordinates.
    pub fn global_ray(&self, system: &System) -> Result<Ray, TraceError> {
        Ok(system.get_global_transform(self.creator)?.apply_ray(&self.ray))
    }

    /// The intercept point expressed in system coordinates.
    pub fn global_intercept(&self, system: &System) -> Result<Option<Point3<f64>>, TraceError> {
        match self.intercept {
            Some(intercept) => {
                let transform = system.get_global_transform(intercept.element)?;
                Ok(Some(transform.apply_point(intercept.point)))
            }
            None => Ok(None),
        }
    }
}
