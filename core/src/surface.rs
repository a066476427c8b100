use std::rc::Rc;

use cgmath::{InnerSpace, Point2, Point3, Vector3};
use optrace_common::{Aabb, Ray};

use crate::curve::{Curve, Flat};
use crate::intensity::IntensityModel;
use crate::interface::{incidence_cosine, reflect, refract, ComplexIndex, Interface};
use crate::material::{Material, Mirror};
use crate::params::Params;
use crate::shape::Shape;

/// Rays closer than this to their origin do not count as hits, so a ray
/// leaving a surface never intersects it again at its own origin.
pub const MIN_DISTANCE: f64 = 1e-7;

/// What a surface does to the light reaching it.
#[derive(Debug, Clone)]
pub enum SurfaceRole {
    /// Interface between two media. `before` lies on the local -Z side.
    /// `None` stands for the system environment.
    Optical {
        before: Option<Rc<dyn Material>>,
        after: Option<Rc<dyn Material>>,
    },
    /// Aperture stop: blocks light outside its shape up to `external_radius`.
    Stop {
        external_radius: f64,
        intercept_reemit: bool,
    },
    /// Detector: records and absorbs every ray.
    Image,
}

/// An element whose curve and shape define a ray intersection target.
#[derive(Debug, Clone)]
pub struct Surface {
    curve: Rc<dyn Curve>,
    shape: Rc<dyn Shape>,
    role: SurfaceRole,
    discard_intensity: f64,
}

/// The light leaving a surface after an interaction, in the surface frame.
#[derive(Debug, Clone)]
pub(crate) struct Emission {
    pub direction: Vector3<f64>,
    pub intensity: f64,
    pub medium: Rc<dyn Material>,
}

impl Surface {
    pub fn new(curve: Rc<dyn Curve>, shape: Rc<dyn Shape>, role: SurfaceRole) -> Self {
        Self {
            curve,
            shape,
            role,
            discard_intensity: 0.0,
        }
    }

    /// A refracting interface between `before` (local -Z side) and `after`.
    pub fn optical(
        curve: Rc<dyn Curve>,
        shape: Rc<dyn Shape>,
        before: Option<Rc<dyn Material>>,
        after: Option<Rc<dyn Material>>,
    ) -> Self {
        Self::new(curve, shape, SurfaceRole::Optical { before, after })
    }

    /// A lossless mirror, reflective on both sides.
    pub fn mirror(curve: Rc<dyn Curve>, shape: Rc<dyn Shape>) -> Self {
        Self::mirror_with(curve, shape, Rc::new(Mirror::new()))
    }

    pub fn mirror_with(curve: Rc<dyn Curve>, shape: Rc<dyn Shape>, coating: Rc<dyn Material>) -> Self {
        Self::optical(curve, shape, Some(coating.clone()), Some(coating))
    }

    /// A flat aperture stop whose opening is `shape`.
    ///
    /// The blocking area extends to twice the aperture's largest radius.
    pub fn stop(shape: Rc<dyn Shape>) -> Self {
        let external_radius = shape.max_radius() * 2.0;
        Self::new(
            Rc::new(Flat),
            shape,
            SurfaceRole::Stop {
                external_radius,
                intercept_reemit: false,
            },
        )
    }

    pub fn image(curve: Rc<dyn Curve>, shape: Rc<dyn Shape>) -> Self {
        Self::new(curve, shape, SurfaceRole::Image)
    }

    /// Rays whose intensity drops under `threshold` are discarded by this surface.
    pub fn with_discard_intensity(mut self, threshold: f64) -> Self {
        self.discard_intensity = threshold;
        self
    }

    /// Sets the outer radius of a stop's blocking area. No effect on other surfaces.
    pub fn with_external_radius(mut self, radius: f64) -> Self {
        if let SurfaceRole::Stop { external_radius, .. } = &mut self.role {
            *external_radius = radius;
        }
        self
    }

    /// Makes a stop intercept the rays passing through its opening and
    /// reemit them unchanged. No effect on other surfaces.
    pub fn with_intercept_reemit(mut self, enabled: bool) -> Self {
        if let SurfaceRole::Stop { intercept_reemit, .. } = &mut self.role {
            *intercept_reemit = enabled;
        }
        self
    }

    pub fn curve(&self) -> &Rc<dyn Curve> {
        &self.curve
    }

    pub fn shape(&self) -> &Rc<dyn Shape> {
        &self.shape
    }

    pub fn set_curve(&mut self, curve: Rc<dyn Curve>) {
        self.curve = curve;
    }

    pub fn set_shape(&mut self, shape: Rc<dyn Shape>) {
        self.shape = shape;
    }

    pub fn role(&self) -> &SurfaceRole {
        &self.role
    }

    pub fn role_mut(&mut self) -> &mut SurfaceRole {
        &mut self.role
    }

    pub fn discard_intensity(&self) -> f64 {
        self.discard_intensity
    }

    pub fn set_discard_intensity(&mut self, threshold: f64) {
        self.discard_intensity = threshold;
    }

    pub fn is_stop(&self) -> bool {
        matches!(self.role, SurfaceRole::Stop { .. })
    }

    pub fn is_image(&self) -> bool {
        matches!(self.role, SurfaceRole::Image)
    }

    /// Whether either side of an optical surface is a reflecting material.
    pub fn is_reflecting(&self) -> bool {
        match &self.role {
            SurfaceRole::Optical { before, after } => [before, after]
                .into_iter()
                .flatten()
                .any(|m| m.is_reflecting()),
            _ => false,
        }
    }

    /// Materials on the local -Z and +Z sides, `None` meaning the environment.
    pub fn materials(&self) -> Option<(Option<&Rc<dyn Material>>, Option<&Rc<dyn Material>>)> {
        match &self.role {
            SurfaceRole::Optical { before, after } => Some((before.as_ref(), after.as_ref())),
            _ => None,
        }
    }

    /// Finds where a ray in the surface's local frame hits the surface.
    ///
    /// Returns None when the curve is missed, when the hit lies behind the ray
    /// origin, or when it falls outside the shape. For stops the blocking area
    /// out to the external radius counts as part of the surface, and in
    /// non-sequential propagation rays crossing the opening are ignored unless
    /// the stop reemits them.
    pub fn intersect(&self, params: &Params, ray: &Ray) -> Option<Point3<f64>> {
        let point = self.curve.intersect(ray)?;
        if ray.project(point) < MIN_DISTANCE {
            return None;
        }
        let point2 = Point2::new(point.x, point.y);

        match self.role {
            SurfaceRole::Stop {
                external_radius,
                intercept_reemit,
            } => {
                if point.x.hypot(point.y) > external_radius {
                    return None;
                }
                if !params.is_sequential() && !intercept_reemit && self.shape.inside(point2) {
                    return None;
                }
                Some(point)
            }
            _ => self.shape.inside(point2).then_some(point),
        }
    }

    /// Local bounding box enclosing every point `intersect` may return.
    pub fn bounding_box(&self) -> Aabb {
        let (lo, hi) = match self.role {
            SurfaceRole::Stop { external_radius, .. } => {
                (Point2::new(-external_radius, -external_radius), Point2::new(external_radius, external_radius))
            }
            _ => self.shape.get_bounding_box(),
        };

        let radius = lo.x.hypot(lo.y).max(hi.x.hypot(hi.y));
        let mut z_min = 0.0f64;
        let mut z_max = 0.0f64;
        const SAMPLES: usize = 16;
        for i in 1..=SAMPLES {
            let z = self.curve.sagitta(radius * i as f64 / SAMPLES as f64);
            if z.is_finite() {
                z_min = z_min.min(z);
                z_max = z_max.max(z);
            }
        }
        Aabb::new(Point3::new(lo.x, lo.y, z_min), Point3::new(hi.x, hi.y, z_max))
    }

    /// Computes the light leaving the surface for a ray that hit it at `point`.
    ///
    /// `direction` and `point` are in the surface frame. Returns None when
    /// the ray is absorbed.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn interact(
        &self,
        environment: &Rc<dyn Material>,
        model: &dyn IntensityModel,
        medium: &Rc<dyn Material>,
        wavelen: f64,
        intensity: f64,
        point: Point3<f64>,
        direction: Vector3<f64>,
    ) -> Option<Emission> {
        match &self.role {
            SurfaceRole::Image => None,
            SurfaceRole::Stop { .. } => self.shape.inside(Point2::new(point.x, point.y)).then(|| Emission {
                direction,
                intensity,
                medium: medium.clone(),
            }),
            SurfaceRole::Optical { before, after } => {
                let normal = self.curve.normal(point);
                let forward = normal.dot(direction) > 0.0;
                let outgoing = (if forward { after } else { before })
                    .as_ref()
                    .unwrap_or(environment);

                let interface = Interface {
                    incoming: ComplexIndex::new(
                        medium.get_refractive_index(wavelen),
                        medium.get_extinction_coefficient(wavelen),
                    ),
                    outgoing: ComplexIndex::new(
                        outgoing.get_refractive_index(wavelen),
                        outgoing.get_extinction_coefficient(wavelen),
                    ),
                    cos_incidence: incidence_cosine(direction, normal),
                };

                if outgoing.is_reflecting() {
                    return Some(Emission {
                        direction: reflect(direction, normal),
                        intensity: model.reflected(intensity, &interface),
                        medium: medium.clone(),
                    });
                }
                if outgoing.is_opaque() {
                    return None;
                }

                match refract(direction, normal, interface.incoming.n, interface.outgoing.n) {
                    Some(refracted) => Some(Emission {
                        direction: refracted,
                        intensity: model.transmitted(intensity, &interface),
                        medium: outgoing.clone(),
                    }),
                    None => {
                        // Total internal reflection
                        let tir = Interface {
                            outgoing: ComplexIndex::real(interface.outgoing.n),
                            ..interface
                        };
                        Some(Emission {
                            direction: reflect(direction, normal),
                            intensity: model.reflected(intensity, &tir),
                            medium: medium.clone(),
                        })
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::Sphere;
    use crate::intensity::IntensityMode;
    use crate::material::{Absorber, Solid, Vacuum};
    use crate::params::PropagationMode;
    use crate::shape::Disk;

    fn air() -> Rc<dyn Material> {
        Rc::new(Vacuum)
    }

    fn axial(x: f64, y: f64) -> Ray {
        Ray::new(Point3::new(x, y, -10.0), Vector3::unit_z())
    }

    #[test]
    fn test_intersect_rejects_outside_and_behind() {
        let surface = Surface::image(Rc::new(Flat), Rc::new(Disk::new(5.0)));
        let params = Params::default();
        assert!(surface.intersect(&params, &axial(1.0, 1.0)).is_some());
        assert!(surface.intersect(&params, &axial(6.0, 0.0)).is_none());

        let behind = Ray::new(Point3::new(0.0, 0.0, 10.0), Vector3::unit_z());
        assert!(surface.intersect(&params, &behind).is_none());

        let on_surface = Ray::new(Point3::new(0.0, 0.0, 0.0), Vector3::unit_z());
        assert!(surface.intersect(&params, &on_surface).is_none());
    }

    #[test]
    fn test_stop_intersection_depends_on_mode() {
        let stop = Surface::stop(Rc::new(Disk::new(10.0)));
        let mut params = Params::default();

        // Non-sequential: the opening is transparent, the blocking ring is not
        assert!(stop.intersect(&params, &axial(2.0, 0.0)).is_none());
        assert!(stop.intersect(&params, &axial(15.0, 0.0)).is_some());
        assert!(stop.intersect(&params, &axial(25.0, 0.0)).is_none());

        let reemit = stop.clone().with_intercept_reemit(true);
        assert!(reemit.intersect(&params, &axial(2.0, 0.0)).is_some());

        params.propagation_mode = PropagationMode::Sequential;
        assert!(stop.intersect(&params, &axial(2.0, 0.0)).is_some());
    }

    #[test]
    fn test_stop_interaction() {
        let stop = Surface::stop(Rc::new(Disk::new(10.0)));
        let model = IntensityMode::Intensity.model();
        let d = Vector3::new(0.0, 0.1, 1.0).normalize();

        let passed = stop
            .interact(&air(), model, &air(), 550.0, 1.0, Point3::new(0.0, 3.0, 0.0), d)
            .unwrap();
        assert_eq!(passed.direction, d);
        assert_eq!(passed.intensity, 1.0);

        assert!(stop
            .interact(&air(), model, &air(), 550.0, 1.0, Point3::new(0.0, 13.0, 0.0), d)
            .is_none());
    }

    #[test]
    fn test_optical_refraction_and_losses() {
        let glass: Rc<dyn Material> = Rc::new(Solid::new(1.5));
        let surface = Surface::optical(Rc::new(Flat), Rc::new(Disk::new(10.0)), None, Some(glass.clone()));
        let model = IntensityMode::Intensity.model();

        let out = surface
            .interact(&air(), model, &air(), 550.0, 1.0, Point3::new(0.0, 0.0, 0.0), Vector3::unit_z())
            .unwrap();
        assert!((out.direction - Vector3::unit_z()).magnitude() < 1e-12);
        assert!((out.intensity - 0.96).abs() < 1e-12);
        assert!((out.medium.get_refractive_index(550.0) - 1.5).abs() < 1e-12);

        // Coming back out of the glass
        let back = surface
            .interact(&air(), model, &glass, 550.0, 1.0, Point3::new(0.0, 0.0, 0.0), -Vector3::unit_z())
            .unwrap();
        assert_eq!(back.medium.get_refractive_index(550.0), 1.0);
    }

    #[test]
    fn test_total_internal_reflection_keeps_medium() {
        let glass: Rc<dyn Material> = Rc::new(Solid::new(1.5));
        let surface = Surface::optical(Rc::new(Flat), Rc::new(Disk::new(10.0)), Some(glass.clone()), None);
        let model = IntensityMode::Intensity.model();
        let angle = 60f64.to_radians();
        let d = Vector3::new(angle.sin(), 0.0, angle.cos());

        let out = surface
            .interact(&air(), model, &glass, 550.0, 1.0, Point3::new(0.0, 0.0, 0.0), d)
            .unwrap();
        assert!(out.direction.z < 0.0);
        assert_eq!(out.intensity, 1.0);
        assert_eq!(out.medium.get_refractive_index(550.0), 1.5);
    }

    #[test]
    fn test_mirror_and_absorber() {
        let mirror = Surface::mirror(Rc::new(Sphere::from_radius(-100.0)), Rc::new(Disk::new(10.0)));
        assert!(mirror.is_reflecting());
        let model = IntensityMode::Intensity.model();
        let out = mirror
            .interact(&air(), model, &air(), 550.0, 1.0, Point3::new(0.0, 0.0, 0.0), Vector3::unit_z())
            .unwrap();
        assert!((out.direction + Vector3::unit_z()).magnitude() < 1e-12);
        assert_eq!(out.intensity, 1.0);

        let absorber: Rc<dyn Material> = Rc::new(Absorber);
        let black = Surface::optical(Rc::new(Flat), Rc::new(Disk::new(10.0)), None, Some(absorber));
        assert!(black
            .interact(&air(), model, &air(), 550.0, 1.0, Point3::new(0.0, 0.0, 0.0), Vector3::unit_z())
            .is_none());
    }

    #[test]
    fn test_bounding_box_covers_sag() {
        let surface = Surface::image(Rc::new(Sphere::from_radius(20.0)), Rc::new(Disk::new(10.0)));
        let aabb = surface.bounding_box();
        assert!((aabb.max.z - surface.curve().sagitta(10.0f64.hypot(10.0))).abs() < 1e-9);
        assert_eq!(aabb.min.z, 0.0);
    }
}
