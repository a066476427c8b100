//! Surface profiles.
//!
//! A curve gives the sagitta `z(r)` of a rotationally symmetric surface whose
//! vertex sits at the local origin, tangent to the `z = 0` plane.

use std::fmt;

use cgmath::{InnerSpace, Point3, Vector3};
use optrace_common::{Ray, EPSILON};

const NEWTON_MAX_ITERATIONS: usize = 32;
const NEWTON_TOLERANCE: f64 = 1e-10;

pub trait Curve: fmt::Debug {
    /// Surface height at radial distance `r` from the axis.
    fn sagitta(&self, r: f64) -> f64;

    /// Slope `dz/dr` at radial distance `r`.
    fn derivative(&self, r: f64) -> f64;

    /// Sagitta at an arbitrary point of the `xy` plane.
    fn sagitta_xy(&self, x: f64, y: f64) -> f64 {
        self.sagitta(x.hypot(y))
    }

    /// Unit normal at a point of the curve, pointing towards local `+z` at the vertex.
    fn normal(&self, point: Point3<f64>) -> Vector3<f64> {
        let r = point.x.hypot(point.y);
        if r < EPSILON {
            return Vector3::unit_z();
        }
        let d = self.derivative(r);
        Vector3::new(-d * point.x / r, -d * point.y / r, 1.0).normalize()
    }

    /// Finds where the ray's supporting line meets the curve.
    ///
    /// The default solves `z - sagitta(x, y) = 0` by Newton iteration starting
    /// from the vertex plane. The returned point may lie behind the ray origin.
    fn intersect(&self, ray: &Ray) -> Option<Point3<f64>> {
        let mut t = ray.intersect_xy_plane()?;
        for _ in 0..NEWTON_MAX_ITERATIONS {
            let p = ray.point_at(t);
            let f = p.z - self.sagitta_xy(p.x, p.y);
            if f.abs() < NEWTON_TOLERANCE {
                return Some(p);
            }
            let r = p.x.hypot(p.y);
            let radial_rate = if r < EPSILON {
                0.0
            } else {
                (p.x * ray.direction.x + p.y * ray.direction.y) / r
            };
            let df = ray.direction.z - self.derivative(r) * radial_rate;
            if df.abs() < EPSILON || !df.is_finite() {
                return None;
            }
            t -= f / df;
        }
        None
    }
}

/// A plane.
#[derive(Debug, Clone, Copy, Default)]
pub struct Flat;

impl Curve for Flat {
    fn sagitta(&self, _r: f64) -> f64 {
        0.0
    }

    fn derivative(&self, _r: f64) -> f64 {
        0.0
    }

    fn normal(&self, _point: Point3<f64>) -> Vector3<f64> {
        Vector3::unit_z()
    }

    fn intersect(&self, ray: &Ray) -> Option<Point3<f64>> {
        let t = ray.intersect_xy_plane()?;
        let mut p = ray.point_at(t);
        p.z = 0.0;
        Some(p)
    }
}

/// A spherical cap of given curvature (inverse radius). Positive curvature
/// puts the center of the sphere on the `+z` side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    curvature: f64,
}

impl Sphere {
    pub fn new(curvature: f64) -> Self {
        Self { curvature }
    }

    pub fn from_radius(radius: f64) -> Self {
        Self::new(1.0 / radius)
    }

    pub fn curvature(&self) -> f64 {
        self.curvature
    }
}

impl Curve for Sphere {
    fn sagitta(&self, r: f64) -> f64 {
        let c = self.curvature;
        let root = (1.0 - c * c * r * r).max(0.0).sqrt();
        c * r * r / (1.0 + root)
    }

    fn derivative(&self, r: f64) -> f64 {
        let c = self.curvature;
        let root = (1.0 - c * c * r * r).max(EPSILON).sqrt();
        c * r / root
    }

    /// Analytic intersection with the sphere `c·|p|² - 2z = 0`, keeping the
    /// root on the cap that contains the vertex.
    fn intersect(&self, ray: &Ray) -> Option<Point3<f64>> {
        let c = self.curvature;
        let o = ray.origin;
        let d = ray.direction;

        let a = c * d.magnitude2();
        let b = c * (o.x * d.x + o.y * d.y + o.z * d.z) - d.z;
        let k = c * (o.x * o.x + o.y * o.y + o.z * o.z) - 2.0 * o.z;

        let discriminant = b * b - a * k;
        if discriminant < 0.0 {
            return None;
        }
        let denom = b + b.signum() * discriminant.sqrt();
        let denom = if b == 0.0 { discriminant.sqrt() } else { denom };
        if denom.abs() < EPSILON {
            return None;
        }
        Some(ray.point_at(-k / denom))
    }
}
