use cgmath::{InnerSpace, Point3, Vector3};

use crate::EPSILON;

/// A geometric ray in 3D space, defined by an origin point and a direction vector.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Point3<f64>,
    pub direction: Vector3<f64>, // Should be normalized
}

impl Ray {
    /// Creates a new ray with the given origin and direction.
    /// The direction will be normalized automatically.
    pub fn new(origin: Point3<f64>, direction: Vector3<f64>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Returns a point along the ray at parameter t.
    /// The point is calculated as: origin + t * direction
    pub fn point_at(&self, t: f64) -> Point3<f64> {
        self.origin + self.direction * t
    }

    /// Ray parameter of the point closest to `point` along the supporting line.
    pub fn project(&self, point: Point3<f64>) -> f64 {
        (point - self.origin).dot(self.direction)
    }

    /// Intersects the ray's supporting line with the local `z = 0` plane.
    ///
    /// Returns the line parameter, which may be negative.
    /// Returns None when the ray runs parallel to the plane.
    pub fn intersect_xy_plane(&self) -> Option<f64> {
        if self.direction.z.abs() < EPSILON {
            return None;
        }
        Some(-self.origin.z / self.direction.z)
    }
}
