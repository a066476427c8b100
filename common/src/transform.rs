use cgmath::{
    Deg, EuclideanSpace, InnerSpace, Matrix3, Point3, Quaternion, Rad, Rotation,
    Rotation3, Vector3,
};

use crate::Ray;

/// A rigid pose: rotation followed by translation.
///
/// A transform maps coordinates expressed in a child frame into its parent
/// frame: `p_parent = rotation * p_child + translation`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pub rotation: Quaternion<f64>,
    pub translation: Vector3<f64>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    /// Creates a transform from a rotation and a translation.
    /// The rotation is normalized.
    pub fn new(rotation: Quaternion<f64>, translation: Vector3<f64>) -> Self {
        Self {
            rotation: rotation.normalize(),
            translation,
        }
    }

    pub fn identity() -> Self {
        Self {
            rotation: Quaternion::new(1.0, 0.0, 0.0, 0.0),
            translation: Vector3::new(0.0, 0.0, 0.0),
        }
    }

    pub fn from_translation(translation: Vector3<f64>) -> Self {
        Self {
            translation,
            ..Self::identity()
        }
    }

    pub fn from_rotation(rotation: Quaternion<f64>) -> Self {
        Self::new(rotation, Vector3::new(0.0, 0.0, 0.0))
    }

    /// Rotation about the X axis.
    pub fn from_angle_x(angle: impl Into<Rad<f64>>) -> Self {
        Self::from_rotation(Quaternion::from_angle_x(angle))
    }

    /// Returns a pose whose local +Z axis points along `direction`, located at `position`.
    ///
    /// Returns `None` when `direction` has no length.
    pub fn looking_along(position: Point3<f64>, direction: Vector3<f64>) -> Option<Self> {
        let len = direction.magnitude();
        if len < crate::EPSILON {
            return None;
        }
        let rotation = Quaternion::from_arc(
            Vector3::unit_z(),
            direction / len,
            Some(Vector3::unit_x()),
        );
        Some(Self::new(rotation, position.to_vec()))
    }

    /// Composes two transforms. `inner` is applied first, then `self`.
    pub fn compose(&self, inner: &Transform) -> Transform {
        Transform::new(
            self.rotation * inner.rotation,
            self.rotation.rotate_vector(inner.translation) + self.translation,
        )
    }

    /// Returns the inverse pose.
    pub fn inverse(&self) -> Transform {
        let inv = self.rotation.conjugate();
        Transform {
            rotation: inv,
            translation: -inv.rotate_vector(self.translation),
        }
    }

    pub fn apply_point(&self, point: Point3<f64>) -> Point3<f64> {
        Point3::from_vec(self.rotation.rotate_vector(point.to_vec()) + self.translation)
    }

    pub fn apply_vector(&self, vector: Vector3<f64>) -> Vector3<f64> {
        self.rotation.rotate_vector(vector)
    }

    pub fn apply_ray(&self, ray: &Ray) -> Ray {
        Ray {
            origin: self.apply_point(ray.origin),
            direction: self.apply_vector(ray.direction),
        }
    }

    /// Position of the frame origin expressed in the parent frame.
    pub fn position(&self) -> Point3<f64> {
        Point3::from_vec(self.translation)
    }

    /// Returns a copy translated by `offset`, expressed in the parent frame.
    pub fn translated(&self, offset: Vector3<f64>) -> Self {
        Self {
            rotation: self.rotation,
            translation: self.translation + offset,
        }
    }

    /// Returns a copy rotated about the local X, Y then Z axes.
    pub fn rotated(&self, x: Deg<f64>, y: Deg<f64>, z: Deg<f64>) -> Self {
        let r = Quaternion::from_angle_x(x) * Quaternion::from_angle_y(y) * Quaternion::from_angle_z(z);
        Self::new(self.rotation * r, self.translation)
    }

    /// Local Z axis expressed in the parent frame.
    pub fn z_axis(&self) -> Vector3<f64> {
        self.rotation.rotate_vector(Vector3::unit_z())
    }

    /// Compares the action of both transforms rather than their quaternions,
    /// since `q` and `-q` encode the same rotation.
    pub fn approx_eq(&self, other: &Transform, tolerance: f64) -> bool {
        let a = Matrix3::from(self.rotation);
        let b = Matrix3::from(other.rotation);
        let rotation_close = (0..3)
            .all(|c| (0..3).all(|r| (a[c][r] - b[c][r]).abs() <= tolerance));
        rotation_close && (self.translation - other.translation).magnitude() <= tolerance
    }

    pub fn is_identity(&self, tolerance: f64) -> bool {
        self.approx_eq(&Transform::identity(), tolerance)
    }
}
