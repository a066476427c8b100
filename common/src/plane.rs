use cgmath::{EuclideanSpace, InnerSpace, Point3, Vector3};

/// A plane in 3D space defined by a normal and distance from origin.
///
/// The plane equation is: normal · point + distance = 0
#[derive(Debug, Copy, Clone)]
pub struct Plane {
    /// Unit normal
    pub normal: Vector3<f64>,
    /// Signed distance from origin along the normal
    pub distance: f64,
}

impl Plane {
    /// Creates a new plane from a normal vector and a point on the plane.
    /// The normal will be normalized automatically.
    pub fn new(normal: Vector3<f64>, point: Point3<f64>) -> Self {
        let normal = normal.normalize();
        let distance = -normal.dot(point.to_vec());
        Self { normal, distance }
    }

    /// Computes the signed distance from a point to the plane.
    ///
    /// - Positive: point is on the same side as the normal
    /// - Zero: point is on the plane
    /// - Negative: point is on the opposite side
    pub fn signed_distance(&self, point: Point3<f64>) -> f64 {
        self.normal.dot(point.to_vec()) + self.distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EPSILON;

    #[test]
    fn test_plane_from_normal_and_point() {
        let plane = Plane::new(Vector3::new(0.0, 2.0, 0.0), Point3::new(0.0, 5.0, 0.0));

        assert!((plane.normal.magnitude() - 1.0).abs() < EPSILON);
        assert!(plane.signed_distance(Point3::new(10.0, 5.0, -3.0)).abs() < EPSILON);
        assert!(plane.signed_distance(Point3::new(0.0, 6.0, 0.0)) > 0.0);
        assert!(plane.signed_distance(Point3::new(0.0, 4.0, 0.0)) < 0.0);
    }
}
