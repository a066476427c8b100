use cgmath::Point3;

use crate::{Ray, EPSILON};

/// An axis-aligned bounding box (AABB) in 3D space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl Aabb {
    /// Creates a new AABB from min and max points.
    pub fn new(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self { min, max }
    }

    /// Grows the box by `margin` on every side.
    pub fn padded(&self, margin: f64) -> Self {
        Self {
            min: Point3::new(self.min.x - margin, self.min.y - margin, self.min.z - margin),
            max: Point3::new(self.max.x + margin, self.max.y + margin, self.max.z + margin),
        }
    }

    /// Tests if a ray intersects this AABB using the slab method.
    /// Returns the t parameter of the intersection point if it hits, None otherwise.
    /// If the ray originates inside the box, returns Some(0.0).
    pub fn intersects_ray(&self, ray: &Ray) -> Option<f64> {
        let mut tmin = f64::NEG_INFINITY;
        let mut tmax = f64::INFINITY;

        // Test intersection with each pair of parallel planes
        for axis in 0..3 {
            let origin_component = ray.origin[axis];
            let dir_component = ray.direction[axis];
            let min_component = self.min[axis];
            let max_component = self.max[axis];

            if dir_component.abs() < EPSILON {
                // Ray is parallel to the slab
                if origin_component < min_component || origin_component > max_component {
                    return None;
                }
            } else {
                let inv_dir = 1.0 / dir_component;
                let mut t1 = (min_component - origin_component) * inv_dir;
                let mut t2 = (max_component - origin_component) * inv_dir;

                if t1 > t2 {
                    std::mem::swap(&mut t1, &mut t2);
                }

                tmin = tmin.max(t1);
                tmax = tmax.min(t2);

                if tmin > tmax {
                    return None;
                }
            }
        }

        if tmin >= 0.0 {
            Some(tmin)
        } else if tmax >= 0.0 {
            Some(0.0) // Ray origin is inside the box
        } else {
            None // Box is behind the ray
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector3;

    fn unit_box() -> Aabb {
        Aabb::new(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_ray_hits_box() {
        let ray = Ray::new(Point3::new(0.0, 0.0, -10.0), Vector3::new(0.0, 0.0, 1.0));
        let t = unit_box().intersects_ray(&ray).unwrap();
        assert!((t - 9.0).abs() < EPSILON);
    }

    #[test]
    fn test_ray_inside_box() {
        let ray = Ray::new(Point3::new(0.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(unit_box().intersects_ray(&ray), Some(0.0));
    }

    #[test]
    fn test_ray_misses_box() {
        let ray = Ray::new(Point3::new(5.0, 0.0, -10.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(unit_box().intersects_ray(&ray).is_none());
    }

    #[test]
    fn test_box_behind_ray() {
        let ray = Ray::new(Point3::new(0.0, 0.0, 10.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(unit_box().intersects_ray(&ray).is_none());
    }

    #[test]
    fn test_flat_box_is_hit_head_on() {
        // Zero thickness along Z, as produced by a flat surface
        let aabb = Aabb::new(Point3::new(-1.0, -1.0, 0.0), Point3::new(1.0, 1.0, 0.0));
        let ray = Ray::new(Point3::new(0.5, 0.5, -3.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(aabb.intersects_ray(&ray).is_some());
    }

    #[test]
    fn test_padded_box_catches_grazing_ray() {
        let ray = Ray::new(Point3::new(1.4, 0.0, -10.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(unit_box().intersects_ray(&ray).is_none());
        let t = unit_box().padded(0.5).intersects_ray(&ray).unwrap();
        assert!((t - 8.5).abs() < EPSILON);
    }
}
