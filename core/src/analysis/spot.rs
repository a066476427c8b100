use cgmath::{EuclideanSpace, InnerSpace, Point3, Vector2};

use crate::element::ElementId;
use crate::error::TraceError;
use crate::params::Params;
use crate::result::TraceResult;
use crate::tracer::Tracer;
use crate::System;

/// Footprint of the rays reaching an image surface.
///
/// Positions are in the image's local frame. The centroid and the RMS radius
/// are weighted by the intensity each ray carries on arrival, the maximum
/// radius covers every ray.
#[derive(Debug, Clone, PartialEq)]
pub struct Spot {
    pub image: ElementId,
    pub centroid: Point3<f64>,
    pub rms_radius: f64,
    pub max_radius: f64,
    pub total_intensity: f64,
    pub ray_count: usize,
}

impl Spot {
    /// Traces `system` with `params` and measures the spot on `image`.
    pub fn trace(system: &System, image: ElementId, params: Params) -> Result<Self, TraceError> {
        if system.element(image)?.as_surface().is_none() {
            return Err(TraceError::configuration(format!("spot image {image} is not a surface")));
        }

        let mut result = TraceResult::new();
        result.set_intercepted_save_state(image, true);
        Tracer::with_params(system, params).trace(&mut result)?;
        Self::from_result(&result, image)
    }

    /// Measures the spot from an existing result that collected `image` intercepts.
    pub fn from_result(result: &TraceResult, image: ElementId) -> Result<Self, TraceError> {
        let hits: Vec<(Point3<f64>, f64)> = result
            .intercepted_rays(image)?
            .filter_map(|ray| ray.intercept().map(|hit| (hit.point, hit.intensity)))
            .collect();
        if hits.is_empty() {
            return Err(TraceError::configuration(format!("no ray reached image {image}")));
        }

        let total_intensity: f64 = hits.iter().map(|(_, i)| i).sum();
        // Rays that carry no energy still locate the spot
        let weight = |intensity: f64| if total_intensity > 0.0 { intensity } else { 1.0 };
        let total_weight: f64 = hits.iter().map(|&(_, i)| weight(i)).sum();

        let weighted = hits
            .iter()
            .fold(Point3::origin().to_vec(), |acc, &(p, i)| acc + p.to_vec() * weight(i));
        let centroid = Point3::from_vec(weighted / total_weight);

        let mut sum_sq = 0.0;
        let mut max_radius = 0.0f64;
        for &(p, i) in &hits {
            let r = Vector2::new(p.x - centroid.x, p.y - centroid.y).magnitude();
            sum_sq += r * r * weight(i);
            max_radius = max_radius.max(r);
        }

        Ok(Self {
            image,
            centroid,
            rms_radius: (sum_sq / total_weight).sqrt(),
            max_radius,
            total_intensity,
            ray_count: hits.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use cgmath::Vector3;
    use optrace_common::Ray;

    use crate::material::Vacuum;
    use crate::ray::{Intercept, TraceRay};

    fn hit(result: &mut TraceResult, x: f64, arrival: f64) {
        let ray = TraceRay::new(Ray::new(Point3::origin(), Vector3::unit_z()), 550.0, 1.0, 1, Rc::new(Vacuum));
        let id = result.push_ray(ray, None);
        result.ray_mut(id).intercept = Some(Intercept {
            element: 2,
            point: Point3::new(x, 0.0, 0.0),
            intensity: arrival,
        });
        result.record_intercepted(2, id);
    }

    #[test]
    fn test_spot_uses_arrival_intensity() {
        let mut result = TraceResult::new();
        result.set_intercepted_save_state(2, true);
        hit(&mut result, 1.0, 0.75);
        hit(&mut result, -3.0, 0.25);

        let spot = Spot::from_result(&result, 2).unwrap();
        assert_eq!(spot.ray_count, 2);
        assert!((spot.total_intensity - 1.0).abs() < 1e-12);
        assert!(spot.centroid.x.abs() < 1e-12);
        assert!((spot.rms_radius - 3f64.sqrt()).abs() < 1e-12);
        assert!((spot.max_radius - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_spot_without_energy_is_unweighted() {
        let mut result = TraceResult::new();
        result.set_intercepted_save_state(2, true);
        hit(&mut result, 1.0, 0.0);
        hit(&mut result, 3.0, 0.0);

        let spot = Spot::from_result(&result, 2).unwrap();
        assert_eq!(spot.total_intensity, 0.0);
        assert!((spot.centroid.x - 2.0).abs() < 1e-12);
        assert!((spot.rms_radius - 1.0).abs() < 1e-12);
    }
}
