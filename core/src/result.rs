use std::collections::HashMap;

use cgmath::{EuclideanSpace, Point2, Point3, Vector3};

use crate::element::ElementId;
use crate::error::{BinKind, TraceError};
use crate::ray::{RayId, TraceRay};

/// The ray forest and per-element bins produced by a trace.
///
/// Bins only exist for elements registered before tracing with
/// [`set_generated_save_state`](Self::set_generated_save_state) or
/// [`set_intercepted_save_state`](Self::set_intercepted_save_state).
/// Clearing the result keeps those registrations.
#[derive(Debug, Default)]
pub struct TraceResult {
    rays: Vec<TraceRay>,
    wavelengths: Vec<f64>,
    sources: Vec<ElementId>,
    generated: HashMap<ElementId, Vec<RayId>>,
    intercepted: HashMap<ElementId, Vec<RayId>>,
}

impl TraceResult {
    pub fn new() -> Self {
        Self::default()
    }

    // ========== Bin registration ==========

    /// Enables or disables collection of the rays generated by `element`.
    pub fn set_generated_save_state(&mut self, element: ElementId, enabled: bool) {
        if enabled {
            self.generated.entry(element).or_default();
        } else {
            self.generated.remove(&element);
        }
    }

    /// Enables or disables collection of the rays intercepted by `element`.
    pub fn set_intercepted_save_state(&mut self, element: ElementId, enabled: bool) {
        if enabled {
            self.intercepted.entry(element).or_default();
        } else {
            self.intercepted.remove(&element);
        }
    }

    pub fn is_generated_saved(&self, element: ElementId) -> bool {
        self.generated.contains_key(&element)
    }

    pub fn is_intercepted_saved(&self, element: ElementId) -> bool {
        self.intercepted.contains_key(&element)
    }

    /// Drops every ray, wavelength and source. Bin registrations are kept.
    pub fn clear(&mut self) {
        self.rays.clear();
        self.wavelengths.clear();
        self.sources.clear();
        self.generated.values_mut().for_each(Vec::clear);
        self.intercepted.values_mut().for_each(Vec::clear);
    }

    // ========== Queries ==========

    /// Rays intercepted by `surface`, in interception order.
    pub fn get_intercepted(&self, surface: ElementId) -> Result<&[RayId], TraceError> {
        self.intercepted
            .get(&surface)
            .map(Vec::as_slice)
            .ok_or(TraceError::NotCollected {
                kind: BinKind::Intercepted,
                element: surface,
            })
    }

    /// Rays generated by `element`, in generation order.
    pub fn get_generated(&self, element: ElementId) -> Result<&[RayId], TraceError> {
        self.generated
            .get(&element)
            .map(Vec::as_slice)
            .ok_or(TraceError::NotCollected {
                kind: BinKind::Generated,
                element,
            })
    }

    pub fn intercepted_rays(&self, surface: ElementId) -> Result<impl Iterator<Item = &TraceRay>, TraceError> {
        Ok(self.get_intercepted(surface)?.iter().map(|&id| &self.rays[id]))
    }

    pub fn generated_rays(&self, element: ElementId) -> Result<impl Iterator<Item = &TraceRay>, TraceError> {
        Ok(self.get_generated(element)?.iter().map(|&id| &self.rays[id]))
    }

    /// Sources that contributed rays, in enumeration order.
    pub fn get_source_list(&self) -> &[ElementId] {
        &self.sources
    }

    /// Distinct wavelengths carried by the rays, sorted.
    pub fn get_ray_wavelen_set(&self) -> &[f64] {
        &self.wavelengths
    }

    pub fn ray(&self, id: RayId) -> Option<&TraceRay> {
        self.rays.get(id)
    }

    pub fn rays(&self) -> &[TraceRay] {
        &self.rays
    }

    pub fn len(&self) -> usize {
        self.rays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rays.is_empty()
    }

    /// Number of rays between `id` and its source ray.
    pub fn ancestor_count(&self, id: RayId) -> usize {
        let mut count = 0;
        let mut current = self.rays.get(id).and_then(|r| r.parent);
        while let Some(parent) = current {
            count += 1;
            current = self.rays[parent].parent;
        }
        count
    }

    /// Mean intercept position on `surface`, in its local frame.
    pub fn get_intercepted_centroid(&self, surface: ElementId) -> Result<Point3<f64>, TraceError> {
        let mut sum = Vector3::new(0.0, 0.0, 0.0);
        let mut count = 0usize;
        for ray in self.intercepted_rays(surface)? {
            if let Some(intercept) = ray.intercept() {
                sum += intercept.point.to_vec();
                count += 1;
            }
        }
        if count == 0 {
            return Err(TraceError::configuration(format!(
                "no ray intercepted by element {surface}"
            )));
        }
        Ok(Point3::from_vec(sum / count as f64))
    }

    /// Lower and upper corners of the intercept footprint on `surface`, in its local frame.
    pub fn get_intercepted_window(&self, surface: ElementId) -> Result<(Point2<f64>, Point2<f64>), TraceError> {
        let mut window: Option<(Point2<f64>, Point2<f64>)> = None;
        for ray in self.intercepted_rays(surface)? {
            let Some(intercept) = ray.intercept() else {
                continue;
            };
            let p = Point2::new(intercept.point.x, intercept.point.y);
            window = Some(match window {
                None => (p, p),
                Some((lo, hi)) => (
                    Point2::new(lo.x.min(p.x), lo.y.min(p.y)),
                    Point2::new(hi.x.max(p.x), hi.y.max(p.y)),
                ),
            });
        }
        window.ok_or_else(|| TraceError::configuration(format!("no ray intercepted by element {surface}")))
    }

    /// Highest ray intensity in the pool, 0 when empty.
    pub fn get_max_ray_intensity(&self) -> f64 {
        self.rays.iter().map(|r| r.intensity).fold(0.0, f64::max)
    }

    // ========== Pool management ==========

    pub(crate) fn add_source(&mut self, source: ElementId) {
        if !self.sources.contains(&source) {
            self.sources.push(source);
        }
    }

    /// Adds a ray to the pool, linking it under `parent`.
    pub(crate) fn push_ray(&mut self, mut ray: TraceRay, parent: Option<RayId>) -> RayId {
        let id = self.rays.len();
        ray.parent = parent;
        if let Err(index) = self.wavelengths.binary_search_by(|w| w.total_cmp(&ray.wavelen)) {
            self.wavelengths.insert(index, ray.wavelen);
        }
        self.rays.push(ray);
        if let Some(parent) = parent {
            self.rays[parent].children.push(id);
        }
        id
    }

    pub(crate) fn ray_mut(&mut self, id: RayId) -> &mut TraceRay {
        &mut self.rays[id]
    }

    pub(crate) fn record_generated(&mut self, element: ElementId, ray: RayId) {
        if let Some(bin) = self.generated.get_mut(&element) {
            bin.push(ray);
        }
    }

    pub(crate) fn record_intercepted(&mut self, element: ElementId, ray: RayId) {
        if let Some(bin) = self.intercepted.get_mut(&element) {
            bin.push(ray);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::material::Vacuum;
    use crate::ray::Intercept;
    use optrace_common::Ray;

    fn ray(wavelen: f64) -> TraceRay {
        TraceRay::new(
            Ray::new(Point3::new(0.0, 0.0, 0.0), Vector3::unit_z()),
            wavelen,
            1.0,
            1,
            Rc::new(Vacuum),
        )
    }

    #[test]
    fn test_unrequested_bin_is_lookup_error() {
        let result = TraceResult::new();
        let err = result.get_intercepted(3).unwrap_err();
        assert!(err.is_lookup());
        assert!(matches!(
            err,
            TraceError::NotCollected { kind: BinKind::Intercepted, element: 3 }
        ));
    }

    #[test]
    fn test_ray_forest_links() {
        let mut result = TraceResult::new();
        let root = result.push_ray(ray(550.0), None);
        let child = result.push_ray(ray(550.0), Some(root));
        let grandchild = result.push_ray(ray(450.0), Some(child));

        assert_eq!(result.ray(root).unwrap().children(), &[child]);
        assert_eq!(result.ray(grandchild).unwrap().parent(), Some(child));
        assert_eq!(result.ancestor_count(grandchild), 2);
        assert_eq!(result.ancestor_count(root), 0);
        assert_eq!(result.get_ray_wavelen_set(), &[450.0, 550.0]);
    }

    #[test]
    fn test_clear_keeps_bins() {
        let mut result = TraceResult::new();
        result.set_intercepted_save_state(2, true);
        let id = result.push_ray(ray(550.0), None);
        result.record_intercepted(2, id);
        result.record_intercepted(5, id);
        assert_eq!(result.get_intercepted(2).unwrap().len(), 1);
        assert!(result.get_intercepted(5).is_err());

        result.clear();
        assert!(result.is_empty());
        assert!(result.get_intercepted(2).unwrap().is_empty());
    }

    #[test]
    fn test_centroid_and_window() {
        let mut result = TraceResult::new();
        result.set_intercepted_save_state(2, true);
        for (x, y) in [(1.0, 0.0), (-1.0, 2.0), (3.0, -2.0)] {
            let id = result.push_ray(ray(550.0), None);
            result.ray_mut(id).intercept = Some(Intercept {
                element: 2,
                point: Point3::new(x, y, 0.0),
                intensity: 1.0,
            });
            result.record_intercepted(2, id);
        }
        let centroid = result.get_intercepted_centroid(2).unwrap();
        assert!((centroid.x - 1.0).abs() < 1e-12);
        assert!(centroid.y.abs() < 1e-12);

        let (lo, hi) = result.get_intercepted_window(2).unwrap();
        assert_eq!(lo, Point2::new(-1.0, -2.0));
        assert_eq!(hi, Point2::new(3.0, 2.0));

        result.set_intercepted_save_state(4, true);
        assert!(matches!(
            result.get_intercepted_centroid(4),
            Err(TraceError::Configuration(_))
        ));
    }
}
