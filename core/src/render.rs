//! Hooks feeding element and ray geometry to external renderers.

use cgmath::{Point2, Point3, Vector2};

use crate::element::{Element, ElementId, ElementKind};
use crate::error::TraceError;
use crate::result::TraceResult;
use crate::surface::SurfaceRole;
use crate::tree::{walk_system, ElementVisitor};
use crate::System;

const PROFILE_SEGMENTS: usize = 32;
const CONTOUR_SEGMENTS: usize = 64;

/// What is being drawn, so backends can pick colors and line styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Style {
    Surface,
    Stop,
    Image,
    Source,
    Ray,
    LostRay,
}

/// A drawing backend. Coordinates are in the system frame, in millimetres.
pub trait Renderer {
    fn polyline_2d(&mut self, points: &[Point2<f64>], style: Style);

    fn point_2d(&mut self, point: Point2<f64>, style: Style);

    fn polyline_3d(&mut self, points: &[Point3<f64>], style: Style);

    fn point_3d(&mut self, point: Point3<f64>, style: Style);
}

// Collects enabled leaves; disabled groups hide their members.
struct Visible(Vec<ElementId>);

impl ElementVisitor for Visible {
    fn enter_element(&mut self, id: ElementId, element: &Element) -> bool {
        if !element.is_enabled() {
            return false;
        }
        if element.as_group().is_none() {
            self.0.push(id);
        }
        true
    }
}

impl System {
    fn visible_leaves(&self) -> Vec<ElementId> {
        let mut visible = Visible(Vec::new());
        walk_system(self, &mut visible);
        visible.0
    }

    /// Draws the meridional section of the system: the YZ plane, with the
    /// system Z axis mapped to the horizontal axis.
    pub fn draw_2d(&self, renderer: &mut dyn Renderer) -> Result<(), TraceError> {
        for id in self.visible_leaves() {
            let element = self.element(id)?;
            let global = self.get_global_transform(id)?;
            match element.kind() {
                ElementKind::Surface(surface) => {
                    let radius = surface.shape().get_outer_radius(Vector2::new(0.0, 1.0));
                    let points: Vec<Point2<f64>> = (0..=PROFILE_SEGMENTS)
                        .map(|i| {
                            let y = -radius + 2.0 * radius * i as f64 / PROFILE_SEGMENTS as f64;
                            let p = global.apply_point(Point3::new(0.0, y, surface.curve().sagitta(y.abs())));
                            Point2::new(p.z, p.y)
                        })
                        .collect();
                    renderer.polyline_2d(&points, surface_style(surface.role()));
                }
                ElementKind::Source(_) => {
                    let p = global.position();
                    renderer.point_2d(Point2::new(p.z, p.y), Style::Source);
                }
                ElementKind::Group(_) => {}
            }
        }
        Ok(())
    }

    /// Draws surface outlines lifted onto their curves and source positions.
    pub fn draw_3d(&self, renderer: &mut dyn Renderer) -> Result<(), TraceError> {
        for id in self.visible_leaves() {
            let element = self.element(id)?;
            let global = self.get_global_transform(id)?;
            match element.kind() {
                ElementKind::Surface(surface) => {
                    let points: Vec<Point3<f64>> = surface
                        .shape()
                        .contour(CONTOUR_SEGMENTS)
                        .into_iter()
                        .map(|p| global.apply_point(Point3::new(p.x, p.y, surface.curve().sagitta_xy(p.x, p.y))))
                        .collect();
                    renderer.polyline_3d(&points, surface_style(surface.role()));
                }
                ElementKind::Source(_) => renderer.point_3d(global.position(), Style::Source),
                ElementKind::Group(_) => {}
            }
        }
        Ok(())
    }
}

fn surface_style(role: &SurfaceRole) -> Style {
    match role {
        SurfaceRole::Optical { .. } => Style::Surface,
        SurfaceRole::Stop { .. } => Style::Stop,
        SurfaceRole::Image => Style::Image,
    }
}

impl TraceResult {
    /// Draws one segment per ray, from its origin to its intercept. Lost rays
    /// are drawn `lost_ray_length` long. Rays left unexpanded are skipped.
    pub fn draw_rays_3d(
        &self,
        system: &System,
        renderer: &mut dyn Renderer,
        lost_ray_length: f64,
    ) -> Result<(), TraceError> {
        for ray in self.rays() {
            let global = ray.global_ray(system)?;
            if let Some(end) = ray.global_intercept(system)? {
                renderer.polyline_3d(&[global.origin, end], Style::Ray);
            } else if ray.is_lost() {
                renderer.polyline_3d(&[global.origin, global.point_at(lost_ray_length)], Style::LostRay);
            }
        }
        Ok(())
    }
}
