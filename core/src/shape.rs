//! Two dimensional apertures in a surface's local XY plane.

use std::f64::consts::{PI, TAU};
use std::fmt;

use cgmath::{InnerSpace, Point2, Vector2};

use crate::distribution::{Distribution, Pattern};

pub trait Shape: fmt::Debug {
    /// Whether a point of the local XY plane belongs to the shape.
    fn inside(&self, point: Point2<f64>) -> bool;

    /// Distance from the origin to the farthest point of the shape.
    fn max_radius(&self) -> f64;

    /// Distance from the origin to the nearest point of the shape.
    fn min_radius(&self) -> f64 {
        0.0
    }

    /// Distance to the outer edge along `direction`.
    fn get_outer_radius(&self, _direction: Vector2<f64>) -> f64 {
        self.max_radius()
    }

    /// Distance to the inner edge along `direction`; 0 for shapes without a hole.
    fn get_hole_radius(&self, _direction: Vector2<f64>) -> f64 {
        self.min_radius()
    }

    /// Lower and upper corners of the axis aligned box enclosing the shape.
    fn get_bounding_box(&self) -> (Point2<f64>, Point2<f64>) {
        let r = self.max_radius();
        (Point2::new(-r, -r), Point2::new(r, r))
    }

    /// Closed outline used by draw hooks.
    fn contour(&self, segments: usize) -> Vec<Point2<f64>> {
        circle(self.max_radius(), segments)
    }

    /// Feeds sample points to `visitor` in a deterministic order.
    ///
    /// With `unobstructed` set, points falling into a central hole are kept.
    fn get_pattern(
        &self,
        distribution: &Distribution,
        unobstructed: bool,
        visitor: &mut dyn FnMut(Point2<f64>),
    ) {
        let radius = self.max_radius() * distribution.scaling;
        let hole = self.min_radius();
        let mut emit = |p: Point2<f64>| {
            let in_hole = Vector2::new(p.x, p.y).magnitude() < hole;
            if self.inside(p) || (unobstructed && in_hole) {
                visitor(p);
            }
        };
        generate_pattern(distribution, radius, &mut emit);
    }
}

/// Generates the raw points of a pattern spanning a disk of `radius`.
pub fn generate_pattern(
    distribution: &Distribution,
    radius: f64,
    visitor: &mut dyn FnMut(Point2<f64>),
) {
    let n = distribution.radial_density.max(1) as i64;
    let step = radius / n as f64;

    match distribution.pattern {
        Pattern::Meridional => {
            for i in -n..=n {
                visitor(Point2::new(0.0, i as f64 * step));
            }
        }
        Pattern::Sagittal => {
            for i in -n..=n {
                visitor(Point2::new(i as f64 * step, 0.0));
            }
        }
        Pattern::Cross => {
            visitor(Point2::new(0.0, 0.0));
            for i in (-n..=n).filter(|&i| i != 0) {
                visitor(Point2::new(0.0, i as f64 * step));
            }
            for i in (-n..=n).filter(|&i| i != 0) {
                visitor(Point2::new(i as f64 * step, 0.0));
            }
        }
        Pattern::Square => {
            for j in -n..=n {
                for i in -n..=n {
                    visitor(Point2::new(i as f64 * step, j as f64 * step));
                }
            }
        }
        Pattern::Triangular => {
            let row_step = step * 3f64.sqrt() / 2.0;
            let rows = (radius / row_step).floor() as i64;
            for j in -rows..=rows {
                let offset = if j.rem_euclid(2) == 1 { step / 2.0 } else { 0.0 };
                let y = j as f64 * row_step;
                for i in -n - 1..=n {
                    let x = i as f64 * step + offset;
                    if x * x + y * y <= radius * radius * (1.0 + 1e-12) {
                        visitor(Point2::new(x, y));
                    }
                }
            }
        }
        Pattern::Hexapolar => {
            visitor(Point2::new(0.0, 0.0));
            for ring in 1..=n {
                let r = ring as f64 * step;
                let count = 6 * ring;
                for k in 0..count {
                    let angle = TAU * k as f64 / count as f64;
                    visitor(Point2::new(r * angle.cos(), r * angle.sin()));
                }
            }
        }
    }
}

fn circle(radius: f64, segments: usize) -> Vec<Point2<f64>> {
    let segments = segments.max(3);
    (0..=segments)
        .map(|i| {
            let angle = 2.0 * PI * i as f64 / segments as f64;
            Point2::new(radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}

/// A full circular aperture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Disk {
    radius: f64,
}

impl Disk {
    pub fn new(radius: f64) -> Self {
        Self { radius }
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }
}

impl Shape for Disk {
    fn inside(&self, point: Point2<f64>) -> bool {
        point.x * point.x + point.y * point.y <= self.radius * self.radius
    }

    fn max_radius(&self) -> f64 {
        self.radius
    }
}

/// A circular aperture with a central obstruction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ring {
    radius: f64,
    hole_radius: f64,
}

impl Ring {
    pub fn new(radius: f64, hole_radius: f64) -> Self {
        Self {
            radius,
            hole_radius: hole_radius.min(radius),
        }
    }
}

impl Shape for Ring {
    fn inside(&self, point: Point2<f64>) -> bool {
        let r2 = point.x * point.x + point.y * point.y;
        r2 <= self.radius * self.radius && r2 >= self.hole_radius * self.hole_radius
    }

    fn max_radius(&self) -> f64 {
        self.radius
    }

    fn min_radius(&self) -> f64 {
        self.hole_radius
    }
}

/// A rectangle centered on the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    half_width: f64,
    half_height: f64,
}

impl Rectangle {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            half_width: width / 2.0,
            half_height: height / 2.0,
        }
    }
}

impl Shape for Rectangle {
    fn inside(&self, point: Point2<f64>) -> bool {
        point.x.abs() <= self.half_width && point.y.abs() <= self.half_height
    }

    fn max_radius(&self) -> f64 {
        self.half_width.hypot(self.half_height)
    }

    fn get_outer_radius(&self, direction: Vector2<f64>) -> f64 {
        let dx = direction.x.abs();
        let dy = direction.y.abs();
        let tx = if dx > 0.0 { self.half_width / dx } else { f64::INFINITY };
        let ty = if dy > 0.0 { self.half_height / dy } else { f64::INFINITY };
        let t = tx.min(ty);
        if t.is_finite() {
            t * direction.magnitude()
        } else {
            0.0
        }
    }

    fn get_bounding_box(&self) -> (Point2<f64>, Point2<f64>) {
        (
            Point2::new(-self.half_width, -self.half_height),
            Point2::new(self.half_width, self.half_height),
        )
    }

    fn contour(&self, _segments: usize) -> Vec<Point2<f64>> {
        let (w, h) = (self.half_width, self.half_height);
        vec![
            Point2::new(-w, -h),
            Point2::new(w, -h),
            Point2::new(w, h),
            Point2::new(-w, h),
            Point2::new(-w, -h),
        ]
    }
}
