use std::rc::Rc;

use cgmath::Point3;

use crate::curve::{Curve, Flat, Sphere};
use crate::element::{Element, Group};
use crate::material::Material;
use crate::shape::Disk;
use crate::surface::Surface;

#[derive(Debug, Clone)]
struct LensSurface {
    curvature: f64,
    aperture_radius: f64,
    thickness: f64,
    // Medium behind the surface, None for the environment
    glass: Option<Rc<dyn Material>>,
}

/// Builds a group of optical surfaces stacked along the local Z axis.
///
/// Each surface is followed by a slab of the given material and thickness;
/// the last one faces the environment.
///
/// ```
/// use std::rc::Rc;
/// use optrace::{Lens, Solid, System};
///
/// let glass = Rc::new(Solid::new(1.5168).with_name("N-BK7"));
/// let lens = Lens::new()
///     .add_surface(1.0 / 50.0, 12.0, 5.0, glass)
///     .last_surface(-1.0 / 50.0, 12.0)
///     .build();
///
/// let mut system = System::new();
/// system.add(lens);
/// assert_eq!(system.surfaces(true).len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Lens {
    surfaces: Vec<LensSurface>,
}

impl Lens {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a surface followed by `thickness` millimetres of `glass`.
    pub fn add_surface(mut self, curvature: f64, aperture_radius: f64, thickness: f64, glass: Rc<dyn Material>) -> Self {
        self.surfaces.push(LensSurface {
            curvature,
            aperture_radius,
            thickness,
            glass: Some(glass),
        });
        self
    }

    /// Appends a surface followed by `thickness` millimetres of environment.
    pub fn add_air_gap(mut self, curvature: f64, aperture_radius: f64, thickness: f64) -> Self {
        self.surfaces.push(LensSurface {
            curvature,
            aperture_radius,
            thickness,
            glass: None,
        });
        self
    }

    /// Appends the final surface, exiting into the environment.
    pub fn last_surface(self, curvature: f64, aperture_radius: f64) -> Self {
        self.add_air_gap(curvature, aperture_radius, 0.0)
    }

    /// Distance between the first and last vertices.
    pub fn thickness(&self) -> f64 {
        let n = self.surfaces.len().saturating_sub(1);
        self.surfaces[..n].iter().map(|s| s.thickness).sum()
    }

    /// Produces a detached group element holding one surface per entry.
    pub fn build(self) -> Element {
        let mut group = Group::new();
        let mut z = 0.0;
        let mut before: Option<Rc<dyn Material>> = None;

        for (index, entry) in self.surfaces.into_iter().enumerate() {
            let curve: Rc<dyn Curve> = if entry.curvature == 0.0 {
                Rc::new(Flat)
            } else {
                Rc::new(Sphere::new(entry.curvature))
            };
            let surface = Surface::optical(
                curve,
                Rc::new(Disk::new(entry.aperture_radius)),
                before.take(),
                entry.glass.clone(),
            );
            group = group.with_member(
                Element::surface(surface)
                    .with_name(format!("S{}", index + 1))
                    .with_position(Point3::new(0.0, 0.0, z)),
            );
            z += entry.thickness;
            before = entry.glass;
        }

        Element::group(group).with_name("lens")
    }
}
