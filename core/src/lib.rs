//! Geometric and radiometric ray tracing through optical systems.
//!
//! A [`System`] holds a tree of [`Element`]s: surfaces coupling a [`Curve`]
//! and a [`Shape`], light [`Source`]s and [`Group`]s of either. A [`Tracer`]
//! propagates source rays through the system, sequentially or not, and fills
//! a [`TraceResult`] with the resulting ray forest.

pub mod analysis;
mod curve;
mod distribution;
mod element;
pub mod error;
mod intensity;
pub mod interface;
mod lens;
mod material;
mod params;
mod ray;
pub mod render;
mod result;
mod sequence;
mod shape;
mod source;
mod surface;
mod system;
mod tracer;
mod transform_cache;
pub mod tree;

pub use optrace_common as common;
pub use optrace_common::Transform;

pub use analysis::Spot;
pub use curve::{Curve, Flat, Sphere};
pub use distribution::{Distribution, Pattern};
pub use element::{Element, ElementId, ElementKind, Group, SYSTEM_FRAME};
pub use error::TraceError;
pub use intensity::{FresnelModel, IntensityMode, IntensityModel, PolarizedModel, SimpleModel};
pub use lens::Lens;
pub use material::{Absorber, Material, Mirror, Solid, Vacuum};
pub use params::{Params, PropagationMode};
pub use ray::{Intercept, RayId, TraceRay};
pub use render::{Renderer, Style};
pub use result::TraceResult;
pub use sequence::{Sequence, SequenceEntry};
pub use shape::{Disk, Rectangle, Ring, Shape};
pub use source::{Source, SourceMode, SpectralLine, DEFAULT_WAVELEN};
pub use surface::{Surface, SurfaceRole, MIN_DISTANCE};
pub use system::System;
pub use tracer::Tracer;
pub use tree::ElementVisitor;
