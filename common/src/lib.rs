//! Geometric primitives shared by the optrace crates.
//!
//! Everything here is expressed in `f64`: optical path computations accumulate
//! error quickly over long propagation distances.

mod aabb;
mod plane;
mod ray;
mod transform;

pub use aabb::Aabb;
pub use plane::Plane;
pub use ray::Ray;
pub use transform::Transform;

/// Tolerance used for parallelism and degeneracy checks.
pub const EPSILON: f64 = 1e-9;
