//! Measurements derived from trace results.

mod spot;

pub use spot::Spot;
