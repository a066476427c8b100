use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::distribution::Distribution;
use crate::element::ElementId;
use crate::error::TraceError;
use crate::intensity::IntensityMode;
use crate::sequence::Sequence;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PropagationMode {
    /// Rays visit the elements of a fixed [`Sequence`] in order.
    Sequential,
    /// Each ray looks for the nearest surface it hits.
    #[default]
    NonSequential,
}

/// Trace configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    pub propagation_mode: PropagationMode,
    pub intensity_mode: IntensityMode,
    /// Maximum number of ray generations below a source ray.
    pub max_bounce: u32,
    pub distribution: Distribution,
    /// Per-element distributions overriding `distribution`.
    pub distribution_overrides: HashMap<ElementId, Distribution>,
    /// Sample the central obstruction of shapes too.
    pub unobstructed: bool,
    /// Distance beyond which a ray counts as lost, also used to draw lost rays.
    pub lost_ray_length: f64,
    /// Sequence used in sequential mode. Built from the system when absent.
    pub sequence: Option<Sequence>,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            propagation_mode: PropagationMode::NonSequential,
            intensity_mode: IntensityMode::Intensity,
            max_bounce: 50,
            distribution: Distribution::default(),
            distribution_overrides: HashMap::new(),
            unobstructed: false,
            lost_ray_length: 1000.0,
            sequence: None,
        }
    }
}

impl Params {
    pub fn is_sequential(&self) -> bool {
        self.propagation_mode == PropagationMode::Sequential
    }

    /// Distribution used to sample `element`.
    pub fn get_distribution(&self, element: ElementId) -> &Distribution {
        self.distribution_overrides
            .get(&element)
            .unwrap_or(&self.distribution)
    }

    pub fn set_distribution(&mut self, element: ElementId, distribution: Distribution) {
        self.distribution_overrides.insert(element, distribution);
    }

    pub fn reset_distribution(&mut self, element: ElementId) {
        self.distribution_overrides.remove(&element);
    }

    /// Switches to sequential propagation along `sequence`.
    pub fn set_sequential(&mut self, sequence: Option<Sequence>) {
        self.propagation_mode = PropagationMode::Sequential;
        self.sequence = sequence;
    }

    pub fn validate(&self) -> Result<(), TraceError> {
        self.distribution.validate()?;
        for distribution in self.distribution_overrides.values() {
            distribution.validate()?;
        }
        if self.lost_ray_length.is_nan() || self.lost_ray_length <= 0.0 {
            return Err(TraceError::configuration(format!(
                "lost ray length must be positive, got {}",
                self.lost_ray_length
            )));
        }
        Ok(())
    }
}
