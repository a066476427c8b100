use serde::{Deserialize, Serialize};

use crate::error::TraceError;

/// Layout of sample points over a surface shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Pattern {
    /// Points along the local X axis.
    Sagittal,
    /// Points along the local Y axis.
    Meridional,
    /// Union of the sagittal and meridional lines.
    Cross,
    /// Square grid.
    Square,
    /// Equilateral triangle lattice.
    Triangular,
    /// Concentric rings holding 6, 12, 18... points around a center point.
    #[default]
    Hexapolar,
}

/// How a shape is sampled when generating source rays.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Distribution {
    pub pattern: Pattern,
    /// Number of samples along a radius. Must be at least 1.
    pub radial_density: u32,
    /// Fraction of the shape radius covered by the pattern.
    pub scaling: f64,
}

impl Default for Distribution {
    fn default() -> Self {
        Self {
            pattern: Pattern::Hexapolar,
            radial_density: 5,
            scaling: 0.999,
        }
    }
}

impl Distribution {
    pub const MIN_RADIAL_DENSITY: u32 = 1;

    pub fn new(pattern: Pattern, radial_density: u32) -> Self {
        Self {
            pattern,
            radial_density,
            ..Default::default()
        }
    }

    pub fn with_scaling(mut self, scaling: f64) -> Self {
        self.scaling = scaling;
        self
    }

    pub fn validate(&self) -> Result<(), TraceError> {
        if self.radial_density < Self::MIN_RADIAL_DENSITY {
            return Err(TraceError::configuration(format!(
                "distribution radial density must be at least {}, got {}",
                Self::MIN_RADIAL_DENSITY,
                self.radial_density
            )));
        }
        if !self.scaling.is_finite() || self.scaling <= 0.0 {
            return Err(TraceError::configuration(format!(
                "distribution scaling must be positive, got {}",
                self.scaling
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_hexapolar() {
        let distribution = Distribution::default();
        assert_eq!(distribution.pattern, Pattern::Hexapolar);
        assert_eq!(distribution.radial_density, 5);
        assert!(distribution.validate().is_ok());
    }

    #[test]
    fn test_zero_density_is_rejected() {
        let err = Distribution::new(Pattern::Square, 0).validate().unwrap_err();
        assert!(matches!(err, TraceError::Configuration(_)));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let distribution: Distribution =
            serde_json::from_str(r#"{ "pattern": "Meridional" }"#).unwrap();
        assert_eq!(distribution.pattern, Pattern::Meridional);
        assert_eq!(distribution.radial_density, 5);
        assert!((distribution.scaling - 0.999).abs() < 1e-12);
    }
}
