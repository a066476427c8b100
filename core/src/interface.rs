//! Direction and energy laws at the boundary between two media.

use cgmath::{InnerSpace, Vector3};
use num_complex::Complex64;

/// Mirrors `direction` about the plane of `normal`. The normal may face either side.
pub fn reflect(direction: Vector3<f64>, normal: Vector3<f64>) -> Vector3<f64> {
    (direction - normal * (2.0 * direction.dot(normal))).normalize()
}

/// Vector form of Snell's law for a ray going from index `n1` into index `n2`.
///
/// Returns None on total internal reflection.
pub fn refract(direction: Vector3<f64>, normal: Vector3<f64>, n1: f64, n2: f64) -> Option<Vector3<f64>> {
    // Normal facing the incoming ray
    let facing = if direction.dot(normal) > 0.0 { -normal } else { normal };
    let cos_i = -direction.dot(facing);
    let eta = n1 / n2;
    let k = 1.0 - eta * eta * (1.0 - cos_i * cos_i);
    if k < 0.0 {
        return None;
    }
    Some((direction * eta + facing * (eta * cos_i - k.sqrt())).normalize())
}

/// Cosine of the angle between a ray and a surface normal, in `[0, 1]`.
pub fn incidence_cosine(direction: Vector3<f64>, normal: Vector3<f64>) -> f64 {
    direction.dot(normal).abs().min(1.0)
}

/// Complex refractive index `n + i·k`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComplexIndex {
    pub n: f64,
    pub k: f64,
}

impl ComplexIndex {
    pub fn new(n: f64, k: f64) -> Self {
        Self { n, k }
    }

    pub fn real(n: f64) -> Self {
        Self { n, k: 0.0 }
    }

    pub fn to_complex(self) -> Complex64 {
        Complex64::new(self.n, self.k)
    }
}

/// Both sides of an interface as seen by one ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interface {
    pub incoming: ComplexIndex,
    pub outgoing: ComplexIndex,
    pub cos_incidence: f64,
}

impl Interface {
    /// Unpolarized Fresnel reflectance, the mean of the s and p power coefficients.
    pub fn reflectance(&self) -> f64 {
        let n1 = self.incoming.to_complex();
        let n2 = self.outgoing.to_complex();
        let cos_i = Complex64::new(self.cos_incidence, 0.0);

        let sin2_i = 1.0 - self.cos_incidence * self.cos_incidence;
        let ratio = n1 / n2;
        let cos_t = (1.0 - ratio * ratio * sin2_i).sqrt();

        let rs = (n1 * cos_i - n2 * cos_t) / (n1 * cos_i + n2 * cos_t);
        let rp = (n2 * cos_i - n1 * cos_t) / (n2 * cos_i + n1 * cos_t);

        let r = (rs.norm_sqr() + rp.norm_sqr()) / 2.0;
        if r.is_finite() {
            r.clamp(0.0, 1.0)
        } else {
            1.0
        }
    }

    pub fn transmittance(&self) -> f64 {
        1.0 - self.reflectance()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-12;

    #[test]
    fn test_reflect_normal_incidence() {
        let d = Vector3::new(0.0, 0.0, 1.0);
        let r = reflect(d, Vector3::new(0.0, 0.0, -1.0));
        assert!((r - Vector3::new(0.0, 0.0, -1.0)).magnitude() < TOLERANCE);
    }

    #[test]
    fn test_refract_snell() {
        let angle = 30f64.to_radians();
        let d = Vector3::new(angle.sin(), 0.0, angle.cos());
        let t = refract(d, Vector3::unit_z(), 1.0, 1.5).unwrap();
        let sin_t = t.x;
        assert!((angle.sin() - 1.5 * sin_t).abs() < TOLERANCE);
        assert!(t.z > 0.0);

        // Normal orientation does not matter
        let t2 = refract(d, -Vector3::unit_z(), 1.0, 1.5).unwrap();
        assert!((t - t2).magnitude() < TOLERANCE);
    }

    #[test]
    fn test_total_internal_reflection() {
        let angle = 60f64.to_radians();
        let d = Vector3::new(angle.sin(), 0.0, angle.cos());
        assert!(refract(d, Vector3::unit_z(), 1.5, 1.0).is_none());
    }

    #[test]
    fn test_fresnel_normal_incidence() {
        let interface = Interface {
            incoming: ComplexIndex::real(1.0),
            outgoing: ComplexIndex::real(1.5),
            cos_incidence: 1.0,
        };
        assert!((interface.reflectance() - 0.04).abs() < TOLERANCE);
        assert!((interface.transmittance() - 0.96).abs() < TOLERANCE);
    }

    #[test]
    fn test_fresnel_grazing_and_metal() {
        let grazing = Interface {
            incoming: ComplexIndex::real(1.0),
            outgoing: ComplexIndex::real(1.5),
            cos_incidence: 0.0,
        };
        assert!((grazing.reflectance() - 1.0).abs() < 1e-9);

        // Aluminium-like index: strongly reflecting
        let metal = Interface {
            incoming: ComplexIndex::real(1.0),
            outgoing: ComplexIndex::new(1.2, 7.0),
            cos_incidence: 1.0,
        };
        let expected = ((1.0f64 - 1.2).powi(2) + 49.0) / ((1.0f64 + 1.2).powi(2) + 49.0);
        assert!((metal.reflectance() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_fresnel_oblique_dielectric() {
        let (n1, n2) = (1.0, 1.5);
        let cos_i = 45f64.to_radians().cos();
        let sin_t = (1.0 - cos_i * cos_i).sqrt() * n1 / n2;
        let cos_t = (1.0 - sin_t * sin_t).sqrt();
        let rs = ((n1 * cos_i - n2 * cos_t) / (n1 * cos_i + n2 * cos_t)).powi(2);
        let rp = ((n2 * cos_i - n1 * cos_t) / (n2 * cos_i + n1 * cos_t)).powi(2);

        let interface = Interface {
            incoming: ComplexIndex::real(n1),
            outgoing: ComplexIndex::real(n2),
            cos_incidence: cos_i,
        };
        assert!((interface.reflectance() - (rs + rp) / 2.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_fresnel_beyond_critical_angle_reflects_everything() {
        let interface = Interface {
            incoming: ComplexIndex::real(1.5),
            outgoing: ComplexIndex::real(1.0),
            cos_incidence: 60f64.to_radians().cos(),
        };
        assert!((interface.reflectance() - 1.0).abs() < 1e-9);
        assert!(interface.transmittance().abs() < 1e-9);
    }
}
