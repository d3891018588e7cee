use glam::{vec4, Vec3, Vec4};

use crate::luminance;

/// Spherical harmonics (L1) of incoming indirect radiance, one [`Vec4`] of
/// coefficients per color channel.
///
/// Coefficient order is `(L00, L1-1, L10, L11)`, i.e. DC term first and then
/// the `y`, `z` and `x` bands.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SphericalHarmonics {
    pub r: Vec4,
    pub g: Vec4,
    pub b: Vec4,
}

impl SphericalHarmonics {
    const Y00: f32 = 0.282095;
    const Y1: f32 = 0.488603;

    /// Projects radiance arriving from given direction.
    pub fn project(dir: Vec3, radiance: Vec3) -> Self {
        let basis = vec4(
            Self::Y00,
            Self::Y1 * dir.y,
            Self::Y1 * dir.z,
            Self::Y1 * dir.x,
        );

        Self {
            r: basis * radiance.x,
            g: basis * radiance.y,
            b: basis * radiance.z,
        }
    }

    pub fn from_texels([r, g, b]: [Vec4; 3]) -> Self {
        Self { r, g, b }
    }

    pub fn texels(&self) -> [Vec4; 3] {
        [self.r, self.g, self.b]
    }

    /// Returns the DC term, proportional to the average radiance.
    pub fn dc(&self) -> Vec3 {
        Vec3::new(self.r.x, self.g.x, self.b.x)
    }

    pub fn dc_luminance(&self) -> f32 {
        luminance(self.dc())
    }

    /// Evaluates irradiance for a surface with given normal, using the
    /// clamped-cosine convolution of the L1 bands.
    pub fn irradiance(&self, normal: Vec3) -> Vec3 {
        const A0: f32 = core::f32::consts::PI;
        const A1: f32 = 2.0 * core::f32::consts::PI / 3.0;

        let basis = vec4(
            A0 * Self::Y00,
            A1 * Self::Y1 * normal.y,
            A1 * Self::Y1 * normal.z,
            A1 * Self::Y1 * normal.x,
        );

        Vec3::new(self.r.dot(basis), self.g.dot(basis), self.b.dot(basis))
            .max(Vec3::ZERO)
    }

    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self {
            r: crate::lerp(self.r, other.r, t),
            g: crate::lerp(self.g, other.g, t),
            b: crate::lerp(self.b, other.b, t),
        }
    }
}

#[cfg(test)]
mod tests {
    use core::f32::consts::PI;

    use approx::assert_relative_eq;
    use glam::vec3;

    use super::*;

    #[test]
    fn irradiance_of_uniform_radiance() {
        // Uniform radiance `L` over the whole sphere gives `PI * L` of
        // irradiance regardless of the normal.
        let l00 = SphericalHarmonics::Y00 * 4.0 * PI;

        let sh = SphericalHarmonics {
            r: vec4(2.0 * l00, 0.0, 0.0, 0.0),
            g: Vec4::ZERO,
            b: vec4(l00, 0.0, 0.0, 0.0),
        };

        for normal in [Vec3::X, Vec3::NEG_Y, vec3(0.0, 0.6, 0.8)] {
            let actual = sh.irradiance(normal);

            assert_relative_eq!(2.0 * PI, actual.x, epsilon = 1e-4);
            assert_relative_eq!(0.0, actual.y);
            assert_relative_eq!(PI, actual.z, epsilon = 1e-4);
        }
    }

    #[test]
    fn projection_is_brighter_towards_source() {
        let sh = SphericalHarmonics::project(Vec3::Y, Vec3::ONE);

        let towards = sh.irradiance(Vec3::Y);
        let away = sh.irradiance(Vec3::NEG_Y);

        assert!(towards.x > away.x);
        assert_relative_eq!(sh.dc().x, SphericalHarmonics::Y00);
    }
}
