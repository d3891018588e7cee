use glam::{vec4, Vec4};

use crate::normalized_ratio;

/// Per-stratum estimate of how much lighting changed between frames.
///
/// Stores absolute luminance differences together with their normalizers,
/// so that filtering the raw sums and dividing afterwards gives the same
/// ratio as averaging only the strata that actually found a sample.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GradientSample {
    /// `|curr - prev|` luminance of direct diffuse and specular.
    pub delta: f32,

    /// `max(curr, prev)` luminance of direct diffuse and specular.
    pub norm: f32,

    /// `|curr - prev|` luminance of the indirect DC term.
    pub indirect_delta: f32,

    /// `max(curr, prev)` luminance of the indirect DC term.
    pub indirect_norm: f32,
}

impl GradientSample {
    pub fn new(
        curr: f32,
        prev: f32,
        indirect_curr: f32,
        indirect_prev: f32,
    ) -> Self {
        Self {
            delta: (curr - prev).abs(),
            norm: curr.max(prev),
            indirect_delta: (indirect_curr - indirect_prev).abs(),
            indirect_norm: indirect_curr.max(indirect_prev),
        }
    }

    pub fn serialize(&self) -> Vec4 {
        vec4(self.delta, self.norm, self.indirect_delta, self.indirect_norm)
    }

    pub fn deserialize(d0: Vec4) -> Self {
        Self {
            delta: d0.x,
            norm: d0.y,
            indirect_delta: d0.z,
            indirect_norm: d0.w,
        }
    }

    /// Returns relative change of direct lighting, within `0.0..=1.0`.
    pub fn lambda(&self) -> f32 {
        normalized_ratio(self.delta, self.norm)
    }

    /// Returns relative change of indirect lighting, within `0.0..=1.0`.
    pub fn indirect_lambda(&self) -> f32 {
        normalized_ratio(self.indirect_delta, self.indirect_norm)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn doubled_lighting() {
        let sample = GradientSample::new(2.0, 1.0, 0.5, 0.5);

        assert_relative_eq!(0.5, sample.lambda());
        assert_relative_eq!(0.0, sample.indirect_lambda());
    }

    #[test]
    fn missing_sample() {
        let sample = GradientSample::deserialize(Vec4::ZERO);

        assert_eq!(0.0, sample.lambda());
        assert_eq!(0.0, sample.indirect_lambda());
    }
}
