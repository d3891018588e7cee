use core::ops;

use glam::{vec3, Vec3};

pub fn lerp<T>(a: T, b: T, t: f32) -> T
where
    T: ops::Add<Output = T>,
    T: ops::Sub<Output = T>,
    T: ops::Mul<f32, Output = T>,
    T: Copy,
{
    a + (b - a) * t.clamp(0.0, 1.0)
}

/// Returns the Rec. 709 luminance of given linear color.
pub fn luminance(color: Vec3) -> f32 {
    color.dot(vec3(0.2126, 0.7152, 0.0722))
}

/// Returns `value / norm` clamped to `0.0..=1.0`, or zero for non-positive
/// norms.
pub fn normalized_ratio(value: f32, norm: f32) -> f32 {
    if norm > 1e-6 {
        (value / norm).clamp(0.0, 1.0)
    } else {
        0.0
    }
}
