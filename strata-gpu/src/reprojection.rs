use glam::{ivec2, vec2, IVec2, UVec2, Vec2, Vec3};

/// Where a pixel's surface point landed in the previous frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Reprojection {
    /// Previous-frame position, in pixel coordinates where integers denote
    /// pixel centers.
    pub prev_pos: Vec2,

    /// Expected previous-frame linear depth.
    pub prev_depth: f32,
}

impl Reprojection {
    pub fn new(screen_pos: UVec2, depth: f32, motion: Vec3) -> Self {
        Self {
            prev_pos: screen_pos.as_vec2() + vec2(motion.x, motion.y),
            prev_depth: depth + motion.z,
        }
    }

    /// Returns the previous-frame pixel closest to the reprojected point.
    pub fn nearest(&self) -> IVec2 {
        (self.prev_pos + 0.5).floor().as_ivec2()
    }

    /// Returns the four pixels around the reprojected point together with
    /// their bilinear weights; taps with zero weight are still reported so
    /// that callers can rely on a fixed order.
    pub fn taps(&self) -> [(IVec2, f32); 4] {
        let base = self.prev_pos.floor();
        let fract = self.prev_pos - base;
        let p00 = base.as_ivec2();

        [
            (p00, (1.0 - fract.x) * (1.0 - fract.y)),
            (p00 + ivec2(1, 0), fract.x * (1.0 - fract.y)),
            (p00 + ivec2(0, 1), (1.0 - fract.x) * fract.y),
            (p00 + ivec2(1, 1), fract.x * fract.y),
        ]
    }
}
