use glam::{vec2, vec3, Vec2, Vec3};

pub struct Normal;

impl Normal {
    /// Compresses normal from Vec3 into Vec2 using octahedron-normal mapping;
    /// the result lies within `-1.0..=1.0`.
    pub fn encode(n: Vec3) -> Vec2 {
        let n = n / (n.x.abs() + n.y.abs() + n.z.abs());

        if n.z >= 0.0 {
            vec2(n.x, n.y)
        } else {
            vec2(
                (1.0 - n.y.abs()).copysign(n.x),
                (1.0 - n.x.abs()).copysign(n.y),
            )
        }
    }

    /// See: [`Self::encode()`].
    pub fn decode(n: Vec2) -> Vec3 {
        let mut v = vec3(n.x, n.y, 1.0 - n.x.abs() - n.y.abs());
        let t = (-v.z).max(0.0);

        v.x -= t.copysign(v.x);
        v.y -= t.copysign(v.y);
        v.normalize()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn encoding() {
        for n in [
            vec3(0.0, 0.0, 1.0),
            vec3(0.0, 0.0, -1.0),
            vec3(0.26, 0.53, 0.80),
            vec3(-0.6, 0.3, -0.74),
            vec3(1.0, -1.0, -1.0),
        ] {
            let n = n.normalize();
            let actual = Normal::decode(Normal::encode(n));

            assert_relative_eq!(n.x, actual.x, epsilon = 1e-5);
            assert_relative_eq!(n.y, actual.y, epsilon = 1e-5);
            assert_relative_eq!(n.z, actual.z, epsilon = 1e-5);
        }
    }
}
