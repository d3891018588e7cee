use strata_gpu::prelude::*;

/// Clamps accumulated colors that outshine their whole 3x3 neighbourhood.
///
/// A single rare, high-energy path would otherwise linger in the history for
/// dozens of frames; clamping it to `max_ratio` times the brightest neighbour
/// keeps the energy of regular noise intact.
pub fn main(
    global_id: UVec2,
    params: &AntifireflyPassParams,
    depth: Tex,
    diff_colors: Tex,
    spec_colors: Tex,
    indir_r: Tex,
    indir_g: Tex,
    indir_b: Tex,
) -> [Vec4; 5] {
    let screen_pos = global_id;
    let diff_color = diff_colors.read(screen_pos);
    let spec_color = spec_colors.read(screen_pos);

    let indirect = SphericalHarmonics::from_texels([
        indir_r.read(screen_pos),
        indir_g.read(screen_pos),
        indir_b.read(screen_pos),
    ]);

    let unchanged =
        [diff_color, spec_color, indirect.r, indirect.g, indirect.b];

    if depth.read(screen_pos).x <= 0.0 {
        return unchanged;
    }

    let mut max_diff = 0.0f32;
    let mut max_spec = 0.0f32;
    let mut max_indir = 0.0f32;
    let mut neighbours = 0;

    for dy in -1..=1 {
        for dx in -1..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }

            let pos = screen_pos.as_ivec2() + ivec2(dx, dy);

            if !depth.contains(pos) {
                continue;
            }

            let pos = pos.as_uvec2();

            if depth.read(pos).x <= 0.0 {
                continue;
            }

            let neighbour_indirect = SphericalHarmonics::from_texels([
                indir_r.read(pos),
                indir_g.read(pos),
                indir_b.read(pos),
            ]);

            max_diff = max_diff.max(luminance(diff_colors.read(pos).xyz()));
            max_spec = max_spec.max(luminance(spec_colors.read(pos).xyz()));
            max_indir = max_indir.max(neighbour_indirect.dc_luminance());
            neighbours += 1;
        }
    }

    if neighbours == 0 {
        return unchanged;
    }

    let diff_scale =
        clamp_scale(luminance(diff_color.xyz()), max_diff, params.max_ratio);

    let spec_scale =
        clamp_scale(luminance(spec_color.xyz()), max_spec, params.max_ratio);

    let indir_scale =
        clamp_scale(indirect.dc_luminance(), max_indir, params.max_ratio);

    [
        (diff_color.xyz() * diff_scale).extend(diff_color.w),
        (spec_color.xyz() * spec_scale).extend(spec_color.w),
        indirect.r * indir_scale,
        indirect.g * indir_scale,
        indirect.b * indir_scale,
    ]
}

/// Returns the factor bringing `lum` down to `max_ratio * max_lum`.
fn clamp_scale(lum: f32, max_lum: f32, max_ratio: f32) -> f32 {
    let limit = max_lum * max_ratio;

    if lum > limit && lum > 0.0 {
        limit / lum
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    const SIZE: UVec2 = UVec2::new(3, 3);

    fn run(
        pos: UVec2,
        depth: &[Vec4],
        diffuse: &[Vec4],
        indirect: &[Vec4],
    ) -> [Vec4; 5] {
        let zeros = vec![Vec4::ZERO; 9];

        main(
            pos,
            &AntifireflyPassParams { max_ratio: 2.0 },
            Tex::new(SIZE, depth),
            Tex::new(SIZE, diffuse),
            Tex::new(SIZE, &zeros),
            Tex::new(SIZE, indirect),
            Tex::new(SIZE, indirect),
            Tex::new(SIZE, indirect),
        )
    }

    #[test]
    fn firefly_is_clamped() {
        let depth = vec![Vec4::ONE; 9];
        let mut diffuse = vec![vec4(0.5, 0.5, 0.5, 0.25); 9];

        diffuse[4] = vec4(100.0, 100.0, 100.0, 0.25);
        diffuse[0] = vec4(0.75, 0.75, 0.75, 0.25);

        let [diff, spec, ..] =
            run(uvec2(1, 1), &depth, &diffuse, &[Vec4::ZERO; 9]);

        // Twice the brightest neighbour
        assert_relative_eq!(1.5, diff.x, epsilon = 1e-4);
        assert_relative_eq!(1.5, diff.z, epsilon = 1e-4);
        assert_eq!(0.25, diff.w);
        assert_eq!(Vec4::ZERO, spec);

        // Neighbours themselves are left alone
        let [diff, ..] = run(uvec2(0, 0), &depth, &diffuse, &[Vec4::ZERO; 9]);

        assert_eq!(vec4(0.75, 0.75, 0.75, 0.25), diff);
    }

    #[test]
    fn regular_noise_is_left_alone() {
        let depth = vec![Vec4::ONE; 9];
        let mut diffuse = vec![Vec4::splat(0.4); 9];

        diffuse[4] = Vec4::splat(0.7);

        let [diff, ..] = run(uvec2(1, 1), &depth, &diffuse, &[Vec4::ZERO; 9]);

        assert_eq!(Vec4::splat(0.7), diff);
    }

    #[test]
    fn indirect_firefly_is_clamped() {
        let depth = vec![Vec4::ONE; 9];
        let mut indirect = vec![vec4(0.1, 0.0, 0.0, 0.0); 9];

        indirect[4] = vec4(10.0, 1.0, 0.0, 0.0);

        let [_, _, r, g, b] =
            run(uvec2(1, 1), &depth, &[Vec4::ZERO; 9], &indirect);

        assert_relative_eq!(0.2, r.x, epsilon = 1e-5);
        assert_relative_eq!(0.02, r.y, epsilon = 1e-5);
        assert_eq!(r, g);
        assert_eq!(r, b);
    }

    #[test]
    fn sky_is_ignored() {
        let mut depth = vec![Vec4::ZERO; 9];
        let mut diffuse = vec![Vec4::ZERO; 9];

        depth[4] = Vec4::ONE;
        diffuse[4] = Vec4::splat(50.0);

        // No surfaces around, so there's nothing to compare against
        let [diff, ..] = run(uvec2(1, 1), &depth, &diffuse, &[Vec4::ZERO; 9]);

        assert_eq!(Vec4::splat(50.0), diff);

        // Sky pixels themselves pass through
        let [diff, ..] = run(uvec2(0, 1), &depth, &diffuse, &[Vec4::ZERO; 9]);

        assert_eq!(Vec4::ZERO, diff);
    }
}
