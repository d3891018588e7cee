use strata_gpu::prelude::*;

/// Estimates per-pixel variance of diffuse and specular luminance.
///
/// Pixels with long enough history use their temporally accumulated moments
/// directly; the rest borrow moments (and colors) from a 7x7 neighbourhood of
/// geometrically similar pixels and have their variance boosted, since a few
/// frames' worth of samples tend to underestimate it.
pub fn main(
    global_id: UVec2,
    params: &VarianceEstimationPassParams,
    diff_colors: Tex,
    spec_colors: Tex,
    moments: Tex,
    history: Tex,
    normals: Tex,
    depth: Tex,
    depth_grad: Tex,
    indir_r: Tex,
    indir_g: Tex,
    indir_b: Tex,
) -> [Vec4; 5] {
    let screen_pos = global_id;
    let history_len = history.read(screen_pos).x.max(1.0);
    let center_depth = depth.read(screen_pos).x;

    let mut diff_color = diff_colors.read(screen_pos).xyz();
    let mut spec_color = spec_colors.read(screen_pos).xyz();
    let mut pixel_moments = moments.read(screen_pos);
    let mut boost = 1.0;

    if history_len < params.history_threshold && center_depth > 0.0 {
        let center_normal =
            GBufferSample::unpack_normal(normals.read(screen_pos));

        let center_grad = depth_grad.read(screen_pos).x.max(1e-3);

        let mut sum_diff = Vec3::ZERO;
        let mut sum_spec = Vec3::ZERO;
        let mut sum_moments = Vec4::ZERO;
        let mut sum_weight = 0.0;

        for dy in -3..=3 {
            for dx in -3..=3 {
                let offset = ivec2(dx, dy);
                let pos = screen_pos.as_ivec2() + offset;

                if !depth.contains(pos) {
                    continue;
                }

                let pos = pos.as_uvec2();
                let sample_depth = depth.read(pos).x;

                if sample_depth <= 0.0 {
                    continue;
                }

                let weight = if offset == IVec2::ZERO {
                    1.0
                } else {
                    let normal = GBufferSample::unpack_normal(normals.read(pos));

                    let normal_weight = center_normal
                        .dot(normal)
                        .max(0.0)
                        .powf(params.sigma_normal);

                    let depth_weight = (-(center_depth - sample_depth).abs()
                        / (params.sigma_depth
                            * center_grad
                            * offset.as_vec2().length()
                            + 1e-3))
                        .exp();

                    normal_weight * depth_weight
                };

                sum_diff += diff_colors.read(pos).xyz() * weight;
                sum_spec += spec_colors.read(pos).xyz() * weight;
                sum_moments += moments.read(pos) * weight;
                sum_weight += weight;
            }
        }

        diff_color = sum_diff / sum_weight;
        spec_color = sum_spec / sum_weight;
        pixel_moments = sum_moments / sum_weight;
        boost = params.history_threshold / history_len;
    }

    let diff_variance =
        (pixel_moments.y - pixel_moments.x * pixel_moments.x).max(0.0) * boost;

    let spec_variance =
        (pixel_moments.w - pixel_moments.z * pixel_moments.z).max(0.0) * boost;

    [
        diff_color.extend(diff_variance),
        spec_color.extend(spec_variance),
        indir_r.read(screen_pos),
        indir_g.read(screen_pos),
        indir_b.read(screen_pos),
    ]
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    struct Fixture {
        size: UVec2,
        colors: Vec<Vec4>,
        moments: Vec<Vec4>,
        history: Vec<Vec4>,
        normals: Vec<Vec4>,
        depth: Vec<Vec4>,
        zeros: Vec<Vec4>,
    }

    impl Fixture {
        fn new(history_len: f32) -> Self {
            let size = uvec2(8, 8);
            let len = (size.x * size.y) as usize;

            let colors: Vec<_> = (0..len)
                .map(|idx| Vec4::splat(if idx % 2 == 0 { 0.25 } else { 0.75 }))
                .collect();

            let moments = colors
                .iter()
                .map(|color| {
                    let lum = luminance(color.xyz());

                    vec4(lum, lum * lum, 0.0, 0.0)
                })
                .collect();

            Self {
                size,
                colors,
                moments,
                history: vec![vec4(history_len, 0.0, 0.0, 0.0); len],
                normals: vec![GBufferSample::pack_normal(Vec3::Z); len],
                depth: vec![vec4(5.0, 0.0, 0.0, 0.0); len],
                zeros: vec![Vec4::ZERO; len],
            }
        }

        fn run(&self) -> [Vec4; 5] {
            let size = self.size;

            main(
                uvec2(4, 4),
                &VarianceEstimationPassParams {
                    history_threshold: 4.0,
                    sigma_normal: 128.0,
                    sigma_depth: 1.0,
                },
                Tex::new(size, &self.colors),
                Tex::new(size, &self.zeros),
                Tex::new(size, &self.moments),
                Tex::new(size, &self.history),
                Tex::new(size, &self.normals),
                Tex::new(size, &self.depth),
                Tex::new(size, &self.zeros),
                Tex::new(size, &self.zeros),
                Tex::new(size, &self.zeros),
                Tex::new(size, &self.zeros),
            )
        }
    }

    #[test]
    fn converged_pixels_use_own_moments() {
        let [diff, spec, ..] = Fixture::new(8.0).run();

        assert_relative_eq!(0.25, diff.x);
        assert_eq!(0.0, diff.w);
        assert_eq!(0.0, spec.w);
    }

    #[test]
    fn fresh_pixels_borrow_neighbourhood() {
        let [diff, ..] = Fixture::new(1.0).run();

        // Columns alternating between 0.25 and 0.75 give variance of about
        // 0.06, boosted four times for history of a single frame
        assert!(diff.x > 0.25 && diff.x < 0.75);
        assert_relative_eq!(0.25, diff.w, epsilon = 0.01);
    }

    #[test]
    fn variance_shrinks_as_history_grows() {
        let variances: Vec<_> = [1.0, 2.0, 3.0, 4.0]
            .into_iter()
            .map(|len| Fixture::new(len).run()[0].w)
            .collect();

        assert!(variances.windows(2).all(|pair| pair[1] <= pair[0]));
        assert_eq!(0.0, variances[3]);
    }
}
