use strata_gpu::prelude::*;

const KERNEL: [f32; 3] = [0.25, 0.5, 0.25];

/// Performs a single iteration of the edge-avoiding à-trous wavelet filter.
///
/// Diffuse and specular colors carry their variance in the alpha channel;
/// it drives the luminance edge-stopping function and is propagated to the
/// next iteration. Indirect spherical harmonics are filtered with geometric
/// weights only.
pub fn main(
    global_id: UVec2,
    params: &SpatialAtrousPassParams,
    normals: Tex,
    depth: Tex,
    depth_grad: Tex,
    metallic_roughness: Tex,
    diff_colors: Tex,
    spec_colors: Tex,
    indir_r: Tex,
    indir_g: Tex,
    indir_b: Tex,
) -> [Vec4; 5] {
    let screen_pos = global_id;
    let center_depth = depth.read(screen_pos).x;
    let center_diff = diff_colors.read(screen_pos);
    let center_spec = spec_colors.read(screen_pos);

    if center_depth <= 0.0 {
        return [
            center_diff,
            center_spec,
            indir_r.read(screen_pos),
            indir_g.read(screen_pos),
            indir_b.read(screen_pos),
        ];
    }

    let center_normal = GBufferSample::unpack_normal(normals.read(screen_pos));
    let center_grad = depth_grad.read(screen_pos).x.max(1e-3);
    let center_roughness = metallic_roughness.read(screen_pos).y;
    let center_diff_lum = luminance(center_diff.xyz());
    let center_spec_lum = luminance(center_spec.xyz());

    let diff_lum_sigma = params.sigma_luminance
        * prefiltered_variance(diff_colors, screen_pos).sqrt()
        + 1e-4;

    let spec_lum_sigma = params.sigma_luminance
        * prefiltered_variance(spec_colors, screen_pos).sqrt()
        + 1e-4;

    let step = params.step_size();

    let mut diff = Filtered::default();
    let mut spec = Filtered::default();
    let mut indirect = SphericalHarmonics::default();
    let mut indirect_weight = 0.0;

    for dy in -1..=1 {
        for dx in -1..=1 {
            let offset = ivec2(dx, dy) * step;
            let pos = screen_pos.as_ivec2() + offset;

            if !depth.contains(pos) {
                continue;
            }

            let pos = pos.as_uvec2();
            let kernel = KERNEL[(dx + 1) as usize] * KERNEL[(dy + 1) as usize];
            let diff_color = diff_colors.read(pos);
            let spec_color = spec_colors.read(pos);

            let (geometry_weight, diff_lum_weight, spec_lum_weight) =
                if offset == IVec2::ZERO {
                    (1.0, 1.0, 1.0)
                } else {
                    let sample_depth = depth.read(pos).x;

                    if sample_depth <= 0.0 {
                        continue;
                    }

                    let normal =
                        GBufferSample::unpack_normal(normals.read(pos));

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

                    let roughness_weight = (-(center_roughness
                        - metallic_roughness.read(pos).y)
                        .abs()
                        * params.sigma_roughness)
                        .exp();

                    let diff_lum_weight = luminance_weight(
                        center_diff_lum,
                        diff_color,
                        diff_lum_sigma,
                    );

                    let spec_lum_weight = luminance_weight(
                        center_spec_lum,
                        spec_color,
                        spec_lum_sigma,
                    );

                    (
                        normal_weight * depth_weight,
                        diff_lum_weight,
                        spec_lum_weight * roughness_weight,
                    )
                };

            diff.add(diff_color, kernel * geometry_weight * diff_lum_weight);
            spec.add(spec_color, kernel * geometry_weight * spec_lum_weight);

            let weight = kernel * geometry_weight;

            indirect.r += indir_r.read(pos) * weight;
            indirect.g += indir_g.read(pos) * weight;
            indirect.b += indir_b.read(pos) * weight;
            indirect_weight += weight;
        }
    }

    [
        diff.eval(),
        spec.eval(),
        indirect.r / indirect_weight,
        indirect.g / indirect_weight,
        indirect.b / indirect_weight,
    ]
}

fn luminance_weight(center_lum: f32, sample: Vec4, sigma: f32) -> f32 {
    (-(center_lum - luminance(sample.xyz())).abs() / sigma).exp()
}

/// Returns variance blurred with a 3x3 gaussian, which makes the luminance
/// edge-stopping function more robust against outliers.
fn prefiltered_variance(colors: Tex, screen_pos: UVec2) -> f32 {
    let mut sum = 0.0;
    let mut sum_weight = 0.0;

    for dy in -1..=1 {
        for dx in -1..=1 {
            let pos = screen_pos.as_ivec2() + ivec2(dx, dy);

            if let Some(color) = colors.get(pos) {
                let weight =
                    KERNEL[(dx + 1) as usize] * KERNEL[(dy + 1) as usize];

                sum += color.w * weight;
                sum_weight += weight;
            }
        }
    }

    sum / sum_weight
}

/// Weighted sum of colors which keeps track of their variance (stored in
/// the alpha channel).
#[derive(Default)]
struct Filtered {
    color: Vec3,
    variance: f32,
    weight: f32,
}

impl Filtered {
    fn add(&mut self, sample: Vec4, weight: f32) {
        self.color += sample.xyz() * weight;
        self.variance += sample.w * weight * weight;
        self.weight += weight;
    }

    fn eval(&self) -> Vec4 {
        (self.color / self.weight)
            .extend(self.variance / (self.weight * self.weight))
    }
}
