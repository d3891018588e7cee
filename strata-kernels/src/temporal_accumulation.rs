use strata_gpu::prelude::*;

/// History found by reprojecting current pixel into the previous frame.
struct History {
    diff_color: Vec3,
    moments: Vec4,
    spec_color: Vec3,
    indirect: SphericalHarmonics,
    len: f32,
}

/// Blends this frame's noisy samples into the accumulated history.
///
/// History is found by bilinearly reprojecting the pixel and keeping only
/// those taps which agree on geometry (depth, geometric normal, geometry and
/// instance); when none agrees, the pixel starts over with history length of
/// one. On top of the usual exponential moving average, the blend factor is
/// raised wherever gradients detected a change of lighting, so that stale
/// history fades out even where reprojection itself succeeds.
pub fn main(
    global_id: UVec2,
    params: &TemporalAccumulationPassParams,
    motion: Tex,
    depth: Tex,
    prev_depth: Tex,
    depth_grad: Tex,
    normal_geometry: Tex,
    prev_normal_geometry: Tex,
    visibility: Tex,
    prev_visibility: Tex,
    geometry_matches: Tex,
    direct: Tex,
    specular: Tex,
    indir_r: Tex,
    indir_g: Tex,
    indir_b: Tex,
    prev_diff_colors: Tex,
    prev_moments: Tex,
    prev_spec_colors: Tex,
    prev_indir_r: Tex,
    prev_indir_g: Tex,
    prev_indir_b: Tex,
    prev_history: Tex,
    gradients: Tex,
) -> [Vec4; 7] {
    let screen_pos = global_id;
    let diff_color = direct.read(screen_pos).xyz();
    let spec_color = specular.read(screen_pos).xyz();

    let indirect = SphericalHarmonics::from_texels([
        indir_r.read(screen_pos),
        indir_g.read(screen_pos),
        indir_b.read(screen_pos),
    ]);

    let diff_lum = luminance(diff_color);
    let spec_lum = luminance(spec_color);

    let moments =
        vec4(diff_lum, diff_lum * diff_lum, spec_lum, spec_lum * spec_lum);

    let history = if params.history_valid() {
        reproject(
            screen_pos,
            params,
            motion,
            depth,
            prev_depth,
            depth_grad,
            normal_geometry,
            prev_normal_geometry,
            visibility,
            prev_visibility,
            GeometryMatchMap::new(geometry_matches),
            |pos| History {
                diff_color: prev_diff_colors.read(pos).xyz(),
                moments: prev_moments.read(pos),
                spec_color: prev_spec_colors.read(pos).xyz(),
                indirect: SphericalHarmonics::from_texels([
                    prev_indir_r.read(pos),
                    prev_indir_g.read(pos),
                    prev_indir_b.read(pos),
                ]),
                len: prev_history.read(pos).x,
            },
        )
    } else {
        None
    };

    let Some(history) = history else {
        return [
            diff_color.extend(0.0),
            moments,
            spec_color.extend(0.0),
            indirect.r,
            indirect.g,
            indirect.b,
            vec4(1.0, 0.0, 0.0, 0.0),
        ];
    };

    let gradient =
        GradientSample::deserialize(gradients.read(screen_pos / STRATA_SIZE));

    let antilag =
        (gradient.lambda() * params.antilag_sensitivity).clamp(0.0, 1.0);

    let indirect_antilag = (gradient.indirect_lambda()
        * params.antilag_sensitivity)
        .clamp(0.0, 1.0);

    let len = (history.len + 1.0).min(params.history_cap);
    let color_alpha = (1.0 / len).max(params.min_color_alpha);
    let moments_alpha = (1.0 / len).max(params.min_moments_alpha);

    let diff_alpha = lerp(color_alpha, 1.0, antilag);
    let indirect_alpha = lerp(color_alpha, 1.0, indirect_antilag);
    let moments_alpha = lerp(moments_alpha, 1.0, antilag);

    [
        lerp(history.diff_color, diff_color, diff_alpha).extend(0.0),
        lerp(history.moments, moments, moments_alpha),
        lerp(history.spec_color, spec_color, diff_alpha).extend(0.0),
        lerp(history.indirect.r, indirect.r, indirect_alpha),
        lerp(history.indirect.g, indirect.g, indirect_alpha),
        lerp(history.indirect.b, indirect.b, indirect_alpha),
        vec4(len, 1.0 - diff_alpha, 1.0 - indirect_alpha, 0.0),
    ]
}

fn reproject(
    screen_pos: UVec2,
    params: &TemporalAccumulationPassParams,
    motion: Tex,
    depth: Tex,
    prev_depth: Tex,
    depth_grad: Tex,
    normal_geometry: Tex,
    prev_normal_geometry: Tex,
    visibility: Tex,
    prev_visibility: Tex,
    geometry_matches: GeometryMatchMap,
    history: impl Fn(UVec2) -> History,
) -> Option<History> {
    let curr = Visibility::unpack(visibility.read(screen_pos))?;
    let curr_depth = depth.read(screen_pos).x;

    let reprojection =
        Reprojection::new(screen_pos, curr_depth, motion.read(screen_pos).xyz());

    let normal =
        GBufferSample::unpack_normal(normal_geometry.read(screen_pos));

    let depth_tolerance = params.depth_tolerance * curr_depth
        + 2.0 * depth_grad.read(screen_pos).x;

    let mut sum = History {
        diff_color: Vec3::ZERO,
        moments: Vec4::ZERO,
        spec_color: Vec3::ZERO,
        indirect: Default::default(),
        len: 0.0,
    };

    let mut sum_weight = 0.0;
    let mut best_weight = 0.0;

    for (tap, weight) in reprojection.taps() {
        if weight <= 0.0 {
            continue;
        }

        let Some(prev) = prev_visibility
            .get(tap)
            .and_then(Visibility::unpack)
            .and_then(|prev| geometry_matches.translate(prev))
        else {
            continue;
        };

        if !prev.is_same_surface(&curr) {
            continue;
        }

        let tap = tap.as_uvec2();

        if (prev_depth.read(tap).x - reprojection.prev_depth).abs()
            > depth_tolerance
        {
            continue;
        }

        let prev_normal =
            GBufferSample::unpack_normal(prev_normal_geometry.read(tap));

        if normal.dot(prev_normal) < params.normal_threshold {
            continue;
        }

        let sample = history(tap);

        sum.diff_color += sample.diff_color * weight;
        sum.moments += sample.moments * weight;
        sum.spec_color += sample.spec_color * weight;
        sum.indirect.r += sample.indirect.r * weight;
        sum.indirect.g += sample.indirect.g * weight;
        sum.indirect.b += sample.indirect.b * weight;
        sum_weight += weight;

        // History length is a count, so instead of blending it we take it
        // from the dominant tap
        if weight > best_weight {
            best_weight = weight;
            sum.len = sample.len;
        }
    }

    if sum_weight < 1e-3 || sum.len < 1.0 {
        return None;
    }

    Some(History {
        diff_color: sum.diff_color / sum_weight,
        moments: sum.moments / sum_weight,
        spec_color: sum.spec_color / sum_weight,
        indirect: SphericalHarmonics {
            r: sum.indirect.r / sum_weight,
            g: sum.indirect.g / sum_weight,
            b: sum.indirect.b / sum_weight,
        },
        len: sum.len,
    })
}
