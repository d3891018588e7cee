use strata_gpu::prelude::*;

/// Picks a single gradient sample for each stratum.
///
/// Every pixel of the stratum is a candidate: we follow its motion vector
/// back into the previous frame and, if it lands on the very same triangle,
/// compare what the producer shaded there last frame with what it shaded
/// now. Candidates re-traced with the previous frame's random seed win, since
/// their difference doesn't contain any noise; among the rest we prefer the
/// brightest one.
pub fn main(
    global_id: UVec2,
    params: &GradientSamplesPassParams,
    visibility: Tex,
    prev_visibility: Tex,
    motion: Tex,
    geometry_matches: Tex,
    seeds: Tex,
    prev_seeds: Tex,
    direct: Tex,
    prev_direct: Tex,
    specular: Tex,
    prev_specular: Tex,
    indir_r: Tex,
    indir_g: Tex,
    indir_b: Tex,
    prev_indir_r: Tex,
    prev_indir_g: Tex,
    prev_indir_b: Tex,
) -> [Vec4; 1] {
    if params.history_valid == 0 {
        return [Vec4::ZERO];
    }

    let geometry_matches = GeometryMatchMap::new(geometry_matches);
    let mut best: Option<(bool, f32, GradientSample)> = None;

    for dy in 0..STRATA_SIZE {
        for dx in 0..STRATA_SIZE {
            let pos = global_id * STRATA_SIZE + uvec2(dx, dy);

            if !visibility.contains(pos.as_ivec2()) {
                continue;
            }

            let Some(curr) = Visibility::unpack(visibility.read(pos)) else {
                continue;
            };

            let prev_pos =
                Reprojection::new(pos, 0.0, motion.read(pos).xyz()).nearest();

            let Some(prev) = prev_visibility
                .get(prev_pos)
                .and_then(Visibility::unpack)
                .and_then(|prev| geometry_matches.translate(prev))
            else {
                continue;
            };

            if !prev.is_same_triangle(&curr) {
                continue;
            }

            let prev_pos = prev_pos.as_uvec2();

            let seed_matches = seeds.read(pos).x.to_bits()
                == prev_seeds.read(prev_pos).x.to_bits();

            let curr_lum = luminance(
                direct.read(pos).xyz() + specular.read(pos).xyz(),
            );

            let prev_lum = luminance(
                prev_direct.read(prev_pos).xyz()
                    + prev_specular.read(prev_pos).xyz(),
            );

            let curr_indir = SphericalHarmonics::from_texels([
                indir_r.read(pos),
                indir_g.read(pos),
                indir_b.read(pos),
            ]);

            let prev_indir = SphericalHarmonics::from_texels([
                prev_indir_r.read(prev_pos),
                prev_indir_g.read(prev_pos),
                prev_indir_b.read(prev_pos),
            ]);

            let is_better = match best {
                Some((best_seed_matches, best_lum, _)) => {
                    (seed_matches, prev_lum) > (best_seed_matches, best_lum)
                }
                None => true,
            };

            if is_better {
                best = Some((
                    seed_matches,
                    prev_lum,
                    GradientSample::new(
                        curr_lum,
                        prev_lum,
                        curr_indir.dc_luminance(),
                        prev_indir.dc_luminance(),
                    ),
                ));
            }
        }
    }

    [best
        .map(|(_, _, sample)| sample.serialize())
        .unwrap_or_default()]
}
