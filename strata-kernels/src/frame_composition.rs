use core::f32::consts::PI;

use strata_gpu::prelude::*;

pub fn main(
    global_id: UVec2,
    params: &FrameCompositionPassParams,
    albedo: Tex,
    normals: Tex,
    visibility: Tex,
    direct: Tex,
    diff_colors: Tex,
    spec_colors: Tex,
    indir_r: Tex,
    indir_g: Tex,
    indir_b: Tex,
) -> [Vec4; 1] {
    let screen_pos = global_id;

    // Sky pixels carry their radiance in the unfiltered direct channel
    if Visibility::is_none(visibility.read(screen_pos)) {
        return [direct.read(screen_pos).xyz().extend(1.0)];
    }

    let diff = diff_colors.read(screen_pos).xyz();
    let spec = spec_colors.read(screen_pos).xyz();

    let indirect = SphericalHarmonics::from_texels([
        indir_r.read(screen_pos),
        indir_g.read(screen_pos),
        indir_b.read(screen_pos),
    ])
    .irradiance(GBufferSample::unpack_normal(normals.read(screen_pos)))
        / PI;

    let color = match params.mode {
        // CompositionMode::Final
        0 => albedo.read(screen_pos).xyz() * (diff + indirect) + spec,

        // CompositionMode::Diffuse
        1 => diff,

        // CompositionMode::Specular
        2 => spec,

        // CompositionMode::Indirect
        3 => indirect,

        _ => Default::default(),
    };

    [color.extend(1.0)]
}
