use strata_gpu::prelude::*;

/// Spreads sparse gradient samples over neighbouring strata.
pub fn main(
    global_id: UVec2,
    params: &GradientAtrousPassParams,
    gradients: Tex,
) -> [Vec4; 1] {
    let step = params.step_size();
    let center = global_id.as_ivec2();
    let mut sum = Vec4::ZERO;
    let mut count = 0.0;

    for dy in -1..=1 {
        for dx in -1..=1 {
            if let Some(sample) = gradients.get(center + ivec2(dx, dy) * step)
            {
                sum += sample;
                count += 1.0;
            }
        }
    }

    [sum / count]
}
