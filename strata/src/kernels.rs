use bytemuck::Pod;
use glam::{uvec2, UVec2, Vec4};
use strata_gpu::Tex;
use strata_kernels::*;

/// Identifies the per-pixel program a dispatch runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kernel {
    MergeGeometry,
    GradientSamples,
    GradientAtrous,
    TemporalAccumulation,
    Antifirefly,
    VarianceEstimation,
    SpatialAtrous,
    FrameComposition,
}

impl Kernel {
    /// Returns number of images the kernel reads and writes.
    pub fn bindings(&self) -> (usize, usize) {
        match self {
            Kernel::MergeGeometry => (2, 1),
            Kernel::GradientSamples => (16, 1),
            Kernel::GradientAtrous => (1, 1),
            Kernel::TemporalAccumulation => (22, 7),
            Kernel::Antifirefly => (6, 5),
            Kernel::VarianceEstimation => (10, 5),
            Kernel::SpatialAtrous => (9, 5),
            Kernel::FrameComposition => (9, 1),
        }
    }

    pub(crate) fn execute(
        &self,
        size: UVec2,
        params: &[u8],
        inputs: &[Tex],
        outputs: &mut [Vec<Vec4>],
    ) {
        match self {
            Kernel::MergeGeometry => {
                run::<_, 2, _>(size, params, inputs, outputs, |pos, p, &[a, b]| {
                    merge_geometry::main(pos, p, a, b)
                });
            }

            Kernel::GradientSamples => {
                run::<_, 16, _>(
                    size,
                    params,
                    inputs,
                    outputs,
                    |pos, p, &[a, b, c, d, e, f, g, h, i, j, k, l, m, n, o, q]| {
                        gradient_samples::main(
                            pos, p, a, b, c, d, e, f, g, h, i, j, k, l, m, n,
                            o, q,
                        )
                    },
                );
            }

            Kernel::GradientAtrous => {
                run::<_, 1, _>(size, params, inputs, outputs, |pos, p, &[a]| {
                    gradient_atrous::main(pos, p, a)
                });
            }

            Kernel::TemporalAccumulation => {
                run::<_, 22, _>(size, params, inputs, outputs, |pos, p, i| {
                    temporal_accumulation::main(
                        pos, p, i[0], i[1], i[2], i[3], i[4], i[5], i[6], i[7],
                        i[8], i[9], i[10], i[11], i[12], i[13], i[14], i[15],
                        i[16], i[17], i[18], i[19], i[20], i[21],
                    )
                });
            }

            Kernel::Antifirefly => {
                run::<_, 6, _>(size, params, inputs, outputs, |pos, p, i| {
                    antifirefly::main(
                        pos, p, i[0], i[1], i[2], i[3], i[4], i[5],
                    )
                });
            }

            Kernel::VarianceEstimation => {
                run::<_, 10, _>(size, params, inputs, outputs, |pos, p, i| {
                    variance_estimation::main(
                        pos, p, i[0], i[1], i[2], i[3], i[4], i[5], i[6], i[7],
                        i[8], i[9],
                    )
                });
            }

            Kernel::SpatialAtrous => {
                run::<_, 9, _>(size, params, inputs, outputs, |pos, p, i| {
                    spatial_atrous::main(
                        pos, p, i[0], i[1], i[2], i[3], i[4], i[5], i[6], i[7],
                        i[8],
                    )
                });
            }

            Kernel::FrameComposition => {
                run::<_, 9, _>(size, params, inputs, outputs, |pos, p, i| {
                    frame_composition::main(
                        pos, p, i[0], i[1], i[2], i[3], i[4], i[5], i[6], i[7],
                        i[8],
                    )
                });
            }
        }
    }
}

/// Invokes `kernel` for each texel of the dispatch and scatters its results
/// into `outputs`.
fn run<'a, P, const R: usize, const W: usize>(
    size: UVec2,
    params: &[u8],
    inputs: &[Tex<'a>],
    outputs: &mut [Vec<Vec4>],
    kernel: impl Fn(UVec2, &P, &[Tex<'a>; R]) -> [Vec4; W],
) where
    P: Pod,
{
    assert_eq!(
        std::mem::size_of::<P>(),
        params.len(),
        "invalid size of kernel's parameters"
    );

    let params: P = bytemuck::pod_read_unaligned(params);

    let inputs: &[Tex; R] = inputs
        .try_into()
        .unwrap_or_else(|_| panic!("expected {R} inputs, got {}", inputs.len()));

    assert_eq!(W, outputs.len(), "expected {W} outputs");

    for y in 0..size.y {
        for x in 0..size.x {
            let idx = (y * size.x + x) as usize;
            let texels = kernel(uvec2(x, y), &params, inputs);

            for (output, texel) in outputs.iter_mut().zip(texels) {
                output[idx] = texel;
            }
        }
    }
}
