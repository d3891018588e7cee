use strata_gpu as gpu;

use crate::{
    CommandRecorder, ComputePass, DenoiserConfig, FrameSlot, ImageBank,
    ImageName, Kernel,
};

/// Dilates the sparse gradient samples with a widening box filter,
/// bouncing between the ping and pong images; the result ends up in
/// `DisPingGradient`.
#[derive(Debug)]
pub struct GradientAtrousPass {
    passes: [ComputePass<gpu::GradientAtrousPassParams>; 2],
}

impl GradientAtrousPass {
    pub fn new(_: &DenoiserConfig) -> Self {
        use ImageName::*;

        let ping_to_pong = ComputePass::builder("gradient_atrous_ping")
            .read([DisPingGradient.curr()])
            .write([DisPongGradient.curr()])
            .build(Kernel::GradientAtrous);

        let pong_to_ping = ComputePass::builder("gradient_atrous_pong")
            .read([DisPongGradient.curr()])
            .write([DisPingGradient.curr()])
            .build(Kernel::GradientAtrous);

        Self {
            passes: [ping_to_pong, pong_to_ping],
        }
    }

    pub fn run(
        &self,
        bank: &ImageBank,
        recorder: &mut CommandRecorder,
        slot: FrameSlot,
    ) {
        for iteration in 0..gpu::GRADIENT_ATROUS_ITERATIONS {
            self.passes[iteration as usize % 2].run(
                bank,
                recorder,
                slot,
                gpu::GradientAtrousPassParams { iteration },
            );
        }
    }
}
