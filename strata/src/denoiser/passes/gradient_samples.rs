use strata_gpu as gpu;

use crate::{
    CommandRecorder, ComputePass, DenoiserConfig, FrameSlot, ImageBank,
    ImageName, Kernel,
};

/// Picks one pixel per stratum and measures how much its shading changed
/// since the previous frame.
#[derive(Debug)]
pub struct GradientSamplesPass {
    pass: ComputePass<gpu::GradientSamplesPassParams>,
}

impl GradientSamplesPass {
    pub fn new(_: &DenoiserConfig) -> Self {
        use ImageName::*;

        let pass = ComputePass::builder("gradient_samples")
            .read([
                VisibilityBuffer.curr(),
                VisibilityBuffer.prev(),
                Motion.curr(),
                GeometryMatchPrev.curr(),
                RandomSeed.curr(),
                RandomSeed.prev(),
                UnfilteredDirect.curr(),
                UnfilteredDirect.prev(),
                UnfilteredSpecular.curr(),
                UnfilteredSpecular.prev(),
                UnfilteredIndirShR.curr(),
                UnfilteredIndirShG.curr(),
                UnfilteredIndirShB.curr(),
                UnfilteredIndirShR.prev(),
                UnfilteredIndirShG.prev(),
                UnfilteredIndirShB.prev(),
            ])
            .write([DisPingGradient.curr()])
            .build(Kernel::GradientSamples);

        Self { pass }
    }

    pub fn run(
        &self,
        bank: &ImageBank,
        recorder: &mut CommandRecorder,
        slot: FrameSlot,
        history_valid: bool,
    ) {
        self.pass.run(
            bank,
            recorder,
            slot,
            gpu::GradientSamplesPassParams {
                history_valid: history_valid as u32,
            },
        );
    }
}
