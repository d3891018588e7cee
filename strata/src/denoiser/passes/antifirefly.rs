use strata_gpu as gpu;

use crate::{
    CommandRecorder, ComputePass, DenoiserConfig, FrameSlot, ImageBank,
    ImageName, Kernel,
};

/// Clamps fireflies out of freshly accumulated colors.
///
/// Temporal accumulation leaves its raw output in the pong images; this pass
/// moves it into the accumulation images, which become the next frame's
/// history.
#[derive(Debug)]
pub struct AntifireflyPass {
    pass: ComputePass<gpu::AntifireflyPassParams>,
    params: gpu::AntifireflyPassParams,
}

impl AntifireflyPass {
    pub fn new(config: &DenoiserConfig) -> Self {
        use ImageName::*;

        let pass = ComputePass::builder("antifirefly")
            .read([
                Depth.curr(),
                DiffPongColorAndVariance.curr(),
                SpecPongColorAndVariance.curr(),
                IndirPongShR.curr(),
                IndirPongShG.curr(),
                IndirPongShB.curr(),
            ])
            .write([
                DiffAccumColor.curr(),
                SpecAccumColor.curr(),
                IndirAccumShR.curr(),
                IndirAccumShG.curr(),
                IndirAccumShB.curr(),
            ])
            .build(Kernel::Antifirefly);

        let params = gpu::AntifireflyPassParams {
            max_ratio: config.firefly_ratio,
        };

        Self { pass, params }
    }

    pub fn run(
        &self,
        bank: &ImageBank,
        recorder: &mut CommandRecorder,
        slot: FrameSlot,
    ) {
        self.pass.run(bank, recorder, slot, self.params);
    }
}
