use strata_gpu as gpu;

use crate::{
    CommandRecorder, ComputePass, DenoiserConfig, FrameSlot, ImageBank,
    ImageName, Kernel,
};

#[derive(Debug)]
pub struct VarianceEstimationPass {
    pass: ComputePass<gpu::VarianceEstimationPassParams>,
    params: gpu::VarianceEstimationPassParams,
}

impl VarianceEstimationPass {
    pub fn new(config: &DenoiserConfig) -> Self {
        use ImageName::*;

        let pass = ComputePass::builder("variance_estimation")
            .read([
                DiffAccumColor.curr(),
                SpecAccumColor.curr(),
                AccumMoments.curr(),
                AccumHistoryLength.curr(),
                Normal.curr(),
                Depth.curr(),
                DepthGrad.curr(),
                IndirAccumShR.curr(),
                IndirAccumShG.curr(),
                IndirAccumShB.curr(),
            ])
            .write([
                DiffPingColorAndVariance.curr(),
                SpecPingColorAndVariance.curr(),
                IndirPingShR.curr(),
                IndirPingShG.curr(),
                IndirPingShB.curr(),
            ])
            .build(Kernel::VarianceEstimation);

        let params = gpu::VarianceEstimationPassParams {
            history_threshold: config.variance_history_threshold,
            sigma_normal: config.sigma_normal,
            sigma_depth: config.sigma_depth,
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
