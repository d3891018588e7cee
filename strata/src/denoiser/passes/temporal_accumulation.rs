use strata_gpu as gpu;

use crate::{
    CommandRecorder, ComputePass, DenoiserConfig, FrameSlot, ImageBank,
    ImageName, Kernel,
};

/// Reprojects previous frame's accumulated signals and blends them with the
/// current samples, trusting the history less where gradients spike.
///
/// Colors land in the pong images, for [`super::AntifireflyPass`] to pick
/// them up.
#[derive(Debug)]
pub struct TemporalAccumulationPass {
    pass: ComputePass<gpu::TemporalAccumulationPassParams>,
    params: gpu::TemporalAccumulationPassParams,
}

impl TemporalAccumulationPass {
    pub fn new(config: &DenoiserConfig) -> Self {
        use ImageName::*;

        let pass = ComputePass::builder("temporal_accumulation")
            .read([
                Motion.curr(),
                Depth.curr(),
                Depth.prev(),
                DepthGrad.curr(),
                NormalGeometry.curr(),
                NormalGeometry.prev(),
                VisibilityBuffer.curr(),
                VisibilityBuffer.prev(),
                GeometryMatchPrev.curr(),
                UnfilteredDirect.curr(),
                UnfilteredSpecular.curr(),
                UnfilteredIndirShR.curr(),
                UnfilteredIndirShG.curr(),
                UnfilteredIndirShB.curr(),
                DiffColorHistory.prev(),
                AccumMoments.prev(),
                SpecAccumColor.prev(),
                IndirAccumShR.prev(),
                IndirAccumShG.prev(),
                IndirAccumShB.prev(),
                AccumHistoryLength.prev(),
                DisPingGradient.curr(),
            ])
            .write([
                DiffPongColorAndVariance.curr(),
                AccumMoments.curr(),
                SpecPongColorAndVariance.curr(),
                IndirPongShR.curr(),
                IndirPongShG.curr(),
                IndirPongShB.curr(),
                AccumHistoryLength.curr(),
            ])
            .build(Kernel::TemporalAccumulation);

        let params = gpu::TemporalAccumulationPassParams {
            history_valid: 0,
            history_cap: config.history_cap,
            min_color_alpha: config.min_color_alpha,
            min_moments_alpha: config.min_moments_alpha,
            antilag_sensitivity: config.antilag_sensitivity,
            depth_tolerance: config.depth_tolerance,
            normal_threshold: config.normal_threshold,
        };

        Self { pass, params }
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
            gpu::TemporalAccumulationPassParams {
                history_valid: history_valid as u32,
                ..self.params
            },
        );
    }
}
