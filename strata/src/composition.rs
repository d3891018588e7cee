use strata_gpu as gpu;

use crate::{
    CommandRecorder, CompositionMode, ComputePass, Denoiser, FrameSlot,
    ImageBank, ImageName, Kernel,
};

/// Downstream consumer of the denoised signals; combines them with the
/// G-buffer into the `Final` image.
#[derive(Debug)]
pub struct FrameCompositionPass {
    pass: ComputePass<gpu::FrameCompositionPassParams>,
}

impl FrameCompositionPass {
    pub fn new() -> Self {
        use ImageName::*;

        let outputs = Denoiser::outputs();

        let pass = ComputePass::builder("frame_composition")
            .read([
                Albedo.curr(),
                Normal.curr(),
                VisibilityBuffer.curr(),
                UnfilteredDirect.curr(),
                outputs.diffuse.curr(),
                outputs.specular.curr(),
                outputs.indirect[0].curr(),
                outputs.indirect[1].curr(),
                outputs.indirect[2].curr(),
            ])
            .write([Final.curr()])
            .build(Kernel::FrameComposition);

        Self { pass }
    }

    pub fn run(
        &self,
        bank: &ImageBank,
        recorder: &mut CommandRecorder,
        slot: FrameSlot,
        mode: CompositionMode,
    ) {
        debug_assert!(bank.is_sized());

        self.pass.run(
            bank,
            recorder,
            slot,
            gpu::FrameCompositionPassParams {
                mode: mode.serialize(),
            },
        );
    }
}

impl Default for FrameCompositionPass {
    fn default() -> Self {
        Self::new()
    }
}
