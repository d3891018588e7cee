use strata_gpu as gpu;

use crate::{
    CommandRecorder, ComputePass, DenoiserConfig, FrameSlot, GeometryMatches,
    ImageBank, ImageName, Kernel,
};

/// Builds `GeometryMatchPrev` out of the producer's explicit records and
/// the previous frame's table.
#[derive(Debug)]
pub struct MergeGeometryPass {
    pass: ComputePass<gpu::MergeGeometryPassParams>,
}

impl MergeGeometryPass {
    pub fn new(_: &DenoiserConfig) -> Self {
        let pass = ComputePass::builder("merge_geometry")
            .read([
                ImageName::GeometryRecords.curr(),
                ImageName::GeometryMatchPrev.prev(),
            ])
            .write([ImageName::GeometryMatchPrev.curr()])
            .build(Kernel::MergeGeometry);

        Self { pass }
    }

    pub fn run(
        &self,
        bank: &ImageBank,
        recorder: &mut CommandRecorder,
        slot: FrameSlot,
        matches: &GeometryMatches,
    ) {
        bank.upload(
            recorder,
            slot,
            ImageName::GeometryRecords,
            matches.texels(),
        );

        self.pass.run(
            bank,
            recorder,
            slot,
            gpu::MergeGeometryPassParams {
                changed_classes: matches.changed_classes(),
            },
        );
    }
}
