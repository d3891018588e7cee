use std::marker::PhantomData;

use bytemuck::Pod;
use log::debug;

use crate::{
    Access, CommandRecorder, Dispatch, FrameSlot, ImageBank, ImageRef, Kernel,
};

/// Single dispatch of a [`Kernel`] over a fixed set of bank images.
///
/// Images are bound by name, so the same pass serves both frame parities;
/// the physical images get resolved each time the pass is run.
#[derive(Debug)]
pub struct ComputePass<P> {
    label: String,
    kernel: Kernel,
    reads: Vec<ImageRef>,
    writes: Vec<ImageRef>,
    _params: PhantomData<P>,
}

impl<P> ComputePass<P>
where
    P: Pod,
{
    pub fn builder(label: impl ToString) -> ComputePassBuilder<P> {
        ComputePassBuilder {
            label: label.to_string(),
            reads: Default::default(),
            writes: Default::default(),
            _params: Default::default(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kernel(&self) -> Kernel {
        self.kernel
    }

    pub fn reads(&self) -> &[ImageRef] {
        &self.reads
    }

    pub fn writes(&self) -> &[ImageRef] {
        &self.writes
    }

    /// Records the dispatch, preceded by whatever barriers its bindings
    /// require; the dispatch covers the extent of the first written image.
    pub fn run(
        &self,
        bank: &ImageBank,
        recorder: &mut CommandRecorder,
        slot: FrameSlot,
        params: P,
    ) {
        let bindings = self
            .reads
            .iter()
            .map(|&image| (image, Access::ReadOnly))
            .chain(self.writes.iter().map(|&image| (image, Access::ReadWrite)));

        bank.barrier(recorder, slot, bindings);

        recorder.dispatch(Dispatch {
            label: format!("strata_{}_pass", self.label),
            kernel: self.kernel,
            reads: self
                .reads
                .iter()
                .map(|&image| bank.resolve(image, slot))
                .collect(),
            writes: self
                .writes
                .iter()
                .map(|&image| bank.resolve(image, slot))
                .collect(),
            size: bank.extent(self.writes[0].name),
            params: bytemuck::bytes_of(&params).to_vec(),
        });
    }
}

pub struct ComputePassBuilder<P> {
    label: String,
    reads: Vec<ImageRef>,
    writes: Vec<ImageRef>,
    _params: PhantomData<P>,
}

impl<P> ComputePassBuilder<P>
where
    P: Pod,
{
    pub fn read<const N: usize>(mut self, images: [ImageRef; N]) -> Self {
        self.reads.extend(images);
        self
    }

    pub fn write<const N: usize>(mut self, images: [ImageRef; N]) -> Self {
        self.writes.extend(images);
        self
    }

    pub fn build(self, kernel: Kernel) -> ComputePass<P> {
        debug!("Initializing pass: {} ({kernel:?})", self.label);

        assert_eq!(
            kernel.bindings(),
            (self.reads.len(), self.writes.len()),
            "pass `{}` doesn't match bindings of {kernel:?}",
            self.label
        );

        ComputePass {
            label: self.label,
            kernel,
            reads: self.reads,
            writes: self.writes,
            _params: PhantomData,
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::uvec2;
    use strata_gpu::GradientAtrousPassParams;

    use super::*;
    use crate::{Command, ImageName, QueueClass, SoftwareDevice};

    fn pass() -> ComputePass<GradientAtrousPassParams> {
        ComputePass::builder("test")
            .read([ImageName::DisPingGradient.curr()])
            .write([ImageName::DisPongGradient.curr()])
            .build(Kernel::GradientAtrous)
    }

    #[test]
    fn run() {
        let mut gpu = SoftwareDevice::default();
        let mut bank = ImageBank::new();
        let mut recorder =
            CommandRecorder::new(FrameSlot::FIRST, QueueClass::Graphics);

        bank.on_resize(&mut gpu, uvec2(30, 20)).unwrap();

        pass().run(
            &bank,
            &mut recorder,
            FrameSlot::FIRST,
            GradientAtrousPassParams { iteration: 2 },
        );

        let [Command::Dispatch(dispatch)] = recorder.commands() else {
            panic!("expected a single dispatch: {:?}", recorder.commands());
        };

        assert_eq!("strata_test_pass", dispatch.label);
        assert_eq!(uvec2(10, 7), dispatch.size);
        assert_eq!(vec![2, 0, 0, 0], dispatch.params);
    }

    #[test]
    #[should_panic(expected = "doesn't match bindings")]
    fn invalid_bindings() {
        ComputePass::<GradientAtrousPassParams>::builder("test")
            .read([ImageName::DisPingGradient.curr()])
            .build(Kernel::GradientAtrous);
    }
}
