use fxhash::FxHashMap;
use glam::{UVec2, Vec4};
use log::trace;

use crate::{FrameSlot, ImageHandle, Kernel, QueueClass};

/// How a command touches an image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    ReadOnly,
    ReadWrite,
}

impl Access {
    /// Returns whether an access following `self` has to wait for it.
    pub fn conflicts_with(&self, next: Access) -> bool {
        !matches!((self, next), (Access::ReadOnly, Access::ReadOnly))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageBarrier {
    pub image: ImageHandle,
    pub before: Access,
    pub after: Access,
}

#[derive(Clone, Debug)]
pub struct Dispatch {
    pub label: String,
    pub kernel: Kernel,
    pub reads: Vec<ImageHandle>,
    pub writes: Vec<ImageHandle>,
    pub size: UVec2,

    /// Kernel's parameters, as `bytemuck::bytes_of()`.
    pub params: Vec<u8>,
}

#[derive(Clone, Debug)]
pub enum Command {
    Barrier(Vec<ImageBarrier>),
    Dispatch(Dispatch),
    Upload { image: ImageHandle, texels: Vec<Vec4> },
    Clear { image: ImageHandle, value: Vec4 },
    PushLabel(String),
    PopLabel,
}

/// Finished list of commands, ready to be submitted.
#[derive(Clone, Debug)]
pub struct CommandList {
    pub slot: FrameSlot,
    pub queue: QueueClass,
    pub commands: Vec<Command>,
}

/// Append-only command list of a single frame slot and queue.
///
/// The recorder remembers which images got accessed since their last
/// barrier, which allows [`Self::barrier()`] to emit only those transitions
/// that are actually required.
#[derive(Debug)]
pub struct CommandRecorder {
    slot: FrameSlot,
    queue: QueueClass,
    commands: Vec<Command>,
    pending: FxHashMap<ImageHandle, Access>,
    labels: usize,
}

impl CommandRecorder {
    pub fn new(slot: FrameSlot, queue: QueueClass) -> Self {
        Self {
            slot,
            queue,
            commands: Default::default(),
            pending: Default::default(),
            labels: 0,
        }
    }

    pub fn slot(&self) -> FrameSlot {
        self.slot
    }

    pub fn queue(&self) -> QueueClass {
        self.queue
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn reset(&mut self) {
        self.commands.clear();
        self.pending.clear();
        self.labels = 0;
    }

    /// Makes previous accesses of given images visible to the next access;
    /// returns number of emitted transitions.
    pub fn barrier(
        &mut self,
        images: impl IntoIterator<Item = (ImageHandle, Access)>,
    ) -> usize {
        let mut barriers: Vec<ImageBarrier> = Vec::new();

        for (image, after) in images {
            if barriers.iter().any(|barrier| barrier.image == image) {
                continue;
            }

            let Some(&before) = self.pending.get(&image) else {
                continue;
            };

            if before.conflicts_with(after) {
                // Whatever writes after a barrier towards reads still has to
                // wait for them
                match after {
                    Access::ReadOnly => {
                        self.pending.insert(image, Access::ReadOnly);
                    }
                    Access::ReadWrite => {
                        self.pending.remove(&image);
                    }
                }

                barriers.push(ImageBarrier {
                    image,
                    before,
                    after,
                });
            }
        }

        let len = barriers.len();

        if len > 0 {
            self.commands.push(Command::Barrier(barriers));
        }

        len
    }

    pub fn dispatch(&mut self, dispatch: Dispatch) {
        trace!(
            "Recording dispatch `{}`; size={:?}",
            dispatch.label,
            dispatch.size
        );

        for &image in &dispatch.reads {
            self.pending.entry(image).or_insert(Access::ReadOnly);
        }

        for &image in &dispatch.writes {
            self.pending.insert(image, Access::ReadWrite);
        }

        self.commands.push(Command::Dispatch(dispatch));
    }

    pub fn upload(&mut self, image: ImageHandle, texels: Vec<Vec4>) {
        self.pending.insert(image, Access::ReadWrite);
        self.commands.push(Command::Upload { image, texels });
    }

    pub fn clear(&mut self, image: ImageHandle, value: Vec4) {
        self.pending.insert(image, Access::ReadWrite);
        self.commands.push(Command::Clear { image, value });
    }

    /// Wraps commands recorded by `f` into a debug label.
    pub fn scope<T>(
        &mut self,
        label: impl ToString,
        f: impl FnOnce(&mut Self) -> T,
    ) -> T {
        self.labels += 1;
        self.commands.push(Command::PushLabel(label.to_string()));

        let result = f(self);

        self.commands.push(Command::PopLabel);
        self.labels -= 1;

        result
    }

    /// Takes the recorded commands out, leaving the recorder empty.
    ///
    /// Submission acts as a full synchronization point, so nothing recorded
    /// later needs to wait for what's been recorded so far.
    pub fn finish(&mut self) -> CommandList {
        assert_eq!(0, self.labels, "unbalanced debug labels");

        self.pending.clear();

        CommandList {
            slot: self.slot,
            queue: self.queue,
            commands: std::mem::take(&mut self.commands),
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::uvec2;

    use super::*;

    fn dispatch(reads: &[ImageHandle], writes: &[ImageHandle]) -> Dispatch {
        Dispatch {
            label: "test".into(),
            kernel: Kernel::GradientAtrous,
            reads: reads.to_vec(),
            writes: writes.to_vec(),
            size: uvec2(1, 1),
            params: vec![0; 4],
        }
    }

    #[test]
    fn barriers() {
        let a = ImageHandle::new(0, 0);
        let b = ImageHandle::new(1, 0);
        let c = ImageHandle::new(2, 0);
        let mut target =
            CommandRecorder::new(FrameSlot::FIRST, QueueClass::Compute);

        // Nothing happened yet, so there's nothing to wait for
        assert_eq!(
            0,
            target.barrier([(a, Access::ReadOnly), (b, Access::ReadWrite)])
        );

        target.dispatch(dispatch(&[a], &[b]));

        // Read-after-read needs no barrier, read-after-write does
        assert_eq!(
            1,
            target.barrier([(a, Access::ReadOnly), (b, Access::ReadOnly)])
        );

        target.dispatch(dispatch(&[a, b], &[c]));

        // Write-after-read needs a barrier, and so does read-after-write
        assert_eq!(
            2,
            target.barrier([(c, Access::ReadOnly), (a, Access::ReadWrite)])
        );

        // ... but only once
        assert_eq!(
            0,
            target.barrier([(c, Access::ReadOnly), (a, Access::ReadWrite)])
        );

        let list = target.finish();

        assert_eq!(4, list.commands.len());
        assert!(target.is_empty());
    }

    #[test]
    fn finishing_synchronizes_everything() {
        let a = ImageHandle::new(0, 0);
        let mut target =
            CommandRecorder::new(FrameSlot::FIRST, QueueClass::Graphics);

        target.upload(a, vec![Vec4::ZERO]);
        target.finish();

        assert_eq!(0, target.barrier([(a, Access::ReadOnly)]));
    }

    #[test]
    #[should_panic(expected = "unbalanced debug labels")]
    fn unbalanced_labels() {
        let mut target =
            CommandRecorder::new(FrameSlot::FIRST, QueueClass::Graphics);

        target.labels = 1;
        target.finish();
    }
}
