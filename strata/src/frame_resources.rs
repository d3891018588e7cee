use std::fmt;
use std::time::Duration;

use log::{debug, trace};

use crate::{
    CommandRecorder, Error, FenceHandle, GpuApi, QueueClass, Result,
    SemaphoreHandle, Submission,
};

/// Number of frames the CPU may record ahead of the GPU.
///
/// Doubled images alternate between two physical copies, so the ring of
/// frame slots must line up with them.
pub const FRAMES_IN_FLIGHT: usize = 2;

const _: () = assert!(FRAMES_IN_FLIGHT == 2);

/// Index of one of the [`FRAMES_IN_FLIGHT`] sets of per-frame resources;
/// doubles as the parity used to resolve doubled images.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameSlot(u32);

impl FrameSlot {
    pub const FIRST: Self = Self(0);

    pub fn new(index: u32) -> Self {
        assert!((index as usize) < FRAMES_IN_FLIGHT);

        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }

    pub fn next(&self) -> Self {
        Self((self.0 + 1) % FRAMES_IN_FLIGHT as u32)
    }

    pub fn prev(&self) -> Self {
        Self((self.0 + FRAMES_IN_FLIGHT as u32 - 1) % FRAMES_IN_FLIGHT as u32)
    }
}

impl fmt::Display for FrameSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug)]
struct SlotResources {
    fence: FenceHandle,
    uploads_done: SemaphoreHandle,
    frame_done: SemaphoreHandle,
    recorders: [CommandRecorder; 3],
}

/// Ring of per-frame command recorders and synchronization primitives.
#[derive(Debug)]
pub struct FrameResourcePool {
    slots: Vec<SlotResources>,
    current: FrameSlot,
    fence_timeout: Duration,
    recording: bool,
}

impl FrameResourcePool {
    pub const DEFAULT_FENCE_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(gpu: &mut dyn GpuApi) -> Result<Self> {
        debug!("Initializing frame resources; frames={FRAMES_IN_FLIGHT}");

        let slots = (0..FRAMES_IN_FLIGHT as u32)
            .map(|idx| {
                let slot = FrameSlot::new(idx);

                Ok(SlotResources {
                    // Signalled, so that the very first wait returns at once
                    fence: gpu.create_fence(true)?,
                    uploads_done: gpu.create_semaphore()?,
                    frame_done: gpu.create_semaphore()?,
                    recorders: QueueClass::ALL
                        .map(|queue| CommandRecorder::new(slot, queue)),
                })
            })
            .collect::<Result<_>>()?;

        Ok(Self {
            slots,
            current: FrameSlot::new(FRAMES_IN_FLIGHT as u32 - 1),
            fence_timeout: Self::DEFAULT_FENCE_TIMEOUT,
            recording: false,
        })
    }

    pub fn with_fence_timeout(mut self, timeout: Duration) -> Self {
        self.fence_timeout = timeout;
        self
    }

    pub fn current(&self) -> FrameSlot {
        self.current
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Advances to the next frame slot, waiting until the GPU is done with
    /// whatever that slot was used for the last time.
    pub fn begin_frame(&mut self, gpu: &mut dyn GpuApi) -> Result<FrameSlot> {
        assert!(!self.recording, "previous frame hasn't been submitted");

        let slot = self.current.next();
        let resources = &mut self.slots[slot.index()];

        trace!("Waiting for frame slot {slot}");

        if !gpu.wait_for_fence(resources.fence, self.fence_timeout)? {
            return Err(Error::device_lost(format!(
                "frame slot {slot} didn't complete within {:?}",
                self.fence_timeout
            )));
        }

        gpu.reset_fence(resources.fence);

        for recorder in &mut resources.recorders {
            recorder.reset();
        }

        self.current = slot;
        self.recording = true;

        Ok(slot)
    }

    pub fn recorder(
        &mut self,
        slot: FrameSlot,
        queue: QueueClass,
    ) -> &mut CommandRecorder {
        assert!(self.recording, "no frame is being recorded");
        assert_eq!(self.current, slot, "frame slot {slot} is not current");

        &mut self.slots[slot.index()].recorders[queue.index()]
    }

    /// Semaphore signalled once given slot's uploads are done.
    pub fn uploads_done(&self, slot: FrameSlot) -> SemaphoreHandle {
        self.slots[slot.index()].uploads_done
    }

    /// Semaphore to signal once given slot's last submission is done; the
    /// next frame's uploads wait on it before overwriting shared images.
    pub fn frame_done(&self, slot: FrameSlot) -> SemaphoreHandle {
        self.slots[slot.index()].frame_done
    }

    /// Submits commands recorded so far for given queue.
    pub fn submit(
        &mut self,
        gpu: &mut dyn GpuApi,
        queue: QueueClass,
        wait_on: &[SemaphoreHandle],
        signal: &[SemaphoreHandle],
    ) -> Result<()> {
        self.submit_ex(gpu, queue, wait_on, signal, None)
    }

    /// Submits commands recorded for given queue together with the slot's
    /// fence, finishing the frame.
    pub fn end_frame(
        &mut self,
        gpu: &mut dyn GpuApi,
        queue: QueueClass,
        wait_on: &[SemaphoreHandle],
        signal: &[SemaphoreHandle],
    ) -> Result<()> {
        let fence = self.slots[self.current.index()].fence;

        self.submit_ex(gpu, queue, wait_on, signal, Some(fence))?;
        self.recording = false;

        Ok(())
    }

    fn submit_ex(
        &mut self,
        gpu: &mut dyn GpuApi,
        queue: QueueClass,
        wait_on: &[SemaphoreHandle],
        signal: &[SemaphoreHandle],
        fence: Option<FenceHandle>,
    ) -> Result<()> {
        let slot = self.current;
        let commands = self.recorder(slot, queue).finish();

        trace!(
            "Submitting frame slot {slot} to {queue:?}; commands={}",
            commands.commands.len()
        );

        gpu.submit(
            queue,
            commands,
            &Submission {
                wait_on: wait_on.to_vec(),
                signal: signal.to_vec(),
                fence,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SoftwareDevice;

    #[test]
    fn slots() {
        assert_eq!(FrameSlot::new(1), FrameSlot::FIRST.next());
        assert_eq!(FrameSlot::FIRST, FrameSlot::new(1).next());
        assert_eq!(FrameSlot::new(1), FrameSlot::FIRST.prev());
    }

    #[test]
    fn frames_advance_round_robin() {
        let mut gpu = SoftwareDevice::default();
        let mut target = FrameResourcePool::new(&mut gpu).unwrap();

        let slots: Vec<_> = (0..5)
            .map(|_| {
                let slot = target.begin_frame(&mut gpu).unwrap();

                target
                    .end_frame(&mut gpu, QueueClass::Graphics, &[], &[])
                    .unwrap();

                slot.index()
            })
            .collect();

        assert_eq!(vec![0, 1, 0, 1, 0], slots);
    }

    #[test]
    fn hung_device_is_reported_as_lost() {
        let mut gpu = SoftwareDevice::default();

        let mut target = FrameResourcePool::new(&mut gpu)
            .unwrap()
            .with_fence_timeout(Duration::from_millis(1));

        for _ in 0..2 {
            target.begin_frame(&mut gpu).unwrap();
            target
                .end_frame(&mut gpu, QueueClass::Graphics, &[], &[])
                .unwrap();
        }

        gpu.simulate_hang();

        let err = target.begin_frame(&mut gpu).unwrap_err();

        assert_eq!(crate::ErrorKind::DeviceLost, err.kind());
    }

    #[test]
    fn uploads_wait_for_previous_frame() {
        let mut gpu = SoftwareDevice::default();
        let mut target = FrameResourcePool::new(&mut gpu).unwrap();
        let mut prev_frame_done = None;

        for _ in 0..4 {
            let slot = target.begin_frame(&mut gpu).unwrap();
            let uploads_done = target.uploads_done(slot);
            let frame_done = target.frame_done(slot);

            target
                .submit(
                    &mut gpu,
                    QueueClass::Transfer,
                    prev_frame_done.take().as_slice(),
                    &[uploads_done],
                )
                .unwrap();

            target
                .end_frame(
                    &mut gpu,
                    QueueClass::Graphics,
                    &[uploads_done],
                    &[frame_done],
                )
                .unwrap();

            prev_frame_done = Some(frame_done);
        }

        assert_ne!(
            target.frame_done(FrameSlot::FIRST),
            target.frame_done(FrameSlot::new(1))
        );
    }

    #[test]
    #[should_panic(expected = "previous frame hasn't been submitted")]
    fn frames_cannot_overlap() {
        let mut gpu = SoftwareDevice::default();
        let mut target = FrameResourcePool::new(&mut gpu).unwrap();

        target.begin_frame(&mut gpu).unwrap();
        target.begin_frame(&mut gpu).unwrap();
    }
}
