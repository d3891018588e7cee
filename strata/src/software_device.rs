mod executor;
mod timeline;
mod validator;

use std::collections::VecDeque;
use std::time::Duration;

use derivative::Derivative;
use glam::{UVec2, Vec4};
use log::{debug, trace, warn};

use self::executor::*;
use self::timeline::*;
use self::validator::*;
use crate::{
    CommandList, Error, FenceHandle, GpuApi, ImageDesc, ImageHandle,
    QueueClass, Result, SemaphoreHandle, Submission,
};

/// [`GpuApi`] executing command lists on the CPU.
///
/// Submissions are validated eagerly (missing barriers and accesses racing
/// with other queues are reported as errors, aliased bindings panic) and then
/// queued; the actual work happens
/// lazily, when a fence is waited on, the device is polled or brought idle,
/// which mimics asynchronous execution of a real device.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct SoftwareDevice {
    images: Vec<ImageSlot>,
    fences: Vec<bool>,
    semaphores: Vec<SemaphoreState>,
    #[derivative(Debug = "ignore")]
    queue: VecDeque<PendingSubmission>,
    #[derivative(Debug = "ignore")]
    timeline: Timeline,
    memory_limit: Option<u64>,
    memory_used: u64,
    lost: Option<String>,
    hung: bool,
    stats: DeviceStats,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeviceStats {
    pub submissions: usize,
    pub dispatches: usize,
    pub barriers: usize,
    pub uploads: usize,
    pub clears: usize,
}

#[derive(Debug, Default)]
struct ImageSlot {
    generation: u32,
    image: Option<Image>,
}

#[derive(Derivative)]
#[derivative(Debug)]
struct Image {
    desc: ImageDesc,
    #[derivative(Debug = "ignore")]
    texels: Vec<Vec4>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum SemaphoreState {
    #[default]
    Unsignaled,

    /// Some already-submitted work is going to signal this semaphore.
    Pending,
}

struct PendingSubmission {
    queue: QueueClass,
    commands: CommandList,
    fence: Option<FenceHandle>,
}

impl Default for SoftwareDevice {
    fn default() -> Self {
        Self {
            images: Default::default(),
            fences: Default::default(),
            semaphores: Default::default(),
            queue: Default::default(),
            timeline: Default::default(),
            memory_limit: None,
            memory_used: 0,
            lost: None,
            hung: false,
            stats: Default::default(),
        }
    }
}

impl SoftwareDevice {
    pub fn with_memory_limit(bytes: u64) -> Self {
        let mut gpu = Self::default();

        gpu.memory_limit = Some(bytes);
        gpu
    }

    pub fn set_memory_limit(&mut self, bytes: Option<u64>) {
        self.memory_limit = bytes;
    }

    pub fn memory_used(&self) -> u64 {
        self.memory_used
    }

    pub fn stats(&self) -> DeviceStats {
        self.stats
    }

    pub fn live_images(&self) -> usize {
        self.images
            .iter()
            .filter(|slot| slot.image.is_some())
            .count()
    }

    /// Makes all further operations fail with [`Error::DeviceLost`].
    pub fn simulate_device_loss(&mut self, reason: impl ToString) {
        self.lost = Some(reason.to_string());
    }

    /// Makes the device stop processing submitted work, so that fences
    /// don't get signalled anymore.
    pub fn simulate_hang(&mut self) {
        self.hung = true;
    }

    /// Executes all submitted work.
    pub fn poll(&mut self) -> Result<()> {
        self.ensure_alive()?;

        while !self.hung {
            let Some(submission) = self.queue.pop_front() else {
                break;
            };

            self.execute(submission);
        }

        if self.queue.is_empty() {
            self.timeline.idle();
        }

        Ok(())
    }

    pub fn size(&self, image: ImageHandle) -> UVec2 {
        self.image(image).desc.size
    }

    pub fn label(&self, image: ImageHandle) -> &str {
        &self.image(image).desc.label
    }

    /// Returns texels of given image as of the last executed submission.
    pub fn read(&self, image: ImageHandle) -> &[Vec4] {
        &self.image(image).texels
    }

    fn image(&self, handle: ImageHandle) -> &Image {
        self.images
            .get(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.image.as_ref())
            .unwrap_or_else(|| panic!("stale image handle: {handle}"))
    }

    fn image_mut(&mut self, handle: ImageHandle) -> &mut Image {
        self.images
            .get_mut(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.image.as_mut())
            .unwrap_or_else(|| panic!("stale image handle: {handle}"))
    }

    fn ensure_alive(&self) -> Result<()> {
        match &self.lost {
            Some(reason) => Err(Error::device_lost(reason)),
            None => Ok(()),
        }
    }

    fn execute(&mut self, submission: PendingSubmission) {
        trace!(
            "Executing {:?} submission of frame slot {}; commands={}",
            submission.queue,
            submission.commands.slot,
            submission.commands.commands.len(),
        );

        Executor::new(self).run(submission.commands.commands);

        if let Some(fence) = submission.fence {
            self.fences[fence.0 as usize] = true;
        }
    }
}

impl GpuApi for SoftwareDevice {
    fn create_image(&mut self, desc: &ImageDesc) -> Result<ImageHandle> {
        self.ensure_alive()?;

        assert!(
            desc.size.x > 0 && desc.size.y > 0,
            "image `{}` has zero size",
            desc.label
        );

        let requested = desc.bytes();

        if let Some(limit) = self.memory_limit {
            if self.memory_used + requested > limit {
                return Err(Error::OutOfDeviceMemory {
                    label: desc.label.clone(),
                    requested,
                    available: limit.saturating_sub(self.memory_used),
                });
            }
        }

        let image = Image {
            desc: desc.clone(),
            texels: vec![Vec4::ZERO; (desc.size.x * desc.size.y) as usize],
        };

        let index = match self.images.iter().position(|slot| slot.image.is_none())
        {
            Some(index) => index,
            None => {
                self.images.push(Default::default());
                self.images.len() - 1
            }
        };

        let slot = &mut self.images[index];

        slot.image = Some(image);
        self.memory_used += requested;

        Ok(ImageHandle::new(index as u32, slot.generation))
    }

    fn destroy_image(&mut self, image: ImageHandle) {
        let freed = self.image(image).desc.bytes();
        let slot = &mut self.images[image.index() as usize];

        slot.image = None;
        slot.generation += 1;
        self.memory_used -= freed;
        self.timeline.forget(image);
    }

    fn create_fence(&mut self, signaled: bool) -> Result<FenceHandle> {
        self.ensure_alive()?;
        self.fences.push(signaled);

        Ok(FenceHandle(self.fences.len() as u32 - 1))
    }

    fn create_semaphore(&mut self) -> Result<SemaphoreHandle> {
        self.ensure_alive()?;
        self.semaphores.push(Default::default());

        Ok(SemaphoreHandle(self.semaphores.len() as u32 - 1))
    }

    /// Executes queued work until the fence gets signalled.
    ///
    /// Nothing here measures time: `timeout` only shows up in the warning,
    /// and a fence that never signals is modelled by [`Self::simulate_hang()`].
    fn wait_for_fence(
        &mut self,
        fence: FenceHandle,
        timeout: Duration,
    ) -> Result<bool> {
        self.ensure_alive()?;

        while !self.fences[fence.0 as usize] && !self.hung {
            let Some(submission) = self.queue.pop_front() else {
                break;
            };

            self.execute(submission);
        }

        let signaled = self.fences[fence.0 as usize];

        if signaled {
            self.timeline.fence_signaled(fence);
        } else {
            warn!("Fence {fence:?} not signalled within {timeout:?}");
        }

        Ok(signaled)
    }

    fn reset_fence(&mut self, fence: FenceHandle) {
        self.fences[fence.0 as usize] = false;
    }

    fn submit(
        &mut self,
        queue: QueueClass,
        commands: CommandList,
        submission: &Submission,
    ) -> Result<()> {
        self.ensure_alive()?;

        Validator::new(self).validate(&commands)?;

        let clock = self
            .timeline
            .check(queue, &commands, submission)
            .map_err(|hazard| Error::UnorderedSubmission {
                image: self.label(hazard.image).to_string(),
                queue,
                previous: hazard.previous.to_string(),
            })?;

        self.timeline.record(queue, &commands, submission, clock);

        for semaphore in &submission.wait_on {
            let state = &mut self.semaphores[semaphore.0 as usize];

            assert_eq!(
                SemaphoreState::Pending,
                *state,
                "waiting on semaphore {semaphore:?} which nothing signals"
            );

            *state = SemaphoreState::Unsignaled;
        }

        for semaphore in &submission.signal {
            self.semaphores[semaphore.0 as usize] = SemaphoreState::Pending;
        }

        if let Some(fence) = submission.fence {
            assert!(
                !self.fences[fence.0 as usize],
                "fence {fence:?} submitted while still signalled"
            );
        }

        self.stats.submissions += 1;

        self.queue.push_back(PendingSubmission {
            queue,
            commands,
            fence: submission.fence,
        });

        Ok(())
    }

    fn wait_idle(&mut self) -> Result<()> {
        self.poll()?;

        if self.queue.is_empty() {
            Ok(())
        } else {
            Err(Error::device_lost("device stopped processing submissions"))
        }
    }
}

impl Drop for SoftwareDevice {
    fn drop(&mut self) {
        let live_images = self.live_images();

        if live_images > 0 {
            debug!("Dropping software device with {live_images} live images");
        }
    }
}
