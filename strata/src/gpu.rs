//! Capabilities through which strata talks to the device.

use std::fmt;
use std::time::Duration;

use glam::UVec2;

use crate::{CommandList, Result};

/// Generational index of an image owned by a [`GpuApi`] implementation.
///
/// Handles stay `Copy` and cheap to pass around; destroying an image bumps
/// its slot's generation, so stale handles can be told apart from live ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageHandle {
    index: u32,
    generation: u32,
}

impl ImageHandle {
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FenceHandle(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SemaphoreHandle(pub u32);

/// Kind of queue a command list gets submitted to; lists submitted to
/// different queues are independent streams, ordered only by semaphores.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueueClass {
    Graphics,
    Compute,
    Transfer,
}

impl QueueClass {
    pub const ALL: [Self; 3] = [Self::Graphics, Self::Compute, Self::Transfer];

    pub fn index(&self) -> usize {
        match self {
            QueueClass::Graphics => 0,
            QueueClass::Compute => 1,
            QueueClass::Transfer => 2,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ImageDesc {
    pub label: String,
    pub size: UVec2,
    pub format: wgpu::TextureFormat,
}

impl ImageDesc {
    /// Returns how many bytes this image occupies on the device.
    pub fn bytes(&self) -> u64 {
        let texel_size = self.format.block_size(None).unwrap_or(4) as u64;

        texel_size * self.size.x as u64 * self.size.y as u64
    }
}

#[derive(Clone, Debug, Default)]
pub struct Submission {
    /// Semaphores that must be signalled before the list starts executing.
    pub wait_on: Vec<SemaphoreHandle>,

    /// Semaphores signalled once the list completes.
    pub signal: Vec<SemaphoreHandle>,

    /// Fence signalled once the list completes.
    pub fence: Option<FenceHandle>,
}

pub trait GpuApi {
    fn create_image(&mut self, desc: &ImageDesc) -> Result<ImageHandle>;

    fn destroy_image(&mut self, image: ImageHandle);

    fn create_fence(&mut self, signaled: bool) -> Result<FenceHandle>;

    fn create_semaphore(&mut self) -> Result<SemaphoreHandle>;

    /// Blocks until given fence gets signalled or the timeout elapses;
    /// returns whether the fence got signalled.
    fn wait_for_fence(
        &mut self,
        fence: FenceHandle,
        timeout: Duration,
    ) -> Result<bool>;

    fn reset_fence(&mut self, fence: FenceHandle);

    /// Hands given command list over to the device; returns as soon as the
    /// work is queued.
    fn submit(
        &mut self,
        queue: QueueClass,
        commands: CommandList,
        submission: &Submission,
    ) -> Result<()>;

    fn wait_idle(&mut self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use glam::uvec2;

    use super::*;

    #[test]
    fn image_bytes() {
        let desc = ImageDesc {
            label: "test".into(),
            size: uvec2(4, 3),
            format: wgpu::TextureFormat::Rgba16Float,
        };

        assert_eq!(4 * 3 * 8, desc.bytes());
    }
}
