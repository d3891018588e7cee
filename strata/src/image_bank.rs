mod catalog;

use fxhash::FxHashMap;
use glam::{UVec2, Vec4};
use log::{debug, info};

pub use self::catalog::*;
use crate::{
    Access, CommandRecorder, FrameSlot, GpuApi, ImageDesc, ImageHandle, Result,
};

/// Owner of every image in the [`ImageName`] catalog.
///
/// Images get (re)allocated only through [`Self::on_resize()`]; in-between,
/// the bank hands out plain handles, resolving doubled images by the parity
/// of the frame slot asking.
#[derive(Debug, Default)]
pub struct ImageBank {
    render_size: Option<UVec2>,
    generation: u32,
    images: FxHashMap<ImageName, Vec<ImageHandle>>,
    bytes: u64,
}

impl ImageBank {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn is_sized(&self) -> bool {
        self.render_size.is_some()
    }

    pub fn render_size(&self) -> Option<UVec2> {
        self.render_size
    }

    /// Number of times the images have been (re)allocated; everything
    /// recorded against an older generation refers to destroyed images.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn total_bytes(&self) -> u64 {
        self.bytes
    }

    /// Destroys all images and allocates them anew for given resolution.
    ///
    /// Newly allocated images have undefined contents; on failure the bank
    /// is left without any images.
    pub fn on_resize(
        &mut self,
        gpu: &mut dyn GpuApi,
        render_size: UVec2,
    ) -> Result<()> {
        assert!(
            render_size.x > 0 && render_size.y > 0,
            "invalid render size: {render_size:?}"
        );

        info!("Resizing images; render_size={render_size:?}");

        gpu.wait_idle()?;

        self.destroy(gpu);
        self.generation += 1;

        for &name in ImageName::ALL {
            let spec = name.spec();
            let copies = if spec.is_doubled() { 2 } else { 1 };
            let mut handles = Vec::with_capacity(copies);

            for copy in 0..copies {
                let desc = ImageDesc {
                    label: Self::physical_label(name, copy, copies),
                    size: spec.size_policy.extent(render_size),
                    format: spec.format,
                };

                debug!(
                    "Allocating image `{}`; size={:?}, format={:?}",
                    desc.label, desc.size, desc.format
                );

                match gpu.create_image(&desc) {
                    Ok(handle) => {
                        self.bytes += desc.bytes();
                        handles.push(handle);
                    }

                    Err(err) => {
                        for handle in handles {
                            gpu.destroy_image(handle);
                        }

                        self.destroy(gpu);

                        return Err(err);
                    }
                }
            }

            self.images.insert(name, handles);
        }

        self.render_size = Some(render_size);

        debug!("Images allocated; bytes={}", self.bytes);

        Ok(())
    }

    pub fn destroy(&mut self, gpu: &mut dyn GpuApi) {
        for (_, handles) in self.images.drain() {
            for handle in handles {
                gpu.destroy_image(handle);
            }
        }

        self.render_size = None;
        self.bytes = 0;
    }

    /// Returns physical image behind given name for a frame of given parity.
    pub fn resolve(
        &self,
        image: impl Into<ImageRef>,
        slot: FrameSlot,
    ) -> ImageHandle {
        let image = image.into();

        let handles = self.images.get(&image.name).unwrap_or_else(|| {
            panic!("image bank accessed before being sized: {image:?}")
        });

        match (image.history, handles.as_slice()) {
            (History::Curr, [handle]) => *handle,
            (History::Curr, [a, b]) => [*a, *b][slot.index()],
            (History::Prev, [a, b]) => [*a, *b][slot.prev().index()],
            (History::Prev, [_]) => {
                panic!("image `{}` has no history", image.name.label())
            }
            _ => unreachable!(),
        }
    }

    /// Returns extent of given image, which must be the same for all its
    /// copies.
    pub fn extent(&self, name: ImageName) -> UVec2 {
        let render_size = self.render_size.unwrap_or_else(|| {
            panic!("image bank accessed before being sized")
        });

        name.extent(render_size)
    }

    /// Inserts barriers required before given images are accessed the
    /// specified way.
    pub fn barrier(
        &self,
        recorder: &mut CommandRecorder,
        slot: FrameSlot,
        images: impl IntoIterator<Item = (ImageRef, Access)>,
    ) -> usize {
        let images: Vec<_> = images
            .into_iter()
            .map(|(image, access)| (self.resolve(image, slot), access))
            .collect();

        recorder.barrier(images)
    }

    pub fn upload(
        &self,
        recorder: &mut CommandRecorder,
        slot: FrameSlot,
        image: impl Into<ImageRef>,
        texels: Vec<Vec4>,
    ) {
        let image = image.into();
        let extent = self.extent(image.name);

        assert_eq!(
            (extent.x * extent.y) as usize,
            texels.len(),
            "upload doesn't match extent of `{}`",
            image.name.label()
        );

        let handle = self.resolve(image, slot);

        recorder.barrier([(handle, Access::ReadWrite)]);
        recorder.upload(handle, texels);
    }

    /// Discards contents of given image.
    pub fn clear(
        &self,
        recorder: &mut CommandRecorder,
        slot: FrameSlot,
        image: impl Into<ImageRef>,
    ) {
        let image = image.into();
        let handle = self.resolve(image, slot);

        recorder.barrier([(handle, Access::ReadWrite)]);
        recorder.clear(handle, image.name.clear_value());
    }

    /// Returns a descriptor for hosts mirroring the catalog on a `wgpu`
    /// device.
    pub fn descriptor(
        &self,
        name: ImageName,
    ) -> wgpu::TextureDescriptor<'static> {
        let size = self.extent(name);

        wgpu::TextureDescriptor {
            label: Some(name.label()),
            size: wgpu::Extent3d {
                width: size.x,
                height: size.y,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: name.spec().format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        }
    }

    fn physical_label(name: ImageName, copy: usize, copies: usize) -> String {
        if copies == 1 {
            format!("strata_{}", name.label())
        } else {
            format!("strata_{}_{}", name.label(), ["a", "b"][copy])
        }
    }
}
