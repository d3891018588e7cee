use std::collections::VecDeque;

use glam::{UVec2, Vec3, Vec4};
use log::{info, trace, warn};
use rand::Rng;
use strata_gpu::{GBufferSample, SphericalHarmonics};

use crate::{
    CommandRecorder, Denoiser, DenoiserConfig, FrameCompositionPass,
    FrameResourcePool, FrameSlot, GeometryMatches, GpuApi, GradientTargets,
    ImageBank, ImageHandle, ImageName, QueueClass, Result, SemaphoreHandle,
};

/// Notification consumed at the beginning of the next frame.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Resize(UVec2),
    ReloadPasses,
    Reconfigure(DenoiserConfig),
}

/// Source of the noisy signals (usually a path tracer).
///
/// Producers are expected to shade each pixel with
/// [`ProducerContext::pixel_seed()`], except for pixels for which
/// [`ProducerContext::gradient_seed()`] returns a seed; those have to be
/// shaded (and reported in the G-buffer) with that seed instead, which is
/// what lets gradients tell lighting changes apart from noise.
pub trait Producer {
    /// Writes this frame's G-buffer and radiance images and returns the
    /// frame's geometry matches.
    fn produce(&mut self, ctxt: ProducerContext<'_>) -> Result<GeometryMatches>;
}

/// What a [`Producer`] gets to work with during a single frame.
pub struct ProducerContext<'a> {
    pub bank: &'a ImageBank,
    pub recorder: &'a mut CommandRecorder,
    pub slot: FrameSlot,
    pub frame: u64,

    /// Fresh random seed, drawn once per frame.
    pub seed: u32,

    pub size: UVec2,

    targets: &'a mut GradientTargets,
}

impl ProducerContext<'_> {
    /// Returns a fresh random seed for given pixel.
    pub fn pixel_seed(&self, pos: UVec2) -> u32 {
        self.targets.seed(pos)
    }

    /// Returns the previous frame's seed given pixel has to be re-shaded
    /// with, if the pixel got picked as its stratum's gradient sample.
    pub fn gradient_seed(&self, pos: UVec2, motion: Vec3) -> Option<u32> {
        self.targets.gradient_seed(pos, motion)
    }

    fn upload(&mut self, image: ImageName, texels: Vec<Vec4>) {
        self.bank.upload(self.recorder, self.slot, image, texels);
    }

    /// Uploads the G-buffer images, given one sample per pixel in row-major
    /// order.
    pub fn write_gbuffer(&mut self, samples: &[GBufferSample]) {
        self.assert_len(samples.len());

        self.targets
            .record(samples.iter().map(|sample| sample.seed).collect());

        let texels: Vec<_> =
            samples.iter().map(|sample| sample.pack()).collect();

        macro_rules! upload {
            ($( $image:ident => $field:ident, )*) => {
                $(
                    self.upload(
                        ImageName::$image,
                        texels.iter().map(|texels| texels.$field).collect(),
                    );
                )*
            };
        }

        upload!(
            Albedo => albedo,
            Normal => normal,
            NormalGeometry => normal_geometry,
            MetallicRoughness => metallic_roughness,
            Depth => depth,
            DepthGrad => depth_grad,
            Motion => motion,
            SurfacePosition => surface_position,
            VisibilityBuffer => visibility,
            RandomSeed => random_seed,
        );
    }

    /// Uploads the unfiltered radiance images, given one value per pixel in
    /// row-major order.
    pub fn write_radiance(
        &mut self,
        direct: &[Vec3],
        specular: &[Vec3],
        indirect: &[SphericalHarmonics],
    ) {
        self.assert_len(direct.len());
        self.assert_len(specular.len());
        self.assert_len(indirect.len());

        self.upload(
            ImageName::UnfilteredDirect,
            direct.iter().map(|color| color.extend(1.0)).collect(),
        );

        self.upload(
            ImageName::UnfilteredSpecular,
            specular.iter().map(|color| color.extend(1.0)).collect(),
        );

        for (channel, image) in [
            ImageName::UnfilteredIndirShR,
            ImageName::UnfilteredIndirShG,
            ImageName::UnfilteredIndirShB,
        ]
        .into_iter()
        .enumerate()
        {
            self.upload(
                image,
                indirect.iter().map(|sh| sh.texels()[channel]).collect(),
            );
        }
    }

    fn assert_len(&self, len: usize) {
        assert_eq!(
            (self.size.x * self.size.y) as usize,
            len,
            "producer's data doesn't match render size {:?}",
            self.size
        );
    }
}

/// Per-frame driver sequencing the producer, the denoiser and composition.
pub struct Orchestrator<G, P>
where
    G: GpuApi,
    P: Producer,
{
    gpu: G,
    producer: P,
    frames: FrameResourcePool,
    bank: ImageBank,
    denoiser: Denoiser,
    composition: FrameCompositionPass,
    targets: GradientTargets,

    /// Signalled by the previous frame's graphics submission.
    prev_frame_done: Option<SemaphoreHandle>,

    events: VecDeque<Event>,
    frame: u64,
}

impl<G, P> Orchestrator<G, P>
where
    G: GpuApi,
    P: Producer,
{
    pub fn new(
        mut gpu: G,
        producer: P,
        size: UVec2,
        config: DenoiserConfig,
    ) -> Result<Self> {
        info!("Initializing orchestrator; size={size:?}");

        let frames = FrameResourcePool::new(&mut gpu)?;
        let mut bank = ImageBank::new();

        bank.on_resize(&mut gpu, size)?;

        Ok(Self {
            gpu,
            producer,
            frames,
            bank,
            denoiser: Denoiser::new(config),
            composition: FrameCompositionPass::new(),
            targets: GradientTargets::new(),
            prev_frame_done: None,
            events: Default::default(),
            frame: 0,
        })
    }

    /// Queues an event; it's going to be handled when the next frame begins.
    pub fn notify(&mut self, event: Event) {
        trace!("Queueing event: {event:?}");

        self.events.push_back(event);
    }

    pub fn render_frame(&mut self) -> Result<()> {
        self.dispatch_events()?;

        let slot = self.frames.begin_frame(&mut self.gpu)?;
        let size = self.bank.render_size().unwrap_or_default();

        let seed = rand::thread_rng().gen();

        trace!("Rendering frame {} (slot {slot})", self.frame);

        self.targets.begin_frame(size, seed);

        let matches = self.producer.produce(ProducerContext {
            bank: &self.bank,
            recorder: self.frames.recorder(slot, QueueClass::Transfer),
            slot,
            frame: self.frame,
            seed,
            size,
            targets: &mut self.targets,
        })?;

        let uploads_done = self.frames.uploads_done(slot);
        let frame_done = self.frames.frame_done(slot);

        // Producer's images are single, so they can't be overwritten until
        // the previous frame is done reading them
        self.frames.submit(
            &mut self.gpu,
            QueueClass::Transfer,
            self.prev_frame_done.take().as_slice(),
            &[uploads_done],
        )?;

        let recorder = self.frames.recorder(slot, QueueClass::Graphics);

        self.denoiser
            .merge_samples(&self.bank, recorder, slot, &matches);

        self.denoiser.denoise(&self.bank, recorder, slot);

        self.composition.run(
            &self.bank,
            recorder,
            slot,
            self.denoiser.config().composition_mode,
        );

        self.frames.end_frame(
            &mut self.gpu,
            QueueClass::Graphics,
            &[uploads_done],
            &[frame_done],
        )?;

        self.prev_frame_done = Some(frame_done);
        self.frame += 1;

        Ok(())
    }

    pub fn wait_idle(&mut self) -> Result<()> {
        self.gpu.wait_idle()
    }

    pub fn gpu(&self) -> &G {
        &self.gpu
    }

    pub fn gpu_mut(&mut self) -> &mut G {
        &mut self.gpu
    }

    pub fn producer_mut(&mut self) -> &mut P {
        &mut self.producer
    }

    pub fn bank(&self) -> &ImageBank {
        &self.bank
    }

    pub fn denoiser(&self) -> &Denoiser {
        &self.denoiser
    }

    /// Number of frames rendered so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Returns physical image behind given name, as seen by the most
    /// recently rendered frame.
    pub fn image(&self, name: ImageName) -> ImageHandle {
        self.bank.resolve(name, self.frames.current())
    }

    fn dispatch_events(&mut self) -> Result<()> {
        while let Some(event) = self.events.pop_front() {
            trace!("Dispatching event: {event:?}");

            match event {
                Event::Resize(size) => {
                    self.targets.reset();
                    self.bank.on_resize(&mut self.gpu, size)?;
                }

                Event::ReloadPasses => {
                    self.denoiser.rebuild_passes();
                    self.composition = FrameCompositionPass::new();
                }

                Event::Reconfigure(config) => {
                    self.denoiser.set_config(config);
                }
            }
        }

        Ok(())
    }
}

impl<G, P> Drop for Orchestrator<G, P>
where
    G: GpuApi,
    P: Producer,
{
    fn drop(&mut self) {
        info!("Shutting down orchestrator; frames={}", self.frame);

        if let Err(err) = self.gpu.wait_idle() {
            warn!("Couldn't wait for the device to go idle: {err}");
        }

        self.bank.destroy(&mut self.gpu);
    }
}
