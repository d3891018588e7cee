#![allow(dead_code)]

use glam::{uvec2, vec2, vec3, UVec2, Vec3, Vec4};
use strata::types::{
    ChangeFrequency, GBufferSample, GeometryClass, GradientSample, Noise,
    PassThrough, PrimaryVisibility, SphericalHarmonics, Visibility,
};
use strata::{
    DenoiserConfig, GeometryMatches, ImageName, Orchestrator, Producer,
    ProducerContext, SoftwareDevice,
};

pub const SIZE: UVec2 = UVec2::new(12, 9);

pub const STATIC: GeometryClass = GeometryClass::new(
    ChangeFrequency::Static,
    PassThrough::Opaque,
    PrimaryVisibility::World,
);

pub const DYNAMIC: GeometryClass = GeometryClass::new(
    ChangeFrequency::Dynamic,
    PassThrough::Opaque,
    PrimaryVisibility::World,
);

/// Returns class and local geometry index seen through given pixel during
/// given frame.
pub type GeometryFn = Box<dyn Fn(u64, UVec2) -> (GeometryClass, u32)>;

pub type MatchesFn = Box<dyn Fn(u64) -> GeometryMatches>;

/// Flat wall facing the camera, lit by a single (optionally flickering)
/// light; the camera never moves.
///
/// Noise is derived from each pixel's seed, so gradient samples re-shaded
/// with the previous frame's seed get the previous frame's noise.
pub struct TestScene {
    pub light: f32,

    /// Amplitude of the per-frame noise, relative to the light.
    pub noise: f32,

    /// Contrast of a static checkerboard pattern.
    pub pattern: f32,

    pub geometry: GeometryFn,
    pub matches: MatchesFn,

    /// Pixels through which the sky is visible.
    pub sky: Box<dyn Fn(UVec2) -> bool>,
}

impl Default for TestScene {
    fn default() -> Self {
        Self {
            light: 1.0,
            noise: 0.0,
            pattern: 0.0,
            geometry: Box::new(|_, _| (STATIC, 0)),
            matches: Box::new(|_| GeometryMatches::new()),
            sky: Box::new(|_| false),
        }
    }
}

impl Producer for TestScene {
    fn produce(
        &mut self,
        mut ctxt: ProducerContext<'_>,
    ) -> strata::Result<GeometryMatches> {
        let frame = ctxt.frame;
        let size = ctxt.size;

        let mut gbuffer = Vec::new();
        let mut direct = Vec::new();
        let mut specular = Vec::new();
        let mut indirect = Vec::new();

        for y in 0..size.y {
            for x in 0..size.x {
                let pos = uvec2(x, y);
                let motion = Vec3::ZERO;

                let seed = ctxt
                    .gradient_seed(pos, motion)
                    .unwrap_or_else(|| ctxt.pixel_seed(pos));

                let noise = Noise::new(seed, UVec2::ZERO).sample() * 2.0 - 1.0;
                let noise = noise * self.noise;

                if (self.sky)(pos) {
                    gbuffer.push(GBufferSample::sky());
                    direct.push(Vec3::splat(0.3));
                    specular.push(Vec3::ZERO);
                    indirect.push(SphericalHarmonics::default());
                    continue;
                }

                let (class, local) = (self.geometry)(frame, pos);

                gbuffer.push(GBufferSample {
                    albedo: Vec3::ONE,
                    world_position: vec3(x as f32, y as f32, 5.0),
                    normal: Vec3::Z,
                    geometric_normal: Vec3::Z,
                    motion,
                    depth: 5.0,
                    depth_grad: 0.01,
                    roughness: 0.5,
                    metallic: 0.0,
                    visibility: Some(Visibility {
                        instance_id: 0,
                        geometry_index: class.global_index(local),
                        primitive_index: 0,
                        barycentrics: vec2(0.25, 0.25),
                    }),
                    seed,
                });

                let checker = ((x + y) % 2) as f32;
                let radiance = self.light * (0.5 + self.pattern * checker);

                direct.push(Vec3::splat(radiance * (1.0 + noise)));
                specular.push(Vec3::ZERO);

                indirect.push(SphericalHarmonics::project(
                    Vec3::Z,
                    Vec3::splat(0.1 * self.light),
                ));
            }
        }

        ctxt.write_gbuffer(&gbuffer);
        ctxt.write_radiance(&direct, &specular, &indirect);

        Ok((self.matches)(frame))
    }
}

pub type TestOrchestrator = Orchestrator<SoftwareDevice, TestScene>;

pub fn orchestrator(scene: TestScene) -> TestOrchestrator {
    Orchestrator::new(
        SoftwareDevice::default(),
        scene,
        SIZE,
        DenoiserConfig::default(),
    )
    .unwrap()
}

/// Renders given number of frames.
pub fn render(target: &mut TestOrchestrator, frames: usize) {
    for _ in 0..frames {
        target.render_frame().unwrap();
    }
}

/// Returns contents of given image as of the most recently rendered frame.
pub fn read(target: &mut TestOrchestrator, image: ImageName) -> Vec<Vec4> {
    target.wait_idle().unwrap();

    let handle = target.image(image);

    target.gpu().read(handle).to_vec()
}

pub fn history_lengths(target: &mut TestOrchestrator) -> Vec<f32> {
    read(target, ImageName::AccumHistoryLength)
        .into_iter()
        .map(|history| history.x)
        .collect()
}

/// Returns how much each pixel trusted its history in the latest frame.
pub fn trust(target: &mut TestOrchestrator) -> Vec<f32> {
    read(target, ImageName::AccumHistoryLength)
        .into_iter()
        .map(|history| history.y)
        .collect()
}

/// Returns relative change of lighting detected in each stratum.
pub fn lambdas(target: &mut TestOrchestrator) -> Vec<f32> {
    read(target, ImageName::DisPingGradient)
        .into_iter()
        .map(|sample| GradientSample::deserialize(sample).lambda())
        .collect()
}

pub fn index(pos: UVec2) -> usize {
    (pos.y * SIZE.x + pos.x) as usize
}
