use glam::{vec4, Vec3, Vec4, Vec4Swizzles};

use crate::{Normal, Visibility};

/// Auxiliary per-pixel data written by the producer alongside noisy
/// radiance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GBufferSample {
    pub albedo: Vec3,
    pub world_position: Vec3,
    pub normal: Vec3,
    pub geometric_normal: Vec3,

    /// Offset (in pixels) from this pixel to where the same surface point was
    /// seen in the previous frame; `z` is the expected change of linear depth
    /// (`prev_depth - depth`).
    pub motion: Vec3,

    /// Linear depth; zero for pixels that don't see any geometry.
    pub depth: f32,

    /// Screen-space derivative of linear depth.
    pub depth_grad: f32,

    pub roughness: f32,
    pub metallic: f32,
    pub visibility: Option<Visibility>,

    /// Random seed the producer used to trace this pixel.
    pub seed: u32,
}

impl GBufferSample {
    /// Sample for a pixel through which the sky is visible.
    pub fn sky() -> Self {
        Self {
            albedo: Vec3::ZERO,
            world_position: Vec3::ZERO,
            normal: Vec3::Z,
            geometric_normal: Vec3::Z,
            motion: Vec3::ZERO,
            depth: 0.0,
            depth_grad: 0.0,
            roughness: 1.0,
            metallic: 0.0,
            visibility: None,
            seed: 0,
        }
    }

    pub fn is_some(&self) -> bool {
        self.visibility.is_some()
    }

    pub fn pack(&self) -> GBufferTexels {
        GBufferTexels {
            albedo: self.albedo.extend(1.0),
            normal: Self::pack_normal(self.normal),
            normal_geometry: Self::pack_normal(self.geometric_normal),
            metallic_roughness: vec4(self.metallic, self.roughness, 0.0, 0.0),
            depth: vec4(self.depth, 0.0, 0.0, 0.0),
            depth_grad: vec4(self.depth_grad, 0.0, 0.0, 0.0),
            motion: self.motion.extend(0.0),
            surface_position: self.world_position.extend(1.0),
            visibility: self
                .visibility
                .map(|visibility| visibility.pack())
                .unwrap_or_else(Visibility::none),
            random_seed: vec4(f32::from_bits(self.seed), 0.0, 0.0, 0.0),
        }
    }

    pub fn unpack(texels: &GBufferTexels) -> Self {
        Self {
            albedo: texels.albedo.xyz(),
            world_position: texels.surface_position.xyz(),
            normal: Self::unpack_normal(texels.normal),
            geometric_normal: Self::unpack_normal(texels.normal_geometry),
            motion: texels.motion.xyz(),
            depth: texels.depth.x,
            depth_grad: texels.depth_grad.x,
            roughness: texels.metallic_roughness.y,
            metallic: texels.metallic_roughness.x,
            visibility: Visibility::unpack(texels.visibility),
            seed: texels.random_seed.x.to_bits(),
        }
    }

    pub fn pack_normal(normal: Vec3) -> Vec4 {
        Normal::encode(normal).extend(0.0).extend(0.0)
    }

    pub fn unpack_normal(d0: Vec4) -> Vec3 {
        Normal::decode(d0.xy())
    }
}

/// [`GBufferSample`] split into texels of the individual G-buffer images.
#[derive(Clone, Copy, Debug)]
pub struct GBufferTexels {
    pub albedo: Vec4,
    pub normal: Vec4,
    pub normal_geometry: Vec4,
    pub metallic_roughness: Vec4,
    pub depth: Vec4,
    pub depth_grad: Vec4,
    pub motion: Vec4,
    pub surface_position: Vec4,
    pub visibility: Vec4,
    pub random_seed: Vec4,
}
