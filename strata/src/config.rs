/// What the frame composition writes into the final image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CompositionMode {
    /// Albedo-modulated diffuse and indirect lighting plus specular.
    #[default]
    Final,

    /// Denoised direct diffuse lighting alone.
    Diffuse,

    /// Denoised specular lighting alone.
    Specular,

    /// Irradiance of the denoised indirect lighting.
    Indirect,
}

impl CompositionMode {
    pub(crate) fn serialize(&self) -> u32 {
        match self {
            CompositionMode::Final => 0,
            CompositionMode::Diffuse => 1,
            CompositionMode::Specular => 2,
            CompositionMode::Indirect => 3,
        }
    }
}

/// Tunables of the denoising pipeline.
///
/// The defaults were picked empirically and are expected to be re-tuned
/// against reference images.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DenoiserConfig {
    /// Maximum history length (in frames) a pixel can accumulate.
    pub history_cap: f32,

    /// Lower bound of the weight given to the current frame's color.
    pub min_color_alpha: f32,

    /// Lower bound of the weight given to the current frame's moments.
    pub min_moments_alpha: f32,

    /// How strongly detected lighting changes discard history; a relative
    /// change of `1.0 / antilag_sensitivity` discards it completely.
    pub antilag_sensitivity: f32,

    /// Relative depth difference tolerated when reprojecting history.
    pub depth_tolerance: f32,

    /// Minimum dot product of geometric normals tolerated when reprojecting
    /// history.
    pub normal_threshold: f32,

    /// How many times brighter than its brightest neighbour an accumulated
    /// color can get before it's treated as a firefly.
    pub firefly_ratio: f32,

    /// History length below which variance is estimated spatially.
    pub variance_history_threshold: f32,

    pub sigma_normal: f32,
    pub sigma_depth: f32,
    pub sigma_luminance: f32,
    pub sigma_roughness: f32,

    pub composition_mode: CompositionMode,
}

impl Default for DenoiserConfig {
    fn default() -> Self {
        Self {
            history_cap: 32.0,
            min_color_alpha: 0.03,
            min_moments_alpha: 0.2,
            antilag_sensitivity: 2.0,
            depth_tolerance: 0.05,
            normal_threshold: 0.9,
            firefly_ratio: 2.0,
            variance_history_threshold: 4.0,
            sigma_normal: 128.0,
            sigma_depth: 1.0,
            sigma_luminance: 4.0,
            sigma_roughness: 8.0,
            composition_mode: Default::default(),
        }
    }
}
