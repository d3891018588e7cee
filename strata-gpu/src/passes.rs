use bytemuck::{Pod, Zeroable};

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct MergeGeometryPassParams {
    /// Bitmask of [`crate::GeometryClass::mask()`] for static classes whose
    /// geometry got re-uploaded this frame.
    pub changed_classes: u32,
}

impl MergeGeometryPassParams {
    pub fn is_changed(&self, class: u32) -> bool {
        self.changed_classes & (1 << class) > 0
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct GradientSamplesPassParams {
    /// Whether the previous-frame images contain meaningful data; zero on
    /// the first frame after (re)allocation.
    pub history_valid: u32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct GradientAtrousPassParams {
    pub iteration: u32,
}

impl GradientAtrousPassParams {
    pub fn step_size(&self) -> i32 {
        1 << self.iteration
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct TemporalAccumulationPassParams {
    pub history_valid: u32,
    pub history_cap: f32,
    pub min_color_alpha: f32,
    pub min_moments_alpha: f32,
    pub antilag_sensitivity: f32,
    pub depth_tolerance: f32,
    pub normal_threshold: f32,
}

impl TemporalAccumulationPassParams {
    pub fn history_valid(&self) -> bool {
        self.history_valid > 0
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct AntifireflyPassParams {
    /// How many times brighter than its brightest neighbour a pixel can get
    /// before it's clamped.
    pub max_ratio: f32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct VarianceEstimationPassParams {
    /// Pixels with history shorter than this borrow moments from their
    /// neighbourhood.
    pub history_threshold: f32,
    pub sigma_normal: f32,
    pub sigma_depth: f32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct SpatialAtrousPassParams {
    pub iteration: u32,
    pub sigma_normal: f32,
    pub sigma_depth: f32,
    pub sigma_luminance: f32,
    pub sigma_roughness: f32,
}

impl SpatialAtrousPassParams {
    pub fn step_size(&self) -> i32 {
        1 << self.iteration
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct FrameCompositionPassParams {
    /// See: `CompositionMode` on the host side.
    pub mode: u32,
}
