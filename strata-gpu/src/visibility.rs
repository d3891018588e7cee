use glam::{vec2, vec4, Vec2, Vec3, Vec4};

/// Number of bits used to store the geometry index; the remaining bits of the
/// packed word hold the primitive index.
pub const GEOMETRY_INDEX_BITS: u32 = 12;

pub const MAX_GEOMETRIES: u32 = 1 << GEOMETRY_INDEX_BITS;
pub const MAX_PRIMITIVES: u32 = 1 << (32 - GEOMETRY_INDEX_BITS);

/// Identifies the exact triangle point seen through a pixel.
///
/// Together with the previous frame's geometry match table this is enough to
/// tell whether a reprojected history sample still belongs to the same
/// surface, even when depth and normal happen to agree.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Visibility {
    pub instance_id: u32,

    /// Global geometry index, see [`crate::GeometryClass::global_index()`].
    pub geometry_index: u32,

    pub primitive_index: u32,

    /// Barycentrics of the second and third vertex; the first one is implied.
    pub barycentrics: Vec2,
}

impl Visibility {
    /// Returns the packed marker for pixels that don't see any geometry.
    pub fn none() -> Vec4 {
        vec4(f32::from_bits(u32::MAX), f32::from_bits(u32::MAX), 0.0, 0.0)
    }

    pub fn pack(&self) -> Vec4 {
        debug_assert!(self.geometry_index < MAX_GEOMETRIES);
        debug_assert!(self.primitive_index < MAX_PRIMITIVES);

        vec4(
            f32::from_bits(self.instance_id),
            f32::from_bits(
                self.geometry_index
                    | (self.primitive_index << GEOMETRY_INDEX_BITS),
            ),
            self.barycentrics.x,
            self.barycentrics.y,
        )
    }

    pub fn unpack(d0: Vec4) -> Option<Self> {
        if Self::is_none(d0) {
            return None;
        }

        let geometry_and_primitive = d0.y.to_bits();

        Some(Self {
            instance_id: d0.x.to_bits(),
            geometry_index: geometry_and_primitive & (MAX_GEOMETRIES - 1),
            primitive_index: geometry_and_primitive >> GEOMETRY_INDEX_BITS,
            barycentrics: vec2(d0.z, d0.w),
        })
    }

    pub fn is_none(d0: Vec4) -> bool {
        d0.x.to_bits() == u32::MAX && d0.y.to_bits() == u32::MAX
    }

    /// Returns barycentrics of all three vertices.
    pub fn full_barycentrics(&self) -> Vec3 {
        let b = self.barycentrics;

        Vec3::new(1.0 - b.x - b.y, b.x, b.y)
    }

    /// Returns whether both records point at the same triangle, assuming
    /// `self` comes from the previous frame and its geometry index has
    /// already been translated into current frame's numbering.
    pub fn is_same_triangle(&self, other: &Self) -> bool {
        self.is_same_surface(other)
            && self.primitive_index == other.primitive_index
    }

    /// Like [`Self::is_same_triangle()`], but accepts any triangle of the
    /// same geometry.
    pub fn is_same_surface(&self, other: &Self) -> bool {
        self.instance_id == other.instance_id
            && self.geometry_index == other.geometry_index
    }
}
