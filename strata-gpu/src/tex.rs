use glam::{IVec2, UVec2, Vec4};

/// Read-only view into a single RGBA32F image.
#[derive(Clone, Copy, Debug)]
pub struct Tex<'a> {
    size: UVec2,
    texels: &'a [Vec4],
}

impl<'a> Tex<'a> {
    pub fn new(size: UVec2, texels: &'a [Vec4]) -> Self {
        assert_eq!(
            texels.len(),
            (size.x * size.y) as usize,
            "texel count doesn't match image size {size:?}",
        );

        Self { size, texels }
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }

    pub fn contains(&self, pos: IVec2) -> bool {
        pos.x >= 0
            && pos.y >= 0
            && (pos.x as u32) < self.size.x
            && (pos.y as u32) < self.size.y
    }

    pub fn read(&self, pos: UVec2) -> Vec4 {
        debug_assert!(pos.x < self.size.x && pos.y < self.size.y);

        self.texels[(pos.y * self.size.x + pos.x) as usize]
    }

    /// Reads texel at given position, returning `None` if it's out of
    /// bounds.
    pub fn get(&self, pos: IVec2) -> Option<Vec4> {
        if self.contains(pos) {
            Some(self.read(pos.as_uvec2()))
        } else {
            None
        }
    }

    pub fn read_clamped(&self, pos: IVec2) -> Vec4 {
        let pos = pos.clamp(IVec2::ZERO, self.size.as_ivec2() - 1);

        self.read(pos.as_uvec2())
    }
}
