use glam::{uvec2, vec4, UVec2, Vec4};

use crate::{Tex, Visibility, MAX_GEOMETRIES};

/// Number of geometry slots reserved for each [`GeometryClass`].
pub const GEOMETRIES_PER_CLASS: u32 = MAX_GEOMETRIES / GeometryClass::COUNT;

/// Marks a previous-frame geometry that has no counterpart in current frame.
pub const NO_MATCH: u32 = u32::MAX;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeFrequency {
    /// Uploaded once and kept around until the scene changes.
    Static,

    /// Re-uploaded every frame.
    Dynamic,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PassThrough {
    Opaque,
    AlphaTested,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimaryVisibility {
    World,
    FirstPerson,
}

/// Group of geometries sharing the same upload and visibility rules.
///
/// Each class owns a contiguous range of [`GEOMETRIES_PER_CLASS`] global
/// geometry indices; the class index doubles as the row of the geometry
/// match images.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GeometryClass {
    pub change_frequency: ChangeFrequency,
    pub pass_through: PassThrough,
    pub primary_visibility: PrimaryVisibility,
}

impl GeometryClass {
    pub const COUNT: u32 = 8;

    pub const ALL: [Self; Self::COUNT as usize] = {
        use ChangeFrequency::*;
        use PassThrough::*;
        use PrimaryVisibility::*;

        [
            Self::new(Static, Opaque, World),
            Self::new(Static, Opaque, FirstPerson),
            Self::new(Static, AlphaTested, World),
            Self::new(Static, AlphaTested, FirstPerson),
            Self::new(Dynamic, Opaque, World),
            Self::new(Dynamic, Opaque, FirstPerson),
            Self::new(Dynamic, AlphaTested, World),
            Self::new(Dynamic, AlphaTested, FirstPerson),
        ]
    };

    pub const fn new(
        change_frequency: ChangeFrequency,
        pass_through: PassThrough,
        primary_visibility: PrimaryVisibility,
    ) -> Self {
        Self {
            change_frequency,
            pass_through,
            primary_visibility,
        }
    }

    pub fn index(&self) -> u32 {
        let cf = match self.change_frequency {
            ChangeFrequency::Static => 0,
            ChangeFrequency::Dynamic => 1,
        };

        let pt = match self.pass_through {
            PassThrough::Opaque => 0,
            PassThrough::AlphaTested => 1,
        };

        let pv = match self.primary_visibility {
            PrimaryVisibility::World => 0,
            PrimaryVisibility::FirstPerson => 1,
        };

        (cf << 2) | (pt << 1) | pv
    }

    pub fn from_index(index: u32) -> Self {
        Self::ALL[index as usize]
    }

    /// Returns class of given global geometry index.
    pub fn of(global_index: u32) -> Self {
        Self::from_index(global_index / GEOMETRIES_PER_CLASS)
    }

    pub fn is_static(&self) -> bool {
        self.change_frequency == ChangeFrequency::Static
    }

    pub fn global_index(&self, local_index: u32) -> u32 {
        assert!(
            local_index < GEOMETRIES_PER_CLASS,
            "geometry index out of range: {local_index}",
        );

        self.index() * GEOMETRIES_PER_CLASS + local_index
    }

    pub fn local_index(global_index: u32) -> u32 {
        global_index % GEOMETRIES_PER_CLASS
    }

    pub fn mask(&self) -> u32 {
        1 << self.index()
    }
}

/// Previous-to-current geometry index table, produced by the geometry merging
/// pass.
///
/// The table has one row per [`GeometryClass`] and one column per local
/// geometry index of the *previous* frame; each texel holds the matching
/// current global index (`x`) and whether the row has ever been written
/// (`y`).
#[derive(Clone, Copy)]
pub struct GeometryMatchMap<'a> {
    tex: Tex<'a>,
}

impl<'a> GeometryMatchMap<'a> {
    pub const SIZE: UVec2 =
        UVec2::new(GEOMETRIES_PER_CLASS, GeometryClass::COUNT);

    pub fn new(tex: Tex<'a>) -> Self {
        debug_assert_eq!(Self::SIZE, tex.size());

        Self { tex }
    }

    pub fn entry(matched: u32) -> Vec4 {
        vec4(f32::from_bits(matched), 1.0, 0.0, 0.0)
    }

    pub fn is_populated(&self, class: u32) -> bool {
        self.tex.read(uvec2(0, class)).y > 0.0
    }

    /// Returns current-frame global index of given previous-frame geometry.
    pub fn get(&self, prev_global_index: u32) -> Option<u32> {
        let pos = uvec2(
            GeometryClass::local_index(prev_global_index),
            prev_global_index / GEOMETRIES_PER_CLASS,
        );

        let d0 = self.tex.read(pos);

        if d0.y == 0.0 {
            return None;
        }

        Some(d0.x.to_bits()).filter(|&idx| idx != NO_MATCH)
    }

    /// Returns whether any previous-frame geometry of given class maps into
    /// given current-frame global index.
    pub fn is_target(&self, class: u32, global_index: u32) -> bool {
        (0..GEOMETRIES_PER_CLASS).any(|local_index| {
            self.tex.read(uvec2(local_index, class)).x.to_bits()
                == global_index
        })
    }

    /// Renumbers previous-frame visibility into current frame's geometry
    /// indices; returns `None` if the geometry is gone.
    pub fn translate(&self, prev: Visibility) -> Option<Visibility> {
        let geometry_index = self.get(prev.geometry_index)?;

        Some(Visibility {
            geometry_index,
            ..prev
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices() {
        for (idx, class) in GeometryClass::ALL.iter().enumerate() {
            assert_eq!(idx as u32, class.index());
            assert_eq!(*class, GeometryClass::from_index(idx as u32));
        }

        assert_eq!(512, GEOMETRIES_PER_CLASS);
    }

    #[test]
    fn global_indices() {
        let class = GeometryClass::ALL[5];
        let global = class.global_index(17);

        assert_eq!(5 * 512 + 17, global);
        assert_eq!(class, GeometryClass::of(global));
        assert_eq!(17, GeometryClass::local_index(global));
        assert!(!class.is_static());
        assert!(GeometryClass::ALL[3].is_static());
    }

    #[test]
    fn match_map() {
        let size = GeometryMatchMap::SIZE;
        let mut texels = vec![Vec4::ZERO; (size.x * size.y) as usize];

        for (local_index, texel) in texels[512..1024].iter_mut().enumerate() {
            *texel = GeometryMatchMap::entry(match local_index {
                3 => NO_MATCH,
                4 => 512 + 3,
                idx => 512 + idx as u32,
            });
        }

        let map = GeometryMatchMap::new(Tex::new(size, &texels));

        assert!(!map.is_populated(0));
        assert!(map.is_populated(1));
        assert_eq!(None, map.get(17));
        assert_eq!(None, map.get(512 + 3));
        assert_eq!(Some(512 + 3), map.get(512 + 4));
        assert_eq!(Some(512 + 5), map.get(512 + 5));
        assert!(map.is_target(1, 512 + 3));
        assert!(!map.is_target(1, 512 + 4));
    }
}
