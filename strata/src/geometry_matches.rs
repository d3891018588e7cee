use fxhash::FxHashMap;
use glam::Vec4;
use strata_gpu::{GeometryClass, GeometryMatchMap, NO_MATCH};

/// Producer-supplied correspondences between previous- and current-frame
/// geometry indices, consumed by the geometry merging pass.
///
/// Geometries without an explicit record are matched with themselves if they
/// belong to an unchanged static class and with nothing otherwise.
#[derive(Clone, Debug, Default)]
pub struct GeometryMatches {
    records: FxHashMap<u32, Option<u32>>,
    changed_classes: u32,
}

impl GeometryMatches {
    pub fn new() -> Self {
        Default::default()
    }

    /// Records that previous frame's geometry `prev` of given class became
    /// `curr` (or is gone, if `None`).
    ///
    /// Both indices are local to the class.
    pub fn insert(
        &mut self,
        class: GeometryClass,
        prev: u32,
        curr: Option<u32>,
    ) -> &mut Self {
        let prev = class.global_index(prev);
        let curr = curr.map(|curr| class.global_index(curr));

        self.records.insert(prev, curr);
        self
    }

    /// Marks a static class as re-uploaded, so that its geometries stop
    /// being matched with themselves implicitly.
    pub fn mark_changed(&mut self, class: GeometryClass) -> &mut Self {
        assert!(
            class.is_static(),
            "dynamic geometry is always treated as changed"
        );

        self.changed_classes |= class.mask();
        self
    }

    pub fn changed_classes(&self) -> u32 {
        self.changed_classes
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.changed_classes == 0
    }

    /// Returns texels of the `GeometryRecords` image.
    pub fn texels(&self) -> Vec<Vec4> {
        let size = GeometryMatchMap::SIZE;
        let mut texels = vec![Vec4::ZERO; (size.x * size.y) as usize];

        for (&prev, &curr) in &self.records {
            texels[prev as usize] =
                GeometryMatchMap::entry(curr.unwrap_or(NO_MATCH));
        }

        texels
    }
}

#[cfg(test)]
mod tests {
    use glam::uvec2;
    use strata_gpu::{ChangeFrequency, PassThrough, PrimaryVisibility, Tex};

    use super::*;

    const STATIC: GeometryClass = GeometryClass::new(
        ChangeFrequency::Static,
        PassThrough::Opaque,
        PrimaryVisibility::World,
    );

    const DYNAMIC: GeometryClass = GeometryClass::new(
        ChangeFrequency::Dynamic,
        PassThrough::AlphaTested,
        PrimaryVisibility::World,
    );

    #[test]
    fn texels() {
        let mut target = GeometryMatches::new();

        target
            .insert(DYNAMIC, 3, Some(5))
            .insert(DYNAMIC, 4, None)
            .mark_changed(STATIC);

        let texels = target.texels();
        let map =
            GeometryMatchMap::new(Tex::new(GeometryMatchMap::SIZE, &texels));
        let row = DYNAMIC.index() * 512;

        assert_eq!(Some(row + 5), map.get(row + 3));
        assert_eq!(None, map.get(row + 4));
        assert_eq!(Vec4::ZERO, texels[(row + 4) as usize + 1]);
        assert_eq!(uvec2(512, 8), GeometryMatchMap::SIZE);
        assert_eq!(STATIC.mask(), target.changed_classes());
    }

    #[test]
    #[should_panic(expected = "always treated as changed")]
    fn dynamic_classes_cannot_be_marked() {
        GeometryMatches::new().mark_changed(DYNAMIC);
    }
}
