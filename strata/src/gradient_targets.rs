use glam::{uvec2, UVec2, Vec3};
use log::trace;
use strata_gpu::{Noise, Reprojection, STRATA_SIZE};

/// Decides which pixels the producer re-shades for gradient estimation.
///
/// Every frame, one pixel of each stratum gets shaded with the random seed
/// the previous frame used for the same surface point. Compared against the
/// previous frame's result, such a pixel tells how much lighting changed
/// with no Monte Carlo noise mixed in.
///
/// Seeds are captured from the producer's G-buffer uploads, so the producer
/// doesn't have to keep its own copy of the previous frame.
#[derive(Debug, Default)]
pub struct GradientTargets {
    size: UVec2,
    frame_seed: u32,
    prev_seeds: Option<Vec<u32>>,
    curr_seeds: Option<Vec<u32>>,
}

impl GradientTargets {
    pub fn new() -> Self {
        Default::default()
    }

    /// Moves seeds of the frame that just finished into history and picks
    /// this frame's targets using given seed.
    pub fn begin_frame(&mut self, size: UVec2, frame_seed: u32) {
        let size_matches = self.size == size;

        self.prev_seeds = self.curr_seeds.take().filter(|_| size_matches);
        self.size = size;
        self.frame_seed = frame_seed;

        trace!(
            "Gradient targets ready; history={}",
            self.prev_seeds.is_some()
        );
    }

    /// Forgets all seeds, so that the next frame doesn't re-shade anything.
    pub fn reset(&mut self) {
        self.prev_seeds = None;
        self.curr_seeds = None;
    }

    pub fn has_history(&self) -> bool {
        self.prev_seeds.is_some()
    }

    /// Returns this frame's target in given stratum.
    pub fn target(&self, stratum: UVec2) -> UVec2 {
        let origin = stratum * STRATA_SIZE;

        assert!(
            origin.x < self.size.x && origin.y < self.size.y,
            "stratum {stratum:?} lies outside of the frame"
        );

        let extent = (self.size - origin).min(UVec2::splat(STRATA_SIZE));
        let pick = Noise::new(self.frame_seed, stratum).sample_int();

        origin + uvec2(pick % extent.x, (pick / extent.x) % extent.y)
    }

    pub fn is_target(&self, pos: UVec2) -> bool {
        self.has_history() && self.target(pos / STRATA_SIZE) == pos
    }

    /// Returns a fresh seed for given pixel.
    pub fn seed(&self, pos: UVec2) -> u32 {
        Noise::new(self.frame_seed, pos).sample_int()
    }

    /// Returns the seed previous frame shaded given pixel with.
    pub fn prev_seed(&self, pos: UVec2) -> Option<u32> {
        let seeds = self.prev_seeds.as_ref()?;

        if pos.x >= self.size.x || pos.y >= self.size.y {
            return None;
        }

        seeds.get((pos.y * self.size.x + pos.x) as usize).copied()
    }

    /// Returns the seed given pixel has to be shaded with, if it's a target;
    /// `motion` is the pixel's motion vector.
    pub fn gradient_seed(&self, pos: UVec2, motion: Vec3) -> Option<u32> {
        if !self.is_target(pos) {
            return None;
        }

        let prev_pos = Reprojection::new(pos, 0.0, motion).nearest();

        if prev_pos.x < 0 || prev_pos.y < 0 {
            return None;
        }

        self.prev_seed(prev_pos.as_uvec2())
    }

    pub(crate) fn record(&mut self, seeds: Vec<u32>) {
        assert_eq!(
            (self.size.x * self.size.y) as usize,
            seeds.len(),
            "recorded seeds don't match render size"
        );

        self.curr_seeds = Some(seeds);
    }
}

#[cfg(test)]
mod tests {
    use glam::vec3;

    use super::*;

    fn targets(size: UVec2) -> GradientTargets {
        let mut target = GradientTargets::new();

        target.begin_frame(size, 1);
        target.record((0..size.x * size.y).collect());
        target.begin_frame(size, 2);
        target
    }

    #[test]
    fn one_target_per_stratum() {
        let size = uvec2(8, 7);
        let target = targets(size);
        let mut counts = vec![0; 9];

        for y in 0..size.y {
            for x in 0..size.x {
                if target.is_target(uvec2(x, y)) {
                    counts[(y / 3 * 3 + x / 3) as usize] += 1;
                }
            }
        }

        // Partial strata at the borders included
        assert_eq!(vec![1; 9], counts);
    }

    #[test]
    fn targets_change_between_frames() {
        let size = uvec2(30, 30);
        let mut target = targets(size);
        let a: Vec<_> = (0..10).map(|x| target.target(uvec2(x, 0))).collect();

        target.begin_frame(size, 3);

        let b: Vec<_> = (0..10).map(|x| target.target(uvec2(x, 0))).collect();

        assert_ne!(a, b);
    }

    #[test]
    fn gradient_seeds_follow_motion() {
        let size = uvec2(6, 6);
        let target = targets(size);
        let pos = target.target(uvec2(1, 1));

        assert_eq!(
            Some(pos.y * 6 + pos.x),
            target.gradient_seed(pos, Vec3::ZERO)
        );

        let moved = (pos.as_ivec2() - 1).as_uvec2();

        assert_eq!(
            Some(moved.y * 6 + moved.x),
            target.gradient_seed(pos, vec3(-1.0, -1.0, 0.0))
        );

        // Pixels that aren't targets get fresh seeds
        let other = uvec2(if pos.x == 3 { 4 } else { 3 }, pos.y);

        assert_eq!(None, target.gradient_seed(other, Vec3::ZERO));
    }

    #[test]
    fn no_targets_without_history() {
        let size = uvec2(6, 6);
        let mut target = targets(size);

        target.reset();
        target.begin_frame(size, 3);

        assert!(!target.has_history());
        assert!(!target.is_target(target.target(UVec2::ZERO)));

        // Recorded seeds of a different size can't be reused either
        let mut target = targets(size);

        target.record((0..36).collect());
        target.begin_frame(uvec2(3, 3), 4);

        assert!(!target.has_history());
    }
}
