//! Common structs and algorithms used by strata's kernels and host code.

#![allow(clippy::len_without_is_empty)]
#![allow(clippy::manual_range_contains)]

mod gbuffer;
mod geometry;
mod gradient;
mod noise;
mod normal;
mod passes;
mod reprojection;
mod sh;
mod tex;
mod utils;
mod visibility;

pub use self::gbuffer::*;
pub use self::geometry::*;
pub use self::gradient::*;
pub use self::noise::*;
pub use self::normal::*;
pub use self::passes::*;
pub use self::reprojection::*;
pub use self::sh::*;
pub use self::tex::*;
pub use self::utils::*;
pub use self::visibility::*;

pub mod prelude {
    pub use glam::*;

    pub use crate::*;
}

/// Width and height (in pixels) of a single gradient stratum.
///
/// Each stratum contributes exactly one gradient sample per frame, so the
/// gradient images are downscaled by this factor.
pub const STRATA_SIZE: u32 = 3;

/// Number of iterations of the dilating filter applied over gradients.
pub const GRADIENT_ATROUS_ITERATIONS: u32 = 4;

/// Number of iterations of the edge-avoiding spatial filter.
pub const ATROUS_ITERATIONS: u32 = 4;
