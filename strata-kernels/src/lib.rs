//! Per-pixel entry points of strata's passes.
//!
//! Each module exposes a `main()` invoked once per texel of the dispatch; it
//! receives its inputs in binding order and returns one texel per output.

#![allow(clippy::too_many_arguments)]

pub mod antifirefly;
pub mod frame_composition;
pub mod gradient_atrous;
pub mod gradient_samples;
pub mod merge_geometry;
pub mod spatial_atrous;
pub mod temporal_accumulation;
pub mod variance_estimation;
