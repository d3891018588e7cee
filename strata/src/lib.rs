//! strata: spatiotemporal variance-guided denoiser for real-time path
//! tracers.
//!
//! The host side records the denoising passes into command lists through
//! [`GpuApi`]; [`SoftwareDevice`] implements it on the CPU, running the
//! kernels from `strata-kernels`.

#![allow(clippy::new_without_default)]
#![allow(clippy::too_many_arguments)]

mod command_recorder;
mod composition;
mod config;
mod denoiser;
mod error;
mod frame_resources;
mod geometry_matches;
mod gpu;
mod gradient_targets;
mod image_bank;
mod kernels;
mod orchestrator;
mod pass;
mod software_device;
mod utils;

pub use strata_gpu as types;

pub use self::command_recorder::*;
pub use self::composition::*;
pub use self::config::*;
pub use self::denoiser::*;
pub use self::error::*;
pub use self::frame_resources::*;
pub use self::geometry_matches::*;
pub use self::gpu::*;
pub use self::gradient_targets::*;
pub use self::image_bank::*;
pub use self::kernels::*;
pub use self::orchestrator::*;
pub use self::pass::*;
pub use self::software_device::*;
pub(crate) use self::utils::*;
