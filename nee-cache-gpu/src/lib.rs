//! Common structs, algorithms etc. used by the NEE cache pass, both when it's
//! compiled into a shader and when it's dispatched on the CPU.

#![cfg_attr(target_arch = "spirv", no_std)]
#![allow(clippy::len_without_is_empty)]
#![allow(clippy::manual_range_contains)]
#![allow(clippy::too_many_arguments)]

mod brdf;
mod emissive;
mod frame;
mod gbuffer;
mod hit;
mod light_sample;
mod logluv;
mod mis;
mod nee_cache;
mod noise;
mod normal;
mod pass;
mod passes;
mod ray;
mod reservoir;
mod storage;
mod training;
mod utils;
mod visibility;

pub use self::brdf::*;
pub use self::emissive::*;
pub use self::frame::*;
pub use self::gbuffer::*;
pub use self::hit::*;
pub use self::light_sample::*;
pub use self::logluv::*;
pub use self::mis::*;
pub use self::nee_cache::*;
pub use self::noise::*;
pub use self::normal::*;
pub use self::pass::*;
pub use self::passes::*;
pub use self::ray::*;
pub use self::reservoir::*;
pub use self::storage::*;
pub use self::training::*;
pub use self::utils::*;
pub use self::visibility::*;

/// Smallest value we consider a non-zero length, area, luminance etc.
pub const NEE_EPSILON: f32 = 0.000001;
