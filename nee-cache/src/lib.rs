//! Host side of the NEE cache pass: owns the buffers shared between pixels,
//! turns [`NeeCacheConfig`] into pass parameters and dispatches the pass over
//! the screen, tile by tile.

mod buffers;
mod config;
mod error;
mod nee_cache_buffer;
mod renderer;
mod training_vertex_buffer;
mod utils;

pub use nee_cache_gpu as gpu;

pub use self::buffers::*;
pub use self::config::*;
pub use self::error::*;
pub use self::nee_cache_buffer::*;
pub use self::renderer::*;
pub use self::training_vertex_buffer::*;
pub(crate) use self::utils::*;
