mod shared_buffer;

pub use self::shared_buffer::*;
