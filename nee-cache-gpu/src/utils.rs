mod f32_ext;
mod vec3_ext;

pub use self::f32_ext::*;
pub use self::vec3_ext::*;

/// PCG-based integer hash; used both to seed the noise and to address the
/// cache's cells.
pub fn hash(value: u32) -> u32 {
    let state = value.wrapping_mul(747796405).wrapping_add(2891336453);
    let word =
        ((state >> ((state >> 28) + 4)) ^ state).wrapping_mul(277803737);

    (word >> 22) ^ word
}
