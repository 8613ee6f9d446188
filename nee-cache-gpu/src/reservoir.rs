mod gi;

pub use self::gi::*;
use crate::F32Ext;

/// Single-sample weighted reservoir.
#[derive(Clone, Copy, Default, PartialEq)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct Reservoir<T> {
    pub sample: T,

    /// Number of candidates streamed through this reservoir; zero means the
    /// sample is meaningless and must not be read
    pub m: u32,

    /// Average weight of the streamed candidates
    pub w: f32,
}

impl<T> Reservoir<T>
where
    T: Clone + Copy,
{
    /// Streams a candidate through this reservoir.
    ///
    /// The candidate's `weight` is scaled by `mix_probability` and it replaces
    /// the current sample with probability `weight / (total + weight)`, using
    /// `u` (in range `<0.0, 1.0)`) as the random draw. Nonsense weights
    /// (negative, NaN, infinite) count as zero.
    ///
    /// Returns whether the sample has been replaced.
    pub fn update(
        &mut self,
        sample: T,
        weight: f32,
        mix_probability: f32,
        u: f32,
    ) -> bool {
        let weighted = (weight * mix_probability).sanitize();
        let total = self.w.sanitize() * (self.m as f32) + weighted;

        self.m = self.m.saturating_add(1);
        self.w = total / (self.m as f32);

        if weighted > 0.0 && u * total < weighted {
            self.sample = sample;
            true
        } else {
            false
        }
    }

    pub fn is_empty(&self) -> bool {
        self.m == 0
    }
}
