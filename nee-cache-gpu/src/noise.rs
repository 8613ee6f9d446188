use glam::UVec2;

use crate::{hash, Frame};

/// Identifies an independent random sequence within a pixel.
///
/// Two streams of the same pixel and frame never share samples, so e.g. the
/// reservoir's acceptance test doesn't shift when cache insertion starts
/// consuming more samples.
#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct NoiseStream(u32);

impl NoiseStream {
    pub const NEE_CACHE: Self = Self(0x4e45_4543);
    pub const RESERVOIR: Self = Self(0x5253_5652);

    pub fn get(self) -> u32 {
        self.0
    }
}

/// Deterministic per-pixel white noise.
///
/// The sequence is a pure function of (frame, pixel, stream) - constructing
/// the generator twice yields the same samples.
#[derive(Clone, Copy)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct WhiteNoise {
    state: u32,
}

impl WhiteNoise {
    pub fn new(frame: Frame, screen_pos: UVec2, stream: NoiseStream) -> Self {
        let seed = hash(frame.get() ^ hash(stream.get()));
        let seed = hash(screen_pos.x ^ hash(screen_pos.y ^ seed));

        Self { state: seed }
    }

    /// Generates a uniform sample in range `<0.0, 1.0)`.
    pub fn sample(&mut self) -> f32 {
        // Keep only 24 bits so that the result is exactly representable and
        // never rounds up to 1.0
        ((self.sample_int() >> 8) as f32) * (1.0 / 16_777_216.0)
    }

    /// Generates a uniform sample in range `<0, u32::MAX>`.
    pub fn sample_int(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(747796405)
            .wrapping_add(2891336453);

        let word = ((self.state >> ((self.state >> 28) + 4)) ^ self.state)
            .wrapping_mul(277803737);

        (word >> 22) ^ word
    }

    /// Generates a uniform sample in range `<0, n)`; returns 0 for `n = 0`.
    pub fn sample_below(&mut self, n: u32) -> u32 {
        let sample = self.sample();

        if n == 0 {
            0
        } else {
            ((sample * (n as f32)) as u32).min(n - 1)
        }
    }
}
