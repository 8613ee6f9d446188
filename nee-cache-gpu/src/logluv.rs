use glam::{vec3, Mat3, Vec3};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

use crate::Vec3Ext;

/// Compact, 32-bit representation of an HDR color.
///
/// Layout:
///
/// - bits 20..32 - log2 of luminance, 64 steps per stop, with zero reserved
///   for black,
/// - bits 10..20 - CIE u' chromaticity,
/// - bits 0..10 - CIE v' chromaticity.
///
/// Covers luminances from `2^-32` to `2^32` with relative error below 1%.
pub struct LogLuv;

impl LogLuv {
    const LOG_STEPS: f32 = 64.0;
    const LOG_OFFSET: f32 = 32.0;
    const LOG_MAX: f32 = 4095.0;
    const UV_SCALE: f32 = 1023.0 / 0.62;

    pub fn encode(rgb: Vec3) -> u32 {
        let xyz = rgb_to_xyz() * rgb.sanitize();
        let y = xyz.y;

        if !(y > 0.0) {
            return 0;
        }

        let log = ((y.log2() + Self::LOG_OFFSET) * Self::LOG_STEPS).round();

        if log < 1.0 {
            return 0;
        }

        let log = log.min(Self::LOG_MAX) as u32;
        let denominator = xyz.x + 15.0 * xyz.y + 3.0 * xyz.z;
        let u = 4.0 * xyz.x / denominator;
        let v = 9.0 * xyz.y / denominator;
        let u = (u * Self::UV_SCALE).round().clamp(0.0, 1023.0) as u32;
        let v = (v * Self::UV_SCALE).round().clamp(0.0, 1023.0) as u32;

        (log << 20) | (u << 10) | v
    }

    pub fn decode(value: u32) -> Vec3 {
        let log = value >> 20;

        if log == 0 {
            return Vec3::ZERO;
        }

        let y = ((log as f32) / Self::LOG_STEPS - Self::LOG_OFFSET).exp2();
        let u = (((value >> 10) & 1023) as f32) / Self::UV_SCALE;
        let v = ((value & 1023) as f32) / Self::UV_SCALE;
        let denominator = 6.0 * u - 16.0 * v + 12.0;
        let cx = 9.0 * u / denominator;
        let cy = 4.0 * v / denominator;

        if !(cy > 0.0) {
            return Vec3::ZERO;
        }

        let xyz = vec3(cx / cy * y, y, (1.0 - cx - cy) / cy * y);

        (xyz_to_rgb() * xyz).max(Vec3::ZERO)
    }
}

fn rgb_to_xyz() -> Mat3 {
    Mat3::from_cols(
        vec3(0.4124564, 0.2126729, 0.0193339),
        vec3(0.3575761, 0.7151522, 0.1191920),
        vec3(0.1804375, 0.0721750, 0.9503041),
    )
}

fn xyz_to_rgb() -> Mat3 {
    Mat3::from_cols(
        vec3(3.2404542, -0.9692660, 0.0556434),
        vec3(-1.5371385, 1.8760108, -0.2040259),
        vec3(-0.4985314, 0.0415560, 1.0572252),
    )
}
