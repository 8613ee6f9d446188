use glam::{vec3, vec4, Vec3, Vec4};
#[cfg(target_arch = "spirv")]
use spirv_std::num_traits::Float;

use crate::{F32Ext, Normal};

/// Surface state of the primary hit, as decoded from the geometry buffer.
#[derive(Clone, Copy, Default)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct GBufferEntry {
    pub base_color: Vec3,
    pub normal: Vec3,
    pub metallic: f32,
    pub roughness: f32,
    pub reflectance: f32,
    pub depth: f32,
    pub flags: u32,
}

impl GBufferEntry {
    /// Surface uses a height map, so shadow rays must start above the
    /// displaced surface rather than at the interpolated triangle.
    pub const FLAG_DISPLACEMENT: u32 = 1;

    pub fn unpack(d0: Vec4) -> Self {
        let [r, g, b, flags] = to_bytes(d0.x.to_bits());
        let [metallic, roughness, reflectance, _] = to_bytes(d0.z.to_bits());

        Self {
            base_color: vec3(r as f32, g as f32, b as f32) / 255.0,
            normal: Normal::decode_u32(d0.y.to_bits()),
            metallic: metallic as f32 / 255.0,
            roughness: roughness as f32 / 255.0,
            reflectance: reflectance as f32 / 255.0,
            depth: d0.w,
            flags,
        }
    }

    pub fn pack(self) -> Vec4 {
        fn unorm(value: f32) -> u32 {
            (value.saturate() * 255.0 + 0.5) as u32
        }

        let x = from_bytes([
            unorm(self.base_color.x),
            unorm(self.base_color.y),
            unorm(self.base_color.z),
            self.flags & 0xff,
        ]);

        let z = from_bytes([
            unorm(self.metallic),
            unorm(self.roughness),
            unorm(self.reflectance),
            0,
        ]);

        vec4(
            f32::from_bits(x),
            f32::from_bits(Normal::encode_u32(self.normal)),
            f32::from_bits(z),
            self.depth,
        )
    }

    /// Returns whether this entry describes an actual surface; primary rays
    /// that missed the scene leave the depth at zero.
    pub fn is_some(&self) -> bool {
        self.depth > 0.0
    }

    pub fn has_displacement(&self) -> bool {
        self.flags & Self::FLAG_DISPLACEMENT > 0
    }

    pub fn clamped_roughness(&self) -> f32 {
        self.roughness.clamp(0.089 * 0.089, 1.0)
    }

    /// Returns half-angle of the cone into which this surface scatters most
    /// of the light.
    pub fn lobe_angle(&self) -> f32 {
        self.clamped_roughness().sqr() * core::f32::consts::FRAC_PI_2
    }
}

fn from_bytes([a, b, c, d]: [u32; 4]) -> u32 {
    a | (b << 8) | (c << 16) | (d << 24)
}

fn to_bytes(value: u32) -> [u32; 4] {
    [
        value & 0xff,
        (value >> 8) & 0xff,
        (value >> 16) & 0xff,
        value >> 24,
    ]
}
