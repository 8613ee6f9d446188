use core::ops::{Deref, DerefMut};

use glam::{vec3, vec4, Vec3, Vec4, Vec4Swizzles};
use half::f16;
use spirv_std::arch::IndexUnchecked;

use crate::{F32Ext, Hit, LayeredBrdf, Normal, Reservoir, Vec3Ext};

/// Reservoir carrying one indirect-lighting sample per pixel, consumed by the
/// spatiotemporal resampling passes.
#[derive(Clone, Copy, Default)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct GiReservoir {
    pub reservoir: Reservoir<GiSample>,
    pub flags: GiFlags,
}

impl GiReservoir {
    /// Number of `Vec4`s occupied by a single reservoir.
    pub const STRIDE: usize = 2;

    pub fn read(buffer: &[Vec4], id: usize) -> Self {
        let d0 = unsafe { *buffer.index_unchecked(Self::STRIDE * id) };
        let d1 = unsafe { *buffer.index_unchecked(Self::STRIDE * id + 1) };

        let [r, g] = unpack_f16x2(d1.x.to_bits());
        let [b, flags] = unpack_u16x2(d1.y.to_bits());
        let b = f16::from_bits(b as u16).to_f32();

        Self {
            reservoir: Reservoir {
                sample: GiSample {
                    position: d0.xyz(),
                    normal: Normal::decode_u32(d1.z.to_bits()),
                    radiance: Vec3::new(r, g, b),
                },
                m: d1.w.to_bits(),
                w: d0.w,
            },
            flags: GiFlags::unpack(flags),
        }
    }

    pub fn write(self, buffer: &mut [Vec4], id: usize) {
        let radiance = GiSample::clamp_radiance(self.sample.radiance);

        let d0 = self.sample.position.extend(self.w.sanitize());

        let d1 = vec4(
            f32::from_bits(pack_f16x2([radiance.x, radiance.y])),
            f32::from_bits(
                (f16::from_f32(radiance.z).to_bits() as u32)
                    | (self.flags.pack() << 16),
            ),
            f32::from_bits(Normal::encode_u32(self.sample.normal)),
            f32::from_bits(self.m),
        );

        unsafe {
            *buffer.index_unchecked_mut(Self::STRIDE * id) = d0;
            *buffer.index_unchecked_mut(Self::STRIDE * id + 1) = d1;
        }
    }

    /// Returns the carried sample, if there's anything to carry.
    pub fn carried(&self) -> Option<GiSample> {
        if self.is_empty() || !self.flags.is_valid {
            None
        } else {
            Some(self.sample)
        }
    }
}

impl Deref for GiReservoir {
    type Target = Reservoir<GiSample>;

    fn deref(&self) -> &Self::Target {
        &self.reservoir
    }
}

impl DerefMut for GiReservoir {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.reservoir
    }
}

#[derive(Clone, Copy, Default, PartialEq)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct GiSample {
    pub position: Vec3,
    pub normal: Vec3,

    /// Radiance divided by the density of having picked this sample
    pub radiance: Vec3,
}

impl GiSample {
    /// Largest radiance (per component) that survives packing into a
    /// half-float.
    pub const MAX_RADIANCE: f32 = 65000.0;

    /// Returns how much `hit` cares about this sample - the target function
    /// used when resampling.
    pub fn target_pdf(&self, hit: &Hit) -> f32 {
        let l = self.dir(hit.point);
        let brdf = LayeredBrdf::new(&hit.gbuffer);

        self.radiance.luma() * brdf.importance(l, hit.view())
    }

    pub fn dir(&self, point: Vec3) -> Vec3 {
        (self.position - point).normalize_or_zero()
    }

    /// Clamps each component into `<0.0, MAX_RADIANCE>`; NaNs become zero.
    pub fn clamp_radiance(radiance: Vec3) -> Vec3 {
        let clamp = |value: f32| {
            if value.is_nan() {
                0.0
            } else {
                value.clamp(0.0, Self::MAX_RADIANCE)
            }
        };

        vec3(clamp(radiance.x), clamp(radiance.y), clamp(radiance.z))
    }
}

/// Bookkeeping attached to [`GiReservoir`], packed into 16 bits:
///
/// - bits 0..8 - virtual fraction,
/// - bits 8..15 - portal id,
/// - bit 15 - validity.
#[derive(Clone, Copy, Default, PartialEq)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct GiFlags {
    pub is_valid: bool,

    /// Fraction of the path that's been traced through a virtual (e.g.
    /// reflected) segment, in range `<0.0, 1.0>`
    pub virtual_fraction: f32,

    /// Portal the sample has been reached through; only the lower 7 bits
    /// are stored
    pub portal_id: u32,
}

impl GiFlags {
    pub fn unpack(d0: u32) -> Self {
        Self {
            is_valid: (d0 >> 15) & 1 == 1,
            virtual_fraction: ((d0 & 0xff) as f32) / 255.0,
            portal_id: (d0 >> 8) & 0x7f,
        }
    }

    pub fn pack(self) -> u32 {
        let virtual_fraction =
            (self.virtual_fraction.saturate() * 255.0 + 0.5) as u32;

        virtual_fraction
            | ((self.portal_id & 0x7f) << 8)
            | ((self.is_valid as u32) << 15)
    }
}

fn pack_f16x2([a, b]: [f32; 2]) -> u32 {
    let a = f16::from_f32(a).to_bits() as u32;
    let b = f16::from_f32(b).to_bits() as u32;

    a | (b << 16)
}

fn unpack_f16x2(d0: u32) -> [f32; 2] {
    let [a, b] = unpack_u16x2(d0);

    [
        f16::from_bits(a as u16).to_f32(),
        f16::from_bits(b as u16).to_f32(),
    ]
}

fn unpack_u16x2(d0: u32) -> [u32; 2] {
    [d0 & 0xffff, d0 >> 16]
}
