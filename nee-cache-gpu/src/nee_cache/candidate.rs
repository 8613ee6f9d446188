use glam::{vec4, Vec4};

/// Emissive region referred to by a cache candidate: a range of triangles
/// within one emissive surface.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct NeeRegion {
    pub surface_id: u32,

    /// First triangle of the range, relative to the surface's first triangle
    pub primitive_offset: u32,

    pub primitive_count: u32,
}

impl NeeRegion {
    pub fn new(
        surface_id: u32,
        primitive_offset: u32,
        primitive_count: u32,
    ) -> Self {
        Self {
            surface_id,
            primitive_offset,
            primitive_count,
        }
    }
}

#[derive(Clone, Copy, Default, PartialEq)]
#[cfg_attr(not(target_arch = "spirv"), derive(Debug))]
pub struct NeeCandidate {
    pub region: NeeRegion,

    /// Importance of this region; candidates are picked proportionally to it
    pub weight: f32,
}

impl NeeCandidate {
    pub fn new(region: NeeRegion, weight: f32) -> Self {
        Self { region, weight }
    }

    pub fn unpack(d0: Vec4) -> Self {
        Self {
            region: NeeRegion {
                surface_id: d0.x.to_bits(),
                primitive_offset: d0.y.to_bits(),
                primitive_count: d0.z.to_bits(),
            },
            weight: d0.w,
        }
    }

    pub fn pack(self) -> Vec4 {
        vec4(
            f32::from_bits(self.region.surface_id),
            f32::from_bits(self.region.primitive_offset),
            f32::from_bits(self.region.primitive_count),
            self.weight,
        )
    }

    /// Returns the weight, with nonsense (negative, NaN, infinite) values
    /// mapped to zero.
    pub fn clamped_weight(&self) -> f32 {
        if self.weight.is_finite() && self.weight > 0.0 {
            self.weight
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialization() {
        let target = NeeCandidate::new(NeeRegion::new(0xcafebabe, 12, 3), 0.75);
        let target = NeeCandidate::unpack(target.pack());

        assert_eq!(0xcafebabe, target.region.surface_id);
        assert_eq!(12, target.region.primitive_offset);
        assert_eq!(3, target.region.primitive_count);
        assert_eq!(0.75, target.weight);
    }

    #[test]
    fn clamped_weight() {
        let region = NeeRegion::default();

        assert_eq!(0.0, NeeCandidate::new(region, -1.0).clamped_weight());
        assert_eq!(0.0, NeeCandidate::new(region, f32::NAN).clamped_weight());
        assert_eq!(0.5, NeeCandidate::new(region, 0.5).clamped_weight());
    }
}
